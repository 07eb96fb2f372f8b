// 📜 Protocol Entity - operating guidelines attached to a location

use serde::{Deserialize, Serialize};

/// Field guideline for operating at a location. Not clearance-gated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Protocol {
    pub id: i64,
    pub location_id: i64,
    pub title: String,
    pub concise_guideline: String,
}
