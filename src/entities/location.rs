// 📍 Location Entity - cities and named venues

use serde::{Deserialize, Serialize};

/// A city, or a named venue inside a city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: i64,

    /// Venue name ("Holiday Inn"); `None` for a bare city entry
    #[serde(default)]
    pub name: Option<String>,

    pub city: String,
    pub country: String,
    pub currency: String,
}

impl Location {
    /// True for named venues, false for bare cities.
    pub fn is_venue(&self) -> bool {
        self.name.is_some()
    }

    /// "Holiday Inn, Sarajevo" or just "Sarajevo".
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => format!("{}, {}", name, self.city),
            None => self.city.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        let city = Location {
            id: 5,
            name: None,
            city: "Sarajevo".to_string(),
            country: "Bosnia and Herzegovina".to_string(),
            currency: "Bosnian Dinar".to_string(),
        };
        let venue = Location {
            id: 21,
            name: Some("Holiday Inn".to_string()),
            ..city.clone()
        };

        assert!(!city.is_venue());
        assert_eq!(city.display_name(), "Sarajevo");
        assert!(venue.is_venue());
        assert_eq!(venue.display_name(), "Holiday Inn, Sarajevo");
    }
}
