// 🕵️ Person Entity - the gated record
//
// "The id is IDENTITY, everything else is a VALUE"
//
// - access_level decides who may read the record by id
// - alias lookups are case-insensitive and NOT gated
// - legacy rows without an access level read back as level 1

use serde::{Deserialize, Serialize};

use crate::clearance::DEFAULT_ACCESS_LEVEL;

fn default_access_level() -> i64 {
    DEFAULT_ACCESS_LEVEL
}

// ============================================================================
// PERSON
// ============================================================================

/// A person in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// Stable identity - assigned once by the store
    pub id: i64,

    pub full_name: String,

    /// Short handle ("Sloba", "Arkan"); matched case-insensitively
    #[serde(default)]
    pub alias: Option<String>,

    /// Free-form label: Hostile, Friendly, Neutral, Ally, Unfriendly, ...
    pub affiliation: String,

    /// Role, e.g. "Political Leader"
    pub category: String,

    /// Where the person is usually found
    #[serde(default)]
    pub location_id: Option<i64>,

    /// External reference link
    #[serde(default)]
    pub real_person_wiki: Option<String>,

    /// Required clearance to read this record by id (1-9)
    #[serde(default = "default_access_level")]
    pub access_level: i64,
}

impl Person {
    /// Case-insensitive exact alias comparison.
    pub fn has_alias(&self, alias: &str) -> bool {
        self.alias
            .as_deref()
            .map(|own| own.to_lowercase() == alias.to_lowercase())
            .unwrap_or(false)
    }

    /// Canonical retrieval path for this person.
    pub fn canonical_path(&self) -> String {
        format!("/people/{}", self.id)
    }
}

// ============================================================================
// DRAFTS
// ============================================================================

/// Unvalidated creation input, exactly as a caller sent it.
///
/// Every field is optional so that missing values surface as field errors
/// rather than as a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonDraft {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub affiliation: Option<String>,
    #[serde(default)]
    pub access_level: Option<i64>,
    #[serde(default)]
    pub location_id: Option<i64>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub real_person_wiki: Option<String>,
}

impl PersonDraft {
    pub fn new(
        full_name: impl Into<String>,
        category: impl Into<String>,
        affiliation: impl Into<String>,
        access_level: i64,
    ) -> Self {
        PersonDraft {
            full_name: Some(full_name.into()),
            category: Some(category.into()),
            affiliation: Some(affiliation.into()),
            access_level: Some(access_level),
            ..Default::default()
        }
    }
}

/// A validated draft, ready for the store. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPerson {
    pub full_name: String,
    pub alias: Option<String>,
    pub affiliation: String,
    pub category: String,
    pub location_id: Option<i64>,
    pub real_person_wiki: Option<String>,
    pub access_level: i64,
}

impl NewPerson {
    /// Attach the store-assigned id.
    pub fn into_person(self, id: i64) -> Person {
        Person {
            id,
            full_name: self.full_name,
            alias: self.alias,
            affiliation: self.affiliation,
            category: self.category,
            location_id: self.location_id,
            real_person_wiki: self.real_person_wiki,
            access_level: self.access_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_access_level_defaults_to_one() {
        let json = r#"{"id": 7, "fullName": "Legacy Row", "affiliation": "Neutral", "category": "Clerk"}"#;
        let person: Person = serde_json::from_str(json).unwrap();

        assert_eq!(person.access_level, 1);
        assert_eq!(person.alias, None);
        assert_eq!(person.location_id, None);
    }

    #[test]
    fn test_alias_match_ignores_case() {
        let person = NewPerson {
            full_name: "Slobodan Milošević".to_string(),
            alias: Some("Sloba".to_string()),
            affiliation: "Hostile".to_string(),
            category: "Political Leader".to_string(),
            location_id: Some(1),
            real_person_wiki: None,
            access_level: 5,
        }
        .into_person(1);

        assert!(person.has_alias("sloba"));
        assert!(person.has_alias("SLOBA"));
        assert!(!person.has_alias("slob"));
        assert_eq!(person.canonical_path(), "/people/1");
    }

    #[test]
    fn test_draft_deserializes_partial_body() {
        let draft: PersonDraft = serde_json::from_str(r#"{"fullName": "X"}"#).unwrap();

        assert_eq!(draft.full_name.as_deref(), Some("X"));
        assert_eq!(draft.affiliation, None);
        assert_eq!(draft.access_level, None);
    }
}
