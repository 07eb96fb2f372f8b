// 📐 Shape Layer - Draft Validation
// Validates person drafts before they reach the store.
// Every rule runs; all failures come back together, one entry per problem.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::clearance::{DEFAULT_ACCESS_LEVEL, MAX_ACCESS_LEVEL};
use crate::entities::{NewPerson, PersonDraft};

pub const MAX_CATEGORY_LEN: usize = 50;

// ============================================================================
// FIELD ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Wire name of the offending field (camelCase)
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Group errors by field, the shape HTTP validation problems use.
pub fn group_by_field(errors: &[FieldError]) -> BTreeMap<String, Vec<String>> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for error in errors {
        grouped
            .entry(error.field.clone())
            .or_default()
            .push(error.message.clone());
    }
    grouped
}

// ============================================================================
// VALIDATION
// ============================================================================

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Validate a draft. Referential checks (does the location exist?) are the
/// directory's job; this only checks shape.
pub fn validate_draft(draft: &PersonDraft) -> Result<NewPerson, Vec<FieldError>> {
    let mut errors = Vec::new();

    let full_name = non_empty(&draft.full_name);
    if full_name.is_none() {
        errors.push(FieldError::new("fullName", "The FullName field is required."));
    }

    let affiliation = non_empty(&draft.affiliation);
    if affiliation.is_none() {
        errors.push(FieldError::new("affiliation", "The Affiliation field is required."));
    }

    let category = draft.category.clone().unwrap_or_default();
    if category.chars().count() > MAX_CATEGORY_LEN {
        errors.push(FieldError::new(
            "category",
            format!("The Category field must be at most {} characters.", MAX_CATEGORY_LEN),
        ));
    }

    let access_level = draft.access_level.unwrap_or(0);
    if !(DEFAULT_ACCESS_LEVEL..=MAX_ACCESS_LEVEL).contains(&access_level) {
        errors.push(FieldError::new(
            "accessLevel",
            format!(
                "The AccessLevel field must be between {} and {}.",
                DEFAULT_ACCESS_LEVEL, MAX_ACCESS_LEVEL
            ),
        ));
    }

    match (full_name, affiliation) {
        (Some(full_name), Some(affiliation)) if errors.is_empty() => Ok(NewPerson {
            full_name,
            alias: non_empty(&draft.alias),
            affiliation,
            category,
            location_id: draft.location_id,
            real_person_wiki: non_empty(&draft.real_person_wiki),
            access_level,
        }),
        _ => Err(errors),
    }
}
