// Error taxonomy for the directory core
//
// Expected outcomes (not found, denied, invalid draft) are explicit variants.
// Only StoreUnavailable means something actually broke.

use thiserror::Error;

use crate::schema::FieldError;

/// Failure of the persistence medium itself.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store lock poisoned: {0}")]
    Poisoned(&'static str),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    NotFound(String),

    /// Only the levels are carried, never the record itself.
    #[error("clearance {provided} is below required level {required}")]
    AccessDenied { required: i64, provided: i64 },

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl DirectoryError {
    pub fn not_found(what: &str, key: impl std::fmt::Display) -> Self {
        DirectoryError::NotFound(format!("No {} found with {}", what, key))
    }
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;
