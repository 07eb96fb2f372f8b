// Agency Directory - Core Library
// Exposes all modules for use in the CLI, the API server, and tests

pub mod clearance;  // Clearance Gate - allow/deny by level
pub mod config;     // JSON file + env configuration
pub mod db;         // Record Store contract + SQLite store
pub mod directory;  // Directory Service - the orchestrator
pub mod entities;   // People, Locations, Protocols
pub mod error;
pub mod logging;
pub mod memory;     // In-memory Record Store
pub mod schema;     // Draft validation
pub mod search;     // Search Engine
pub mod seed;       // Seeder - schema + reference data

#[cfg(feature = "server")]
pub mod api;        // Axum routes

// Re-export commonly used types
pub use clearance::{
    authorize, caller_level_from_header, Decision,
    DEFAULT_ACCESS_LEVEL, MAX_ACCESS_LEVEL,
};
pub use config::{Agency, Config, ConfigError, StoreKind};
pub use db::{RecordStore, SqliteStore};
pub use directory::{DirectoryService, LinkGenerator, PathLinks, SearchHit};
pub use entities::{Location, NewPerson, Person, PersonDraft, Protocol};
pub use error::{DirectoryError, DirectoryResult, StoreError, StoreResult};
pub use memory::MemoryStore;
pub use schema::{validate_draft, FieldError};
pub use search::{search, SearchQuery, Searchable};
pub use seed::{ensure_schema, initialize, seed_if_empty, SeedData, SeedReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
