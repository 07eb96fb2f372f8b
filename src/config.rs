// ⚙️ Configuration - JSON file, then environment overrides
//
// Lookup order (later wins):
//   1. built-in defaults
//   2. JSON file at $DIRECTORY_CONFIG (or ./directory.json when present)
//   3. AGENCY_NAME, DIRECTORY_DB, DIRECTORY_STORE, DIRECTORY_BIND,
//      DIRECTORY_STATIC_DIR, DIRECTORY_LOG

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::db::{RecordStore, SqliteStore};
use crate::error::StoreError;
use crate::memory::MemoryStore;

pub const DEFAULT_CONFIG_FILE: &str = "directory.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

// ============================================================================
// CONFIG TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agency {
    pub id: i64,
    pub name: String,
    pub country: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Sqlite,
    Memory,
}

impl std::str::FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StoreKind::Sqlite),
            "memory" => Ok(StoreKind::Memory),
            _ => Err(ConfigError::InvalidValue {
                key: "DIRECTORY_STORE",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub agency_name: String,
    pub agencies: Vec<Agency>,
    pub store: StoreKind,
    /// SQLite file, or `:memory:`
    pub database: String,
    pub bind: String,
    /// Served as static files when the directory exists
    pub static_dir: PathBuf,
    /// tracing EnvFilter directive used when RUST_LOG is unset
    pub log: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            agency_name: "Unknown Agency".to_string(),
            agencies: Vec::new(),
            store: StoreKind::Sqlite,
            database: "directory.db".to_string(),
            bind: "0.0.0.0:3000".to_string(),
            static_dir: PathBuf::from("web"),
            log: "info".to_string(),
        }
    }
}

// ============================================================================
// LOADING
// ============================================================================

impl Config {
    /// Defaults, then the config file (if any), then process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::load_from(&env)
    }

    /// Same as `load`, reading variables from `env` instead of the process.
    pub fn load_from(env: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let config = match env.get("DIRECTORY_CONFIG") {
            Some(path) => Self::from_file(Path::new(path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Config::default(),
        };
        config.with_env(env)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn with_env(mut self, env: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        if let Some(name) = get("AGENCY_NAME") {
            self.agency_name = name.to_string();
        }
        if let Some(store) = get("DIRECTORY_STORE") {
            self.store = store.parse()?;
        }
        if let Some(database) = get("DIRECTORY_DB") {
            self.database = database.to_string();
        }
        if let Some(bind) = get("DIRECTORY_BIND") {
            self.bind = bind.to_string();
        }
        if let Some(dir) = get("DIRECTORY_STATIC_DIR") {
            self.static_dir = PathBuf::from(dir);
        }
        if let Some(log) = get("DIRECTORY_LOG") {
            self.log = log.to_string();
        }
        Ok(self)
    }

    /// Open the configured record store. Schema and seed are NOT applied.
    pub fn open_store(&self) -> Result<Arc<dyn RecordStore>, StoreError> {
        let store: Arc<dyn RecordStore> = match self.store {
            StoreKind::Memory => Arc::new(MemoryStore::new()),
            StoreKind::Sqlite if self.database == ":memory:" => {
                Arc::new(SqliteStore::open_in_memory()?)
            }
            StoreKind::Sqlite => Arc::new(SqliteStore::open(Path::new(&self.database))?),
        };
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_env_overrides_defaults() {
        let config = Config::default()
            .with_env(&env(&[
                ("AGENCY_NAME", "Field Office Sarajevo"),
                ("DIRECTORY_DB", ":memory:"),
                ("DIRECTORY_STORE", "memory"),
                ("DIRECTORY_BIND", "127.0.0.1:8080"),
                ("DIRECTORY_LOG", "   "),
            ]))
            .unwrap();

        assert_eq!(config.agency_name, "Field Office Sarajevo");
        assert_eq!(config.database, ":memory:");
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.bind, "127.0.0.1:8080");
        // blank values are ignored
        assert_eq!(config.log, "info");
    }

    #[test]
    fn test_invalid_store_kind() {
        let result = Config::default().with_env(&env(&[("DIRECTORY_STORE", "postgres")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_file_then_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "agencyName": "MI6",
                "agencies": [{{"id": 1, "name": "SIS", "country": "United Kingdom"}}],
                "store": "memory"
            }}"#
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let config = Config::load_from(&env(&[
            ("DIRECTORY_CONFIG", path.as_str()),
            ("AGENCY_NAME", "MI5"),
        ]))
        .unwrap();

        assert_eq!(config.agency_name, "MI5");
        assert_eq!(config.agencies.len(), 1);
        assert_eq!(config.agencies[0].country, "United Kingdom");
        assert_eq!(config.store, StoreKind::Memory);
        // untouched keys keep their defaults
        assert_eq!(config.bind, "0.0.0.0:3000");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = Config::load_from(&env(&[("DIRECTORY_CONFIG", "/nonexistent/directory.json")]));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_open_store_in_memory() {
        let config = Config {
            database: ":memory:".to_string(),
            ..Config::default()
        };
        let store = config.open_store().unwrap();
        store.ensure_schema().unwrap();
        assert!(!store.exists().unwrap());
    }
}
