use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::clearance::DEFAULT_ACCESS_LEVEL;
use crate::entities::{Location, NewPerson, Person, Protocol};
use crate::error::{StoreError, StoreResult};
use crate::seed::SeedData;

// ============================================================================
// RECORD STORE CONTRACT
// ============================================================================

/// The single shared resource behind the directory.
///
/// Lookups return `Ok(None)` / empty vectors for missing records; `Err` is
/// reserved for the medium itself being unusable. `create_person` is the only
/// mutation reachable from request handling and never reuses an id.
pub trait RecordStore: Send + Sync {
    /// Create the three collections if absent. Never drops or alters data.
    fn ensure_schema(&self) -> StoreResult<()>;

    fn person_count(&self) -> StoreResult<i64>;

    /// True once at least one person exists.
    fn exists(&self) -> StoreResult<bool> {
        Ok(self.person_count()? > 0)
    }

    fn get_person_by_id(&self, id: i64) -> StoreResult<Option<Person>>;

    /// Case-insensitive exact alias match; first in insertion order wins.
    fn get_person_by_alias(&self, alias: &str) -> StoreResult<Option<Person>>;

    /// All people, insertion order.
    fn list_people(&self) -> StoreResult<Vec<Person>>;

    fn list_people_matching(
        &self,
        predicate: &dyn Fn(&Person) -> bool,
    ) -> StoreResult<Vec<Person>> {
        Ok(self
            .list_people()?
            .into_iter()
            .filter(|person| predicate(person))
            .collect())
    }

    fn get_location_by_id(&self, id: i64) -> StoreResult<Option<Location>>;

    fn list_locations(&self) -> StoreResult<Vec<Location>>;

    /// Protocols for one location, insertion order.
    fn list_protocols_by_location(&self, location_id: i64) -> StoreResult<Vec<Protocol>>;

    /// Append a person under the next sequential id.
    fn create_person(&self, person: NewPerson) -> StoreResult<Person>;

    /// Insert a reference dataset for all three kinds as one batch.
    fn insert_seed(&self, data: &SeedData) -> StoreResult<()>;
}

// ============================================================================
// SQLITE STORE
// ============================================================================

/// `RecordStore` over a single SQLite connection.
///
/// The connection sits behind a mutex; every call holds it for the duration
/// of one statement (or one transaction for seeding).
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file. Enables WAL for crash recovery.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        info!(path = %path.display(), journal_mode = %mode, "opened sqlite store");
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        debug!("opened in-memory sqlite store");
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        SqliteStore {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Poisoned("sqlite connection"))
    }
}

const PERSON_COLUMNS: &str =
    "Id, FullName, Alias, Affiliation, Category, LocationId, RealPersonWiki, AccessLevel";

fn person_from_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    // Legacy rows may have no level at all
    let access_level: Option<i64> = row.get(7)?;

    Ok(Person {
        id: row.get(0)?,
        full_name: row.get(1)?,
        alias: row.get(2)?,
        affiliation: row.get(3)?,
        category: row.get(4)?,
        location_id: row.get(5)?,
        real_person_wiki: row.get(6)?,
        access_level: access_level.unwrap_or(DEFAULT_ACCESS_LEVEL),
    })
}

fn location_from_row(row: &Row<'_>) -> rusqlite::Result<Location> {
    Ok(Location {
        id: row.get(0)?,
        name: row.get(1)?,
        city: row.get(2)?,
        country: row.get(3)?,
        currency: row.get(4)?,
    })
}

fn protocol_from_row(row: &Row<'_>) -> rusqlite::Result<Protocol> {
    Ok(Protocol {
        id: row.get(0)?,
        location_id: row.get(1)?,
        title: row.get(2)?,
        concise_guideline: row.get(3)?,
    })
}

impl RecordStore for SqliteStore {
    fn ensure_schema(&self) -> StoreResult<()> {
        let conn = self.lock()?;

        // ==========================================================================
        // People (AUTOINCREMENT: ids are never handed out twice)
        // ==========================================================================
        conn.execute(
            "CREATE TABLE IF NOT EXISTS People (
                Id INTEGER PRIMARY KEY AUTOINCREMENT,
                FullName TEXT NOT NULL,
                Alias TEXT NULL,
                Affiliation TEXT NOT NULL,
                Category TEXT NOT NULL,
                LocationId INTEGER NULL,
                RealPersonWiki TEXT NULL,
                AccessLevel INTEGER
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS Locations (
                Id INTEGER PRIMARY KEY,
                Name TEXT NULL,
                City TEXT NOT NULL,
                Country TEXT NOT NULL,
                Currency TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS Protocols (
                Id INTEGER PRIMARY KEY,
                LocationId INTEGER NOT NULL,
                Title TEXT NOT NULL,
                ConciseGuideline TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_protocols_location ON Protocols(LocationId)",
            [],
        )?;

        debug!("schema ensured");
        Ok(())
    }

    fn person_count(&self) -> StoreResult<i64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM People", [], |row| row.get(0))?;
        Ok(count)
    }

    fn get_person_by_id(&self, id: i64) -> StoreResult<Option<Person>> {
        let conn = self.lock()?;
        let person = conn
            .query_row(
                &format!("SELECT {} FROM People WHERE Id = ?1", PERSON_COLUMNS),
                params![id],
                person_from_row,
            )
            .optional()?;
        Ok(person)
    }

    fn get_person_by_alias(&self, alias: &str) -> StoreResult<Option<Person>> {
        // SQLite's LOWER() only folds ASCII, so compare in Rust
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM People WHERE Alias IS NOT NULL ORDER BY Id",
            PERSON_COLUMNS
        ))?;
        let mut rows = stmt.query([])?;

        while let Some(row) = rows.next()? {
            let person = person_from_row(row)?;
            if person.has_alias(alias) {
                return Ok(Some(person));
            }
        }

        Ok(None)
    }

    fn list_people(&self) -> StoreResult<Vec<Person>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM People ORDER BY Id",
            PERSON_COLUMNS
        ))?;
        let people = stmt
            .query_map([], person_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(people)
    }

    fn get_location_by_id(&self, id: i64) -> StoreResult<Option<Location>> {
        let conn = self.lock()?;
        let location = conn
            .query_row(
                "SELECT Id, Name, City, Country, Currency FROM Locations WHERE Id = ?1",
                params![id],
                location_from_row,
            )
            .optional()?;
        Ok(location)
    }

    fn list_locations(&self) -> StoreResult<Vec<Location>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT Id, Name, City, Country, Currency FROM Locations ORDER BY Id")?;
        let locations = stmt
            .query_map([], location_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(locations)
    }

    fn list_protocols_by_location(&self, location_id: i64) -> StoreResult<Vec<Protocol>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT Id, LocationId, Title, ConciseGuideline
             FROM Protocols
             WHERE LocationId = ?1
             ORDER BY Id",
        )?;
        let protocols = stmt
            .query_map(params![location_id], protocol_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(protocols)
    }

    fn create_person(&self, person: NewPerson) -> StoreResult<Person> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO People (FullName, Alias, Affiliation, Category, LocationId, RealPersonWiki, AccessLevel)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                person.full_name,
                person.alias,
                person.affiliation,
                person.category,
                person.location_id,
                person.real_person_wiki,
                person.access_level,
            ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(person.into_person(id))
    }

    fn insert_seed(&self, data: &SeedData) -> StoreResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO Locations (Id, Name, City, Country, Currency) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for loc in &data.locations {
                stmt.execute(params![loc.id, loc.name, loc.city, loc.country, loc.currency])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO People (Id, FullName, Alias, Affiliation, Category, LocationId, RealPersonWiki, AccessLevel)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for p in &data.people {
                stmt.execute(params![
                    p.id,
                    p.full_name,
                    p.alias,
                    p.affiliation,
                    p.category,
                    p.location_id,
                    p.real_person_wiki,
                    p.access_level,
                ])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO Protocols (Id, LocationId, Title, ConciseGuideline) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for proto in &data.protocols {
                stmt.execute(params![
                    proto.id,
                    proto.location_id,
                    proto.title,
                    proto.concise_guideline,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        store
    }

    fn new_person(full_name: &str, alias: Option<&str>, access_level: i64) -> NewPerson {
        NewPerson {
            full_name: full_name.to_string(),
            alias: alias.map(str::to_string),
            affiliation: "Neutral".to_string(),
            category: "Observer".to_string(),
            location_id: None,
            real_person_wiki: None,
            access_level,
        }
    }

    #[test]
    fn test_ensure_schema_twice_keeps_data() {
        let store = store();
        store.create_person(new_person("Jean Dupont", None, 3)).unwrap();

        store.ensure_schema().unwrap();

        assert_eq!(store.person_count().unwrap(), 1);
        assert!(store.exists().unwrap());
    }

    #[test]
    fn test_empty_store_lookups_are_absent_not_errors() {
        let store = store();

        assert!(!store.exists().unwrap());
        assert_eq!(store.get_person_by_id(42).unwrap(), None);
        assert_eq!(store.get_person_by_alias("nobody").unwrap(), None);
        assert_eq!(store.get_location_by_id(1).unwrap(), None);
        assert!(store.list_protocols_by_location(1).unwrap().is_empty());
        assert!(store.list_people().unwrap().is_empty());
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let store = store();
        let first = store.create_person(new_person("A", None, 1)).unwrap();
        let second = store.create_person(new_person("B", None, 1)).unwrap();

        assert!(second.id > first.id);
        assert_eq!(store.get_person_by_id(second.id).unwrap(), Some(second));
    }

    #[test]
    fn test_alias_lookup_is_case_insensitive_first_wins() {
        let store = store();
        let first = store.create_person(new_person("Željko Ražnatović", Some("Arkan"), 5)).unwrap();
        store.create_person(new_person("Impostor", Some("ARKAN"), 1)).unwrap();

        let found = store.get_person_by_alias("arkan").unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[test]
    fn test_alias_lookup_folds_non_ascii() {
        let store = store();
        store.create_person(new_person("Svetlana Ražnatović", Some("Čeca"), 3)).unwrap();

        assert!(store.get_person_by_alias("čECA").unwrap().is_some());
    }

    #[test]
    fn test_legacy_row_without_level_reads_as_one() {
        let store = store();
        {
            let conn = store.lock().unwrap();
            conn.execute(
                "INSERT INTO People (FullName, Affiliation, Category) VALUES ('Legacy', 'Neutral', 'Clerk')",
                [],
            )
            .unwrap();
        }

        let people = store.list_people().unwrap();
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].access_level, 1);
    }

    #[test]
    fn test_list_people_matching() {
        let store = store();
        store.create_person(new_person("Low", None, 1)).unwrap();
        store.create_person(new_person("High", None, 9)).unwrap();

        let high = store.list_people_matching(&|p: &Person| p.access_level > 5).unwrap();
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].full_name, "High");
    }

    #[test]
    fn test_file_store_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("directory.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.ensure_schema().unwrap();
            store.create_person(new_person("Persisted", None, 2)).unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        reopened.ensure_schema().unwrap();
        assert_eq!(reopened.person_count().unwrap(), 1);
    }
}
