// 🗂️ Directory Service - the orchestrator
//
// Composes store + clearance gate + search engine into the queries the HTTP
// layer exposes. Expected outcomes come back as DirectoryError variants;
// only StoreUnavailable means a real fault.
//
// Gating is deliberately uneven:
// - get_by_id             -> clearance checked
// - get_by_alias          -> NOT checked
// - protocols by location -> NOT checked (agent tag is logged only)

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clearance::{authorize, Decision};
use crate::db::RecordStore;
use crate::entities::{Location, Person, PersonDraft, Protocol};
use crate::error::{DirectoryError, DirectoryResult};
use crate::schema::{validate_draft, FieldError};
use crate::search;

/// Tag recorded for protocol views when the caller gives none.
pub const ANONYMOUS_AGENT: &str = "anonymous";

// ============================================================================
// SELF-LINKS
// ============================================================================

/// Something that can compute the canonical retrieval path of a person.
///
/// Provided by the hosting layer; search works without one.
pub trait LinkGenerator: Send + Sync {
    fn person_link(&self, id: i64) -> Option<String>;
}

/// Links of the form `{prefix}/{id}`.
#[derive(Debug, Clone)]
pub struct PathLinks {
    prefix: String,
}

impl PathLinks {
    pub fn new(prefix: impl Into<String>) -> Self {
        PathLinks {
            prefix: prefix.into().trim_end_matches('/').to_string(),
        }
    }
}

impl LinkGenerator for PathLinks {
    fn person_link(&self, id: i64) -> Option<String> {
        Some(format!("{}/{}", self.prefix, id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub person: Person,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

// ============================================================================
// DIRECTORY SERVICE
// ============================================================================

/// Owns the store handle; cheap to clone and share across request tasks.
#[derive(Clone)]
pub struct DirectoryService {
    store: Arc<dyn RecordStore>,
}

impl DirectoryService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        DirectoryService { store }
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    /// Look a person up by id and check the caller's clearance.
    pub fn get_by_id(&self, id: i64, caller_level: i64) -> DirectoryResult<Person> {
        let person = self
            .store
            .get_person_by_id(id)?
            .ok_or_else(|| DirectoryError::not_found("person", format!("Id {}", id)))?;

        match authorize(caller_level, person.access_level) {
            Decision::Allow => Ok(person),
            Decision::Deny { required, provided } => {
                warn!(person_id = id, required, provided, "access denied");
                Err(DirectoryError::AccessDenied { required, provided })
            }
        }
    }

    /// Alias lookup. No clearance check.
    pub fn get_by_alias(&self, alias: &str) -> DirectoryResult<Person> {
        self.store
            .get_person_by_alias(alias)?
            .ok_or_else(|| DirectoryError::not_found("person", format!("alias '{}'", alias)))
    }

    /// Free-text search over every person, in store order.
    pub fn search(
        &self,
        query: &str,
        links: Option<&dyn LinkGenerator>,
    ) -> DirectoryResult<Vec<SearchHit>> {
        let corpus = self.store.list_people()?;
        let matches = search::search(query, &corpus);
        debug!(query, hits = matches.len(), "people search");

        Ok(matches
            .into_iter()
            .map(|person| SearchHit {
                link: links.and_then(|l| l.person_link(person.id)),
                person,
            })
            .collect())
    }

    pub fn list_people(&self) -> DirectoryResult<Vec<Person>> {
        Ok(self.store.list_people()?)
    }

    /// Validate a draft and append it. Every problem is reported at once.
    pub fn create(&self, draft: &PersonDraft) -> DirectoryResult<Person> {
        let validated = validate_draft(draft);
        let mut errors = match &validated {
            Ok(_) => Vec::new(),
            Err(errors) => errors.clone(),
        };

        if let Some(location_id) = draft.location_id {
            if self.store.get_location_by_id(location_id)?.is_none() {
                errors.push(FieldError::new(
                    "locationId",
                    format!("No location found with Id {}", location_id),
                ));
            }
        }

        match validated {
            Ok(new_person) if errors.is_empty() => {
                let person = self.store.create_person(new_person)?;
                info!(person_id = person.id, access_level = person.access_level, "person created");
                Ok(person)
            }
            _ => Err(DirectoryError::Validation(errors)),
        }
    }

    /// Protocols for a location. Not gated; the agent tag is for the log only.
    pub fn list_protocols_by_location(
        &self,
        location_id: i64,
        agent: Option<&str>,
    ) -> DirectoryResult<Vec<Protocol>> {
        let agent = agent
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(ANONYMOUS_AGENT);
        let protocols = self.store.list_protocols_by_location(location_id)?;
        info!(location_id, agent, count = protocols.len(), "protocols viewed");
        Ok(protocols)
    }

    pub fn get_location(&self, id: i64) -> DirectoryResult<Location> {
        self.store
            .get_location_by_id(id)?
            .ok_or_else(|| DirectoryError::not_found("place", format!("Id {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use crate::memory::MemoryStore;
    use crate::seed;

    fn seeded() -> DirectoryService {
        let store = SqliteStore::open_in_memory().unwrap();
        seed::initialize(&store).unwrap();
        DirectoryService::new(Arc::new(store))
    }

    #[test]
    fn test_get_by_id_respects_clearance() {
        let directory = seeded();

        match directory.get_by_id(2, 3) {
            Err(DirectoryError::AccessDenied { required, provided }) => {
                assert_eq!(required, 9);
                assert_eq!(provided, 3);
            }
            other => panic!("expected denial, got {:?}", other),
        }

        let karadzic = directory.get_by_id(2, 9).unwrap();
        assert_eq!(karadzic.full_name, "Radovan Karadžić");
        assert_eq!(karadzic.access_level, 9);
    }

    #[test]
    fn test_get_by_id_unknown_is_not_found_for_every_level() {
        let directory = seeded();

        for level in [-1, 1, 5, 9, 100] {
            assert!(matches!(
                directory.get_by_id(999, level),
                Err(DirectoryError::NotFound(_))
            ));
        }
    }

    #[test]
    fn test_alias_ignores_clearance() {
        let directory = seeded();

        let sloba = directory.get_by_alias("sloba").unwrap();
        assert_eq!(sloba.id, 1);
        assert_eq!(sloba.full_name, "Slobodan Milošević");

        // Frenki is level 9 but alias lookup is not gated
        assert_eq!(directory.get_by_alias("FRENKI").unwrap().access_level, 9);

        assert!(matches!(
            directory.get_by_alias("nobody"),
            Err(DirectoryError::NotFound(_))
        ));
    }

    #[test]
    fn test_search_with_and_without_links() {
        let directory = seeded();
        let links = PathLinks::new("/people/");

        let hits = directory.search("ALIJA", Some(&links)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].person.id, 6);
        assert_eq!(hits[0].link.as_deref(), Some("/people/6"));

        let bare = directory.search("alija", None).unwrap();
        assert_eq!(bare.len(), 1);
        assert_eq!(bare[0].link, None);
    }

    #[test]
    fn test_search_empty_returns_all_in_order() {
        let directory = seeded();
        let ids: Vec<i64> = directory
            .search("", None)
            .unwrap()
            .iter()
            .map(|hit| hit.person.id)
            .collect();

        assert_eq!(ids, (1..=50).collect::<Vec<_>>());
    }

    #[test]
    fn test_create_rejects_empty_full_name() {
        let directory = seeded();
        let draft = PersonDraft::new("", "Diplomat", "Ally", 3);

        match directory.create(&draft) {
            Err(DirectoryError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.field == "fullName"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(directory.store().person_count().unwrap(), 50);
    }

    #[test]
    fn test_create_checks_location_reference() {
        let directory = seeded();
        let draft = PersonDraft {
            location_id: Some(404),
            ..PersonDraft::new("", "Diplomat", "Ally", 3)
        };

        match directory.create(&draft) {
            Err(DirectoryError::Validation(errors)) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["fullName", "locationId"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_create_ids_increase() {
        let directory = seeded();

        let first = directory
            .create(&PersonDraft::new("Kofi Annan", "Diplomat", "Neutral", 3))
            .unwrap();
        let second = directory
            .create(&PersonDraft {
                location_id: Some(14),
                ..PersonDraft::new("Javier Solana", "Diplomat", "Ally", 5)
            })
            .unwrap();

        assert!(first.id > 50);
        assert!(second.id > first.id);
        assert_eq!(second.location_id, Some(14));
        assert_eq!(directory.get_by_id(second.id, 5).unwrap(), second);
    }

    /// Run `threads` workers, each creating `per_thread` people through a
    /// shared service. Returns every id handed out, per worker in call order.
    fn create_concurrently(
        directory: &DirectoryService,
        threads: usize,
        per_thread: usize,
    ) -> Vec<Vec<i64>> {
        std::thread::scope(|scope| {
            let workers: Vec<_> = (0..threads)
                .map(|worker| {
                    let directory = directory.clone();
                    scope.spawn(move || {
                        (0..per_thread)
                            .map(|n| {
                                let name = format!("Observer {}-{}", worker, n);
                                directory
                                    .create(&PersonDraft::new(&name, "Monitor", "Neutral", 2))
                                    .unwrap()
                                    .id
                            })
                            .collect::<Vec<i64>>()
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        })
    }

    fn assert_distinct_increasing(per_worker: &[Vec<i64>], expected_total: usize) {
        for ids in per_worker {
            assert!(ids.windows(2).all(|pair| pair[0] < pair[1]), "{:?}", ids);
        }
        let mut all: Vec<i64> = per_worker.iter().flatten().copied().collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), expected_total);
        assert!(all.iter().all(|id| *id > 50));
    }

    #[test]
    fn test_concurrent_creates_get_distinct_ids_sqlite() {
        let directory = seeded();

        let ids = create_concurrently(&directory, 8, 5);

        assert_distinct_increasing(&ids, 40);
        assert_eq!(directory.store().person_count().unwrap(), 90);
    }

    #[test]
    fn test_concurrent_creates_get_distinct_ids_memory() {
        let store = MemoryStore::new();
        seed::initialize(&store).unwrap();
        let directory = DirectoryService::new(Arc::new(store));

        let ids = create_concurrently(&directory, 8, 5);

        assert_distinct_increasing(&ids, 40);
        assert_eq!(directory.store().person_count().unwrap(), 90);
    }

    #[test]
    fn test_protocols_and_locations() {
        let directory = seeded();

        let protocols = directory.list_protocols_by_location(22, None).unwrap();
        assert_eq!(protocols.len(), 1);
        assert_eq!(protocols[0].title, "Belgrade Café Watch");

        assert!(directory
            .list_protocols_by_location(3, Some("agent-007"))
            .unwrap()
            .is_empty());

        let venue = directory.get_location(21).unwrap();
        assert_eq!(venue.name.as_deref(), Some("Holiday Inn"));
        assert!(matches!(
            directory.get_location(99),
            Err(DirectoryError::NotFound(_))
        ));
    }

    #[test]
    fn test_works_over_memory_store() {
        let store = MemoryStore::new();
        seed::initialize(&store).unwrap();
        let directory = DirectoryService::new(Arc::new(store));

        assert!(directory.get_by_id(31, 8).is_err());
        assert_eq!(directory.get_by_id(31, 9).unwrap().full_name, "Samantha Collins");
        assert_eq!(directory.search("mi6", None).unwrap().len(), 2);
    }
}
