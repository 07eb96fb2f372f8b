// 🧠 In-Memory Record Store
//
// Append-only vectors behind RwLocks, same contract as the SQLite store.
// Handy for tests and for running without a database file.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::db::RecordStore;
use crate::entities::{Location, NewPerson, Person, Protocol};
use crate::error::{StoreError, StoreResult};
use crate::seed::SeedData;

#[derive(Default)]
struct PeopleTable {
    rows: Vec<Person>,
    /// Highest id ever handed out; only grows
    last_id: i64,
}

/// `RecordStore` kept entirely in process memory.
#[derive(Default)]
pub struct MemoryStore {
    people: RwLock<PeopleTable>,
    locations: RwLock<Vec<Location>>,
    protocols: RwLock<Vec<Protocol>>,
}

fn read<'a, T>(lock: &'a RwLock<T>, what: &'static str) -> StoreResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| StoreError::Poisoned(what))
}

fn write<'a, T>(lock: &'a RwLock<T>, what: &'static str) -> StoreResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| StoreError::Poisoned(what))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn ensure_schema(&self) -> StoreResult<()> {
        // Collections exist from construction
        Ok(())
    }

    fn person_count(&self) -> StoreResult<i64> {
        Ok(read(&self.people, "people")?.rows.len() as i64)
    }

    fn get_person_by_id(&self, id: i64) -> StoreResult<Option<Person>> {
        let people = read(&self.people, "people")?;
        Ok(people.rows.iter().find(|p| p.id == id).cloned())
    }

    fn get_person_by_alias(&self, alias: &str) -> StoreResult<Option<Person>> {
        let people = read(&self.people, "people")?;
        Ok(people.rows.iter().find(|p| p.has_alias(alias)).cloned())
    }

    fn list_people(&self) -> StoreResult<Vec<Person>> {
        Ok(read(&self.people, "people")?.rows.clone())
    }

    fn list_people_matching(
        &self,
        predicate: &dyn Fn(&Person) -> bool,
    ) -> StoreResult<Vec<Person>> {
        let people = read(&self.people, "people")?;
        Ok(people.rows.iter().filter(|p| predicate(p)).cloned().collect())
    }

    fn get_location_by_id(&self, id: i64) -> StoreResult<Option<Location>> {
        let locations = read(&self.locations, "locations")?;
        Ok(locations.iter().find(|l| l.id == id).cloned())
    }

    fn list_locations(&self) -> StoreResult<Vec<Location>> {
        Ok(read(&self.locations, "locations")?.clone())
    }

    fn list_protocols_by_location(&self, location_id: i64) -> StoreResult<Vec<Protocol>> {
        let protocols = read(&self.protocols, "protocols")?;
        Ok(protocols
            .iter()
            .filter(|p| p.location_id == location_id)
            .cloned()
            .collect())
    }

    fn create_person(&self, person: NewPerson) -> StoreResult<Person> {
        let mut people = write(&self.people, "people")?;
        people.last_id += 1;
        let created = person.into_person(people.last_id);
        people.rows.push(created.clone());
        Ok(created)
    }

    fn insert_seed(&self, data: &SeedData) -> StoreResult<()> {
        // Take every lock up front so readers never see half a seed
        let mut locations = write(&self.locations, "locations")?;
        let mut people = write(&self.people, "people")?;
        let mut protocols = write(&self.protocols, "protocols")?;

        locations.extend(data.locations.iter().cloned());
        for person in &data.people {
            people.last_id = people.last_id.max(person.id);
            people.rows.push(person.clone());
        }
        protocols.extend(data.protocols.iter().cloned());

        Ok(())
    }
}
