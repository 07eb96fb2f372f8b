// 🌱 Seeder - schema + one-time reference data
//
// Startup sequence, run once before any request traffic:
//   1. ensure_schema()  - idempotent, safe on every boot
//   2. seed_if_empty()  - inserts the reference set only while People is empty
//
// seed_if_empty is check-then-insert. Two concurrent first runs could both
// see an empty table, so callers must finish startup before serving.

use serde::Serialize;
use tracing::info;

use crate::db::RecordStore;
use crate::entities::{Location, Person, Protocol};
use crate::error::StoreResult;

// ============================================================================
// SEED DATA
// ============================================================================

/// One batch of records for all three kinds.
#[derive(Debug, Clone, Default)]
pub struct SeedData {
    pub locations: Vec<Location>,
    pub people: Vec<Person>,
    pub protocols: Vec<Protocol>,
}

/// What a seeding pass inserted. All zeros when it was skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub locations: usize,
    pub people: usize,
    pub protocols: usize,
}

impl SeedReport {
    pub fn skipped(&self) -> bool {
        *self == SeedReport::default()
    }
}

type LocationRow = (i64, Option<&'static str>, &'static str, &'static str, &'static str);
type PersonRow = (
    i64,
    &'static str,
    Option<&'static str>,
    &'static str,
    &'static str,
    i64,
    Option<&'static str>,
    i64,
);
type ProtocolRow = (i64, i64, &'static str, &'static str);

impl SeedData {
    /// The fixed reference dataset: 25 locations, 50 people, 3 protocols.
    pub fn reference() -> Self {
        let locations = LOCATIONS
            .iter()
            .map(|&(id, name, city, country, currency)| Location {
                id,
                name: name.map(str::to_string),
                city: city.to_string(),
                country: country.to_string(),
                currency: currency.to_string(),
            })
            .collect();

        let people = PEOPLE
            .iter()
            .map(
                |&(id, full_name, alias, affiliation, category, location_id, wiki, access_level)| Person {
                    id,
                    full_name: full_name.to_string(),
                    alias: alias.map(str::to_string),
                    affiliation: affiliation.to_string(),
                    category: category.to_string(),
                    location_id: Some(location_id),
                    real_person_wiki: wiki.map(str::to_string),
                    access_level,
                },
            )
            .collect();

        let protocols = PROTOCOLS
            .iter()
            .map(|&(id, location_id, title, guideline)| Protocol {
                id,
                location_id,
                title: title.to_string(),
                concise_guideline: guideline.to_string(),
            })
            .collect();

        SeedData {
            locations,
            people,
            protocols,
        }
    }

    pub fn report(&self) -> SeedReport {
        SeedReport {
            locations: self.locations.len(),
            people: self.people.len(),
            protocols: self.protocols.len(),
        }
    }
}

// ============================================================================
// SEEDER
// ============================================================================

pub fn ensure_schema(store: &dyn RecordStore) -> StoreResult<()> {
    store.ensure_schema()
}

/// Insert the reference dataset iff no person exists yet.
pub fn seed_if_empty(store: &dyn RecordStore) -> StoreResult<SeedReport> {
    seed_with_if_empty(store, &SeedData::reference())
}

/// Same as `seed_if_empty` with a caller-chosen dataset.
pub fn seed_with_if_empty(store: &dyn RecordStore, data: &SeedData) -> StoreResult<SeedReport> {
    let existing = store.person_count()?;
    if existing > 0 {
        info!(existing_people = existing, "store already populated, seeding skipped");
        return Ok(SeedReport::default());
    }

    store.insert_seed(data)?;
    let report = data.report();
    info!(
        locations = report.locations,
        people = report.people,
        protocols = report.protocols,
        "seeded reference data"
    );
    Ok(report)
}

/// Full startup sequence: schema, then seed.
pub fn initialize(store: &dyn RecordStore) -> StoreResult<SeedReport> {
    ensure_schema(store)?;
    seed_if_empty(store)
}

// ============================================================================
// REFERENCE DATASET
// ============================================================================

const LOCATIONS: &[LocationRow] = &[
    (1, None, "Belgrade", "Federal Republic of Yugoslavia", "Yugoslav Dinar"),
    (2, None, "Pale", "Bosnia and Herzegovina", "Bosnian Dinar"),
    (3, None, "Han Pijesak", "Bosnia and Herzegovina", "Bosnian Dinar"),
    (4, None, "Zagreb", "Croatia", "Croatian Kuna"),
    (5, None, "Sarajevo", "Bosnia and Herzegovina", "Bosnian Dinar"),
    (6, None, "Banja Luka", "Bosnia and Herzegovina", "Bosnian Dinar"),
    (7, None, "Knin", "Croatia", "Croatian Kuna"),
    (8, None, "Dečani", "Federal Republic of Yugoslavia", "Yugoslav Dinar"),
    (9, None, "Vukovar", "Croatia", "Croatian Kuna"),
    (10, None, "Tuzla", "Bosnia and Herzegovina", "Bosnian Dinar"),
    (11, None, "Bern", "Switzerland", "Swiss Franc"),
    (12, None, "Zürich", "Switzerland", "Swiss Franc"),
    (13, None, "Dayton", "United States", "US Dollar"),
    (14, None, "New York", "United States", "US Dollar"),
    (15, None, "Brussels", "Belgium", "Belgian Franc"),
    (16, None, "Vlasenica", "Bosnia and Herzegovina", "Bosnian Dinar"),
    (17, None, "Višegrad", "Bosnia and Herzegovina", "Bosnian Dinar"),
    (18, None, "Zenica", "Bosnia and Herzegovina", "Bosnian Dinar"),
    (19, None, "Mostar", "Bosnia and Herzegovina", "Bosnian Dinar"),
    (20, None, "Bocinja", "Bosnia and Herzegovina", "Bosnian Dinar"),
    (21, Some("Holiday Inn"), "Sarajevo", "Bosnia and Herzegovina", "Bosnian Dinar"),
    (22, Some("Hotel Moskva Café"), "Belgrade", "Federal Republic of Yugoslavia", "Yugoslav Dinar"),
    (23, Some("Vilina Vlas Hotel"), "Višegrad", "Bosnia and Herzegovina", "Bosnian Dinar"),
    (24, Some("Kajak Club"), "Banja Luka", "Bosnia and Herzegovina", "Bosnian Dinar"),
    (25, Some("British Embassy"), "Zagreb", "Croatia", "Croatian Kuna"),
];

const PEOPLE: &[PersonRow] = &[
    (1, "Slobodan Milošević", Some("Sloba"), "Hostile", "Political Leader", 1, Some("https://en.wikipedia.org/wiki/Slobodan_Milo%C5%A1evi%C4%87"), 5),
    (2, "Radovan Karadžić", None, "Hostile", "Political Leader", 2, Some("https://en.wikipedia.org/wiki/Radovan_Karad%C5%BEi%C4%87"), 9),
    (3, "Ratko Mladić", None, "Hostile", "Military Leader", 3, Some("https://en.wikipedia.org/wiki/Ratko_Mladi%C4%87"), 9),
    (4, "Vojislav Šešelj", None, "Hostile", "Paramilitary Leader", 1, Some("https://en.wikipedia.org/wiki/Vojislav_%C5%A0e%C5%A1elj"), 5),
    (5, "Franjo Tuđman", None, "Friendly", "Political Leader", 4, Some("https://en.wikipedia.org/wiki/Franjo_Tu%C4%91man"), 3),
    (6, "Alija Izetbegović", None, "Friendly", "Political Leader", 5, Some("https://en.wikipedia.org/wiki/Alija_Izetbegovi%C4%87"), 3),
    (7, "Biljana Plavšić", None, "Hostile", "Political Leader", 6, Some("https://en.wikipedia.org/wiki/Biljana_Plav%C5%A1i%C4%87"), 5),
    (8, "Ante Gotovina", None, "Friendly", "Military Officer", 7, Some("https://en.wikipedia.org/wiki/Ante_Gotovina"), 5),
    (9, "Ramush Haradinaj", None, "Neutral", "Paramilitary Leader", 8, Some("https://en.wikipedia.org/wiki/Ramush_Haradinaj"), 3),
    (10, "Goran Hadžić", None, "Hostile", "Political Leader", 9, Some("https://en.wikipedia.org/wiki/Goran_Had%C5%BEi%C4%87"), 5),
    (11, "Milan Babić", None, "Hostile", "Political Leader", 7, Some("https://en.wikipedia.org/wiki/Milan_Babi%C4%87"), 5),
    (12, "Momčilo Krajišnik", None, "Hostile", "Political Leader", 2, Some("https://en.wikipedia.org/wiki/Mom%C4%8Dilo_Kraji%C5%A1nik"), 5),
    (13, "Željko Ražnatović", Some("Arkan"), "Hostile", "Paramilitary Commander", 1, Some("https://en.wikipedia.org/wiki/Arkan"), 5),
    (14, "Jovica Stanišić", None, "Hostile", "Intelligence Officer", 1, Some("https://en.wikipedia.org/wiki/Jovica_Stani%C5%A1i%C4%87"), 9),
    (15, "Franko Simatović", Some("Frenki"), "Hostile", "Intelligence Officer", 1, Some("https://en.wikipedia.org/wiki/Franko_Simatovi%C4%87"), 9),
    (16, "Naser Orić", None, "Friendly", "Military Officer", 10, Some("https://en.wikipedia.org/wiki/Naser_Ori%C4%87"), 5),
    (17, "Fikret Abdić", Some("Babo"), "Unfriendly", "Warlord", 1, Some("https://en.wikipedia.org/wiki/Fikret_Abdi%C4%87"), 3),
    (18, "Mirjana Marković", Some("Mira"), "Hostile", "Political Figure", 1, Some("https://en.wikipedia.org/wiki/Mirjana_Markovi%C4%87"), 5),
    (19, "Madeleine Albright", None, "Ally", "Diplomat", 14, Some("https://en.wikipedia.org/wiki/Madeleine_Albright"), 3),
    (20, "Sonja Biserko", None, "Friendly", "Activist", 1, Some("https://en.wikipedia.org/wiki/Sonja_Biserko"), 5),
    (21, "Nataša Kandić", None, "Friendly", "Activist", 1, Some("https://en.wikipedia.org/wiki/Nata%C5%A1a_Kandi%C4%87"), 5),
    (22, "Svetlana Ražnatović", Some("Ceca"), "Unfriendly", "Public Figure", 1, Some("https://en.wikipedia.org/wiki/Svetlana_Ra%C5%BEnatovi%C4%87"), 3),
    (23, "Carla Del Ponte", None, "Friendly", "Prosecutor", 11, Some("https://en.wikipedia.org/wiki/Carla_Del_Ponte"), 5),
    (24, "Hashim Thaçi", Some("The Snake"), "Neutral", "Paramilitary Leader", 12, Some("https://en.wikipedia.org/wiki/Hashim_Tha%C3%A7i"), 3),
    (25, "Zoran Đinđić", None, "Friendly", "Political Opposition", 1, Some("https://en.wikipedia.org/wiki/Zoran_%C4%90in%C4%91i%C4%87"), 5),
    (26, "Milan Martić", None, "Hostile", "Paramilitary Leader", 7, Some("https://en.wikipedia.org/wiki/Milan_Marti%C4%87"), 5),
    (27, "Richard Holbrooke", None, "Ally", "Diplomat", 13, Some("https://en.wikipedia.org/wiki/Richard_Holbrooke"), 3),
    (28, "Wesley Clark", None, "Ally", "Military Officer", 15, Some("https://en.wikipedia.org/wiki/Wesley_Clark"), 3),
    (29, "Viktor Bout", Some("Merchant of Death"), "Hostile", "Arms Dealer", 1, Some("https://en.wikipedia.org/wiki/Viktor_Bout"), 5),
    (30, "Radislav Krstić", None, "Hostile", "Military Officer", 16, Some("https://en.wikipedia.org/wiki/Radislav_Krsti%C4%87"), 5),
    (31, "Samantha Collins", None, "Friendly", "MI6 Field Agent", 21, None, 9),
    (32, "Ian Richards", None, "Friendly", "MI6 Station Chief", 25, None, 9),
    (33, "Dragan Vukić", None, "Hostile", "Paramilitary Commander", 23, None, 5),
    (34, "Milica Petrova", None, "Hostile", "GRU Operative", 22, None, 9),
    (35, "James Wheeler", None, "Friendly", "CIA Officer", 5, None, 5),
    (36, "Fatima al-Sayeed", None, "Neutral", "Foreign Volunteer Liaison", 18, None, 3),
    (37, "Miroslav Petrić", None, "Friendly", "HVO Officer", 19, None, 3),
    (38, "Zoran Lukić", None, "Hostile", "Crime Boss", 24, None, 5),
    (39, "Ahmed Zubair", None, "Neutral", "Foreign Fighter", 20, None, 5),
    (40, "Dragomir Petrović", None, "Hostile", "RS Intelligence Officer", 2, None, 5),
    (41, "Lejla Kovačević", None, "Friendly", "Informant", 5, None, 5),
    (42, "Katarina Marković", None, "Friendly", "Journalist (MI5 Source)", 1, None, 5),
    (43, "Aida Selmanović", None, "Friendly", "Witness / Informant", 10, None, 3),
    (44, "Elena Ivanova", None, "Hostile", "Military Advisor", 2, None, 5),
    (45, "Ivanka Marinović", None, "Friendly", "Liaison Officer", 4, None, 3),
    (46, "Petar Jovanović", None, "Hostile", "State Security Officer", 1, None, 5),
    (47, "Marija Kovač", None, "Friendly", "Counterintelligence Agent", 4, None, 5),
    (48, "John Anderson", None, "Friendly", "War Correspondent", 5, None, 3),
    (49, "Mirela Hasanović", None, "Friendly", "Aid Worker", 10, None, 3),
    (50, "Jean Dupont", None, "Neutral", "UN Observer", 5, None, 3),
];

const PROTOCOLS: &[ProtocolRow] = &[
    (1, 21, "Sarajevo Press Zone", "Avoid contact outside Holiday Inn lobby; use journalist cover."),
    (2, 22, "Belgrade Café Watch", "Assume hostile surveillance at Hotel Moskva Café; meets <=15min."),
    (3, 25, "Zagreb Embassy Comms", "Only meet assets inside compound; no personal electronics."),
];
