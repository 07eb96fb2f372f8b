// 🔎 Search Engine - substring match across textual fields
//
// Each searchable record type lists its text fields explicitly as
// (field name, accessor) pairs. A record matches when ANY listed field
// contains the query, ignoring case. Empty query matches everything.
// Results keep corpus order.

use crate::entities::{Location, Person};

// ============================================================================
// SEARCHABLE FIELDS
// ============================================================================

/// One searchable text attribute of a record type.
pub struct TextField<T> {
    pub name: &'static str,
    pub get: fn(&T) -> Option<&str>,
}

/// A record type that can be scanned by `search`.
pub trait Searchable: Sized + 'static {
    fn text_fields() -> &'static [TextField<Self>];
}

static PERSON_FIELDS: [TextField<Person>; 5] = [
    TextField { name: "fullName", get: |p| Some(p.full_name.as_str()) },
    TextField { name: "category", get: |p| Some(p.category.as_str()) },
    TextField { name: "affiliation", get: |p| Some(p.affiliation.as_str()) },
    TextField { name: "alias", get: |p| p.alias.as_deref() },
    TextField { name: "realPersonWiki", get: |p| p.real_person_wiki.as_deref() },
];

impl Searchable for Person {
    fn text_fields() -> &'static [TextField<Person>] {
        &PERSON_FIELDS
    }
}

static LOCATION_FIELDS: [TextField<Location>; 4] = [
    TextField { name: "name", get: |l| l.name.as_deref() },
    TextField { name: "city", get: |l| Some(l.city.as_str()) },
    TextField { name: "country", get: |l| Some(l.country.as_str()) },
    TextField { name: "currency", get: |l| Some(l.currency.as_str()) },
];

impl Searchable for Location {
    fn text_fields() -> &'static [TextField<Location>] {
        &LOCATION_FIELDS
    }
}

// ============================================================================
// MATCHING
// ============================================================================

/// Lower-cased query, built once per search.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    needle: String,
}

impl SearchQuery {
    pub fn new(text: &str) -> Self {
        SearchQuery {
            needle: text.to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    /// Names of the fields of `record` that contain the query.
    pub fn matching_fields<T: Searchable>(&self, record: &T) -> Vec<&'static str> {
        T::text_fields()
            .iter()
            .filter(|field| self.field_matches(field, record))
            .map(|field| field.name)
            .collect()
    }

    pub fn matches<T: Searchable>(&self, record: &T) -> bool {
        if self.is_empty() {
            return true;
        }
        T::text_fields()
            .iter()
            .any(|field| self.field_matches(field, record))
    }

    fn field_matches<T>(&self, field: &TextField<T>, record: &T) -> bool {
        (field.get)(record)
            .map(|value| value.to_lowercase().contains(&self.needle))
            .unwrap_or(false)
    }
}

/// Filter `corpus` down to records matching `query`, preserving order.
pub fn search<'a, T, I>(query: &str, corpus: I) -> Vec<T>
where
    T: Searchable + Clone + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let query = SearchQuery::new(query);
    corpus
        .into_iter()
        .filter(|record| query.matches(*record))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: i64, full_name: &str, alias: Option<&str>, affiliation: &str, category: &str) -> Person {
        Person {
            id,
            full_name: full_name.to_string(),
            alias: alias.map(str::to_string),
            affiliation: affiliation.to_string(),
            category: category.to_string(),
            location_id: None,
            real_person_wiki: None,
            access_level: 3,
        }
    }

    fn corpus() -> Vec<Person> {
        vec![
            person(1, "Slobodan Milošević", Some("Sloba"), "Hostile", "Political Leader"),
            person(6, "Alija Izetbegović", None, "Friendly", "Political Leader"),
            person(19, "Madeleine Albright", None, "Ally", "Diplomat"),
        ]
    }

    #[test]
    fn test_empty_query_returns_everything_in_order() {
        let people = corpus();
        let ids: Vec<i64> = search("", &people).iter().map(|p| p.id).collect();

        assert_eq!(ids, vec![1, 6, 19]);
    }

    #[test]
    fn test_case_insensitive() {
        let people = corpus();
        let lower = search("alija", &people);
        let upper = search("ALIJA", &people);

        assert_eq!(lower, upper);
        assert_eq!(lower.len(), 1);
        assert_eq!(lower[0].id, 6);
    }

    #[test]
    fn test_matches_any_field() {
        let people = corpus();

        // category
        let leaders: Vec<i64> = search("leader", &people).iter().map(|p| p.id).collect();
        assert_eq!(leaders, vec![1, 6]);

        // affiliation
        assert_eq!(search("ally", &people)[0].id, 19);

        // alias
        assert_eq!(search("slob", &people)[0].id, 1);

        assert!(search("zzz", &people).is_empty());
    }

    #[test]
    fn test_missing_optional_fields_never_match() {
        let people = corpus();
        let query = SearchQuery::new("wikipedia");

        assert!(people.iter().all(|p| !query.matches(p)));
    }

    #[test]
    fn test_matching_fields_reports_names() {
        let mut sloba = corpus().remove(0);
        sloba.real_person_wiki = Some("https://en.wikipedia.org/wiki/Slobodan".to_string());

        let query = SearchQuery::new("SLOBODAN");
        assert_eq!(query.matching_fields(&sloba), vec!["fullName", "realPersonWiki"]);
    }

    #[test]
    fn test_locations_are_searchable_too() {
        let locations = vec![
            Location {
                id: 21,
                name: Some("Holiday Inn".to_string()),
                city: "Sarajevo".to_string(),
                country: "Bosnia and Herzegovina".to_string(),
                currency: "Bosnian Dinar".to_string(),
            },
            Location {
                id: 11,
                name: None,
                city: "Bern".to_string(),
                country: "Switzerland".to_string(),
                currency: "Swiss Franc".to_string(),
            },
        ];

        assert_eq!(search("holiday", &locations)[0].id, 21);
        assert_eq!(search("franc", &locations)[0].id, 11);
    }
}
