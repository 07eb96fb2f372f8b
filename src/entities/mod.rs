// Entity Models - People, Locations, Protocols
//
// Each entity has:
// - Stable integer identity assigned by the store, never reused
// - Plain values, cloned out of the store (callers never mutate in place)
// - A serde shape matching the JSON wire format (camelCase)

pub mod location;
pub mod person;
pub mod protocol;

pub use location::Location;
pub use person::{NewPerson, Person, PersonDraft};
pub use protocol::Protocol;
