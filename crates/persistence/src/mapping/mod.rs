//! Translation between registry rows and FHIR resources.
//!
//! - [`identifier`] - `(system, value)` ⇄ primary key or `PERSON_DOC` row
//! - [`person`] - `PERSON` + `PERSON_DOC` rows ⇄ Patient / Practitioner
//! - [`medication_request`] - `MEDICATION_REQUEST` rows → MedicationRequest

pub mod identifier;
pub mod medication_request;
pub mod person;

pub use identifier::{
    DecodedIdentifier, IDENTIFIER_SYSTEMS, IdentifierKind, IdentifierSystem, IdentifierToken,
};
pub use medication_request::to_medication_request_resource;
pub use person::{from_resource, from_resource_at, to_resource};
