//! Saint Martin Hospital person registry persistence.
//!
//! This crate holds the relational side of the FHIR facade: the `PERSON`,
//! `PERSON_DOC` and `MEDICATION_REQUEST` tables, the translation between
//! those rows and FHIR resources, and the search predicates that select
//! them.
//!
//! # Architecture
//!
//! - [`mapping::identifier`] - Identifier codec: FHIR `(system, value)` ⇄
//!   primary key or document row, driven by one static table
//! - [`mapping::person`] - Resource mapper: Person rows ⇄ Patient / Practitioner
//! - [`search`] - Search parameters and the parameterized predicate builder
//! - [`core`] - Storage traits handed to the REST layer
//! - [`backends`] - Backend implementations (SQLite)
//! - [`types`] - Rows, read models and pagination
//! - [`error`] - Error types for all operations
//!
//! The builder and the mapper do not know about each other. A search handler
//! builds a predicate, passes it to storage, and maps the rows it gets back.
//!
//! # Quick Start
//!
//! ```
//! use smh_persistence::mapping::{from_resource, to_resource};
//! use smh_persistence::types::PersonResourceType;
//! use serde_json::json;
//!
//! let request = from_resource(&json!({
//!     "resourceType": "Patient",
//!     "name": [{"family": "Lee", "given": ["Ann"]}],
//!     "telecom": [{"system": "email", "value": "a@x.com"}],
//!     "identifier": [{"system": "https://www.national-office.gov/ni", "value": "NI-123"}]
//! }))
//! .unwrap();
//! assert_eq!(request.documents[0].doc_type_code, 1);
//!
//! let person = request.person.into_person(7);
//! let patient = to_resource(PersonResourceType::Patient, &person, &[]);
//! assert_eq!(patient.id, "7");
//! assert_eq!(patient.name[0].text.as_deref(), Some("Ann Lee"));
//! ```
//!
//! # Search
//!
//! ```
//! use std::collections::HashMap;
//! use smh_persistence::search::{PersonQueryBuilder, PersonSearchParams};
//!
//! let mut query = HashMap::new();
//! query.insert("family".to_string(), "Lee".to_string());
//! query.insert("name".to_string(), "Ann".to_string());
//!
//! let params = PersonSearchParams::from_query(&query).unwrap();
//! let predicate = PersonQueryBuilder::new().build(&params).unwrap();
//! assert_eq!(predicate.len(), 2);
//! assert_eq!(predicate.param_count(), 4);
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod core;
pub mod error;
pub mod mapping;
pub mod search;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{StorageError, StorageResult};
pub use types::{Page, PersonRecord, PersonResource, PersonResourceType, SearchPage};

// Re-export core traits
pub use core::{Backend, BackendKind, MedicationRequestStorage, PersonStorage};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
