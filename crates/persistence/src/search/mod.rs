//! Search support for the person registry.
//!
//! - [`params`] parses raw request parameters into typed search parameters
//! - [`query_builder`] turns typed parameters into a parameterized
//!   [`SearchPredicate`]
//!
//! The predicate is independent of the mapping layer: the caller builds it,
//! hands it to storage, and maps the returned rows.

pub mod params;
pub mod query_builder;

pub use params::{
    MEDICATION_REQUEST_SEARCH_PARAMETERS, MedicationRequestSearchParams,
    PERSON_SEARCH_PARAMETERS, PersonSearchParams,
};
pub use query_builder::{
    PersonQueryBuilder, SearchPredicate, SqlFragment, SqlParam, medication_request_predicate,
};
