//! Axum extractors for FHIR-specific data.
//!
//! - [`FhirResource`] - Extract and validate FHIR resources
//! - [`Pagination`] - Read `_count` / `_offset` from search parameters

mod fhir_resource;
mod pagination;

pub use fhir_resource::{FhirResource, FhirResourceRejection};
pub use pagination::Pagination;
