//! Response formatting for the FHIR REST API.
//!
//! This module provides utilities for building FHIR-compliant responses:
//!
//! - [`operation_outcome`] - OperationOutcome generation
//! - [`bundle`] - searchset Bundle building and paging links
//! - [`headers`] - Response header generation (Location, Last-Modified)
//! - [`format`] - `application/fhir+json` responses

pub mod bundle;
pub mod format;
pub mod headers;
pub mod operation_outcome;

pub use bundle::{BundleBuilder, BundleEntry, SearchUrl};
pub use format::format_resource_response;
pub use headers::{FHIR_JSON, ResourceHeaders};
pub use operation_outcome::OperationOutcomeBuilder;
