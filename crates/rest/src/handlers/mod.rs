//! HTTP request handlers for FHIR interactions.
//!
//! - [`read`] - Read a resource by ID
//! - [`create`] - Create a Patient or Practitioner
//! - [`search`] - Search for resources
//! - [`capabilities`] - CapabilityStatement and security statement
//! - [`health`] - Health check endpoint

pub mod capabilities;
pub mod create;
pub mod health;
pub mod read;
pub mod search;

// Re-export handlers for convenience
pub use capabilities::{capabilities_handler, smart_configuration_handler};
pub use create::create_handler;
pub use health::health_handler;
pub use read::read_handler;
pub use search::{search_get_handler, search_post_handler};
