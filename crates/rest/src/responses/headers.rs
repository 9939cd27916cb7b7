//! Response header generation.
//!
//! Provides utilities for building FHIR-standard response headers.

use axum::http::{HeaderMap, HeaderValue, header};
use chrono::{DateTime, Utc};

/// Media type of every resource this server returns.
pub const FHIR_JSON: &str = "application/fhir+json";

/// Builder for resource response headers.
///
/// Generates the headers this server sends with resources:
/// - Content-Type
/// - Last-Modified
/// - Location (for create operations)
#[derive(Debug)]
pub struct ResourceHeaders {
    /// Last-Modified timestamp.
    last_modified: Option<String>,
    /// Location URL (for created resources).
    location: Option<String>,
    /// Content-Type.
    content_type: String,
}

impl Default for ResourceHeaders {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceHeaders {
    /// Creates a new ResourceHeaders builder.
    pub fn new() -> Self {
        Self {
            last_modified: None,
            location: None,
            content_type: FHIR_JSON.to_string(),
        }
    }

    /// Sets the Last-Modified timestamp.
    pub fn with_last_modified(mut self, timestamp: DateTime<Utc>) -> Self {
        self.last_modified = Some(timestamp.format("%a, %d %b %Y %H:%M:%S GMT").to_string());
        self
    }

    /// Sets the Location URL.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Converts to an Axum HeaderMap.
    pub fn to_header_map(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        // Content-Type
        if let Ok(value) = HeaderValue::from_str(&self.content_type) {
            headers.insert(header::CONTENT_TYPE, value);
        }

        // Last-Modified
        if let Some(last_modified) = &self.last_modified {
            if let Ok(value) = HeaderValue::from_str(last_modified) {
                headers.insert(header::LAST_MODIFIED, value);
            }
        }

        // Location
        if let Some(location) = &self.location {
            if let Ok(value) = HeaderValue::from_str(location) {
                headers.insert(header::LOCATION, value);
            }
        }

        headers
    }

    /// Returns the Last-Modified value.
    pub fn last_modified(&self) -> Option<&str> {
        self.last_modified.as_deref()
    }

    /// Returns the Location value.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}
