//! Error types for the persistence layer.
//!
//! Errors are grouped by category so the REST layer can translate each one
//! into an OperationOutcome with the right status code. Everything except
//! [`BackendError`] is recoverable at the request boundary.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use std::fmt;

use thiserror::Error;

use crate::mapping::identifier::IdentifierToken;

/// The primary error type for all storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Resource state errors
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Request content errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Identifier namespace errors
    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    /// Multi-row insert errors
    #[error(transparent)]
    Insert(#[from] InsertError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors related to resource state.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The requested resource was not found.
    #[error("resource not found: {resource_type}/{id}")]
    NotFound { resource_type: String, id: String },
}

/// Errors related to request content.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A required element is missing or an element has an unusable value.
    #[error("malformed resource at {path}: {message}")]
    MalformedResource { path: String, message: String },

    /// The search parameter value cannot be used.
    #[error("invalid search parameter '{parameter}': {message}")]
    InvalidSearchParameter { parameter: String, message: String },

    /// The resource type is not served by this registry.
    #[error("unsupported resource type: {resource_type}")]
    UnsupportedResourceType { resource_type: String },
}

impl ValidationError {
    /// Shorthand for a missing required element.
    pub fn missing(path: impl Into<String>) -> Self {
        ValidationError::MalformedResource {
            path: path.into(),
            message: "required element is missing".to_string(),
        }
    }

    /// Shorthand for an element carrying an unusable value.
    pub fn invalid(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::MalformedResource {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by the identifier codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// The identifier system is not one of the registry's namespaces.
    #[error("unknown identifier system: {system}")]
    UnknownIdentifierSystem { system: String },

    /// A stored document carries a type code outside the codec table.
    #[error("unknown document type code: {code}")]
    UnknownDocumentType { code: i64 },
}

/// One identifier that could not be persisted, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedIdentifier {
    /// The identifier as submitted.
    pub identifier: IdentifierToken,
    /// Why the insert failed.
    pub reason: String,
}

impl fmt::Display for FailedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.identifier, self.reason)
    }
}

/// Errors raised while writing a person and its documents.
#[derive(Error, Debug)]
pub enum InsertError {
    /// Some document rows failed. The whole create was rolled back.
    #[error(
        "identifier insert failed: {} succeeded, {} failed; no record was written",
        succeeded.len(),
        failed.len()
    )]
    PartialInsertFailure {
        succeeded: Vec<IdentifierToken>,
        failed: Vec<FailedIdentifier>,
    },
}

/// Errors originating from the database backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend is currently unavailable.
    #[error("backend unavailable: {backend_name}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Schema initialisation or migration failed.
    #[error("schema migration failed: {message}")]
    MigrationError { message: String },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
