//! Error types for the FHIR REST API.
//!
//! This module defines all error types used throughout the REST API layer,
//! with automatic conversion to FHIR OperationOutcome responses.
//!
//! # Error Mapping
//!
//! Storage errors from the persistence layer are mapped to HTTP status codes
//! and FHIR issue codes:
//!
//! | Storage Error | HTTP Status | FHIR Issue Code |
//! |--------------|-------------|-----------------|
//! | NotFound | 404 | not-found |
//! | MalformedResource | 400 | required (with `expression`) |
//! | InvalidSearchParameter | 400 | invalid |
//! | UnsupportedResourceType | 404 | not-supported |
//! | UnknownIdentifierSystem | 400 | code-invalid |
//! | PartialInsertFailure | 422 | processing (one issue per identifier) |
//! | BackendError | 500 | exception |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use smh_persistence::error::{
    BackendError, FailedIdentifier, IdentifierError, InsertError, ResourceError, StorageError,
    ValidationError,
};
use smh_persistence::mapping::IdentifierToken;
use thiserror::Error;
use tracing::error;

use crate::responses::operation_outcome::{Issue, IssueType, OperationOutcomeBuilder};

/// The primary error type for REST API operations.
///
/// Each variant maps to one HTTP status code and one OperationOutcome
/// issue code.
#[derive(Debug, Error)]
pub enum RestError {
    /// Resource not found (HTTP 404).
    #[error("Resource not found: {resource_type}/{id}")]
    NotFound {
        /// The resource type (e.g., "Patient").
        resource_type: String,
        /// The resource ID.
        id: String,
    },

    /// The URL names a resource type this server does not serve (HTTP 404).
    #[error("Unsupported resource type: {resource_type}")]
    UnsupportedResourceType {
        /// The requested type.
        resource_type: String,
    },

    /// The interaction is not offered for the resource type (HTTP 405).
    #[error("Method {method} not allowed on {resource_type}")]
    MethodNotAllowed {
        /// The method that was attempted.
        method: String,
        /// The resource type.
        resource_type: String,
    },

    /// Bad request (HTTP 400).
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message.
        message: String,
    },

    /// A recognised search parameter carries an unusable value (HTTP 400).
    #[error("Invalid search parameter '{parameter}': {message}")]
    InvalidSearchParameter {
        /// Parameter name.
        parameter: String,
        /// Error message.
        message: String,
    },

    /// A required element is missing or unusable (HTTP 400).
    #[error("Malformed resource at {path}: {message}")]
    MalformedResource {
        /// Location of the offending element, e.g. `name[0].family`.
        path: String,
        /// Error message.
        message: String,
    },

    /// An identifier uses a system outside the registry's namespaces (HTTP 400).
    #[error("Unknown identifier system: {system}")]
    UnknownIdentifierSystem {
        /// The rejected system URI.
        system: String,
    },

    /// Some identifiers could not be stored; nothing was written (HTTP 422).
    #[error(
        "Identifier insert failed: {} succeeded, {} failed",
        succeeded.len(),
        failed.len()
    )]
    PartialInsertFailure {
        /// Identifiers that were accepted before the rollback.
        succeeded: Vec<IdentifierToken>,
        /// Identifiers that were rejected, with reasons.
        failed: Vec<FailedIdentifier>,
    },

    /// Unsupported media type (HTTP 415).
    #[error("Unsupported media type: {content_type}")]
    UnsupportedMediaType {
        /// The unsupported content type.
        content_type: String,
    },

    /// Internal server error (HTTP 500).
    #[error("Internal error: {message}")]
    InternalError {
        /// Error message. Logged, never sent to the client.
        message: String,
    },
}

impl RestError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RestError::NotFound { .. } | RestError::UnsupportedResourceType { .. } => {
                StatusCode::NOT_FOUND
            }
            RestError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            RestError::BadRequest { .. }
            | RestError::InvalidSearchParameter { .. }
            | RestError::MalformedResource { .. }
            | RestError::UnknownIdentifierSystem { .. } => StatusCode::BAD_REQUEST,
            RestError::PartialInsertFailure { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            RestError::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            RestError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Builds the OperationOutcome body for this error.
    pub fn to_operation_outcome(&self) -> serde_json::Value {
        let builder = OperationOutcomeBuilder::new();
        let builder = match self {
            RestError::NotFound { resource_type, id } => builder.error(
                IssueType::NotFound,
                format!("Resource {}/{} not found", resource_type, id),
            ),
            RestError::UnsupportedResourceType { resource_type } => builder.error(
                IssueType::NotSupported,
                format!("Resource type '{}' is not supported", resource_type),
            ),
            RestError::MethodNotAllowed {
                method,
                resource_type,
            } => builder.error(
                IssueType::NotSupported,
                format!("Method {} not allowed on {}", method, resource_type),
            ),
            RestError::BadRequest { message } => builder.error(IssueType::Invalid, message),
            RestError::InvalidSearchParameter { parameter, message } => builder.add_issue(
                Issue::error(
                    IssueType::Invalid,
                    format!("Invalid search parameter '{}': {}", parameter, message),
                )
                .with_expression(parameter),
            ),
            RestError::MalformedResource { path, message } => builder.add_issue(
                Issue::error(IssueType::Required, format!("{}: {}", path, message))
                    .with_expression(path),
            ),
            RestError::UnknownIdentifierSystem { system } => builder.add_issue(
                Issue::error(
                    IssueType::CodeInvalid,
                    format!("Identifier system '{}' is not known to this server", system),
                )
                .with_expression("identifier"),
            ),
            RestError::PartialInsertFailure { succeeded, failed } => {
                let builder = failed.iter().fold(builder, |builder, failure| {
                    builder.add_issue(
                        Issue::error(
                            IssueType::Processing,
                            format!(
                                "Identifier {} was not stored: {}",
                                failure.identifier, failure.reason
                            ),
                        )
                        .with_expression("identifier"),
                    )
                });
                succeeded.iter().fold(builder, |builder, token| {
                    builder.information(
                        IssueType::Informational,
                        format!("Identifier {} was accepted but rolled back", token),
                    )
                })
            }
            RestError::UnsupportedMediaType { content_type } => builder.error(
                IssueType::NotSupported,
                format!("Content type '{}' is not supported", content_type),
            ),
            RestError::InternalError { .. } => builder.error(
                IssueType::Exception,
                "An unexpected error occurred while processing the request",
            ),
        };
        builder.build()
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        if let RestError::InternalError { message } = &self {
            error!(error = %message, "Request failed with an internal error");
        }
        (self.status_code(), Json(self.to_operation_outcome())).into_response()
    }
}

// Implement conversions from storage errors

impl From<StorageError> for RestError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Resource(e) => e.into(),
            StorageError::Validation(e) => e.into(),
            StorageError::Identifier(e) => e.into(),
            StorageError::Insert(e) => e.into(),
            StorageError::Backend(e) => e.into(),
        }
    }
}

impl From<ResourceError> for RestError {
    fn from(err: ResourceError) -> Self {
        match err {
            ResourceError::NotFound { resource_type, id } => {
                RestError::NotFound { resource_type, id }
            }
        }
    }
}

impl From<ValidationError> for RestError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::MalformedResource { path, message } => {
                RestError::MalformedResource { path, message }
            }
            ValidationError::InvalidSearchParameter { parameter, message } => {
                RestError::InvalidSearchParameter { parameter, message }
            }
            ValidationError::UnsupportedResourceType { resource_type } => {
                RestError::UnsupportedResourceType { resource_type }
            }
        }
    }
}

impl From<IdentifierError> for RestError {
    fn from(err: IdentifierError) -> Self {
        match err {
            IdentifierError::UnknownIdentifierSystem { system } => {
                RestError::UnknownIdentifierSystem { system }
            }
            // A stored code outside the table is a data problem, not a client one.
            IdentifierError::UnknownDocumentType { .. } => RestError::InternalError {
                message: err.to_string(),
            },
        }
    }
}

impl From<InsertError> for RestError {
    fn from(err: InsertError) -> Self {
        match err {
            InsertError::PartialInsertFailure { succeeded, failed } => {
                RestError::PartialInsertFailure { succeeded, failed }
            }
        }
    }
}

impl From<BackendError> for RestError {
    fn from(err: BackendError) -> Self {
        RestError::InternalError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for RestError {
    fn from(err: serde_json::Error) -> Self {
        RestError::BadRequest {
            message: format!("Invalid JSON: {}", err),
        }
    }
}

/// Result type alias for REST operations.
pub type RestResult<T> = Result<T, RestError>;
