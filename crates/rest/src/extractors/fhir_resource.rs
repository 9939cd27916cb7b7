//! FHIR resource extractor.
//!
//! Extracts FHIR resources from request bodies.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::error::RestError;
use crate::fhir_types::is_valid_resource_type;

/// Axum extractor for FHIR resources.
///
/// Extracts a JSON FHIR resource from the request body, validating that
/// it names a resource type this server serves.
///
/// # Example
///
/// ```rust,ignore
/// use smh_rest::extractors::FhirResource;
///
/// async fn create_handler(FhirResource(resource): FhirResource) {
///     println!("Resource type: {}", resource["resourceType"]);
/// }
/// ```
#[derive(Debug)]
pub struct FhirResource(pub Value);

impl FhirResource {
    /// Returns the resource type.
    pub fn resource_type(&self) -> Option<&str> {
        self.0.get("resourceType").and_then(|v| v.as_str())
    }

    /// Consumes the extractor and returns the inner Value.
    pub fn into_inner(self) -> Value {
        self.0
    }
}

/// Error type for FHIR resource extraction failures.
#[derive(Debug)]
pub enum FhirResourceRejection {
    /// JSON parsing failed.
    InvalidJson(String),
    /// Missing resourceType field.
    MissingResourceType,
    /// Unsupported content type.
    UnsupportedMediaType(String),
    /// Resource type not served here.
    InvalidResourceType(String),
}

impl IntoResponse for FhirResourceRejection {
    fn into_response(self) -> Response {
        let error = match self {
            FhirResourceRejection::InvalidJson(msg) => RestError::BadRequest {
                message: format!("Invalid JSON: {}", msg),
            },
            FhirResourceRejection::MissingResourceType => RestError::BadRequest {
                message: "Resource must contain resourceType".to_string(),
            },
            FhirResourceRejection::UnsupportedMediaType(ct) => {
                RestError::UnsupportedMediaType { content_type: ct }
            }
            FhirResourceRejection::InvalidResourceType(rt) => RestError::BadRequest {
                message: format!("Unknown or unsupported resource type: {}", rt),
            },
        };
        error.into_response()
    }
}

impl<S> FromRequest<S> for FhirResource
where
    S: Send + Sync,
{
    type Rejection = FhirResourceRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        // Must own the string before moving req
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/json")
            .to_string();

        if !content_type.contains("json") {
            return Err(FhirResourceRejection::UnsupportedMediaType(content_type));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| FhirResourceRejection::InvalidJson(e.to_string()))?;

        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| FhirResourceRejection::InvalidJson(e.to_string()))?;

        let resource_type = value
            .get("resourceType")
            .and_then(|v| v.as_str())
            .ok_or(FhirResourceRejection::MissingResourceType)?;

        if !is_valid_resource_type(resource_type) {
            return Err(FhirResourceRejection::InvalidResourceType(
                resource_type.to_string(),
            ));
        }

        Ok(FhirResource(value))
    }
}
