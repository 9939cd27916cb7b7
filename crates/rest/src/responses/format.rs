//! FHIR JSON response building.

use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use super::headers::FHIR_JSON;

/// Builds an `application/fhir+json` response.
///
/// Headers in `headers` are applied after the body, so a caller-supplied
/// Content-Type wins over the JSON default.
pub fn format_resource_response(status: StatusCode, mut headers: HeaderMap, content: Value) -> Response {
    if !headers.contains_key(header::CONTENT_TYPE) {
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(FHIR_JSON));
    }
    (status, headers, axum::Json(content)).into_response()
}
