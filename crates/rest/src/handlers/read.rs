//! Read interaction handler.
//!
//! Implements the FHIR [read interaction](https://hl7.org/fhir/http.html#read):
//! `GET [base]/[type]/[id]`

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use serde_json::Value;
use smh_persistence::mapping::{to_medication_request_resource, to_resource};
use smh_persistence::types::{PersonRecord, PersonResourceType};
use tracing::debug;

use crate::error::{RestError, RestResult};
use crate::fhir_types::ServedResourceType;
use crate::responses::{ResourceHeaders, format_resource_response};
use crate::state::{AppState, RegistryStorage};

/// Handler for the read interaction.
///
/// Patient and Practitioner are two views of the same person row, so the
/// same id reads under either type.
///
/// # HTTP Request
///
/// `GET [base]/[type]/[id]`
///
/// # Response
///
/// - `200 OK` - Resource found, returns the resource
/// - `404 Not Found` - Resource does not exist, or the id is not numeric
///
/// # Example
///
/// ```http
/// GET /4_0_0/Patient/123 HTTP/1.1
/// Host: localhost:3005
/// Accept: application/fhir+json
/// ```
pub async fn read_handler<S>(
    State(state): State<AppState<S>>,
    Path((resource_type, id)): Path<(String, String)>,
) -> RestResult<Response>
where
    S: RegistryStorage,
{
    debug!(
        resource_type = %resource_type,
        id = %id,
        "Processing read request"
    );

    let served: ServedResourceType = resource_type.parse()?;
    let not_found = || RestError::NotFound {
        resource_type: served.to_string(),
        id: id.clone(),
    };

    // Ids are database keys; anything else cannot exist.
    let Ok(key) = id.parse::<i64>() else {
        debug!(id = %id, "Non-numeric id on read");
        return Err(not_found());
    };

    let (resource, last_modified) = match served.person_kind() {
        Some(kind) => {
            let record = state
                .storage()
                .read_person(key)
                .await?
                .ok_or_else(not_found)?;
            let last_modified = record.person.updated_at.unwrap_or(record.person.created_at);
            (person_to_json(kind, &record)?, last_modified)
        }
        None => {
            let record = state
                .storage()
                .read_medication_request(key)
                .await?
                .ok_or_else(not_found)?;
            (to_medication_request_resource(&record), record.created_at)
        }
    };

    debug!(resource_type = %served, id = key, "Returning resource");

    let headers = ResourceHeaders::new().with_last_modified(last_modified);
    Ok(format_resource_response(
        StatusCode::OK,
        headers.to_header_map(),
        resource,
    ))
}

/// Maps a stored person to the JSON of the requested projection.
pub(crate) fn person_to_json(kind: PersonResourceType, record: &PersonRecord) -> RestResult<Value> {
    let resource = to_resource(kind, &record.person, &record.documents);
    serde_json::to_value(resource).map_err(|e| RestError::InternalError {
        message: format!("Failed to serialize {}: {}", kind, e),
    })
}
