//! Create interaction handler.
//!
//! Implements the FHIR [create interaction](https://hl7.org/fhir/http.html#create):
//! `POST [base]/[type]`

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};
use smh_persistence::mapping::from_resource;
use tracing::{debug, info};

use crate::error::{RestError, RestResult};
use crate::extractors::FhirResource;
use crate::fhir_types::ServedResourceType;
use crate::responses::{ResourceHeaders, format_resource_response};
use crate::state::{AppState, RegistryStorage};

/// Handler for the create interaction.
///
/// Creates a person from a Patient or Practitioner body. The server assigns
/// the id; identifiers in the hospital's own namespaces are ignored.
///
/// # HTTP Request
///
/// `POST [base]/[type]`
///
/// # Response
///
/// - `201 Created` - body `{"id": "<new id>"}`, `Location` header
/// - `400 Bad Request` - missing or unusable element, unknown identifier system
/// - `405 Method Not Allowed` - the type cannot be created
/// - `422 Unprocessable Entity` - an identifier could not be stored; nothing was written
///
/// # Example
///
/// ```http
/// POST /4_0_0/Patient HTTP/1.1
/// Host: localhost:3005
/// Content-Type: application/fhir+json
///
/// {"resourceType": "Patient", "name": [{"family": "Lee"}], "telecom": [{"value": "a@x.com"}]}
/// ```
pub async fn create_handler<S>(
    State(state): State<AppState<S>>,
    Path(resource_type): Path<String>,
    resource: FhirResource,
) -> RestResult<Response>
where
    S: RegistryStorage,
{
    debug!(resource_type = %resource_type, "Processing create request");

    let served: ServedResourceType = resource_type.parse()?;
    if !served.supports_create() {
        return Err(RestError::MethodNotAllowed {
            method: "POST".to_string(),
            resource_type: served.to_string(),
        });
    }

    // Validate resourceType in body matches URL
    if resource.resource_type() != Some(served.as_str()) {
        return Err(RestError::BadRequest {
            message: format!(
                "Resource type in body ({}) does not match URL ({})",
                resource.resource_type().unwrap_or_default(),
                served
            ),
        });
    }

    let request = from_resource(&resource.into_inner())?;
    let documents = request.documents.len();
    let record = state.storage().create_person(request).await?;

    let id = record.person.id.to_string();
    let location = format!("{}/{}/{}", state.base_url(), served, id);

    info!(
        resource_type = %served,
        id = %id,
        documents,
        "Resource created"
    );

    let headers = ResourceHeaders::new()
        .with_location(location)
        .with_last_modified(record.person.created_at);

    Ok(format_resource_response(
        StatusCode::CREATED,
        headers.to_header_map(),
        serde_json::json!({ "id": id }),
    ))
}
