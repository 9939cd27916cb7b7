//! Capabilities (CapabilityStatement) handler.
//!
//! Implements the FHIR [capabilities interaction](https://hl7.org/fhir/http.html#capabilities):
//! `GET [base]/metadata`, plus the security statement served at
//! `GET [base]/.well-known/smart-configuration`.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
};
use serde_json::Value;
use tracing::debug;

use crate::error::RestResult;
use crate::fhir_types::{FHIR_VERSION, ServedResourceType};
use crate::responses::{FHIR_JSON, format_resource_response};
use crate::state::{AppState, RegistryStorage};

const PUBLISHER: &str = "Saint Martin Hospital";

/// Handler for the capabilities interaction.
///
/// # HTTP Request
///
/// `GET [base]/metadata`
///
/// # Response
///
/// Returns a CapabilityStatement resource (200 OK).
pub async fn capabilities_handler<S>(State(state): State<AppState<S>>) -> RestResult<Response>
where
    S: RegistryStorage,
{
    debug!("Processing capabilities request");

    let capability_statement = build_capability_statement(&state);
    Ok(format_resource_response(
        StatusCode::OK,
        HeaderMap::new(),
        capability_statement,
    ))
}

/// Handler for the SMART configuration document.
///
/// # HTTP Request
///
/// `GET [base]/.well-known/smart-configuration`
pub async fn smart_configuration_handler<S>(
    State(state): State<AppState<S>>,
) -> RestResult<Response>
where
    S: RegistryStorage,
{
    debug!("Processing security statement request");

    Ok(format_resource_response(
        StatusCode::OK,
        HeaderMap::new(),
        build_security_statement(&state),
    ))
}

/// Builds the CapabilityStatement for this server.
fn build_capability_statement<S>(state: &AppState<S>) -> Value
where
    S: RegistryStorage,
{
    let backend_name = state.storage().backend_name();
    let now = chrono::Utc::now();

    let resources: Vec<Value> = ServedResourceType::ALL
        .iter()
        .map(|rt| build_resource_capability(*rt))
        .collect();

    serde_json::json!({
        "resourceType": "CapabilityStatement",
        "status": "active",
        "date": now.format("%Y-%m-%d").to_string(),
        "publisher": PUBLISHER,
        "kind": "instance",
        "software": {
            "name": "smh-fhir-server",
            "version": crate::VERSION
        },
        "implementation": {
            "description": format!("{} person registry ({})", PUBLISHER, backend_name),
            "url": state.base_url()
        },
        "fhirVersion": FHIR_VERSION,
        "format": [FHIR_JSON],
        "rest": [{
            "mode": "server",
            "security": build_security_statement(state),
            "resource": resources
        }]
    })
}

/// Builds the security block shared by the CapabilityStatement and the
/// SMART configuration endpoint.
fn build_security_statement<S>(state: &AppState<S>) -> Value
where
    S: RegistryStorage,
{
    serde_json::json!({
        "cors": state.config().enable_cors,
        "service": [{
            "coding": [{
                "system": "http://terminology.hl7.org/CodeSystem/restful-security-service",
                "code": "SMART-on-FHIR"
            }],
            "text": "OAuth2 using SMART-on-FHIR profile (see http://docs.smarthealthit.org)"
        }]
    })
}

/// Builds the capability entry for a resource type.
fn build_resource_capability(resource_type: ServedResourceType) -> Value {
    let mut interactions = vec![
        serde_json::json!({ "code": "read" }),
        serde_json::json!({ "code": "search-type" }),
    ];
    if resource_type.supports_create() {
        interactions.push(serde_json::json!({ "code": "create" }));
    }

    let search_params: Vec<Value> = resource_type
        .search_parameters()
        .iter()
        .map(|name| {
            let (param_type, documentation) = describe_search_param(name);
            serde_json::json!({
                "name": name,
                "type": param_type,
                "documentation": documentation
            })
        })
        .collect();

    serde_json::json!({
        "type": resource_type.as_str(),
        "profile": format!("http://hl7.org/fhir/StructureDefinition/{}", resource_type),
        "interaction": interactions,
        "versioning": "no-version",
        "readHistory": false,
        "updateCreate": false,
        "searchParam": search_params
    })
}

/// FHIR search parameter type and description for a parameter name.
fn describe_search_param(name: &str) -> (&'static str, &'static str) {
    match name {
        "_id" => ("token", "Logical id of this artifact"),
        "family" => ("string", "A portion of the family name"),
        "gender" => ("token", "Administrative gender"),
        "birthDate" => ("date", "The date of birth (YYYY-MM-DD)"),
        "email" => ("token", "An email address"),
        "name" => ("string", "A portion of the first, second or family name"),
        "identifier" => ("token", "An identifier, as system|value or value"),
        "patient" => ("reference", "The person the medication is for"),
        "requester" => ("reference", "Who ordered the medication"),
        "status" => ("token", "Status of the prescription"),
        _ => ("string", ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_capability_interactions() {
        let patient = build_resource_capability(ServedResourceType::Patient);
        let codes: Vec<_> = patient["interaction"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["code"].as_str().unwrap())
            .collect();
        assert_eq!(codes, vec!["read", "search-type", "create"]);

        let medication = build_resource_capability(ServedResourceType::MedicationRequest);
        assert_eq!(medication["interaction"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_search_params_are_typed() {
        let patient = build_resource_capability(ServedResourceType::Patient);
        let birth_date = patient["searchParam"]
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["name"] == "birthDate")
            .unwrap();
        assert_eq!(birth_date["type"], "date");
    }
}
