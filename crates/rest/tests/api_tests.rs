//! Integration tests for the REST API over an in-memory SQLite registry.
//!
//! Covers:
//! - Capabilities, security statement and health endpoints
//! - Create / read of Patient and Practitioner
//! - OperationOutcome responses for every recoverable error
//! - Search (GET and POST), paging links and totals
//! - MedicationRequest read and search
//! - Base path nesting

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};
use smh_persistence::backends::sqlite::SqliteBackend;
use smh_persistence::mapping::identifier::{
    NATIONAL_ID_SYSTEM, PASSPORT_SYSTEM, PATIENT_ID_SYSTEM, PRACTITIONER_ID_SYSTEM,
};
use smh_persistence::types::NewMedicationRequest;
use smh_rest::{AppState, ServerConfig};

/// Creates a test server whose routes live at the root.
fn create_test_server() -> (TestServer, Arc<SqliteBackend>) {
    create_test_server_with_config(ServerConfig::for_testing())
}

fn create_test_server_with_config(config: ServerConfig) -> (TestServer, Arc<SqliteBackend>) {
    let backend = SqliteBackend::in_memory().expect("Failed to create SQLite backend");
    backend.init_schema().expect("Failed to init schema");
    let backend = Arc::new(backend);

    let state = AppState::new(Arc::clone(&backend), config);
    let app = smh_rest::routing::fhir_routes::create_routes(state);
    let server = TestServer::new(app).expect("Failed to create test server");

    (server, backend)
}

fn patient(first: &str, last: &str, email: &str) -> Value {
    json!({
        "resourceType": "Patient",
        "name": [{"family": last, "given": [first]}],
        "telecom": [{"system": "email", "value": email}],
        "gender": "female",
        "birthDate": "1990-01-01"
    })
}

/// Creates a person as `resource_type` and returns its new id.
async fn create(server: &TestServer, resource_type: &str, mut resource: Value) -> String {
    resource["resourceType"] = json!(resource_type);
    let response = server.post(&format!("/{}", resource_type)).json(&resource).await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["id"]
        .as_str()
        .expect("id in create response")
        .to_string()
}

async fn search_total(server: &TestServer, path: &str) -> u64 {
    let response = server.get(path).await;
    response.assert_status_ok();
    response.json::<Value>()["total"].as_u64().expect("total")
}

// ============================================================================
// Capabilities / Health
// ============================================================================

#[tokio::test]
async fn test_metadata_returns_capability_statement() {
    let (server, _) = create_test_server();

    let response = server.get("/metadata").await;
    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "application/fhir+json");

    let statement: Value = response.json();
    assert_eq!(statement["resourceType"], "CapabilityStatement");
    assert_eq!(statement["fhirVersion"], "4.0.1");
    assert_eq!(statement["kind"], "instance");
    assert_eq!(statement["format"], json!(["application/fhir+json"]));

    let types: Vec<_> = statement["rest"][0]["resource"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["type"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["Patient", "Practitioner", "MedicationRequest"]);
    assert_eq!(
        statement["rest"][0]["security"]["service"][0]["coding"][0]["code"],
        "SMART-on-FHIR"
    );
}

#[tokio::test]
async fn test_smart_configuration() {
    let (server, _) = create_test_server();

    let response = server.get("/.well-known/smart-configuration").await;
    response.assert_status_ok();

    let security: Value = response.json();
    assert_eq!(security["cors"], false);
    assert_eq!(security["service"][0]["coding"][0]["code"], "SMART-on-FHIR");
}

#[tokio::test]
async fn test_health() {
    let (server, _) = create_test_server();

    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "healthy");
}

// ============================================================================
// Create / Read
// ============================================================================

#[tokio::test]
async fn test_create_then_read_patient() {
    let (server, _) = create_test_server();

    let mut resource = patient("Ann", "Lee", "a@x.com");
    resource["identifier"] = json!([{"system": NATIONAL_ID_SYSTEM, "value": "NI-123"}]);

    let response = server.post("/Patient").json(&resource).await;
    response.assert_status(StatusCode::CREATED);
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();
    assert_eq!(
        response.header("location"),
        format!("http://localhost:3005/Patient/{}", id).as_str()
    );

    let response = server.get(&format!("/Patient/{}", id)).await;
    response.assert_status_ok();
    let read: Value = response.json();

    assert_eq!(read["resourceType"], "Patient");
    assert_eq!(read["id"], id.as_str());
    assert_eq!(read["name"][0]["text"], "Ann Lee");
    assert_eq!(read["name"][0]["family"], "Lee");
    assert_eq!(read["telecom"][0]["value"], "a@x.com");
    assert_eq!(read["gender"], "female");
    assert_eq!(read["birthDate"], "1990-01-01");

    assert_eq!(read["identifier"][0]["system"], PATIENT_ID_SYSTEM);
    assert_eq!(read["identifier"][0]["value"], id.as_str());
    assert_eq!(read["identifier"][1]["system"], NATIONAL_ID_SYSTEM);
    assert_eq!(read["identifier"][1]["value"], "NI-123");
}

#[tokio::test]
async fn test_person_reads_as_practitioner() {
    let (server, _) = create_test_server();
    let id = create(&server, "Patient", patient("Ann", "Lee", "a@x.com")).await;

    let response = server.get(&format!("/Practitioner/{}", id)).await;
    response.assert_status_ok();

    let read: Value = response.json();
    assert_eq!(read["resourceType"], "Practitioner");
    assert_eq!(read["identifier"][0]["system"], PRACTITIONER_ID_SYSTEM);
}

#[tokio::test]
async fn test_read_missing_returns_not_found() {
    let (server, _) = create_test_server();

    for path in ["/Patient/999", "/Patient/abc", "/Practitioner/1.5"] {
        let response = server.get(path).await;
        response.assert_status(StatusCode::NOT_FOUND);

        let outcome: Value = response.json();
        assert_eq!(outcome["resourceType"], "OperationOutcome");
        assert_eq!(outcome["issue"][0]["code"], "not-found");
    }
}

#[tokio::test]
async fn test_unsupported_resource_type() {
    let (server, _) = create_test_server();

    let response = server.get("/Observation").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["issue"][0]["code"], "not-supported");
}

// ============================================================================
// Create Errors
// ============================================================================

#[tokio::test]
async fn test_create_missing_family_names_path() {
    let (server, _) = create_test_server();

    let response = server
        .post("/Patient")
        .json(&json!({
            "resourceType": "Patient",
            "name": [{"given": ["Ann"]}],
            "telecom": [{"value": "a@x.com"}]
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let outcome: Value = response.json();
    assert_eq!(outcome["issue"][0]["code"], "required");
    assert_eq!(outcome["issue"][0]["expression"][0], "name[0].family");
    assert_eq!(search_total(&server, "/Patient").await, 0);
}

#[tokio::test]
async fn test_create_missing_email_names_path() {
    let (server, _) = create_test_server();

    let response = server
        .post("/Practitioner")
        .json(&json!({
            "resourceType": "Practitioner",
            "name": [{"family": "House"}]
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["issue"][0]["expression"][0],
        "telecom[0].value"
    );
}

#[tokio::test]
async fn test_create_unknown_identifier_system_writes_nothing() {
    let (server, _) = create_test_server();

    let mut resource = patient("Ann", "Lee", "a@x.com");
    resource["identifier"] = json!([{"system": "urn:other-hospital", "value": "X-1"}]);

    let response = server.post("/Patient").json(&resource).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["issue"][0]["code"], "code-invalid");
    assert_eq!(search_total(&server, "/Patient").await, 0);
}

#[tokio::test]
async fn test_create_duplicate_document_type_is_partial_insert_failure() {
    let (server, _) = create_test_server();

    let mut resource = patient("Ann", "Lee", "a@x.com");
    resource["identifier"] = json!([
        {"system": PASSPORT_SYSTEM, "value": "P-1"},
        {"system": NATIONAL_ID_SYSTEM, "value": "NI-1"},
        {"system": NATIONAL_ID_SYSTEM, "value": "NI-2"}
    ]);

    let response = server.post("/Patient").json(&resource).await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let outcome: Value = response.json();
    let issues = outcome["issue"].as_array().unwrap();
    let errors: Vec<_> = issues.iter().filter(|i| i["severity"] == "error").collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["code"], "processing");
    let text = errors[0]["details"]["text"].as_str().unwrap();
    assert!(text.contains("NI-2"));
    assert!(text.contains("an active document of this type already exists"));
    assert!(!text.contains("UNIQUE"));
    assert_eq!(issues.len(), 3);

    assert_eq!(search_total(&server, "/Patient").await, 0);
}

#[tokio::test]
async fn test_create_body_type_must_match_url() {
    let (server, _) = create_test_server();

    let mut resource = patient("Ann", "Lee", "a@x.com");
    resource["resourceType"] = json!("Practitioner");

    let response = server.post("/Patient").json(&resource).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["issue"][0]["code"], "invalid");
}

#[tokio::test]
async fn test_create_medication_request_not_allowed() {
    let (server, _) = create_test_server();

    let response = server
        .post("/MedicationRequest")
        .json(&json!({"resourceType": "MedicationRequest", "status": "active"}))
        .await;
    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_create_rejects_invalid_json() {
    let (server, _) = create_test_server();

    let response = server
        .post("/Patient")
        .bytes(Bytes::from_static(b"{not json"))
        .content_type("application/fhir+json")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["resourceType"], "OperationOutcome");
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn test_search_by_family_and_gender() {
    let (server, _) = create_test_server();
    create(&server, "Patient", patient("Ann", "Lee", "a@x.com")).await;
    create(&server, "Patient", patient("Bob", "Lee", "b@x.com")).await;
    create(&server, "Patient", patient("Cy", "Kim", "c@x.com")).await;

    let response = server
        .get("/Patient")
        .add_query_param("family", "Lee")
        .add_query_param("gender", "female")
        .await;
    response.assert_status_ok();

    let bundle: Value = response.json();
    assert_eq!(bundle["resourceType"], "Bundle");
    assert_eq!(bundle["type"], "searchset");
    assert_eq!(bundle["total"], 2);
    assert!(bundle["id"].as_str().is_some());
    assert!(bundle["meta"]["lastUpdated"].as_str().is_some());

    let entries = bundle["entry"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["search"]["mode"], "match");
    assert!(
        entries[0]["fullUrl"]
            .as_str()
            .unwrap()
            .starts_with("http://localhost:3005/Patient/")
    );
}

#[tokio::test]
async fn test_search_by_name_substring() {
    let (server, _) = create_test_server();
    create(&server, "Patient", patient("Annabel", "Lee", "a@x.com")).await;
    create(&server, "Patient", patient("Bob", "Hannah", "b@x.com")).await;
    create(&server, "Patient", patient("Cy", "Kim", "c@x.com")).await;

    assert_eq!(search_total(&server, "/Patient?name=ann").await, 2);
    assert_eq!(search_total(&server, "/Patient?name=%25").await, 0);
}

#[tokio::test]
async fn test_search_by_identifier() {
    let (server, _) = create_test_server();

    let mut resource = patient("Ann", "Lee", "a@x.com");
    resource["identifier"] = json!([{"system": NATIONAL_ID_SYSTEM, "value": "NI-123"}]);
    let id = create(&server, "Patient", resource).await;
    create(&server, "Patient", patient("Bob", "Kim", "b@x.com")).await;

    let response = server
        .get("/Patient")
        .add_query_param("identifier", format!("{}|NI-123", NATIONAL_ID_SYSTEM))
        .await;
    let bundle: Value = response.json();
    assert_eq!(bundle["total"], 1);
    assert_eq!(bundle["entry"][0]["resource"]["id"], id.as_str());

    let by_primary = server
        .get("/Patient")
        .add_query_param("identifier", format!("{}|{}", PATIENT_ID_SYSTEM, id))
        .await;
    assert_eq!(by_primary.json::<Value>()["total"], 1);

    let unknown = server
        .get("/Patient")
        .add_query_param("identifier", "urn:other|1")
        .await;
    unknown.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(unknown.json::<Value>()["issue"][0]["code"], "code-invalid");
}

#[tokio::test]
async fn test_search_invalid_parameter_value() {
    let (server, _) = create_test_server();

    let response = server.get("/Patient?birthDate=01-02-1990").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let outcome: Value = response.json();
    assert_eq!(outcome["issue"][0]["code"], "invalid");
    assert_eq!(outcome["issue"][0]["expression"][0], "birthDate");
}

#[tokio::test]
async fn test_search_ignores_unknown_parameters() {
    let (server, _) = create_test_server();
    create(&server, "Patient", patient("Ann", "Lee", "a@x.com")).await;

    assert_eq!(search_total(&server, "/Patient?_sort=family&colour=blue").await, 1);
}

#[tokio::test]
async fn test_search_paging() {
    let (server, _) = create_test_server();
    for (first, email) in [("Ann", "a@x.com"), ("Bea", "b@x.com"), ("Cat", "c@x.com")] {
        create(&server, "Patient", patient(first, "Lee", email)).await;
    }

    let first_page: Value = server.get("/Patient?family=Lee&_count=2").await.json();
    assert_eq!(first_page["total"], 3);
    assert_eq!(first_page["entry"].as_array().unwrap().len(), 2);
    assert_eq!(first_page["link"][0]["relation"], "self");
    assert_eq!(first_page["link"][1]["relation"], "next");
    assert_eq!(
        first_page["link"][1]["url"],
        "http://localhost:3005/Patient?family=Lee&_count=2&_offset=2"
    );

    let second_page: Value = server
        .get("/Patient?family=Lee&_count=2&_offset=2")
        .await
        .json();
    assert_eq!(second_page["total"], 3);
    assert_eq!(second_page["entry"].as_array().unwrap().len(), 1);
    assert_eq!(second_page["entry"][0]["resource"]["name"][0]["text"], "Cat Lee");
    let relations: Vec<_> = second_page["link"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["relation"].as_str().unwrap())
        .collect();
    assert_eq!(relations, vec!["self", "previous"]);
}

#[tokio::test]
async fn test_search_offset_out_of_range() {
    let (server, _) = create_test_server();
    create(&server, "Patient", patient("Ann", "Lee", "a@x.com")).await;

    for offset in ["18446744073709551615", "9223372036854775808"] {
        let response = server.get("/Patient").add_query_param("_offset", offset).await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let outcome: Value = response.json();
        assert_eq!(outcome["issue"][0]["code"], "invalid");
        assert_eq!(outcome["issue"][0]["expression"][0], "_offset");
    }

    let response = server
        .get("/Patient")
        .add_query_param("_offset", "9223372036854775807")
        .await;
    response.assert_status_ok();
    let bundle: Value = response.json();
    assert_eq!(bundle["total"], 1);
    assert!(bundle.get("entry").is_none());
}

#[tokio::test]
async fn test_unfiltered_search_is_bounded_by_page_size() {
    let config = ServerConfig {
        default_page_size: 2,
        ..ServerConfig::for_testing()
    };
    let (server, _) = create_test_server_with_config(config);
    for (first, email) in [("Ann", "a@x.com"), ("Bea", "b@x.com"), ("Cat", "c@x.com")] {
        create(&server, "Practitioner", patient(first, "Lee", email)).await;
    }

    let bundle: Value = server.get("/Practitioner").await.json();
    assert_eq!(bundle["total"], 3);
    assert_eq!(bundle["entry"].as_array().unwrap().len(), 2);

    // _count above the maximum is capped
    let capped: Value = server.get("/Practitioner?_count=500").await.json();
    assert_eq!(capped["entry"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_search_post_form() {
    let (server, _) = create_test_server();
    create(&server, "Patient", patient("Ann", "Lee", "a@x.com")).await;
    create(&server, "Patient", patient("Bob", "Kim", "b@x.com")).await;

    let response = server
        .post("/Patient/_search")
        .form(&[("email", "b@x.com")])
        .await;
    response.assert_status_ok();

    let bundle: Value = response.json();
    assert_eq!(bundle["total"], 1);
    assert_eq!(bundle["entry"][0]["resource"]["name"][0]["family"], "Kim");
}

// ============================================================================
// MedicationRequest
// ============================================================================

#[tokio::test]
async fn test_medication_request_read_and_search() {
    let (server, backend) = create_test_server();
    let patient_id = create(&server, "Patient", patient("Ann", "Lee", "a@x.com")).await;
    let doctor_id = create(&server, "Practitioner", patient("Greg", "House", "g@x.com")).await;

    let patient_key: i64 = patient_id.parse().unwrap();
    let doctor_key: i64 = doctor_id.parse().unwrap();
    let record = backend
        .insert_medication_request(
            NewMedicationRequest::order(patient_key)
                .with_requester(doctor_key)
                .with_medication("1049502", "Acetaminophen 325 MG"),
        )
        .expect("insert medication request");
    backend
        .insert_medication_request(NewMedicationRequest::order(doctor_key))
        .expect("insert medication request");

    let response = server
        .get(&format!("/MedicationRequest/{}", record.id))
        .await;
    response.assert_status_ok();
    let read: Value = response.json();
    assert_eq!(read["resourceType"], "MedicationRequest");
    assert_eq!(read["status"], "active");
    assert_eq!(read["subject"]["reference"], format!("Patient/{}", patient_id));
    assert_eq!(
        read["requester"]["reference"],
        format!("Practitioner/{}", doctor_id)
    );

    let bundle: Value = server
        .get(&format!("/MedicationRequest?patient=Patient/{}", patient_id))
        .await
        .json();
    assert_eq!(bundle["total"], 1);
    assert_eq!(
        bundle["entry"][0]["fullUrl"],
        format!("http://localhost:3005/MedicationRequest/{}", record.id)
    );

    let missing = server.get("/MedicationRequest/999").await;
    missing.assert_status(StatusCode::NOT_FOUND);
}

// ============================================================================
// Base Path
// ============================================================================

#[tokio::test]
async fn test_routes_nest_under_base_path() {
    let config = ServerConfig {
        database_url: ":memory:".to_string(),
        ..ServerConfig::default()
    };
    let (server, _) = create_test_server_with_config(config);

    server.get("/4_0_0/metadata").await.assert_status_ok();
    server
        .get("/metadata")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let response = server
        .post("/4_0_0/Patient")
        .json(&patient("Ann", "Lee", "a@x.com"))
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(
        response.header("location"),
        "http://localhost:3005/4_0_0/Patient/1"
    );
}
