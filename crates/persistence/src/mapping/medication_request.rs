//! `MEDICATION_REQUEST` rows → FHIR MedicationRequest.

use serde_json::{Map, Value, json};

use crate::types::MedicationRequestRecord;

/// Namespace of medication request identifiers.
pub const MEDICATION_REQUEST_ID_SYSTEM: &str =
    "https://saintmartinhospital.org/medication-request-id";

/// Builds the MedicationRequest resource for `record`.
///
/// Optional columns that are `NULL` leave their element out.
pub fn to_medication_request_resource(record: &MedicationRequestRecord) -> Value {
    let mut resource = Map::new();
    resource.insert("resourceType".to_string(), json!("MedicationRequest"));
    resource.insert("id".to_string(), json!(record.id.to_string()));
    resource.insert(
        "identifier".to_string(),
        json!([{
            "use": "official",
            "system": MEDICATION_REQUEST_ID_SYSTEM,
            "value": record.id.to_string()
        }]),
    );
    resource.insert("status".to_string(), json!(record.status));
    resource.insert("intent".to_string(), json!(record.intent));

    if record.medication_code.is_some() || record.medication_display.is_some() {
        let mut coding = Map::new();
        if let Some(code) = &record.medication_code {
            coding.insert("code".to_string(), json!(code));
        }
        if let Some(display) = &record.medication_display {
            coding.insert("display".to_string(), json!(display));
        }
        let mut concept = Map::new();
        concept.insert("coding".to_string(), json!([coding]));
        if let Some(display) = &record.medication_display {
            concept.insert("text".to_string(), json!(display));
        }
        resource.insert(
            "medicationCodeableConcept".to_string(),
            Value::Object(concept),
        );
    }

    resource.insert(
        "subject".to_string(),
        json!({"reference": format!("Patient/{}", record.patient_id)}),
    );

    if let Some(authored_on) = record.authored_on {
        resource.insert("authoredOn".to_string(), json!(authored_on.to_rfc3339()));
    }
    if let Some(requester_id) = record.requester_id {
        resource.insert(
            "requester".to_string(),
            json!({"reference": format!("Practitioner/{}", requester_id)}),
        );
    }
    if let Some(text) = &record.dosage_text {
        resource.insert("dosageInstruction".to_string(), json!([{"text": text}]));
    }
    if let Some(days) = record.supply_duration_days {
        resource.insert(
            "dispenseRequest".to_string(),
            json!({
                "expectedSupplyDuration": {
                    "value": days,
                    "unit": "days",
                    "system": "http://unitsofmeasure.org",
                    "code": "d"
                }
            }),
        );
    }

    Value::Object(resource)
}
