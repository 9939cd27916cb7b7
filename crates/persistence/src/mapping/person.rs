//! Person ⇄ Patient / Practitioner mapping.
//!
//! [`to_resource`] projects one `PERSON` row and its `PERSON_DOC` rows into
//! the nested resource shape. [`from_resource`] goes the other way for a
//! create request, validating the submitted document as it reads it.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{StorageResult, ValidationError};
use crate::mapping::identifier::{self, IdentifierKind};
use crate::types::{
    AdministrativeGender, ContactPoint, HumanName, Identifier, Narrative, NewPerson,
    NewPersonDocument, NewPersonRequest, Period, Person, PersonDocument, PersonResource,
    PersonResourceType,
};

const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Builds the resource for `person`.
///
/// The identifier list always starts with the person's own id in the
/// primary namespace of `resource_type`, followed by the active documents in
/// the order given. Documents whose type code is not in the codec table are
/// skipped.
pub fn to_resource(
    resource_type: PersonResourceType,
    person: &Person,
    documents: &[PersonDocument],
) -> PersonResource {
    let text = display_name(person);

    PersonResource {
        resource_type,
        id: person.id.to_string(),
        text: narrative(&text),
        identifier: identifiers(resource_type, person, documents),
        name: vec![official_name(person, text), nickname(person)],
        telecom: vec![ContactPoint {
            system: Some("email".to_string()),
            value: person.email.clone(),
            contact_use: Some("home".to_string()),
        }],
        gender: person.gender.clone(),
        birth_date: person.birth_date,
    }
}

fn display_name(person: &Person) -> String {
    match &person.first_name {
        Some(first) => format!("{} {}", first, person.last_name),
        None => person.last_name.clone(),
    }
}

fn narrative(text: &str) -> Narrative {
    Narrative {
        status: "generated".to_string(),
        div: format!(
            "<div xmlns=\"{}\">{}</div>",
            XHTML_NAMESPACE,
            html_escape::encode_text(text)
        ),
    }
}

fn official_name(person: &Person, text: String) -> HumanName {
    // given[1] is positional, so a missing first name is kept as "".
    let given = match (&person.first_name, &person.second_name) {
        (first, Some(second)) => vec![first.clone().unwrap_or_default(), second.clone()],
        (Some(first), None) => vec![first.clone()],
        (None, None) => Vec::new(),
    };

    HumanName {
        name_use: Some("official".to_string()),
        text: Some(text),
        family: Some(person.last_name.clone()),
        given,
    }
}

fn nickname(person: &Person) -> HumanName {
    HumanName {
        name_use: Some("nickname".to_string()),
        text: None,
        family: None,
        given: vec![person.nickname.clone().unwrap_or_default()],
    }
}

fn identifiers(
    resource_type: PersonResourceType,
    person: &Person,
    documents: &[PersonDocument],
) -> Vec<Identifier> {
    let primary = IdentifierKind::primary_for(resource_type);
    let mut identifiers = Vec::with_capacity(documents.len() + 1);
    identifiers.push(Identifier {
        identifier_use: Some(primary.identifier_use().to_string()),
        system: Some(primary.system().to_string()),
        value: Some(person.id.to_string()),
        period: Some(Period {
            start: Some(person.created_at),
        }),
    });

    for document in documents.iter().filter(|d| d.is_active()) {
        match IdentifierKind::from_document_code(document.doc_type_code) {
            Ok(kind) => identifiers.push(Identifier {
                identifier_use: Some(kind.identifier_use().to_string()),
                system: Some(kind.system().to_string()),
                value: Some(document.value.clone()),
                period: None,
            }),
            Err(e) => warn!(
                person_id = person.id,
                document_id = document.id,
                error = %e,
                "Skipping person document"
            ),
        }
    }

    identifiers
}

/// Reads a create request body, stamping the current time as creation date.
pub fn from_resource(resource: &Value) -> StorageResult<NewPersonRequest> {
    from_resource_at(resource, Utc::now())
}

/// Reads a create request body with an explicit creation timestamp.
///
/// `name[0].family` and `telecom[0].value` are required. Blank strings count
/// as absent. Identifiers in a hospital primary namespace are ignored since
/// the id is assigned on insert; any other identifier must belong to a known
/// namespace.
pub fn from_resource_at(
    resource: &Value,
    created_at: DateTime<Utc>,
) -> StorageResult<NewPersonRequest> {
    if !resource.is_object() {
        return Err(ValidationError::invalid("$", "resource must be a JSON object").into());
    }

    let last_name = required_text(resource, "/name/0/family", "name[0].family")?;
    let email = required_text(resource, "/telecom/0/value", "telecom[0].value")?;
    let first_name = optional_text(resource, "/name/0/given/0", "name[0].given[0]")?;
    let second_name = optional_text(resource, "/name/0/given/1", "name[0].given[1]")?;
    let nickname = optional_text(resource, "/name/1/given/0", "name[1].given[0]")?;

    let birth_date = optional_text(resource, "/birthDate", "birthDate")?
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                ValidationError::invalid("birthDate", format!("'{}' is not a YYYY-MM-DD date", raw))
            })
        })
        .transpose()?;

    let gender = optional_text(resource, "/gender", "gender")?
        .map(|code| {
            AdministrativeGender::parse(&code)
                .map(|gender| gender.as_str().to_string())
                .ok_or_else(|| {
                    ValidationError::invalid(
                        "gender",
                        format!("'{}' is not one of male, female, other, unknown", code),
                    )
                })
        })
        .transpose()?;

    let documents = documents(resource)?;

    Ok(NewPersonRequest {
        person: NewPerson {
            first_name,
            second_name,
            last_name,
            birth_date,
            gender,
            email: Some(email),
            nickname,
            created_at,
        },
        documents,
    })
}

fn documents(resource: &Value) -> StorageResult<Vec<NewPersonDocument>> {
    let entries = match resource.get("identifier") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(_) => return Err(ValidationError::invalid("identifier", "expected an array").into()),
    };

    let mut documents = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let system = required_text(entry, "/system", &format!("identifier[{}].system", index))?;
        let value = required_text(entry, "/value", &format!("identifier[{}].value", index))?;

        match NewPersonDocument::from_decoded(identifier::decode(&system, &value)?) {
            Some(document) => documents.push(document),
            None => debug!(system = %system, "Ignoring server-assigned identifier"),
        }
    }

    Ok(documents)
}

fn optional_text(
    value: &Value,
    pointer: &str,
    path: &str,
) -> Result<Option<String>, ValidationError> {
    match value.pointer(pointer) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ValidationError::invalid(path, "expected a string")),
    }
}

fn required_text(value: &Value, pointer: &str, path: &str) -> Result<String, ValidationError> {
    optional_text(value, pointer, path)?.ok_or_else(|| ValidationError::missing(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{IdentifierError, StorageError};
    use crate::mapping::identifier::{
        NATIONAL_ID_SYSTEM, PASSPORT_SYSTEM, PATIENT_ID_SYSTEM, PRACTITIONER_ID_SYSTEM,
    };
    use chrono::TimeZone;
    use serde_json::json;

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    fn ann_lee() -> Person {
        Person {
            id: 7,
            first_name: Some("Ann".to_string()),
            second_name: None,
            last_name: "Lee".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 1),
            gender: Some("female".to_string()),
            email: Some("a@x.com".to_string()),
            nickname: None,
            created_at: created(),
            updated_at: None,
        }
    }

    fn document(id: i64, code: i64, value: &str) -> PersonDocument {
        PersonDocument {
            id,
            person_id: 7,
            doc_type_code: code,
            value: value.to_string(),
            created_at: created(),
            deleted_at: None,
        }
    }

    fn assert_malformed(result: StorageResult<NewPersonRequest>, expected_path: &str) {
        match result {
            Err(StorageError::Validation(ValidationError::MalformedResource { path, .. })) => {
                assert_eq!(path, expected_path)
            }
            other => panic!("expected MalformedResource at {}, got {:?}", expected_path, other),
        }
    }

    #[test]
    fn test_ann_lee_identifiers() {
        let resource = to_resource(
            PersonResourceType::Patient,
            &ann_lee(),
            &[document(1, 1, "NI-123")],
        );

        assert_eq!(resource.id, "7");
        assert_eq!(resource.identifier.len(), 2);
        assert_eq!(resource.identifier[0].system.as_deref(), Some(PATIENT_ID_SYSTEM));
        assert_eq!(resource.identifier[0].value.as_deref(), Some("7"));
        assert_eq!(resource.identifier[0].period.as_ref().unwrap().start, Some(created()));
        assert_eq!(resource.identifier[1].system.as_deref(), Some(NATIONAL_ID_SYSTEM));
        assert_eq!(resource.identifier[1].value.as_deref(), Some("NI-123"));
        assert_eq!(resource.identifier[1].identifier_use.as_deref(), Some("usual"));
    }

    #[test]
    fn test_names_and_telecom() {
        let resource = to_resource(PersonResourceType::Patient, &ann_lee(), &[]);

        assert_eq!(resource.name.len(), 2);
        assert_eq!(resource.name[0].text.as_deref(), Some("Ann Lee"));
        assert_eq!(resource.name[0].family.as_deref(), Some("Lee"));
        assert_eq!(resource.name[0].given, vec!["Ann".to_string()]);
        assert_eq!(resource.name[1].name_use.as_deref(), Some("nickname"));
        assert_eq!(resource.name[1].given, vec![String::new()]);

        assert_eq!(resource.telecom.len(), 1);
        assert_eq!(resource.telecom[0].system.as_deref(), Some("email"));
        assert_eq!(resource.telecom[0].value.as_deref(), Some("a@x.com"));
    }

    #[test]
    fn test_practitioner_uses_practitioner_namespace() {
        let resource = to_resource(PersonResourceType::Practitioner, &ann_lee(), &[]);
        let json = serde_json::to_value(&resource).unwrap();

        assert_eq!(json["resourceType"], "Practitioner");
        assert_eq!(json["identifier"][0]["system"], PRACTITIONER_ID_SYSTEM);
        assert_eq!(json["birthDate"], "1990-01-01");
    }

    #[test]
    fn test_deleted_and_unknown_documents_are_skipped() {
        let mut deleted = document(1, 2, "P-OLD");
        deleted.deleted_at = Some(created());
        let docs = vec![deleted, document(2, 9, "???"), document(3, 2, "P-NEW")];

        let resource = to_resource(PersonResourceType::Patient, &ann_lee(), &docs);

        assert_eq!(resource.identifier.len(), 2);
        assert_eq!(resource.identifier[1].system.as_deref(), Some(PASSPORT_SYSTEM));
        assert_eq!(resource.identifier[1].value.as_deref(), Some("P-NEW"));
    }

    #[test]
    fn test_narrative_escapes_markup() {
        let mut person = ann_lee();
        person.last_name = "<b>Lee</b>".to_string();

        let resource = to_resource(PersonResourceType::Patient, &person, &[]);

        assert_eq!(resource.text.status, "generated");
        assert!(resource.text.div.contains("Ann &lt;b&gt;Lee&lt;/b&gt;"));
        assert!(!resource.text.div.contains("<b>"));
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let mut full = ann_lee();
        full.second_name = Some("Marie".to_string());
        full.nickname = Some("Annie".to_string());

        let mut no_first = ann_lee();
        no_first.first_name = None;
        no_first.second_name = Some("Marie".to_string());

        let mut sparse = ann_lee();
        sparse.first_name = None;
        sparse.birth_date = None;
        sparse.gender = None;

        for person in [ann_lee(), full, no_first, sparse] {
            let resource = to_resource(PersonResourceType::Patient, &person, &[]);
            let json = serde_json::to_value(&resource).unwrap();
            let request = from_resource_at(&json, person.created_at).unwrap();

            assert_eq!(request.person.first_name, person.first_name);
            assert_eq!(request.person.second_name, person.second_name);
            assert_eq!(request.person.last_name, person.last_name);
            assert_eq!(request.person.birth_date, person.birth_date);
            assert_eq!(request.person.gender, person.gender);
            assert_eq!(request.person.email, person.email);
            assert_eq!(request.person.nickname, person.nickname);
            assert!(request.documents.is_empty(), "primary identifier is not a document");
        }
    }

    #[test]
    fn test_from_resource_reads_documents() {
        let body = json!({
            "resourceType": "Patient",
            "name": [{"family": "Lee", "given": ["Ann"]}],
            "telecom": [{"system": "email", "value": "a@x.com"}],
            "identifier": [
                {"system": PATIENT_ID_SYSTEM, "value": "99"},
                {"system": NATIONAL_ID_SYSTEM, "value": "NI-123"},
                {"system": PASSPORT_SYSTEM, "value": "P-1"}
            ]
        });

        let request = from_resource_at(&body, created()).unwrap();

        assert_eq!(request.person.created_at, created());
        assert_eq!(request.documents.len(), 2);
        assert_eq!(request.documents[0].doc_type_code, 1);
        assert_eq!(request.documents[0].value, "NI-123");
        assert_eq!(request.documents[1].doc_type_code, 2);
    }

    #[test]
    fn test_missing_telecom_value() {
        let body = json!({
            "resourceType": "Patient",
            "name": [{"family": "Lee"}],
            "telecom": [{"system": "email"}]
        });
        assert_malformed(from_resource(&body), "telecom[0].value");
    }

    #[test]
    fn test_missing_family() {
        let body = json!({
            "resourceType": "Patient",
            "name": [{"given": ["Ann"]}],
            "telecom": [{"value": "a@x.com"}]
        });
        assert_malformed(from_resource(&body), "name[0].family");
    }

    #[test]
    fn test_blank_strings_are_absent() {
        let body = json!({
            "name": [{"family": "Lee", "given": ["", "Marie"]}, {"given": [""]}],
            "telecom": [{"value": "a@x.com"}],
            "gender": ""
        });

        let request = from_resource(&body).unwrap();
        assert_eq!(request.person.first_name, None);
        assert_eq!(request.person.second_name.as_deref(), Some("Marie"));
        assert_eq!(request.person.nickname, None);
        assert_eq!(request.person.gender, None);

        let blank_family = json!({"name": [{"family": "  "}], "telecom": [{"value": "a@x.com"}]});
        assert_malformed(from_resource(&blank_family), "name[0].family");
    }

    #[test]
    fn test_invalid_birth_date_and_gender() {
        let bad_date = json!({
            "name": [{"family": "Lee"}],
            "telecom": [{"value": "a@x.com"}],
            "birthDate": "01/01/1990"
        });
        assert_malformed(from_resource(&bad_date), "birthDate");

        let bad_gender = json!({
            "name": [{"family": "Lee"}],
            "telecom": [{"value": "a@x.com"}],
            "gender": "F"
        });
        assert_malformed(from_resource(&bad_gender), "gender");
    }

    #[test]
    fn test_identifier_entries_are_validated() {
        let no_value = json!({
            "name": [{"family": "Lee"}],
            "telecom": [{"value": "a@x.com"}],
            "identifier": [{"system": NATIONAL_ID_SYSTEM}]
        });
        assert_malformed(from_resource(&no_value), "identifier[0].value");

        let unknown = json!({
            "name": [{"family": "Lee"}],
            "telecom": [{"value": "a@x.com"}],
            "identifier": [{"system": "urn:unknown", "value": "x"}]
        });
        match from_resource(&unknown) {
            Err(StorageError::Identifier(IdentifierError::UnknownIdentifierSystem { system })) => {
                assert_eq!(system, "urn:unknown")
            }
            other => panic!("expected UnknownIdentifierSystem, got {:?}", other),
        }
    }

    #[test]
    fn test_non_object_body() {
        assert_malformed(from_resource(&json!([1, 2])), "$");
    }
}
