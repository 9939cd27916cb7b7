//! Search parameter parsing.
//!
//! Turns the raw key/value pairs of a search request into typed parameters.
//! Names the registry does not recognise are ignored; a recognised name with
//! an unusable value is an error.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::mapping::identifier::IdentifierToken;
use crate::types::AdministrativeGender;

/// Search parameters understood for Patient and Practitioner.
pub const PERSON_SEARCH_PARAMETERS: &[&str] = &[
    "_id",
    "family",
    "gender",
    "birthDate",
    "email",
    "name",
    "identifier",
];

/// Search parameters understood for MedicationRequest.
pub const MEDICATION_REQUEST_SEARCH_PARAMETERS: &[&str] =
    &["_id", "patient", "requester", "status"];

/// Typed person search parameters. `None` means absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonSearchParams {
    pub id: Option<i64>,
    pub family: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub identifier: Option<IdentifierToken>,
}

impl PersonSearchParams {
    /// Parses the request's query parameters.
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self, ValidationError> {
        let id = value(params, "_id")
            .map(|raw| parse_integer("_id", raw))
            .transpose()?;

        let gender = value(params, "gender")
            .map(|raw| {
                AdministrativeGender::parse(raw)
                    .map(|gender| gender.as_str().to_string())
                    .ok_or_else(|| invalid("gender", format!("unknown gender code '{}'", raw)))
            })
            .transpose()?;

        let birth_date = value(params, "birthDate")
            .or_else(|| value(params, "birthdate"))
            .map(|raw| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| invalid("birthDate", format!("'{}' is not a YYYY-MM-DD date", raw)))
            })
            .transpose()?;

        Ok(Self {
            id,
            family: value(params, "family").map(str::to_string),
            gender,
            birth_date,
            email: value(params, "email").map(str::to_string),
            name: value(params, "name").map(str::to_string),
            identifier: value(params, "identifier").map(IdentifierToken::parse),
        })
    }

    /// Returns true when no recognised parameter is present.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Typed medication request search parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MedicationRequestSearchParams {
    pub id: Option<i64>,
    /// Id of the person the medication is for.
    pub patient: Option<i64>,
    /// Id of the prescribing person.
    pub requester: Option<i64>,
    pub status: Option<String>,
}

impl MedicationRequestSearchParams {
    /// Parses the request's query parameters.
    ///
    /// `patient` and `requester` accept a bare id or a relative reference
    /// such as `Patient/7`.
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self, ValidationError> {
        Ok(Self {
            id: value(params, "_id")
                .map(|raw| parse_integer("_id", raw))
                .transpose()?,
            patient: value(params, "patient")
                .or_else(|| value(params, "subject"))
                .map(|raw| parse_reference("patient", "Patient", raw))
                .transpose()?,
            requester: value(params, "requester")
                .map(|raw| parse_reference("requester", "Practitioner", raw))
                .transpose()?,
            status: value(params, "status").map(str::to_string),
        })
    }
}

fn value<'a>(params: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn parse_integer(parameter: &str, raw: &str) -> Result<i64, ValidationError> {
    raw.parse::<i64>()
        .map_err(|_| invalid(parameter, format!("'{}' is not an integer id", raw)))
}

fn parse_reference(parameter: &str, target: &str, raw: &str) -> Result<i64, ValidationError> {
    let id = match raw.split_once('/') {
        Some((resource_type, id)) if resource_type == target => id,
        Some(_) => {
            return Err(invalid(
                parameter,
                format!("'{}' does not reference a {}", raw, target),
            ));
        }
        None => raw,
    };
    parse_integer(parameter, id)
}

fn invalid(parameter: &str, message: String) -> ValidationError {
    ValidationError::InvalidSearchParameter {
        parameter: parameter.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_person_params() {
        let params = PersonSearchParams::from_query(&query(&[
            ("family", "Lee"),
            ("gender", "female"),
            ("birthdate", "1990-01-01"),
            ("_id", "7"),
            ("_count", "5"),
            ("unknown", "x"),
        ]))
        .unwrap();

        assert_eq!(params.family.as_deref(), Some("Lee"));
        assert_eq!(params.gender.as_deref(), Some("female"));
        assert_eq!(params.birth_date, NaiveDate::from_ymd_opt(1990, 1, 1));
        assert_eq!(params.id, Some(7));
        assert_eq!(params.name, None);
    }

    #[test]
    fn test_blank_values_are_absent() {
        let params =
            PersonSearchParams::from_query(&query(&[("name", ""), ("family", "  ")])).unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn test_invalid_values() {
        for (name, raw) in [("_id", "abc"), ("birthDate", "1990/01/01"), ("gender", "F")] {
            match PersonSearchParams::from_query(&query(&[(name, raw)])) {
                Err(ValidationError::InvalidSearchParameter { parameter, .. }) => {
                    assert_eq!(parameter, name)
                }
                other => panic!("expected InvalidSearchParameter for {}, got {:?}", name, other),
            }
        }
    }

    #[test]
    fn test_identifier_token() {
        let params = PersonSearchParams::from_query(&query(&[(
            "identifier",
            "https://www.national-office.gov/ni|NI-123",
        )]))
        .unwrap();
        let token = params.identifier.unwrap();
        assert_eq!(token.system.as_deref(), Some("https://www.national-office.gov/ni"));
        assert_eq!(token.value, "NI-123");
    }

    #[test]
    fn test_medication_request_references() {
        let params = MedicationRequestSearchParams::from_query(&query(&[
            ("patient", "Patient/7"),
            ("requester", "12"),
            ("status", "active"),
        ]))
        .unwrap();
        assert_eq!(params.patient, Some(7));
        assert_eq!(params.requester, Some(12));
        assert_eq!(params.status.as_deref(), Some("active"));

        assert!(
            MedicationRequestSearchParams::from_query(&query(&[("patient", "Group/7")])).is_err()
        );
    }
}
