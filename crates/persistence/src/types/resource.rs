//! The Patient / Practitioner read model.
//!
//! Both resource types are projections of the same `PERSON` row; only the
//! `resourceType` and the primary identifier namespace differ.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The FHIR resource types backed by the `PERSON` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersonResourceType {
    Patient,
    Practitioner,
}

impl PersonResourceType {
    /// Returns the FHIR resource type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonResourceType::Patient => "Patient",
            PersonResourceType::Practitioner => "Practitioner",
        }
    }
}

impl fmt::Display for PersonResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersonResourceType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Patient" => Ok(PersonResourceType::Patient),
            "Practitioner" => Ok(PersonResourceType::Practitioner),
            other => Err(ValidationError::UnsupportedResourceType {
                resource_type: other.to_string(),
            }),
        }
    }
}

/// FHIR `AdministrativeGender`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdministrativeGender {
    Male,
    Female,
    Other,
    Unknown,
}

impl AdministrativeGender {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdministrativeGender::Male => "male",
            AdministrativeGender::Female => "female",
            AdministrativeGender::Other => "other",
            AdministrativeGender::Unknown => "unknown",
        }
    }

    /// Parses a gender code, `None` if it is not one of the four codes.
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "male" => Some(AdministrativeGender::Male),
            "female" => Some(AdministrativeGender::Female),
            "other" => Some(AdministrativeGender::Other),
            "unknown" => Some(AdministrativeGender::Unknown),
            _ => None,
        }
    }
}

/// A Patient or Practitioner resource built from one person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonResource {
    pub resource_type: PersonResourceType,
    pub id: String,
    pub text: Narrative,
    pub identifier: Vec<Identifier>,
    pub name: Vec<HumanName>,
    pub telecom: Vec<ContactPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
}

/// Generated human-readable summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub status: String,
    pub div: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub identifier_use: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanName {
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub name_use: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub contact_use: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_type_parse() {
        assert_eq!(
            "Patient".parse::<PersonResourceType>().unwrap(),
            PersonResourceType::Patient
        );
        assert!("Observation".parse::<PersonResourceType>().is_err());
    }

    #[test]
    fn test_gender_codes() {
        assert_eq!(
            AdministrativeGender::parse("female"),
            Some(AdministrativeGender::Female)
        );
        assert_eq!(AdministrativeGender::parse("F"), None);
        assert_eq!(AdministrativeGender::Other.as_str(), "other");
    }

    #[test]
    fn test_serializes_fhir_field_names() {
        let identifier = Identifier {
            identifier_use: Some("usual".to_string()),
            system: Some("urn:x".to_string()),
            value: Some("1".to_string()),
            period: None,
        };
        let json = serde_json::to_value(&identifier).unwrap();
        assert_eq!(json["use"], "usual");
        assert!(json.get("period").is_none());
    }
}
