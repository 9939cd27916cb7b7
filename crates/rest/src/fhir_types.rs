//! Resource types served by the registry.
//!
//! The URL's `{resource_type}` segment is parsed into [`ServedResourceType`]
//! before any handler touches storage. Names are case-sensitive, as in FHIR.

use std::fmt;
use std::str::FromStr;

use smh_persistence::search::{MEDICATION_REQUEST_SEARCH_PARAMETERS, PERSON_SEARCH_PARAMETERS};
use smh_persistence::types::PersonResourceType;

use crate::error::RestError;

/// FHIR version implemented by this server.
pub const FHIR_VERSION: &str = "4.0.1";

/// The resource types exposed over REST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServedResourceType {
    /// A person, seen as a patient.
    Patient,
    /// A person, seen as a practitioner.
    Practitioner,
    /// A prescription for a patient.
    MedicationRequest,
}

impl ServedResourceType {
    /// Every served type, in CapabilityStatement order.
    pub const ALL: [ServedResourceType; 3] = [
        ServedResourceType::Patient,
        ServedResourceType::Practitioner,
        ServedResourceType::MedicationRequest,
    ];

    /// Returns the FHIR resource type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServedResourceType::Patient => "Patient",
            ServedResourceType::Practitioner => "Practitioner",
            ServedResourceType::MedicationRequest => "MedicationRequest",
        }
    }

    /// The person projection behind this type, if it is one.
    pub fn person_kind(&self) -> Option<PersonResourceType> {
        match self {
            ServedResourceType::Patient => Some(PersonResourceType::Patient),
            ServedResourceType::Practitioner => Some(PersonResourceType::Practitioner),
            ServedResourceType::MedicationRequest => None,
        }
    }

    /// Whether `POST [base]/[type]` is offered.
    pub fn supports_create(&self) -> bool {
        self.person_kind().is_some()
    }

    /// Search parameter names recognised for this type.
    pub fn search_parameters(&self) -> &'static [&'static str] {
        match self {
            ServedResourceType::Patient | ServedResourceType::Practitioner => {
                PERSON_SEARCH_PARAMETERS
            }
            ServedResourceType::MedicationRequest => MEDICATION_REQUEST_SEARCH_PARAMETERS,
        }
    }
}

impl fmt::Display for ServedResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServedResourceType {
    type Err = RestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServedResourceType::ALL
            .into_iter()
            .find(|rt| rt.as_str() == s)
            .ok_or_else(|| RestError::UnsupportedResourceType {
                resource_type: s.to_string(),
            })
    }
}

/// Checks if a resource type name is served by this registry.
pub fn is_valid_resource_type(type_name: &str) -> bool {
    type_name.parse::<ServedResourceType>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_served_types() {
        assert_eq!(
            "Patient".parse::<ServedResourceType>().unwrap(),
            ServedResourceType::Patient
        );
        assert_eq!(
            "MedicationRequest".parse::<ServedResourceType>().unwrap(),
            ServedResourceType::MedicationRequest
        );
    }

    #[test]
    fn test_is_valid_resource_type() {
        assert!(is_valid_resource_type("Practitioner"));
        assert!(!is_valid_resource_type("Observation"));
        assert!(!is_valid_resource_type(""));
        assert!(!is_valid_resource_type("patient")); // Case-sensitive
    }

    #[test]
    fn test_person_projection() {
        assert_eq!(
            ServedResourceType::Practitioner.person_kind(),
            Some(PersonResourceType::Practitioner)
        );
        assert!(!ServedResourceType::MedicationRequest.supports_create());
        assert!(
            ServedResourceType::MedicationRequest
                .search_parameters()
                .contains(&"patient")
        );
    }
}
