//! Identifier codec.
//!
//! Translates between an external FHIR identifier `(system, value)` and the
//! registry's internal representation: either the person's own primary key
//! or a `PERSON_DOC` row `(PRDT_DCTP_ID, PRDT_DOC_VALUE)`.
//!
//! [`IDENTIFIER_SYSTEMS`] is the only place namespaces and document type
//! codes are written down. Decoding searches it by system URI, encoding
//! searches it by document code, so the two directions cannot drift apart.

use std::fmt;

use crate::error::IdentifierError;
use crate::types::PersonResourceType;

/// Namespace of Patient primary identifiers.
pub const PATIENT_ID_SYSTEM: &str = "https://saintmartinhospital.org/patient-id";
/// Namespace of Practitioner primary identifiers.
pub const PRACTITIONER_ID_SYSTEM: &str = "https://saintmartinhospital.org/practitioner-id";
/// Namespace of national identity numbers.
pub const NATIONAL_ID_SYSTEM: &str = "https://www.national-office.gov/ni";
/// Namespace of passport numbers.
pub const PASSPORT_SYSTEM: &str = "https://www.foreign-affairs.gov/pp";
/// Namespace of National Provider Identifiers.
pub const NPI_SYSTEM: &str = "http://hl7.org/fhir/sid/us-npi";

/// Every identifier namespace the registry understands.
///
/// Discriminants index [`IDENTIFIER_SYSTEMS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum IdentifierKind {
    /// The person's own id, presented as a Patient.
    PatientId = 0,
    /// The person's own id, presented as a Practitioner.
    PractitionerId = 1,
    /// National identity document (`PRDT_DCTP_ID = 1`).
    NationalId = 2,
    /// Passport (`PRDT_DCTP_ID = 2`).
    Passport = 3,
    /// National Provider Identifier (`PRDT_DCTP_ID = 3`).
    Npi = 4,
}

/// One row of the codec table.
#[derive(Debug)]
pub struct IdentifierSystem {
    /// The namespace.
    pub kind: IdentifierKind,
    /// The FHIR `Identifier.system` URI.
    pub system: &'static str,
    /// The FHIR `Identifier.use` emitted for this namespace.
    pub identifier_use: &'static str,
    /// The `PERSON_DOC.PRDT_DCTP_ID` code, `None` for primary identifiers.
    pub document_code: Option<i64>,
}

/// The codec table. Row order must follow [`IdentifierKind`] discriminants.
pub static IDENTIFIER_SYSTEMS: [IdentifierSystem; 5] = [
    IdentifierSystem {
        kind: IdentifierKind::PatientId,
        system: PATIENT_ID_SYSTEM,
        identifier_use: "official",
        document_code: None,
    },
    IdentifierSystem {
        kind: IdentifierKind::PractitionerId,
        system: PRACTITIONER_ID_SYSTEM,
        identifier_use: "official",
        document_code: None,
    },
    IdentifierSystem {
        kind: IdentifierKind::NationalId,
        system: NATIONAL_ID_SYSTEM,
        identifier_use: "usual",
        document_code: Some(1),
    },
    IdentifierSystem {
        kind: IdentifierKind::Passport,
        system: PASSPORT_SYSTEM,
        identifier_use: "official",
        document_code: Some(2),
    },
    IdentifierSystem {
        kind: IdentifierKind::Npi,
        system: NPI_SYSTEM,
        identifier_use: "official",
        document_code: Some(3),
    },
];

impl IdentifierKind {
    /// Returns this namespace's table row.
    pub fn entry(self) -> &'static IdentifierSystem {
        &IDENTIFIER_SYSTEMS[self as usize]
    }

    /// Returns the system URI.
    pub fn system(self) -> &'static str {
        self.entry().system
    }

    /// Returns the `Identifier.use` value.
    pub fn identifier_use(self) -> &'static str {
        self.entry().identifier_use
    }

    /// Returns the document type code, if this namespace is stored in `PERSON_DOC`.
    pub fn document_code(self) -> Option<i64> {
        self.entry().document_code
    }

    /// Returns true when the identifier is the person's own id.
    pub fn is_primary(self) -> bool {
        self.document_code().is_none()
    }

    /// The primary namespace used when presenting a person as `resource_type`.
    pub fn primary_for(resource_type: PersonResourceType) -> Self {
        match resource_type {
            PersonResourceType::Patient => IdentifierKind::PatientId,
            PersonResourceType::Practitioner => IdentifierKind::PractitionerId,
        }
    }

    /// Looks up a namespace by system URI.
    pub fn from_system(system: &str) -> Result<Self, IdentifierError> {
        IDENTIFIER_SYSTEMS
            .iter()
            .find(|entry| entry.system == system)
            .map(|entry| entry.kind)
            .ok_or_else(|| IdentifierError::UnknownIdentifierSystem {
                system: system.to_string(),
            })
    }

    /// Looks up a namespace by stored document type code.
    pub fn from_document_code(code: i64) -> Result<Self, IdentifierError> {
        IDENTIFIER_SYSTEMS
            .iter()
            .find(|entry| entry.document_code == Some(code))
            .map(|entry| entry.kind)
            .ok_or(IdentifierError::UnknownDocumentType { code })
    }
}

/// An identifier after decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedIdentifier {
    /// The namespace the identifier belongs to.
    pub kind: IdentifierKind,
    /// The identifier value.
    pub value: String,
}

/// Decodes an external `(system, value)` pair.
pub fn decode(system: &str, value: &str) -> Result<DecodedIdentifier, IdentifierError> {
    Ok(DecodedIdentifier {
        kind: IdentifierKind::from_system(system)?,
        value: value.to_string(),
    })
}

/// Encodes a stored document `(code, value)` pair back to `(system, value)`.
pub fn encode(code: i64, value: &str) -> Result<IdentifierToken, IdentifierError> {
    let kind = IdentifierKind::from_document_code(code)?;
    Ok(IdentifierToken::new(kind.system(), value))
}

/// An identifier as it appears on the wire: FHIR `Identifier` or a search
/// token `system|value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierToken {
    /// The system URI. `None` for a bare value token.
    pub system: Option<String>,
    /// The identifier value.
    pub value: String,
}

impl IdentifierToken {
    /// Creates a token with a system.
    pub fn new(system: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            value: value.into(),
        }
    }

    /// Parses the FHIR token search syntax.
    ///
    /// `system|value` carries both parts, `value` alone has no system and
    /// `|value` explicitly has no system either.
    pub fn parse(token: &str) -> Self {
        match token.split_once('|') {
            Some((system, value)) if !system.is_empty() => Self::new(system, value),
            Some((_, value)) => Self {
                system: None,
                value: value.to_string(),
            },
            None => Self {
                system: None,
                value: token.to_string(),
            },
        }
    }

    /// Decodes this token when it carries a system.
    pub fn decode(&self) -> Result<Option<DecodedIdentifier>, IdentifierError> {
        self.system
            .as_deref()
            .map(|system| decode(system, &self.value))
            .transpose()
    }
}

impl fmt::Display for IdentifierToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.system {
            Some(system) => write!(f, "{}|{}", system, self.value),
            None => write!(f, "{}", self.value),
        }
    }
}
