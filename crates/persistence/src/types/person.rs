//! Relational person rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::mapping::identifier::{DecodedIdentifier, IdentifierKind, IdentifierToken};

/// A row of the `PERSON` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// `PRSN_ID`, assigned by the database.
    pub id: i64,
    pub first_name: Option<String>,
    pub second_name: Option<String>,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    /// Administrative gender code as stored.
    pub gender: Option<String>,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// The column values of a person about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPerson {
    pub first_name: Option<String>,
    pub second_name: Option<String>,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewPerson {
    /// Attaches the id assigned on insert.
    pub fn into_person(self, id: i64) -> Person {
        Person {
            id,
            first_name: self.first_name,
            second_name: self.second_name,
            last_name: self.last_name,
            birth_date: self.birth_date,
            gender: self.gender,
            email: self.email,
            nickname: self.nickname,
            created_at: self.created_at,
            updated_at: None,
        }
    }
}

/// A row of the `PERSON_DOC` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonDocument {
    /// `PRDT_ID`.
    pub id: i64,
    /// `PRDT_PRSN_ID`, the owning person.
    pub person_id: i64,
    /// `PRDT_DCTP_ID`.
    pub doc_type_code: i64,
    /// `PRDT_DOC_VALUE`.
    pub value: String,
    pub created_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl PersonDocument {
    /// Returns true unless the document has been soft-deleted.
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// A document row about to be inserted for a new person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPersonDocument {
    pub kind: IdentifierKind,
    pub doc_type_code: i64,
    pub value: String,
}

impl NewPersonDocument {
    /// Builds the row for a decoded identifier. Primary identifiers have no
    /// document row and yield `None`.
    pub fn from_decoded(identifier: DecodedIdentifier) -> Option<Self> {
        let doc_type_code = identifier.kind.document_code()?;
        Some(Self {
            kind: identifier.kind,
            doc_type_code,
            value: identifier.value,
        })
    }

    /// The identifier as it was submitted.
    pub fn token(&self) -> IdentifierToken {
        IdentifierToken::new(self.kind.system(), self.value.clone())
    }
}

/// A person and the documents stored for it, in `PRDT_ID` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRecord {
    pub person: Person,
    pub documents: Vec<PersonDocument>,
}

/// Everything needed to create a person: the `PERSON` row and one
/// `PERSON_DOC` row per submitted identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPersonRequest {
    pub person: NewPerson,
    pub documents: Vec<NewPersonDocument>,
}
