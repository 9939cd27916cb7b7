//! Core types for the persistence layer.
//!
//! - [`Person`], [`PersonDocument`] - Rows of the `PERSON` and `PERSON_DOC` tables
//! - [`PersonRecord`] - A person together with its documents, as read back
//! - [`PersonResource`] - The Patient / Practitioner read model
//! - [`MedicationRequestRecord`] - Rows of the `MEDICATION_REQUEST` table
//! - [`Page`], [`SearchPage`] - Offset pagination for searches
//!
//! # Examples
//!
//! ```
//! use smh_persistence::types::{Page, PersonResourceType};
//!
//! let kind: PersonResourceType = "Practitioner".parse().unwrap();
//! assert_eq!(kind.as_str(), "Practitioner");
//!
//! let page = Page::new(20, 40);
//! assert_eq!(page.next().offset, 60);
//! ```

mod medication_request;
mod pagination;
mod person;
mod resource;

pub use medication_request::{MedicationRequestRecord, NewMedicationRequest};
pub use pagination::{DEFAULT_PAGE_SIZE, Page, SearchPage};
pub use person::{
    NewPerson, NewPersonDocument, NewPersonRequest, Person, PersonDocument, PersonRecord,
};
pub use resource::{
    AdministrativeGender, ContactPoint, HumanName, Identifier, Narrative, Period,
    PersonResource, PersonResourceType,
};
