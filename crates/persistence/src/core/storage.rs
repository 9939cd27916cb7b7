//! Registry storage traits.
//!
//! [`PersonStorage`] serves both Patient and Practitioner, which are two
//! views of the same `PERSON` row. [`MedicationRequestStorage`] serves
//! MedicationRequest. Handlers receive an implementation through shared
//! state; nothing opens connections on its own.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::search::{MedicationRequestSearchParams, SearchPredicate};
use crate::types::{
    MedicationRequestRecord, NewPersonRequest, Page, PersonRecord, SearchPage,
};

/// Storage for person rows and their documents.
///
/// # Example
///
/// ```ignore
/// use smh_persistence::core::PersonStorage;
/// use smh_persistence::mapping::{from_resource, to_resource};
/// use smh_persistence::types::PersonResourceType;
///
/// async fn example<S: PersonStorage>(storage: &S) -> Result<(), StorageError> {
///     let request = from_resource(&serde_json::json!({
///         "resourceType": "Patient",
///         "name": [{"family": "Lee", "given": ["Ann"]}],
///         "telecom": [{"system": "email", "value": "a@x.com"}]
///     }))?;
///     let created = storage.create_person(request).await?;
///
///     let record = storage.read_person(created.person.id).await?.unwrap();
///     let patient = to_resource(PersonResourceType::Patient, &record.person, &record.documents);
///     assert_eq!(patient.name[0].text.as_deref(), Some("Ann Lee"));
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait PersonStorage: Send + Sync {
    /// Returns a human-readable name for this storage backend.
    fn backend_name(&self) -> &'static str;

    /// Reads a person and all of its documents, `None` if the id is unknown.
    async fn read_person(&self, id: i64) -> StorageResult<Option<PersonRecord>>;

    /// Returns one page of the persons matching `predicate`, ordered by id.
    async fn search_persons(
        &self,
        predicate: &SearchPredicate,
        page: Page,
    ) -> StorageResult<SearchPage<PersonRecord>>;

    /// Inserts a person and its documents atomically.
    ///
    /// # Errors
    ///
    /// * `StorageError::Insert(PartialInsertFailure)` - if any document row
    ///   was rejected; nothing is written.
    async fn create_person(&self, request: NewPersonRequest) -> StorageResult<PersonRecord>;
}

/// Storage for medication requests.
#[async_trait]
pub trait MedicationRequestStorage: Send + Sync {
    /// Reads one medication request, `None` if the id is unknown.
    async fn read_medication_request(
        &self,
        id: i64,
    ) -> StorageResult<Option<MedicationRequestRecord>>;

    /// Returns one page of matching medication requests, ordered by id.
    async fn search_medication_requests(
        &self,
        params: &MedicationRequestSearchParams,
        page: Page,
    ) -> StorageResult<SearchPage<MedicationRequestRecord>>;
}
