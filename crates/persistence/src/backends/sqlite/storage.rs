//! PersonStorage and MedicationRequestStorage implementations for SQLite.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::types::ToSqlOutput;
use rusqlite::{Connection, OptionalExtension, Row, ToSql, params, params_from_iter};
use tracing::{debug, warn};

use crate::core::{MedicationRequestStorage, PersonStorage};
use crate::error::{
    BackendError, FailedIdentifier, InsertError, StorageError, StorageResult, ValidationError,
};
use crate::search::{
    MedicationRequestSearchParams, SearchPredicate, SqlParam, medication_request_predicate,
};
use crate::types::{
    MedicationRequestRecord, NewMedicationRequest, NewPersonRequest, Page, Person,
    PersonDocument, PersonRecord, SearchPage,
};

use super::SqliteBackend;

const PERSON_COLUMNS: &str = "PRSN_ID, PRSN_FIRST_NAME, PRSN_SECOND_NAME, PRSN_LAST_NAME, \
     PRSN_BIRTH_DATE, PRSN_GENDER, PRSN_EMAIL, PRSN_NICK_NAME, PRSN_CREATE_DATE, PRSN_UPDATE_DATE";

const DOCUMENT_COLUMNS: &str = "PRDT_ID, PRDT_PRSN_ID, PRDT_DCTP_ID, PRDT_DOC_VALUE, \
     PRDT_CREATE_DATE, PRDT_DELETE_DATE";

const MEDICATION_REQUEST_COLUMNS: &str = "MDRQ_ID, MDRQ_PRSN_ID, MDRQ_REQUESTER_ID, MDRQ_STATUS, \
     MDRQ_INTENT, MDRQ_MEDICATION_CODE, MDRQ_MEDICATION_DISPLAY, MDRQ_AUTHORED_ON, \
     MDRQ_DOSAGE_TEXT, MDRQ_SUPPLY_DURATION_DAYS, MDRQ_CREATE_DATE";

fn internal_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::Internal {
        backend_name: "sqlite".to_string(),
        message,
        source: None,
    })
}

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlParam::String(s) => ToSqlOutput::from(s.as_str()),
            SqlParam::Integer(i) => ToSqlOutput::from(*i),
        })
    }
}

fn person_from_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get(0)?,
        first_name: row.get(1)?,
        second_name: row.get(2)?,
        last_name: row.get(3)?,
        birth_date: row.get(4)?,
        gender: row.get(5)?,
        email: row.get(6)?,
        nickname: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn document_from_row(row: &Row<'_>) -> rusqlite::Result<PersonDocument> {
    Ok(PersonDocument {
        id: row.get(0)?,
        person_id: row.get(1)?,
        doc_type_code: row.get(2)?,
        value: row.get(3)?,
        created_at: row.get(4)?,
        deleted_at: row.get(5)?,
    })
}

fn medication_request_from_row(row: &Row<'_>) -> rusqlite::Result<MedicationRequestRecord> {
    Ok(MedicationRequestRecord {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        requester_id: row.get(2)?,
        status: row.get(3)?,
        intent: row.get(4)?,
        medication_code: row.get(5)?,
        medication_display: row.get(6)?,
        authored_on: row.get(7)?,
        dosage_text: row.get(8)?,
        supply_duration_days: row.get(9)?,
        created_at: row.get(10)?,
    })
}

/// Loads every document of a person, soft-deleted ones included, in id order.
fn load_documents(conn: &Connection, person_id: i64) -> StorageResult<Vec<PersonDocument>> {
    let sql = format!(
        "SELECT {} FROM PERSON_DOC WHERE PRDT_PRSN_ID = ?1 ORDER BY PRDT_ID",
        DOCUMENT_COLUMNS
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| internal_error(format!("Failed to prepare document query: {}", e)))?;
    let rows = stmt
        .query_map([person_id], document_from_row)
        .map_err(|e| internal_error(format!("Failed to query documents: {}", e)))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| internal_error(format!("Failed to read document row: {}", e)))
}

/// The client-facing reason a `PERSON_DOC` insert failed.
fn document_failure_reason(err: &rusqlite::Error) -> String {
    match err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            "an active document of this type already exists".to_string()
        }
        _ => {
            warn!(error = %err, "Document insert failed");
            "the document could not be stored".to_string()
        }
    }
}

/// Converts a paging value to a SQLite integer.
fn sql_integer(parameter: &str, value: usize) -> StorageResult<i64> {
    i64::try_from(value).map_err(|_| {
        ValidationError::InvalidSearchParameter {
            parameter: parameter.to_string(),
            message: format!("{} is out of range", value),
        }
        .into()
    })
}

/// Runs a paged search: one `COUNT(*)` for the total and one page query.
fn search_page<T>(
    conn: &Connection,
    table: &str,
    columns: &str,
    order_by: &str,
    predicate: &SearchPredicate,
    page: Page,
    map_row: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> StorageResult<SearchPage<T>> {
    let where_clause = predicate.where_clause();

    let count_sql = format!("SELECT COUNT(*) FROM {}{}", table, where_clause);
    let total: i64 = conn
        .query_row(&count_sql, params_from_iter(predicate.params()), |row| {
            row.get(0)
        })
        .map_err(|e| internal_error(format!("Failed to count {} rows: {}", table, e)))?;

    let n = predicate.param_count();
    let select_sql = format!(
        "SELECT {} FROM {}{} ORDER BY {} LIMIT ?{} OFFSET ?{}",
        columns,
        table,
        where_clause,
        order_by,
        n + 1,
        n + 2
    );
    let mut bound: Vec<SqlParam> = predicate.params().cloned().collect();
    bound.push(SqlParam::integer(sql_integer("_count", page.count)?));
    bound.push(SqlParam::integer(sql_integer("_offset", page.offset)?));

    let mut stmt = conn
        .prepare(&select_sql)
        .map_err(|e| internal_error(format!("Failed to prepare {} search: {}", table, e)))?;
    let items = stmt
        .query_map(params_from_iter(bound.iter()), map_row)
        .map_err(|e| internal_error(format!("Failed to search {}: {}", table, e)))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| internal_error(format!("Failed to read {} row: {}", table, e)))?;

    Ok(SearchPage::new(items, total.max(0) as u64, page))
}

#[async_trait]
impl PersonStorage for SqliteBackend {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn read_person(&self, id: i64) -> StorageResult<Option<PersonRecord>> {
        let conn = self.get_connection()?;

        let sql = format!("SELECT {} FROM PERSON WHERE PRSN_ID = ?1", PERSON_COLUMNS);
        let person = conn
            .query_row(&sql, [id], person_from_row)
            .optional()
            .map_err(|e| internal_error(format!("Failed to read person: {}", e)))?;

        match person {
            Some(person) => {
                let documents = load_documents(&conn, person.id)?;
                Ok(Some(PersonRecord { person, documents }))
            }
            None => Ok(None),
        }
    }

    async fn search_persons(
        &self,
        predicate: &SearchPredicate,
        page: Page,
    ) -> StorageResult<SearchPage<PersonRecord>> {
        let conn = self.get_connection()?;

        debug!(
            clauses = predicate.len(),
            count = page.count,
            offset = page.offset,
            "Searching persons"
        );

        let persons = search_page(
            &conn,
            "PERSON",
            PERSON_COLUMNS,
            "PRSN_ID",
            predicate,
            page,
            person_from_row,
        )?;

        let mut records = Vec::with_capacity(persons.items.len());
        for person in persons.items {
            let documents = load_documents(&conn, person.id)?;
            records.push(PersonRecord { person, documents });
        }

        Ok(SearchPage::new(records, persons.total, persons.page))
    }

    async fn create_person(&self, request: NewPersonRequest) -> StorageResult<PersonRecord> {
        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| internal_error(format!("Failed to begin transaction: {}", e)))?;

        let person = &request.person;
        tx.execute(
            "INSERT INTO PERSON (PRSN_FIRST_NAME, PRSN_SECOND_NAME, PRSN_LAST_NAME, PRSN_BIRTH_DATE, \
             PRSN_GENDER, PRSN_EMAIL, PRSN_NICK_NAME, PRSN_CREATE_DATE) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                person.first_name,
                person.second_name,
                person.last_name,
                person.birth_date,
                person.gender,
                person.email,
                person.nickname,
                person.created_at,
            ],
        )
        .map_err(|e| internal_error(format!("Failed to insert person: {}", e)))?;
        let person_id = tx.last_insert_rowid();

        let mut documents = Vec::with_capacity(request.documents.len());
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();

        // Every document is attempted so the caller learns about all failures.
        for document in &request.documents {
            let result = tx.execute(
                "INSERT INTO PERSON_DOC (PRDT_PRSN_ID, PRDT_DCTP_ID, PRDT_DOC_VALUE, PRDT_CREATE_DATE) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    person_id,
                    document.doc_type_code,
                    document.value,
                    person.created_at
                ],
            );
            match result {
                Ok(_) => {
                    documents.push(PersonDocument {
                        id: tx.last_insert_rowid(),
                        person_id,
                        doc_type_code: document.doc_type_code,
                        value: document.value.clone(),
                        created_at: person.created_at,
                        deleted_at: None,
                    });
                    succeeded.push(document.token());
                }
                Err(e) => failed.push(FailedIdentifier {
                    identifier: document.token(),
                    reason: document_failure_reason(&e),
                }),
            }
        }

        if !failed.is_empty() {
            tx.rollback()
                .map_err(|e| internal_error(format!("Failed to roll back person insert: {}", e)))?;
            warn!(
                succeeded = succeeded.len(),
                failed = failed.len(),
                "Person create rolled back after document insert failure"
            );
            return Err(InsertError::PartialInsertFailure { succeeded, failed }.into());
        }

        tx.commit()
            .map_err(|e| internal_error(format!("Failed to commit person insert: {}", e)))?;

        debug!(person_id, documents = documents.len(), "Created person");

        Ok(PersonRecord {
            person: request.person.into_person(person_id),
            documents,
        })
    }
}

#[async_trait]
impl MedicationRequestStorage for SqliteBackend {
    async fn read_medication_request(
        &self,
        id: i64,
    ) -> StorageResult<Option<MedicationRequestRecord>> {
        let conn = self.get_connection()?;
        let sql = format!(
            "SELECT {} FROM MEDICATION_REQUEST WHERE MDRQ_ID = ?1",
            MEDICATION_REQUEST_COLUMNS
        );
        conn.query_row(&sql, [id], medication_request_from_row)
            .optional()
            .map_err(|e| internal_error(format!("Failed to read medication request: {}", e)))
    }

    async fn search_medication_requests(
        &self,
        params: &MedicationRequestSearchParams,
        page: Page,
    ) -> StorageResult<SearchPage<MedicationRequestRecord>> {
        let conn = self.get_connection()?;
        let predicate = medication_request_predicate(params);
        search_page(
            &conn,
            "MEDICATION_REQUEST",
            MEDICATION_REQUEST_COLUMNS,
            "MDRQ_ID",
            &predicate,
            page,
            medication_request_from_row,
        )
    }
}

impl SqliteBackend {
    /// Records a medication request and returns it with its assigned id.
    pub fn insert_medication_request(
        &self,
        request: NewMedicationRequest,
    ) -> StorageResult<MedicationRequestRecord> {
        let conn = self.get_connection()?;
        let created_at = Utc::now();

        conn.execute(
            "INSERT INTO MEDICATION_REQUEST (MDRQ_PRSN_ID, MDRQ_REQUESTER_ID, MDRQ_STATUS, \
             MDRQ_INTENT, MDRQ_MEDICATION_CODE, MDRQ_MEDICATION_DISPLAY, MDRQ_AUTHORED_ON, \
             MDRQ_DOSAGE_TEXT, MDRQ_SUPPLY_DURATION_DAYS, MDRQ_CREATE_DATE) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                request.patient_id,
                request.requester_id,
                request.status,
                request.intent,
                request.medication_code,
                request.medication_display,
                request.authored_on,
                request.dosage_text,
                request.supply_duration_days,
                created_at,
            ],
        )
        .map_err(|e| internal_error(format!("Failed to insert medication request: {}", e)))?;

        Ok(MedicationRequestRecord {
            id: conn.last_insert_rowid(),
            patient_id: request.patient_id,
            requester_id: request.requester_id,
            status: request.status,
            intent: request.intent,
            medication_code: request.medication_code,
            medication_display: request.medication_display,
            authored_on: request.authored_on,
            dosage_text: request.dosage_text,
            supply_duration_days: request.supply_duration_days,
            created_at,
        })
    }

    /// Soft-deletes the active document of the given type, returning whether
    /// one existed.
    pub fn retire_person_document(&self, person_id: i64, doc_type_code: i64) -> StorageResult<bool> {
        let conn = self.get_connection()?;
        let updated = conn
            .execute(
                "UPDATE PERSON_DOC SET PRDT_DELETE_DATE = ?1 \
                 WHERE PRDT_PRSN_ID = ?2 AND PRDT_DCTP_ID = ?3 AND PRDT_DELETE_DATE IS NULL",
                params![Utc::now(), person_id, doc_type_code],
            )
            .map_err(|e| internal_error(format!("Failed to retire document: {}", e)))?;
        Ok(updated > 0)
    }
}
