//! SQLite schema definitions and migrations.

use rusqlite::Connection;

use crate::error::{BackendError, StorageError, StorageResult};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 2;

fn migration_error(context: &str, e: rusqlite::Error) -> StorageError {
    StorageError::Backend(BackendError::MigrationError {
        message: format!("{}: {}", context, e),
    })
}

/// Initialize the database schema.
pub fn initialize_schema(conn: &Connection) -> StorageResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        create_schema_v1(conn)?;
        set_schema_version(conn, 1)?;
        migrate_schema(conn, 1)?;
    } else if current_version < SCHEMA_VERSION {
        migrate_schema(conn, current_version)?;
    }

    Ok(())
}

/// Get the current schema version.
fn get_schema_version(conn: &Connection) -> StorageResult<i32> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL
        )",
        [],
    )
    .map_err(|e| migration_error("Failed to create schema_version table", e))?;

    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .ok();

    Ok(version.unwrap_or(0))
}

/// Set the schema version.
fn set_schema_version(conn: &Connection, version: i32) -> StorageResult<()> {
    conn.execute("DELETE FROM schema_version", [])
        .map_err(|e| migration_error("Failed to clear schema_version", e))?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])
        .map_err(|e| migration_error("Failed to set schema_version", e))?;
    Ok(())
}

/// Create the initial schema (version 1): persons and their documents.
fn create_schema_v1(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS PERSON (
            PRSN_ID INTEGER PRIMARY KEY AUTOINCREMENT,
            PRSN_FIRST_NAME TEXT,
            PRSN_SECOND_NAME TEXT,
            PRSN_LAST_NAME TEXT NOT NULL,
            PRSN_BIRTH_DATE TEXT,
            PRSN_GENDER TEXT,
            PRSN_EMAIL TEXT,
            PRSN_NICK_NAME TEXT,
            PRSN_CREATE_DATE TEXT NOT NULL,
            PRSN_UPDATE_DATE TEXT
        );

        CREATE TABLE IF NOT EXISTS PERSON_DOC (
            PRDT_ID INTEGER PRIMARY KEY AUTOINCREMENT,
            PRDT_PRSN_ID INTEGER NOT NULL REFERENCES PERSON(PRSN_ID),
            PRDT_DCTP_ID INTEGER NOT NULL,
            PRDT_DOC_VALUE TEXT NOT NULL,
            PRDT_CREATE_DATE TEXT NOT NULL,
            PRDT_DELETE_DATE TEXT
        );

        CREATE INDEX IF NOT EXISTS IDX_PERSON_LAST_NAME ON PERSON(PRSN_LAST_NAME);
        CREATE INDEX IF NOT EXISTS IDX_PERSON_EMAIL ON PERSON(PRSN_EMAIL);
        CREATE INDEX IF NOT EXISTS IDX_PERSON_DOC_PERSON ON PERSON_DOC(PRDT_PRSN_ID);
        CREATE INDEX IF NOT EXISTS IDX_PERSON_DOC_VALUE ON PERSON_DOC(PRDT_DCTP_ID, PRDT_DOC_VALUE);",
    )
    .map_err(|e| migration_error("Failed to create person tables", e))
}

/// Run migrations from `from_version` up to [`SCHEMA_VERSION`].
fn migrate_schema(conn: &Connection, from_version: i32) -> StorageResult<()> {
    let mut version = from_version;

    while version < SCHEMA_VERSION {
        match version {
            1 => migrate_v1_to_v2(conn)?,
            _ => {
                return Err(StorageError::Backend(BackendError::MigrationError {
                    message: format!("Unknown schema version: {}", version),
                }));
            }
        }
        version += 1;
        set_schema_version(conn, version)?;
    }

    Ok(())
}

/// Migrate from schema version 1 to version 2.
///
/// - one active document per person and document type
/// - the `MEDICATION_REQUEST` table
fn migrate_v1_to_v2(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        "CREATE UNIQUE INDEX IF NOT EXISTS UQ_PERSON_DOC_ACTIVE_TYPE
            ON PERSON_DOC(PRDT_PRSN_ID, PRDT_DCTP_ID)
            WHERE PRDT_DELETE_DATE IS NULL;

        CREATE TABLE IF NOT EXISTS MEDICATION_REQUEST (
            MDRQ_ID INTEGER PRIMARY KEY AUTOINCREMENT,
            MDRQ_PRSN_ID INTEGER NOT NULL REFERENCES PERSON(PRSN_ID),
            MDRQ_REQUESTER_ID INTEGER REFERENCES PERSON(PRSN_ID),
            MDRQ_STATUS TEXT NOT NULL,
            MDRQ_INTENT TEXT NOT NULL,
            MDRQ_MEDICATION_CODE TEXT,
            MDRQ_MEDICATION_DISPLAY TEXT,
            MDRQ_AUTHORED_ON TEXT,
            MDRQ_DOSAGE_TEXT TEXT,
            MDRQ_SUPPLY_DURATION_DAYS INTEGER,
            MDRQ_CREATE_DATE TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS IDX_MEDICATION_REQUEST_PERSON ON MEDICATION_REQUEST(MDRQ_PRSN_ID);",
    )
    .map_err(|e| migration_error("Failed to migrate schema to version 2", e))
}
