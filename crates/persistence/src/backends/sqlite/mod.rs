//! SQLite backend implementation.
//!
//! Supports in-memory databases (for tests) and file-based databases. The
//! person registry is relational: one row per person, one row per identity
//! document, one row per medication request.
//!
//! # Example
//!
//! ```no_run
//! use smh_persistence::backends::sqlite::SqliteBackend;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = SqliteBackend::open("persondb.db")?;
//! backend.init_schema()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE PERSON (
//!     PRSN_ID INTEGER PRIMARY KEY AUTOINCREMENT,
//!     PRSN_FIRST_NAME TEXT,
//!     PRSN_SECOND_NAME TEXT,
//!     PRSN_LAST_NAME TEXT NOT NULL,
//!     PRSN_BIRTH_DATE TEXT,
//!     PRSN_GENDER TEXT,
//!     PRSN_EMAIL TEXT,
//!     PRSN_NICK_NAME TEXT,
//!     PRSN_CREATE_DATE TEXT NOT NULL,
//!     PRSN_UPDATE_DATE TEXT
//! );
//!
//! -- At most one active (PRDT_DELETE_DATE IS NULL) document per type.
//! CREATE TABLE PERSON_DOC (
//!     PRDT_ID INTEGER PRIMARY KEY AUTOINCREMENT,
//!     PRDT_PRSN_ID INTEGER NOT NULL REFERENCES PERSON(PRSN_ID),
//!     PRDT_DCTP_ID INTEGER NOT NULL,
//!     PRDT_DOC_VALUE TEXT NOT NULL,
//!     PRDT_CREATE_DATE TEXT NOT NULL,
//!     PRDT_DELETE_DATE TEXT
//! );
//! ```

mod backend;
mod schema;
mod storage;

pub use backend::{SqliteBackend, SqliteBackendConfig};
