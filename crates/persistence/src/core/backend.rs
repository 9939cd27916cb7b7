//! Backend abstraction.
//!
//! A backend owns the database connections. Storage traits sit on top of it
//! and describe what the registry can do with the data.

use std::fmt::{self, Debug};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// Supported database backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// SQLite, file-backed or in-memory.
    Sqlite,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Lifecycle operations of a database backend.
#[async_trait]
pub trait Backend: Send + Sync + Debug {
    /// Returns the backend type.
    fn kind(&self) -> BackendKind;

    /// Returns the backend name.
    fn name(&self) -> &'static str;

    /// Checks that a connection can be obtained and used.
    async fn health_check(&self) -> Result<(), BackendError>;

    /// Creates or migrates the schema.
    async fn initialize(&self) -> Result<(), BackendError>;
}
