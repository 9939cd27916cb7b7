//! Application state for the FHIR REST API.
//!
//! This module defines the shared application state that is available to all
//! request handlers: the registry storage and the server configuration.

use std::sync::Arc;

use smh_persistence::core::{Backend, MedicationRequestStorage, PersonStorage};

use crate::config::ServerConfig;

/// Everything a storage backend must provide to be served over REST.
///
/// Blanket-implemented for any type with the three capabilities.
pub trait RegistryStorage:
    PersonStorage + MedicationRequestStorage + Backend + Send + Sync + 'static
{
}

impl<T> RegistryStorage for T where
    T: PersonStorage + MedicationRequestStorage + Backend + Send + Sync + 'static
{
}

/// Shared application state for the REST API.
///
/// # Type Parameters
///
/// * `S` - The storage backend type (must implement [`RegistryStorage`])
///
/// # Example
///
/// ```rust,ignore
/// use smh_rest::{AppState, ServerConfig};
/// use smh_persistence::backends::sqlite::SqliteBackend;
/// use std::sync::Arc;
///
/// let backend = SqliteBackend::in_memory()?;
/// let config = ServerConfig::default();
/// let state = AppState::new(Arc::new(backend), config);
/// ```
pub struct AppState<S> {
    /// The storage backend.
    storage: Arc<S>,

    /// Server configuration.
    config: Arc<ServerConfig>,
}

// Manually implement Clone since S is wrapped in Arc and doesn't need to be Clone
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: RegistryStorage> AppState<S> {
    /// Creates a new AppState with the given storage and configuration.
    pub fn new(storage: Arc<S>, config: ServerConfig) -> Self {
        Self {
            storage,
            config: Arc::new(config),
        }
    }

    /// Returns a reference to the storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns a reference to the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the public base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.config.full_base_url()
    }

    /// Returns the default page size for search results.
    pub fn default_page_size(&self) -> usize {
        self.config.default_page_size
    }

    /// Returns the maximum page size for search results.
    pub fn max_page_size(&self) -> usize {
        self.config.max_page_size
    }
}
