//! # smh-rest - FHIR RESTful API over the person registry
//!
//! This crate exposes the Saint Martin Hospital person registry as a
//! [FHIR R4 RESTful API](https://hl7.org/fhir/R4/http.html). Patient and
//! Practitioner are two projections of the same `PERSON` row;
//! MedicationRequest is read-only.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use smh_rest::{create_app_with_config, ServerConfig};
//! use smh_persistence::backends::sqlite::SqliteBackend;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::default();
//!
//!     // Create a storage backend
//!     let backend = SqliteBackend::open(&config.database_url)?;
//!     backend.init_schema()?;
//!
//!     // Create the Axum application
//!     let app = create_app_with_config(backend, config.clone());
//!
//!     // Start the server
//!     let listener = tokio::net::TcpListener::bind(config.socket_addr()).await?;
//!     axum::serve(listener, app).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## API Endpoints
//!
//! Every path is relative to the path of the configured base URL
//! (`/4_0_0` by default).
//!
//! | Interaction | HTTP Method | URL Pattern | Types |
//! |------------|-------------|-------------|-------|
//! | read | GET | `/[type]/[id]` | all |
//! | create | POST | `/[type]` | Patient, Practitioner |
//! | search | GET/POST | `/[type]?params` or `/[type]/_search` | all |
//! | capabilities | GET | `/metadata` | |
//! | security statement | GET | `/.well-known/smart-configuration` | |
//! | health | GET | `/health` | |
//!
//! ## Error Handling
//!
//! All errors are returned as FHIR [OperationOutcome](https://hl7.org/fhir/operationoutcome.html)
//! resources with appropriate HTTP status codes:
//!
//! | HTTP Status | FHIR Issue Code | Description |
//! |-------------|-----------------|-------------|
//! | 400 | required | Missing or unusable element (with `expression`) |
//! | 400 | code-invalid | Unknown identifier system |
//! | 400 | invalid | Bad request / invalid search parameter |
//! | 404 | not-found | Resource not found |
//! | 404 | not-supported | Resource type not served |
//! | 405 | not-supported | Interaction not offered for the type |
//! | 415 | not-supported | Unsupported media type |
//! | 422 | processing | Identifier insert failed, nothing written |
//! | 500 | exception | Internal server error |
//!
//! ## Configuration
//!
//! See [`config`] for the `SMH_*` environment variables.
//!
//! ## Architecture
//!
//! - [`error`] - Error types and OperationOutcome conversion
//! - [`config`] - Server configuration
//! - [`state`] - Application state (storage, configuration)
//! - [`fhir_types`] - The resource types this server serves
//! - [`handlers`] - HTTP request handlers for each interaction
//! - [`extractors`] - Axum extractors for FHIR-specific data
//! - [`responses`] - Response formatting and header generation
//! - [`routing`] - Route configuration

// Enforce documentation
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod fhir_types;
pub mod handlers;
pub mod responses;
pub mod routing;
pub mod state;

// Re-export commonly used types
pub use config::ServerConfig;
pub use error::{RestError, RestResult};
pub use state::{AppState, RegistryStorage};

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Crate version, reported in the CapabilityStatement.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Creates the Axum application with default configuration.
///
/// For more control, use [`create_app_with_config`].
pub fn create_app<S>(storage: S) -> Router
where
    S: RegistryStorage,
{
    create_app_with_config(storage, ServerConfig::default())
}

/// Creates the Axum application with custom configuration.
///
/// This function sets up the complete FHIR REST API with all handlers,
/// middleware, and configuration.
///
/// # Example
///
/// ```rust,ignore
/// use smh_rest::{create_app_with_config, ServerConfig};
/// use smh_persistence::backends::sqlite::SqliteBackend;
///
/// let backend = SqliteBackend::in_memory()?;
/// backend.init_schema()?;
/// let app = create_app_with_config(backend, ServerConfig::for_testing());
/// ```
pub fn create_app_with_config<S>(storage: S, config: ServerConfig) -> Router
where
    S: RegistryStorage,
{
    info!(
        backend = storage.backend_name(),
        base_url = %config.full_base_url(),
        "Creating REST API server"
    );

    // Create application state
    let state = AppState::new(Arc::new(storage), config.clone());

    // Build the router with all FHIR routes
    let router = routing::fhir_routes::create_routes(state)
        .layer(DefaultBodyLimit::max(config.max_body_size));

    // Build middleware stack
    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            std::time::Duration::from_secs(config.request_timeout),
        ));

    // Add CORS if enabled
    let router = if config.enable_cors {
        let cors = build_cors_layer(&config);
        router.layer(cors)
    } else {
        router
    };

    // Apply remaining middleware
    router.layer(service_builder)
}

/// Builds the CORS layer based on configuration.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let mut cors = CorsLayer::new();

    // Configure origins
    if config.cors_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    // Configure methods
    if config.cors_methods == "*" {
        cors = cors.allow_methods(Any);
    } else {
        let methods: Vec<_> = config
            .cors_methods
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_methods(methods);
    }

    // Configure headers
    if config.cors_headers == "*" {
        cors = cors.allow_headers(Any);
    } else {
        let headers: Vec<_> = config
            .cors_headers
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_headers(headers);
    }

    cors
}

/// Initializes the tracing subscriber for logging.
///
/// This should be called once at application startup. `RUST_LOG`, when set,
/// replaces the filter built from `level`.
///
/// # Arguments
///
/// * `level` - The log level (error, warn, info, debug, trace)
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "smh_rest={level},smh_persistence={level},smh_server={level},tower_http=debug"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
