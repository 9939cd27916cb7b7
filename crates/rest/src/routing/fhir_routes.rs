//! FHIR route configuration.
//!
//! Defines all routes for the FHIR RESTful API.

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers;
use crate::state::{AppState, RegistryStorage};

/// Creates all FHIR REST API routes.
///
/// Routes are nested under the path of the configured base URL
/// (`/4_0_0` by default).
///
/// # Routes
///
/// ## System-level
/// - `GET /metadata` - CapabilityStatement
/// - `GET /.well-known/smart-configuration` - Security statement
/// - `GET /health` - Health check
///
/// ## Type-level
/// - `GET /{type}` - Search
/// - `POST /{type}` - Create
/// - `POST /{type}/_search` - Search (POST)
///
/// ## Instance-level
/// - `GET /{type}/{id}` - Read
pub fn create_routes<S>(state: AppState<S>) -> Router
where
    S: RegistryStorage,
{
    let base_path = state.config().base_path();

    let routes = Router::new()
        // System-level routes
        .route("/metadata", get(handlers::capabilities_handler::<S>))
        .route(
            "/.well-known/smart-configuration",
            get(handlers::smart_configuration_handler::<S>),
        )
        .route("/health", get(handlers::health_handler::<S>))
        // Type-level routes
        .route(
            "/{resource_type}",
            get(handlers::search_get_handler::<S>).post(handlers::create_handler::<S>),
        )
        .route(
            "/{resource_type}/_search",
            post(handlers::search_post_handler::<S>),
        )
        // Instance-level routes
        .route("/{resource_type}/{id}", get(handlers::read_handler::<S>))
        // State
        .with_state(state);

    if base_path.is_empty() {
        routes
    } else {
        Router::new().nest(&base_path, routes)
    }
}
