//! Search interaction handler.
//!
//! Implements the FHIR [search interaction](https://hl7.org/fhir/http.html#search):
//! - `GET [base]/[type]?params` - Type-level search
//! - `POST [base]/[type]/_search` - Type-level search (POST)
//!
//! Unknown parameters are ignored. Results are always paged: `_count`
//! defaults to the configured page size and is capped at the maximum.

use std::collections::HashMap;

use axum::{
    Form,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
};
use serde_json::Value;
use smh_persistence::mapping::to_medication_request_resource;
use smh_persistence::search::{
    MedicationRequestSearchParams, PersonQueryBuilder, PersonSearchParams,
};
use smh_persistence::types::SearchPage;
use tracing::debug;

use crate::error::RestResult;
use crate::extractors::Pagination;
use crate::fhir_types::ServedResourceType;
use crate::handlers::read::person_to_json;
use crate::responses::{BundleBuilder, BundleEntry, SearchUrl, format_resource_response};
use crate::state::{AppState, RegistryStorage};

/// Handler for GET search.
///
/// # HTTP Request
///
/// `GET [base]/[type]?params`
///
/// # Response
///
/// Returns a Bundle of type "searchset".
pub async fn search_get_handler<S>(
    State(state): State<AppState<S>>,
    Path(resource_type): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> RestResult<Response>
where
    S: RegistryStorage,
{
    debug!(
        resource_type = %resource_type,
        params = ?params,
        "Processing search GET request"
    );

    execute_search(&state, &resource_type, params).await
}

/// Handler for POST search.
///
/// Searches for resources using form-encoded parameters.
///
/// # HTTP Request
///
/// `POST [base]/[type]/_search`
pub async fn search_post_handler<S>(
    State(state): State<AppState<S>>,
    Path(resource_type): Path<String>,
    Form(params): Form<HashMap<String, String>>,
) -> RestResult<Response>
where
    S: RegistryStorage,
{
    debug!(
        resource_type = %resource_type,
        params = ?params,
        "Processing search POST request"
    );

    execute_search(&state, &resource_type, params).await
}

/// Executes a search and returns a Bundle response.
async fn execute_search<S>(
    state: &AppState<S>,
    resource_type: &str,
    params: HashMap<String, String>,
) -> RestResult<Response>
where
    S: RegistryStorage,
{
    let served: ServedResourceType = resource_type.parse()?;
    let pagination =
        Pagination::from_params(&params, state.default_page_size(), state.max_page_size())?;

    let results: SearchPage<(i64, Value)> = match served.person_kind() {
        Some(kind) => {
            let search = PersonSearchParams::from_query(&params)?;
            let predicate = PersonQueryBuilder::new().build(&search)?;
            debug!(
                clauses = predicate.len(),
                params = predicate.param_count(),
                "Built person search predicate"
            );

            let page = state
                .storage()
                .search_persons(&predicate, pagination.page())
                .await?;
            let mut items = Vec::with_capacity(page.items.len());
            for record in &page.items {
                items.push((record.person.id, person_to_json(kind, record)?));
            }
            SearchPage::new(items, page.total, page.page)
        }
        None => {
            let search = MedicationRequestSearchParams::from_query(&params)?;
            state
                .storage()
                .search_medication_requests(&search, pagination.page())
                .await?
                .map(|record| (record.id, to_medication_request_resource(&record)))
        }
    };

    debug!(
        resource_type = %served,
        total = results.total,
        returned = results.items.len(),
        "Search completed"
    );

    let bundle = build_search_bundle(state.base_url(), served, &params, results);
    Ok(format_resource_response(
        StatusCode::OK,
        HeaderMap::new(),
        bundle,
    ))
}

/// Builds the searchset Bundle for one page of results.
fn build_search_bundle(
    base_url: &str,
    served: ServedResourceType,
    params: &HashMap<String, String>,
    results: SearchPage<(i64, Value)>,
) -> Value {
    let url = SearchUrl::new(base_url, served.as_str(), params);
    let has_next = results.has_next();

    let builder = BundleBuilder::searchset()
        .total(results.total)
        .paging_links(&url, results.page, has_next);

    results
        .items
        .into_iter()
        .fold(builder, |builder, (id, resource)| {
            builder.add_entry(BundleEntry::search_result(
                resource,
                format!("{}/{}/{}", base_url, served, id),
            ))
        })
        .build()
}
