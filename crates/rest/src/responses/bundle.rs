//! Bundle response building.
//!
//! Search results leave the server as a `searchset` Bundle with a fresh id,
//! the time it was assembled, the full match count, and paging links.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use smh_persistence::types::Page;
use uuid::Uuid;

/// Paging parameters, rewritten on every link.
const PAGING_PARAMETERS: [&str; 2] = ["_count", "_offset"];

/// A link in a Bundle.
#[derive(Debug, Clone)]
pub struct BundleLink {
    /// The relation type (self, next, previous).
    pub relation: String,
    /// The URL.
    pub url: String,
}

impl BundleLink {
    /// Creates a new link.
    pub fn new(relation: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            url: url.into(),
        }
    }

    /// Converts to FHIR JSON.
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "relation": self.relation,
            "url": self.url
        })
    }
}

/// A search result entry in a Bundle.
#[derive(Debug, Clone)]
pub struct BundleEntry {
    /// Full URL of the resource.
    pub full_url: String,
    /// The resource itself.
    pub resource: Value,
}

impl BundleEntry {
    /// Creates a search match entry.
    pub fn search_result(resource: Value, full_url: impl Into<String>) -> Self {
        Self {
            full_url: full_url.into(),
            resource,
        }
    }

    /// Converts to FHIR JSON.
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "fullUrl": self.full_url,
            "resource": self.resource,
            "search": {
                "mode": "match"
            }
        })
    }
}

/// Builder for searchset Bundles.
#[derive(Debug)]
pub struct BundleBuilder {
    id: String,
    last_updated: DateTime<Utc>,
    total: Option<u64>,
    links: Vec<BundleLink>,
    entries: Vec<BundleEntry>,
}

impl BundleBuilder {
    /// Creates a searchset bundle builder with a random id.
    pub fn searchset() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            last_updated: Utc::now(),
            total: None,
            links: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Sets the total count.
    pub fn total(mut self, count: u64) -> Self {
        self.total = Some(count);
        self
    }

    /// Adds a link.
    pub fn add_link(mut self, link: BundleLink) -> Self {
        self.links.push(link);
        self
    }

    /// Adds self, next and previous links for one page of `url`.
    ///
    /// `next` is only added when more matches remain.
    pub fn paging_links(self, url: &SearchUrl, page: Page, has_next: bool) -> Self {
        let mut builder = self.add_link(BundleLink::new("self", url.for_page(page)));
        if has_next && page.count > 0 {
            builder = builder.add_link(BundleLink::new("next", url.for_page(page.next())));
        }
        if let Some(previous) = page.previous() {
            builder = builder.add_link(BundleLink::new("previous", url.for_page(previous)));
        }
        builder
    }

    /// Adds an entry.
    pub fn add_entry(mut self, entry: BundleEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Builds the Bundle resource.
    pub fn build(self) -> Value {
        let mut bundle = serde_json::json!({
            "resourceType": "Bundle",
            "id": self.id,
            "meta": {
                "lastUpdated": self.last_updated.to_rfc3339_opts(SecondsFormat::Millis, true)
            },
            "type": "searchset"
        });

        if let Some(total) = self.total {
            bundle["total"] = serde_json::json!(total);
        }

        if !self.links.is_empty() {
            bundle["link"] =
                serde_json::json!(self.links.iter().map(|l| l.to_json()).collect::<Vec<_>>());
        }

        if !self.entries.is_empty() {
            bundle["entry"] =
                serde_json::json!(self.entries.iter().map(|e| e.to_json()).collect::<Vec<_>>());
        }

        bundle
    }
}

/// The URL of a search, minus its paging parameters.
#[derive(Debug, Clone)]
pub struct SearchUrl {
    base: String,
    query: Vec<(String, String)>,
}

impl SearchUrl {
    /// Captures `[base]/[type]` and the caller's parameters.
    ///
    /// Parameters are sorted by name so the same search always produces the
    /// same links.
    pub fn new(base_url: &str, resource_type: &str, params: &HashMap<String, String>) -> Self {
        let mut query: Vec<(String, String)> = params
            .iter()
            .filter(|(name, _)| !PAGING_PARAMETERS.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        query.sort();

        Self {
            base: format!("{}/{}", base_url, resource_type),
            query,
        }
    }

    /// The URL of one page of this search.
    pub fn for_page(&self, page: Page) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in &self.query {
            serializer.append_pair(name, value);
        }
        serializer.append_pair("_count", &page.count.to_string());
        serializer.append_pair("_offset", &page.offset.to_string());
        format!("{}?{}", self.base, serializer.finish())
    }
}
