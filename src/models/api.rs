use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Quote;

/// Raw query string of `GET /v1/quotes`.
///
/// Every field is kept as a string so that the validator, not the extractor,
/// decides what a bad `page` or `per_page` looks like.
#[derive(Debug, Default, Deserialize)]
pub struct QuoteListQuery {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub per_page: Option<String>,
}

/// One page of filtered quotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginatedQuotes {
    /// Quotes on the requested page, in dataset order
    pub quotes: Vec<Quote>,
    /// Number of quotes matching the filters across all pages
    pub total: usize,
    /// 1-indexed page number
    pub page: u32,
    /// Page size used for slicing
    pub per_page: u32,
    /// `ceil(total / per_page)`
    pub total_pages: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process is serving
    pub status: String,
    /// Service version
    pub version: String,
    /// Seconds since the application state was built
    pub uptime_seconds: u64,
    /// Current timestamp
    pub timestamp: DateTime<Utc>,
}
