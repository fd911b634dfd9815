//! Quote endpoints.
//!
//! # Endpoints
//!
//! - `GET /v1/quotes` - Filtered, paginated listing (`author`, `tag`, `page`, `per_page`)
//! - `GET /v1/quotes/random` - One uniformly random quote
//! - `GET /v1/quotes/{id}` - Lookup by id
//! - `GET /v1/quotes/` - Lookup with an empty id (always a validation error)
//!
//! Extractor rejections are turned into validation errors so that every
//! failure uses the JSON error body. Dataset access may hit the filesystem,
//! so it runs on the blocking pool.

use axum::Json;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::Uri;
use tracing::{debug, error, instrument};

use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::models::{PaginatedQuotes, Quote, QuoteListQuery};
use crate::state::AppState;
use crate::validation::validate_quote_query;

/// List quotes matching the optional filters, one page at a time.
///
/// # Response Body
///
/// ```json
/// {
///   "quotes": [{ "id": "1", "author": "Linus Torvalds", "text": "...", "tags": ["code"] }],
///   "total": 1,
///   "page": 1,
///   "per_page": 10,
///   "total_pages": 1,
///   "has_next": false,
///   "has_previous": false
/// }
/// ```
#[instrument(skip(state, query))]
pub async fn list_quotes(
    State(state): State<AppState>,
    query: Result<Query<QuoteListQuery>, QueryRejection>,
) -> AppResult<Json<PaginatedQuotes>> {
    let result = query
        .map_err(|e| {
            debug!(error = %e, "Rejected query string");
            AppError::Validation("invalid query parameters".to_string())
        })
        .and_then(|Query(query)| {
            validate_quote_query(
                query.author.as_deref().unwrap_or_default(),
                query.tag.as_deref().unwrap_or_default(),
                query.page.as_deref().unwrap_or_default(),
                query.per_page.as_deref().unwrap_or_default(),
            )
        });

    let result = match result {
        Ok(params) => {
            let quotes = state.quotes.clone();
            blocking(move || quotes.quotes_page(&params)).await
        }
        Err(e) => Err(e),
    };

    observe("list", result).map(Json)
}

/// Return one quote chosen uniformly at random.
#[instrument(skip(state))]
pub async fn random_quote(State(state): State<AppState>) -> AppResult<Json<Quote>> {
    let quotes = state.quotes.clone();
    let result = blocking(move || quotes.random_quote()).await;
    observe("random", result).map(Json)
}

/// Look up a quote by id.
#[instrument(skip(state, id))]
pub async fn get_quote(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> AppResult<Json<Quote>> {
    let result = id
        .map_err(|e| {
            debug!(error = %e, "Rejected quote id");
            AppError::Validation("invalid quote ID".to_string())
        })
        .map(|Path(id)| id);

    let result = match result {
        Ok(id) => lookup(&state, id).await,
        Err(e) => Err(e),
    };

    observe("by_id", result).map(Json)
}

/// `GET /v1/quotes/` has an empty id segment, which `{id}` never matches.
#[instrument(skip(state))]
pub async fn get_quote_empty_id(State(state): State<AppState>) -> AppResult<Json<Quote>> {
    observe("by_id", lookup(&state, String::new()).await).map(Json)
}

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> AppError {
    debug!(path = %uri.path(), "No route matched");
    AppError::NotFound("resource not found".to_string())
}

async fn lookup(state: &AppState, id: String) -> AppResult<Quote> {
    let quotes = state.quotes.clone();
    blocking(move || quotes.quote_by_id(&id)).await
}

/// Run a dataset operation on the blocking pool.
pub(crate) async fn blocking<T, F>(op: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op).await.map_err(|e| {
        error!(error = %e, "Dataset task failed");
        AppError::Internal("internal server error".to_string())
    })?
}

fn observe<T>(endpoint: &'static str, result: AppResult<T>) -> AppResult<T> {
    metrics::record_request(endpoint, metrics::outcome_label(&result));
    result
}
