//! Quote query engine.
//!
//! Every operation reads the full dataset through the configured
//! [`QuoteSource`]; there is no index. Filtering is stable, so results keep
//! the dataset's relative order.
//!
//! # Error Precedence
//!
//! For filtered listings, "no quotes match" is a not-found error and is
//! checked before the page range. A page past the end of a non-empty result
//! set is a validation error, never an empty page.

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, instrument};

use crate::error::{AppError, AppResult};
use crate::models::{PaginatedQuotes, Quote};
use crate::repository::QuoteSource;
use crate::validation::{QuoteQueryParams, validate_quote_id};

/// Service answering quote queries. Cheap to clone.
#[derive(Clone)]
pub struct QuoteService {
    source: Arc<dyn QuoteSource>,
}

impl QuoteService {
    /// Create a service reading from `source`.
    pub fn new(source: Arc<dyn QuoteSource>) -> Self {
        Self { source }
    }

    /// Filter by author/tag and return the requested page.
    ///
    /// # Errors
    ///
    /// - `NotFound` when nothing matches the filters
    /// - `Validation` when the page lies beyond the last page
    /// - `Internal` when the dataset cannot be loaded
    #[instrument(skip(self, params), fields(page = params.page, per_page = params.per_page))]
    pub fn quotes_page(&self, params: &QuoteQueryParams) -> AppResult<PaginatedQuotes> {
        let matches = self.filtered_quotes(params.author.as_deref(), params.tag.as_deref())?;
        paginate(matches, params.page, params.per_page)
    }

    /// All quotes matching the optional filters, in dataset order.
    ///
    /// Empty filter strings are treated like `None`.
    pub fn filtered_quotes(&self, author: Option<&str>, tag: Option<&str>) -> AppResult<Vec<Quote>> {
        let quotes = self.source.load()?;
        let filter = QuoteFilter::new(author, tag);

        let matches: Vec<Quote> = quotes
            .iter()
            .filter(|q| filter.matches(q))
            .cloned()
            .collect();

        debug!(
            dataset = quotes.len(),
            matches = matches.len(),
            "Filtered quotes"
        );

        if matches.is_empty() {
            return Err(AppError::NotFound(
                "no quotes found matching the provided filters".to_string(),
            ));
        }

        Ok(matches)
    }

    /// Look up a quote by exact id. The first match wins.
    #[instrument(skip(self))]
    pub fn quote_by_id(&self, id: &str) -> AppResult<Quote> {
        validate_quote_id(id)?;

        self.source
            .load()?
            .iter()
            .find(|q| q.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("quote not found".to_string()))
    }

    /// Draw one quote uniformly at random from the whole dataset.
    ///
    /// Each call is an independent draw.
    #[instrument(skip(self))]
    pub fn random_quote(&self) -> AppResult<Quote> {
        let quotes = self.source.load()?;
        if quotes.is_empty() {
            return Err(AppError::NotFound("no quotes available".to_string()));
        }

        let index = rand::rng().random_range(0..quotes.len());
        quotes
            .get(index)
            .cloned()
            .ok_or_else(|| AppError::Internal("random index out of bounds".to_string()))
    }

    /// Number of quotes currently served.
    pub fn dataset_size(&self) -> AppResult<usize> {
        Ok(self.source.load()?.len())
    }
}

/// Pre-normalized author/tag filter.
struct QuoteFilter {
    author: Option<String>,
    tag: Option<String>,
}

impl QuoteFilter {
    fn new(author: Option<&str>, tag: Option<&str>) -> Self {
        let normalize = |value: Option<&str>| {
            value
                .filter(|v| !v.is_empty())
                .map(|v| v.to_lowercase())
        };

        Self {
            author: normalize(author),
            tag: normalize(tag),
        }
    }

    fn matches(&self, quote: &Quote) -> bool {
        let author_ok = self
            .author
            .as_deref()
            .is_none_or(|author| quote.author_contains(author));
        let tag_ok = self.tag.as_deref().is_none_or(|tag| quote.has_tag(tag));

        author_ok && tag_ok
    }
}

/// Slice `matches` into the requested 1-indexed page.
///
/// # Errors
///
/// - `NotFound` when `matches` is empty
/// - `Validation` when `(page - 1) * per_page >= matches.len()`
pub fn paginate(matches: Vec<Quote>, page: u32, per_page: u32) -> AppResult<PaginatedQuotes> {
    if page == 0 || per_page == 0 {
        return Err(AppError::Validation(
            "page and per_page must be positive".to_string(),
        ));
    }

    let total = matches.len();
    if total == 0 {
        return Err(AppError::NotFound(
            "no quotes found matching the provided filters".to_string(),
        ));
    }

    let size = per_page as usize;
    let total_pages = total.div_ceil(size);
    let start = (page as usize - 1).saturating_mul(size);

    if start >= total {
        return Err(AppError::Validation("page number out of range".to_string()));
    }

    let quotes: Vec<Quote> = matches.into_iter().skip(start).take(size).collect();

    Ok(PaginatedQuotes {
        quotes,
        total,
        page,
        per_page,
        total_pages,
        has_next: (page as usize) < total_pages,
        has_previous: page > 1,
    })
}
