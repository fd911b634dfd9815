//! Dataset loading.
//!
//! The query engine never touches the filesystem directly. It asks a
//! [`QuoteSource`] for the full dataset on every call, so the same engine can
//! run against a file that is re-read per request, a dataset cached at startup,
//! or an in-memory fixture in tests.
//!
//! Read and parse failures are server-side data problems and surface as
//! [`AppError::Internal`] with a fixed client-facing message. The path and the
//! underlying cause are logged.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::models::Quote;

/// Something that can produce the full quote dataset.
pub trait QuoteSource: Send + Sync {
    /// Load every quote, in dataset order.
    fn load(&self) -> AppResult<Arc<Vec<Quote>>>;
}

/// Parse a JSON array of quote records.
pub fn parse_quotes(bytes: &[u8]) -> AppResult<Vec<Quote>> {
    serde_json::from_slice(bytes).map_err(|e| {
        error!(error = %e, "Quotes dataset is not valid JSON");
        AppError::Internal("failed to parse quotes data".to_string())
    })
}

/// Reads the dataset from a JSON file on every [`load`](QuoteSource::load).
#[derive(Debug, Clone)]
pub struct FileQuoteSource {
    path: PathBuf,
}

impl FileQuoteSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_quotes(&self) -> AppResult<Vec<Quote>> {
        let started = Instant::now();

        let bytes = std::fs::read(&self.path).map_err(|e| {
            error!(path = %self.path.display(), error = %e, "Failed to read quotes file");
            AppError::Internal("failed to read quotes file".to_string())
        })?;
        let quotes = parse_quotes(&bytes)?;

        metrics::record_dataset_load(started.elapsed().as_secs_f64(), quotes.len());
        debug!(
            path = %self.path.display(),
            count = quotes.len(),
            "Quotes dataset loaded"
        );

        Ok(quotes)
    }
}

impl QuoteSource for FileQuoteSource {
    fn load(&self) -> AppResult<Arc<Vec<Quote>>> {
        self.read_quotes().map(Arc::new)
    }
}

/// Holds a dataset that was loaded once and is never mutated.
#[derive(Debug, Clone)]
pub struct StaticQuoteSource {
    quotes: Arc<Vec<Quote>>,
}

impl StaticQuoteSource {
    /// Wrap an already materialized dataset (fixtures, tests).
    pub fn new(quotes: Vec<Quote>) -> Self {
        Self {
            quotes: Arc::new(quotes),
        }
    }

    /// Load `source` once and keep the result for the life of the process.
    ///
    /// Duplicate ids are logged but not rejected; lookups return the first.
    pub fn preload(source: &FileQuoteSource) -> AppResult<Self> {
        let quotes = source.read_quotes()?;

        let duplicates = duplicate_ids(&quotes);
        if !duplicates.is_empty() {
            warn!(
                ids = ?duplicates,
                "Quotes dataset contains duplicate ids; lookups return the first match"
            );
        }

        info!(
            path = %source.path().display(),
            count = quotes.len(),
            "Quotes dataset cached"
        );

        Ok(Self::new(quotes))
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

impl QuoteSource for StaticQuoteSource {
    fn load(&self) -> AppResult<Arc<Vec<Quote>>> {
        Ok(Arc::clone(&self.quotes))
    }
}

/// Ids that appear more than once, in order of their second appearance.
fn duplicate_ids(quotes: &[Quote]) -> Vec<&str> {
    let mut seen = HashSet::with_capacity(quotes.len());
    quotes
        .iter()
        .filter(|q| !seen.insert(q.id.as_str()))
        .map(|q| q.id.as_str())
        .collect()
}
