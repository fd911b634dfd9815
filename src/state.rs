//! Shared application state for Axum handlers.
//!
//! The state is cheap to clone: the query service holds its dataset source
//! behind an `Arc` and the configuration is shared read-only. Nothing in the
//! state is mutated after startup.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::config::Config;
use crate::error::AppResult;
use crate::repository::{FileQuoteSource, QuoteSource, StaticQuoteSource};
use crate::services::QuoteService;

/// Shared application state for Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Quote query engine
    pub quotes: QuoteService,
    /// Application configuration
    pub config: Arc<Config>,
    /// Timestamp when the application started
    pub started_at: Instant,
}

impl AppState {
    /// Create state around an already constructed query service.
    pub fn new(quotes: QuoteService, config: Config) -> Self {
        Self {
            quotes,
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }

    /// Build state from configuration, choosing the dataset source.
    ///
    /// With `reload_quotes` the file is re-read on every request and a
    /// missing file only surfaces per request. Otherwise the dataset is
    /// loaded now and load failures are returned to the caller.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the dataset cannot be preloaded.
    pub fn from_config(config: Config) -> AppResult<Self> {
        let file = FileQuoteSource::new(config.quotes_path.clone());

        let source: Arc<dyn QuoteSource> = if config.reload_quotes {
            info!(path = %file.path().display(), "Quotes dataset will be read per request");
            Arc::new(file)
        } else {
            Arc::new(StaticQuoteSource::preload(&file)?)
        };

        Ok(Self::new(QuoteService::new(source), config))
    }

    /// Get the application uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
