//! # Dev Quotes API
//!
//! A small read-only HTTP API serving developer-themed quotes from a static
//! JSON dataset:
//!
//! - **Query engine**: Case-insensitive author/tag filtering, deterministic
//!   pagination, lookup by id and uniform random picks
//! - **Protection**: Per-IP rate limiting, security headers, CORS, timeouts
//! - **Observability**: Request IDs, structured logging, Prometheus metrics,
//!   health and readiness endpoints
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum HTTP Server                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Middleware (Panic → Request ID → Trace → Headers → Limit)  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Handlers (health, quotes)                                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Validation → QuoteService (filter, paginate, random)       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  QuoteSource (file per request, or cached at startup)       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dev_quotes_api::{AppState, Config, build_router};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let state = AppState::from_config(config)?;
//!     let app = build_router(state)?;
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod utils;
pub mod validation;

// Re-exports for convenience
pub use config::Config;
pub use error::{AppError, AppResult};
pub use repository::{FileQuoteSource, QuoteSource, StaticQuoteSource};
pub use routes::build_router;
pub use services::QuoteService;
pub use state::AppState;
