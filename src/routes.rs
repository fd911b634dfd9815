//! Application routing configuration with middleware stack.
//!
//! # Middleware Stack (outermost first)
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌──────────────────┐
//! │  Panic Recovery  │ ← 500 JSON if a handler panics
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │   Request ID     │ ← Adds X-Request-Id header
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │     Tracing      │ ← HTTP request/response logging
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │ Security Headers │ ← XSS / nosniff / framing / HSTS
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │      CORS        │ ← GET only
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │     Timeout      │ ← 408 after REQUEST_TIMEOUT_SECS
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │  Rate Limiting   │ ← 429 if exceeded (per route group)
//! └────────┬─────────┘
//!          ▼
//!      Handler
//! ```
//!
//! # Route Groups
//!
//! - `/v1/health`, `/v1/ready`, `/v1/quotes`, `/v1/quotes/{id}`, `/v1/quotes/` - general limit
//! - `/v1/quotes/random` - separate, higher limit

use std::any::Any;

use axum::Router;
use axum::body::Body;
use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN};
use axum::http::{HeaderValue, Method, Request, Response};
use axum::response::IntoResponse;
use axum::routing::get;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span};

use crate::config::Config;
use crate::error::AppError;
use crate::handlers;
use crate::middleware::{
    RateLimitError, RateLimitLayer, RequestIdExt, RequestIdLayer, SecurityHeadersLayer,
};
use crate::state::AppState;

/// Build the application router with all routes and middleware configured.
///
/// # Errors
///
/// Returns `RateLimitError` if rate limiting configuration is invalid.
pub fn build_router(state: AppState) -> Result<Router, RateLimitError> {
    let config = state.config.clone();

    let mut general = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/quotes", get(handlers::list_quotes))
        .route("/quotes/{id}", get(handlers::get_quote))
        .route("/quotes/", get(handlers::get_quote_empty_id));

    let mut random = Router::new().route("/quotes/random", get(handlers::random_quote));

    if config.rate_limiting_enabled() {
        info!(
            limit = config.rate_limit,
            random_limit = config.random_rate_limit,
            period_secs = config.rate_limit_period.as_secs(),
            trusted_proxies = config.trusted_proxies.len(),
            "Rate limiting enabled"
        );
        general = general.layer(RateLimitLayer::per_period(
            config.rate_limit,
            config.rate_limit_period,
            &config.trusted_proxies,
            "general",
        )?);
        random = random.layer(RateLimitLayer::per_period(
            config.random_rate_limit,
            config.rate_limit_period,
            &config.trusted_proxies,
            "random",
        )?);
    } else {
        info!("Rate limiting disabled (RATE_LIMIT=0)");
    }

    let router = Router::new()
        .nest("/v1", general.merge(random))
        .fallback(handlers::not_found)
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(build_cors_layer(&config))
        .layer(SecurityHeadersLayer::new(config.hsts_max_age))
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
            info_span!(
                "http_request",
                method = %req.method(),
                uri = %req.uri(),
                request_id = req.request_id().unwrap_or("unknown"),
            )
        }))
        .layer(RequestIdLayer::new())
        .layer(CatchPanicLayer::custom(handle_panic));

    Ok(router.with_state(state))
}

/// Build CORS layer from configuration.
///
/// `*` among the configured origins allows any origin. Only `GET` is allowed.
fn build_cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers([ORIGIN, CONTENT_TYPE, ACCEPT, AUTHORIZATION])
        .max_age(config.cors_max_age);

    if config.cors_allowed_origins.iter().any(|o| o == "*") {
        return cors.allow_origin(AnyOrigin);
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    cors.allow_origin(origins)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    error!(panic = %detail, "Request handler panicked");

    AppError::Internal("internal server error".to_string()).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::http::StatusCode;
    use tower::ServiceExt;

    use super::*;
    use crate::error::{AppResult, ErrorResponse};
    use crate::models::Quote;
    use crate::repository::{QuoteSource, StaticQuoteSource};
    use crate::services::QuoteService;

    fn router_with(config: Config) -> Router {
        let quotes = vec![Quote {
            id: "1".to_string(),
            author: "Ada Lovelace".to_string(),
            text: "The more I study, the more insatiable do I feel my genius for it.".to_string(),
            tags: vec!["learning".to_string()],
        }];
        router_over(Arc::new(StaticQuoteSource::new(quotes)), config)
    }

    fn router_over(source: Arc<dyn QuoteSource>, config: Config) -> Router {
        let service = QuoteService::new(source);
        build_router(AppState::new(service, config)).unwrap()
    }

    /// Source that blocks longer than the request timeout.
    struct SlowSource(Duration);

    impl QuoteSource for SlowSource {
        fn load(&self) -> AppResult<Arc<Vec<Quote>>> {
            std::thread::sleep(self.0);
            Ok(Arc::new(Vec::new()))
        }
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_not_found() {
        let response = router_with(Config::default())
            .oneshot(get_request("/nope"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(response.headers()["x-frame-options"], "DENY");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error_type, "NOT_FOUND");
        assert_eq!(body.code, 404);
    }

    #[tokio::test]
    async fn test_random_has_its_own_budget() {
        let config = Config {
            rate_limit: 1,
            random_rate_limit: 2,
            rate_limit_period: Duration::from_secs(60),
            ..Config::default()
        };
        let router = router_with(config);

        let status = |uri: &'static str| {
            let router = router.clone();
            async move { router.oneshot(get_request(uri)).await.unwrap().status() }
        };

        assert_eq!(status("/v1/quotes").await, StatusCode::OK);
        assert_eq!(status("/v1/quotes").await, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(status("/v1/quotes/random").await, StatusCode::OK);
        assert_eq!(status("/v1/quotes/random").await, StatusCode::OK);
        assert_eq!(
            status("/v1/quotes/random").await,
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[tokio::test]
    async fn test_rate_limiting_disabled() {
        let config = Config {
            rate_limit: 0,
            ..Config::default()
        };
        let router = router_with(config);

        for _ in 0..20 {
            let response = router.clone().oneshot(get_request("/v1/quotes/1")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_get_only() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/v1/quotes")
            .header("origin", "https://example.com")
            .header("access-control-request-method", "GET")
            .body(Body::empty())
            .unwrap();

        let response = router_with(Config::default()).oneshot(request).await.unwrap();
        let headers = response.headers();

        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-methods"], "GET");
        assert_eq!(headers["access-control-max-age"], "300");
    }

    #[tokio::test]
    async fn test_empty_quote_id_is_validation_error() {
        let response = router_with(Config::default())
            .oneshot(get_request("/v1/quotes/"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error_type, "VALIDATION");
        assert_eq!(body.message, "quote ID is required");
    }

    #[tokio::test]
    async fn test_slow_request_times_out() {
        let config = Config {
            rate_limit: 0,
            request_timeout: Duration::from_millis(50),
            ..Config::default()
        };
        let router = router_over(Arc::new(SlowSource(Duration::from_millis(300))), config);

        let response = router.oneshot(get_request("/v1/quotes/1")).await.unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[test]
    fn test_handle_panic_is_internal() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
