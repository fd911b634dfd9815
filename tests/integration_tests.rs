//! End-to-end tests for the Dev Quotes API.
//!
//! Each test starts the real router on an ephemeral port, backed by a
//! temporary dataset file, and drives it over HTTP with `reqwest`.
//!
//! Run with: `cargo test --test integration_tests`
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tempfile::NamedTempFile;
use tokio::net::TcpListener;

use dev_quotes_api::{AppState, Config, build_router};

/// 25 quotes: five named ones followed by twenty fillers.
fn dataset() -> Value {
    let mut quotes = vec![
        json!({"id": "1", "author": "Linus Torvalds", "text": "Talk is cheap. Show me the code.", "tags": ["programming", "open-source"]}),
        json!({"id": "2", "author": "Donald Knuth", "text": "Premature optimization is the root of all evil.", "tags": ["performance", "Programming"]}),
        json!({"id": "3", "author": "Edsger W. Dijkstra", "text": "Simplicity is prerequisite for reliability.", "tags": ["design"]}),
        json!({"id": "4", "author": "Grace Hopper", "text": "It's easier to ask forgiveness than it is to get permission.", "tags": ["culture"]}),
        json!({"id": "5", "author": "edsger dijkstra", "text": "Testing shows the presence, not the absence of bugs.", "tags": ["testing"]}),
    ];
    quotes.extend((6..=25).map(|i| {
        json!({"id": i.to_string(), "author": format!("Filler {i}"), "text": "filler", "tags": ["filler"]})
    }));
    Value::Array(quotes)
}

/// Test fixture that owns the dataset file and the running server.
struct TestFixture {
    dataset: NamedTempFile,
    base_url: String,
    client: Client,
}

impl TestFixture {
    /// Server with rate limiting disabled and the default dataset.
    async fn new() -> Self {
        Self::with(&dataset().to_string(), |config| {
            config.rate_limit = 0;
        })
        .await
    }

    /// Server over `contents` with `configure` applied to the test config.
    async fn with(contents: &str, configure: impl FnOnce(&mut Config)) -> Self {
        let dataset = NamedTempFile::new().expect("Failed to create dataset file");
        std::fs::write(dataset.path(), contents).expect("Failed to write dataset");

        let mut config = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            quotes_path: dataset.path().to_path_buf(),
            metrics_port: 0,
            log_level: "warn".to_string(),
            ..Config::default()
        };
        configure(&mut config);

        let state = AppState::from_config(config).expect("Failed to build state");
        let app = build_router(state).expect("Failed to build router");

        // Binding before spawning means the server is accepting once this returns
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to ephemeral port");
        let addr = listener.local_addr().expect("Failed to get local address");

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Server failed");
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            dataset,
            base_url: format!("http://{addr}"),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Request failed")
    }

    async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let response = self.get(path).await;
        let status = response.status();
        let body = response.json().await.expect("Failed to parse response");
        (status, body)
    }

    fn dataset_path(&self) -> &std::path::Path {
        self.dataset.path()
    }
}

fn ids(body: &Value) -> Vec<&str> {
    body["quotes"]
        .as_array()
        .expect("quotes missing")
        .iter()
        .map(|q| q["id"].as_str().expect("id missing"))
        .collect()
}

fn assert_error(body: &Value, error_type: &str, code: u16, message: &str) {
    assert_eq!(body["type"], error_type);
    assert_eq!(body["code"], code);
    assert!(
        body["message"].as_str().unwrap().contains(message),
        "unexpected message: {body}"
    );
}

// ============================================================================
// Health & Readiness Tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/v1/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["uptime_seconds"].is_u64());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_readiness_endpoint() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/v1/ready").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_readiness_fails_on_empty_dataset() {
    let fixture = TestFixture::with("[]", |config| config.rate_limit = 0).await;

    let response = fixture.get("/v1/ready").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    // Health stays green
    let response = fixture.get("/v1/health").await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Listing Tests
// ============================================================================

#[tokio::test]
async fn test_list_defaults() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/v1/quotes").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 25);
    assert_eq!(body["page"], 1);
    assert_eq!(body["per_page"], 10);
    assert_eq!(body["total_pages"], 3);
    assert_eq!(body["has_next"], true);
    assert_eq!(body["has_previous"], false);
    assert_eq!(ids(&body).len(), 10);
    assert_eq!(ids(&body)[0], "1");
}

#[tokio::test]
async fn test_list_last_page() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/v1/quotes?page=3&per_page=10").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec!["21", "22", "23", "24", "25"]);
    assert_eq!(body["has_next"], false);
    assert_eq!(body["has_previous"], true);
}

#[tokio::test]
async fn test_list_author_filter_is_case_insensitive_and_ordered() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/v1/quotes?author=DIJKSTRA").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec!["3", "5"]);
    assert_eq!(body["total"], 2);
    assert_eq!(body["total_pages"], 1);
}

#[tokio::test]
async fn test_list_tag_filter_is_exact() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/v1/quotes?tag=programming").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec!["1", "2"]);

    let (status, body) = fixture.get_json("/v1/quotes?tag=program").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "NOT_FOUND", 404, "no quotes found");
}

#[tokio::test]
async fn test_list_combined_filters() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .get_json("/v1/quotes?author=knuth&tag=PROGRAMMING")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec!["2"]);
}

#[tokio::test]
async fn test_list_page_out_of_range() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/v1/quotes?page=4").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "VALIDATION", 400, "page number out of range");
}

#[tokio::test]
async fn test_oversized_page_is_out_of_range() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/v1/quotes?page=5000000000").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "VALIDATION", 400, "page number out of range");
}

#[tokio::test]
async fn test_no_matches_wins_over_page_range() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/v1/quotes?author=nobody&page=9").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "NOT_FOUND", 404, "no quotes found");
}

#[tokio::test]
async fn test_list_validation_errors() {
    let fixture = TestFixture::new().await;

    let cases = [
        ("/v1/quotes?page=0", "page must be a positive integer"),
        ("/v1/quotes?page=abc", "page must be a positive integer"),
        ("/v1/quotes?per_page=101", "per_page cannot exceed 100"),
        ("/v1/quotes?per_page=-1", "per_page must be a positive integer"),
    ];

    for (path, message) in cases {
        let (status, body) = fixture.get_json(path).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path}");
        assert_error(&body, "VALIDATION", 400, message);
    }

    let long_author = "a".repeat(101);
    let (status, body) = fixture
        .get_json(&format!("/v1/quotes?author={long_author}"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "VALIDATION", 400, "author name too long");
}

#[tokio::test]
async fn test_list_max_per_page() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/v1/quotes?per_page=100").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body).len(), 25);
    assert_eq!(body["total_pages"], 1);
}

// ============================================================================
// Lookup & Random Tests
// ============================================================================

#[tokio::test]
async fn test_get_quote_by_id() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/v1/quotes/2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "2");
    assert_eq!(body["author"], "Donald Knuth");
    assert_eq!(body["tags"], json!(["performance", "Programming"]));
}

#[tokio::test]
async fn test_get_unknown_quote() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/v1/quotes/does-not-exist").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "NOT_FOUND", 404, "quote not found");
}

#[tokio::test]
async fn test_get_quote_with_empty_id() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/v1/quotes/").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_error(&body, "VALIDATION", 400, "quote ID is required");
}

#[tokio::test]
async fn test_random_quote() {
    let fixture = TestFixture::new().await;

    for _ in 0..10 {
        let (status, body) = fixture.get_json("/v1/quotes/random").await;
        assert_eq!(status, StatusCode::OK);

        let id: u32 = body["id"].as_str().unwrap().parse().unwrap();
        assert!((1..=25).contains(&id));
    }
}

#[tokio::test]
async fn test_random_on_empty_dataset() {
    let fixture = TestFixture::with("[]", |config| config.rate_limit = 0).await;

    let (status, body) = fixture.get_json("/v1/quotes/random").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_error(&body, "NOT_FOUND", 404, "no quotes available");
}

// ============================================================================
// Dataset Reload Tests
// ============================================================================

#[tokio::test]
async fn test_reload_picks_up_file_changes() {
    let fixture = TestFixture::with("[]", |config| {
        config.rate_limit = 0;
        config.reload_quotes = true;
    })
    .await;

    let response = fixture.get("/v1/ready").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    std::fs::write(fixture.dataset_path(), dataset().to_string()).unwrap();

    let (status, body) = fixture.get_json("/v1/quotes/4").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["author"], "Grace Hopper");
}

#[tokio::test]
async fn test_reload_with_malformed_dataset_is_internal() {
    let fixture = TestFixture::with("[{\"id\":", |config| {
        config.rate_limit = 0;
        config.reload_quotes = true;
    })
    .await;

    let (status, body) = fixture.get_json("/v1/quotes").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_error(&body, "INTERNAL", 500, "failed to parse quotes data");
}

// ============================================================================
// Middleware Tests
// ============================================================================

#[tokio::test]
async fn test_unknown_route_returns_json_not_found() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get_json("/v2/anything").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["type"], "NOT_FOUND");
    assert_eq!(body["code"], 404);
}

#[tokio::test]
async fn test_security_headers_and_request_id() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/v1/quotes/1").await;
    let headers = response.headers();

    assert_eq!(headers["x-xss-protection"], "1; mode=block");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert!(headers.get("strict-transport-security").is_none());

    let request_id = headers["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(request_id).is_ok());
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .client
        .get(fixture.url("/v1/health"))
        .header("x-request-id", "trace-me-42")
        .send()
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "trace-me-42");
}

#[tokio::test]
async fn test_hsts_behind_https_proxy() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .client
        .get(fixture.url("/v1/health"))
        .header("x-forwarded-proto", "https")
        .send()
        .await
        .unwrap();

    assert_eq!(
        response.headers()["strict-transport-security"],
        "max-age=31536000; includeSubDomains"
    );
}

#[tokio::test]
async fn test_error_responses_carry_headers() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/v1/quotes?page=0").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()["x-frame-options"], "DENY");
}

#[tokio::test]
async fn test_rate_limit_exceeded() {
    let fixture = TestFixture::with(&dataset().to_string(), |config| {
        config.rate_limit = 3;
        config.random_rate_limit = 5;
        config.rate_limit_period = Duration::from_secs(60);
    })
    .await;

    for _ in 0..3 {
        let response = fixture.get("/v1/quotes").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = fixture.get("/v1/quotes").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let headers = response.headers();
    assert_eq!(headers["x-ratelimit-limit"], "3");
    assert_eq!(headers["x-ratelimit-remaining"], "0");
    assert!(headers.contains_key("retry-after"));
    assert!(headers.contains_key("x-request-id"));

    let body: Value = response.json().await.unwrap();
    assert_error(&body, "RATE_LIMITED", 429, "rate limit exceeded");

    // The random endpoint has its own budget
    let response = fixture.get("/v1/quotes/random").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_keys_on_forwarded_ip() {
    let fixture = TestFixture::with(&dataset().to_string(), |config| {
        config.rate_limit = 1;
        config.rate_limit_period = Duration::from_secs(60);
    })
    .await;

    let from = |ip: &'static str| {
        fixture
            .client
            .get(fixture.url("/v1/quotes/1"))
            .header("x-forwarded-for", ip)
            .send()
    };

    assert_eq!(from("203.0.113.1").await.unwrap().status(), StatusCode::OK);
    assert_eq!(
        from("203.0.113.1").await.unwrap().status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(from("203.0.113.2").await.unwrap().status(), StatusCode::OK);
}
