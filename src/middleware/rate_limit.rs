//! Per-IP rate limiting middleware.
//!
//! # Algorithm
//!
//! Uses the Governor crate which implements a Generic Cell Rate Algorithm (GCRA),
//! also known as a "leaky bucket as a meter". A quota of `limit` requests per
//! `period` becomes one cell replenished every `period / limit`, with a burst
//! capacity of `limit`. A client that has been quiet for a full period can
//! therefore send `limit` requests back to back, after which requests are
//! admitted at the sustained rate.
//!
//! Each layer instance owns its own keyed limiter. The router builds one layer
//! for the general routes and one for the random endpoint, so the two budgets
//! are independent.
//!
//! # Response Headers
//!
//! On rate limit exceeded (429):
//! - `Retry-After`: Seconds until the next request will be accepted
//! - `X-RateLimit-Limit`: Configured requests per period
//! - `X-RateLimit-Remaining`: Always `0`
//!
//! The body uses the regular error shape with type `RATE_LIMITED`.
//!
//! # Memory
//!
//! The limiter keeps one entry per client key. Every `prune_interval`
//! requests, entries that have been idle long enough to be indistinguishable
//! from a fresh client are dropped with `retain_recent`.

use std::fmt;
use std::net::IpAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use axum::Json;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::response::IntoResponse;
use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use tower::{Layer, Service};
use tracing::{debug, warn};

use super::ip::client_ip;
use crate::error::ErrorResponse;
use crate::metrics;

/// Error type for rate limit layer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitError {
    /// Limit cannot be zero.
    ZeroLimit,
    /// Period is zero or too short to divide among `limit` requests.
    ZeroPeriod,
}

impl fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLimitError::ZeroLimit => {
                write!(f, "rate limit must be greater than 0; skip the layer to disable limiting")
            }
            RateLimitError::ZeroPeriod => {
                write!(f, "rate limit period must be long enough to replenish one request")
            }
        }
    }
}

impl std::error::Error for RateLimitError {}

/// Requests between sweeps of idle limiter entries.
pub const DEFAULT_PRUNE_INTERVAL: usize = 1024;

/// Per-IP rate limiter keyed by the resolved client IP string.
type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

// =============================================================================
// Trusted Proxy CIDR Matching
// =============================================================================

/// Parsed CIDR network range for trusted proxy validation.
#[derive(Debug, Clone)]
pub struct CidrRange {
    network: IpAddr,
    /// Prefix length (e.g., 24 for /24)
    prefix_len: u8,
}

impl CidrRange {
    /// Parse a CIDR notation string (e.g., "10.0.0.0/8" or "::1/128").
    ///
    /// A bare address is treated as a single-host range. Returns `None` if
    /// the format is invalid.
    pub fn parse(cidr: &str) -> Option<Self> {
        let cidr = cidr.trim();

        let Some((addr, prefix)) = cidr.split_once('/') else {
            let ip: IpAddr = cidr.parse().ok()?;
            return Some(Self {
                network: ip,
                prefix_len: max_prefix(&ip),
            });
        };

        let ip: IpAddr = addr.parse().ok()?;
        let prefix_len: u8 = prefix.parse().ok()?;

        if prefix_len > max_prefix(&ip) {
            return None;
        }

        Some(Self {
            network: ip,
            prefix_len,
        })
    }

    /// Check if an IP address is contained within this CIDR range.
    pub fn contains(&self, ip: &IpAddr) -> bool {
        match (&self.network, ip) {
            (IpAddr::V4(net), IpAddr::V4(addr)) => {
                let mask = u32::MAX
                    .checked_shl(32 - u32::from(self.prefix_len))
                    .unwrap_or(0);
                (u32::from(*net) & mask) == (u32::from(*addr) & mask)
            }
            (IpAddr::V6(net), IpAddr::V6(addr)) => {
                let mask = u128::MAX
                    .checked_shl(128 - u32::from(self.prefix_len))
                    .unwrap_or(0);
                (u128::from(*net) & mask) == (u128::from(*addr) & mask)
            }
            // IPv4 and IPv6 don't match
            _ => false,
        }
    }
}

fn max_prefix(ip: &IpAddr) -> u8 {
    match ip {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

/// Configuration for trusted proxy validation.
///
/// When configured, forwarding headers are only honored for connections
/// whose peer address lies within one of the CIDR ranges.
#[derive(Debug, Clone, Default)]
pub struct TrustedProxyConfig {
    ranges: Vec<CidrRange>,
}

impl TrustedProxyConfig {
    /// Create a new trusted proxy configuration from CIDR strings.
    ///
    /// Invalid CIDR strings are logged as warnings and skipped.
    pub fn new(cidrs: &[String]) -> Self {
        let ranges: Vec<CidrRange> = cidrs
            .iter()
            .filter_map(|cidr| {
                let parsed = CidrRange::parse(cidr);
                if parsed.is_none() {
                    warn!(cidr = %cidr, "Invalid CIDR range in TRUSTED_PROXIES, skipping");
                }
                parsed
            })
            .collect();

        if !ranges.is_empty() {
            debug!(count = ranges.len(), "Trusted proxy validation enabled");
        }

        Self { ranges }
    }

    /// Check if trusted proxy validation is enabled (any ranges configured).
    pub fn is_enabled(&self) -> bool {
        !self.ranges.is_empty()
    }

    /// Check if an address is a trusted proxy.
    ///
    /// Returns `true` for every address when no ranges are configured.
    pub fn is_trusted_ip(&self, ip: &IpAddr) -> bool {
        self.ranges.is_empty() || self.ranges.iter().any(|range| range.contains(ip))
    }

    /// String form of [`is_trusted_ip`](Self::is_trusted_ip).
    ///
    /// Unparseable input is never trusted once ranges are configured.
    pub fn is_trusted(&self, ip_str: &str) -> bool {
        if self.ranges.is_empty() {
            return true;
        }
        ip_str
            .parse::<IpAddr>()
            .is_ok_and(|ip| self.is_trusted_ip(&ip))
    }
}

/// Rate limiting layer for Tower middleware stack.
///
/// # Example
///
/// ```rust,ignore
/// let layer = RateLimitLayer::per_period(50, Duration::from_secs(60), &[], "general")?;
/// let app = Router::new()
///     .route("/v1/quotes", get(handler))
///     .layer(layer);
/// ```
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<KeyedLimiter>,
    /// Requests per period (for headers)
    limit: u32,
    trusted_proxies: Arc<TrustedProxyConfig>,
    /// Metrics label identifying which budget rejected the request
    scope: &'static str,
    /// Requests seen, shared by every clone of the service
    calls: Arc<AtomicUsize>,
    prune_interval: usize,
}

impl RateLimitLayer {
    /// Create a per-IP layer admitting `limit` requests per `period`.
    ///
    /// # Errors
    ///
    /// Returns `RateLimitError::ZeroLimit` if `limit` is 0 and
    /// `RateLimitError::ZeroPeriod` if `period / limit` rounds to zero.
    pub fn per_period(
        limit: u32,
        period: Duration,
        trusted_proxies: &[String],
        scope: &'static str,
    ) -> Result<Self, RateLimitError> {
        let burst = NonZeroU32::new(limit).ok_or(RateLimitError::ZeroLimit)?;

        let quota = Quota::with_period(period / limit)
            .ok_or(RateLimitError::ZeroPeriod)?
            .allow_burst(burst);

        Ok(Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
            limit,
            trusted_proxies: Arc::new(TrustedProxyConfig::new(trusted_proxies)),
            scope,
            calls: Arc::new(AtomicUsize::new(0)),
            prune_interval: DEFAULT_PRUNE_INTERVAL,
        })
    }

    /// Sweep idle client entries every `interval` requests (minimum 1).
    pub fn with_prune_interval(mut self, interval: usize) -> Self {
        self.prune_interval = interval.max(1);
        self
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            limiter: self.limiter.clone(),
            limit: self.limit,
            trusted_proxies: self.trusted_proxies.clone(),
            scope: self.scope,
            calls: self.calls.clone(),
            prune_interval: self.prune_interval,
        }
    }
}

/// Rate limiting service wrapper.
#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    limiter: Arc<KeyedLimiter>,
    limit: u32,
    trusted_proxies: Arc<TrustedProxyConfig>,
    scope: &'static str,
    calls: Arc<AtomicUsize>,
    prune_interval: usize,
}

impl<S> RateLimitService<S> {
    /// Drop entries whose budget has fully replenished.
    fn prune_if_due(&self) {
        let seen = self.calls.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        if !seen.is_multiple_of(self.prune_interval) {
            return;
        }

        let before = self.limiter.len();
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        debug!(
            scope = self.scope,
            before,
            after = self.limiter.len(),
            "Pruned idle rate limit entries"
        );
    }
}

impl<S> Service<Request<Body>> for RateLimitService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        self.prune_if_due();

        // governor's keyed limiter needs an owned key
        let client_ip = client_ip(&req, &self.trusted_proxies).into_owned();

        let Err(not_until) = self.limiter.check_key(&client_ip) else {
            let mut inner = self.inner.clone();
            return Box::pin(async move { inner.call(req).await });
        };

        let wait_time = not_until.wait_time_from(DefaultClock::default().now());
        let retry_after = retry_after_secs(wait_time);

        warn!(
            client_ip = %client_ip,
            path = %req.uri().path(),
            scope = self.scope,
            retry_after_secs = retry_after,
            "Rate limit exceeded for IP"
        );
        metrics::record_rate_limited(self.scope);

        let response = rate_limited_response(self.limit, retry_after);
        Box::pin(async move { Ok(response) })
    }
}

/// Whole seconds to wait, rounded up and never below one.
fn retry_after_secs(wait_time: Duration) -> u64 {
    let secs = wait_time.as_secs() + u64::from(wait_time.subsec_nanos() > 0);
    secs.max(1)
}

fn rate_limited_response(limit: u32, retry_after: u64) -> Response<Body> {
    let status = StatusCode::TOO_MANY_REQUESTS;
    let body = ErrorResponse::new(
        "RATE_LIMITED",
        "rate limit exceeded, please retry later",
        status,
    );

    (
        status,
        [
            ("Retry-After", retry_after.to_string()),
            ("X-RateLimit-Limit", limit.to_string()),
            ("X-RateLimit-Remaining", "0".to_string()),
        ],
        Json(body),
    )
        .into_response()
}
