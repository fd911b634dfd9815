//! HTTP middleware for rate limiting, request ids and security headers.
//!
//! - **Rate Limiting**: Per-IP GCRA limiter with `Retry-After` on rejection
//! - **Request ID**: Generation and propagation of `X-Request-Id`
//! - **Security Headers**: XSS, MIME sniffing, framing and HSTS headers
//! - **Client IP**: Forwarding-header resolution with trusted proxy gating
//!
//! Panic recovery, tracing, CORS and timeouts come from `tower-http` and are
//! wired in [`crate::routes`].

pub mod ip;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use ip::{UNKNOWN_IP, client_ip};
pub use rate_limit::{RateLimitError, RateLimitLayer, TrustedProxyConfig};
pub use request_id::{REQUEST_ID_HEADER, RequestIdExt, RequestIdLayer};
pub use security_headers::SecurityHeadersLayer;
