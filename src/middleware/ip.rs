//! Client IP resolution for per-IP rate limiting.
//!
//! # Resolution Order
//!
//! 1. `X-Forwarded-For` (first entry of the comma-separated list)
//! 2. `X-Real-IP`
//! 3. The TCP peer address (`ConnectInfo<SocketAddr>`)
//! 4. [`UNKNOWN_IP`]
//!
//! # IP Spoofing
//!
//! Forwarding headers are client controlled. When `TRUSTED_PROXIES` is set,
//! steps 1 and 2 are skipped unless the TCP peer lies inside one of the
//! configured CIDR ranges, so a client connecting directly cannot pick its own
//! rate-limit key. With no ranges configured every peer is trusted, which is
//! only safe behind a reverse proxy that overwrites these headers:
//!
//! ```nginx
//! proxy_set_header X-Real-IP $remote_addr;
//! proxy_set_header X-Forwarded-For $remote_addr;
//! ```
//!
//! All requests without any identifiable address share the `"unknown"` key.

use std::borrow::Cow;
use std::net::{IpAddr, SocketAddr};

use axum::extract::ConnectInfo;
use axum::http::Request;
use tracing::debug;

use super::rate_limit::TrustedProxyConfig;

/// Fallback key when no client IP can be determined.
pub const UNKNOWN_IP: &str = "unknown";

/// Where a forwarded client IP was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractedIp<'a> {
    /// First entry of `X-Forwarded-For`.
    FromXff(&'a str),
    /// `X-Real-IP`.
    FromRealIp(&'a str),
    /// No usable forwarding header.
    NotFound,
}

/// Read the forwarding headers without allocating.
///
/// Empty values are treated as absent.
#[inline]
fn extract_ip_from_headers<B>(req: &Request<B>) -> ExtractedIp<'_> {
    // Format: "client, proxy1, proxy2"
    if let Some(forwarded) = req.headers().get("x-forwarded-for")
        && let Ok(value) = forwarded.to_str()
        && let Some(first_ip) = value.split(',').next().map(str::trim)
        && !first_ip.is_empty()
    {
        return ExtractedIp::FromXff(first_ip);
    }

    if let Some(real_ip) = req.headers().get("x-real-ip")
        && let Ok(value) = real_ip.to_str()
        && !value.trim().is_empty()
    {
        return ExtractedIp::FromRealIp(value.trim());
    }

    ExtractedIp::NotFound
}

/// TCP peer address, present when the server was started with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
#[inline]
fn peer_ip<B>(req: &Request<B>) -> Option<IpAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

/// Resolve the rate-limit key for a request.
///
/// Returns `Cow::Borrowed(UNKNOWN_IP)` when nothing identifies the client.
pub fn client_ip<B>(req: &Request<B>, trusted_proxies: &TrustedProxyConfig) -> Cow<'static, str> {
    let peer = peer_ip(req);

    let honor_headers = !trusted_proxies.is_enabled()
        || peer.is_some_and(|ip| trusted_proxies.is_trusted_ip(&ip));

    if honor_headers {
        match extract_ip_from_headers(req) {
            ExtractedIp::FromXff(ip) | ExtractedIp::FromRealIp(ip) => {
                return Cow::Owned(ip.to_string());
            }
            ExtractedIp::NotFound => {}
        }
    } else if extract_ip_from_headers(req) != ExtractedIp::NotFound {
        debug!(
            peer = ?peer,
            "Ignoring forwarding headers from untrusted peer"
        );
    }

    match peer {
        Some(ip) => Cow::Owned(ip.to_string()),
        None => Cow::Borrowed(UNKNOWN_IP),
    }
}
