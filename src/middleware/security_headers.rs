//! Security headers added to every response.
//!
//! - `X-XSS-Protection: 1; mode=block`
//! - `X-Content-Type-Options: nosniff`
//! - `X-Frame-Options: DENY`
//! - `Strict-Transport-Security: max-age=<secs>; includeSubDomains`, only
//!   when the request arrived over HTTPS according to `X-Forwarded-Proto`
//!   and the configured max age is non-zero
//!
//! Headers already set by a handler are overwritten.

use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::header::{
    HeaderName, HeaderValue, STRICT_TRANSPORT_SECURITY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
    X_XSS_PROTECTION,
};
use axum::http::{Request, Response};
use tower::{Layer, Service};

static FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Layer adding the security headers.
#[derive(Clone)]
pub struct SecurityHeadersLayer {
    /// Pre-rendered HSTS value, `None` when disabled
    hsts: Option<HeaderValue>,
}

impl SecurityHeadersLayer {
    /// `hsts_max_age` of 0 disables `Strict-Transport-Security`.
    pub fn new(hsts_max_age: u64) -> Self {
        let hsts = (hsts_max_age > 0)
            .then(|| HeaderValue::from_str(&format!("max-age={hsts_max_age}; includeSubDomains")))
            .and_then(Result::ok);
        Self { hsts }
    }
}

impl<S> Layer<S> for SecurityHeadersLayer {
    type Service = SecurityHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityHeadersService {
            inner,
            hsts: self.hsts.clone(),
        }
    }
}

#[derive(Clone)]
pub struct SecurityHeadersService<S> {
    inner: S,
    hsts: Option<HeaderValue>,
}

impl<S> Service<Request<Body>> for SecurityHeadersService<S>
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
        let hsts = self.hsts.clone().filter(|_| is_https(&req));
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let mut response = inner.call(req).await?;
            let headers = response.headers_mut();

            headers.insert(X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));
            headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
            headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
            if let Some(hsts) = hsts {
                headers.insert(STRICT_TRANSPORT_SECURITY, hsts);
            }

            Ok(response)
        })
    }
}

fn is_https<B>(req: &Request<B>) -> bool {
    req.headers()
        .get(&FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
}
