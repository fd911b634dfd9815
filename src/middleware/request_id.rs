//! Request ID middleware.
//!
//! Every response carries an `X-Request-Id`. A client-supplied id is echoed
//! back when it looks sane (non-empty, at most [`MAX_REQUEST_ID_LENGTH`]
//! bytes of visible ASCII); otherwise a UUIDv4 is generated. The id is also
//! written back into the request headers so the trace span and handlers see
//! the same value.
//!
//! ```bash
//! curl -H "X-Request-Id: my-correlation-id" http://localhost:8080/v1/quotes/random
//! ```

use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::{Request, Response};
use tower::{Layer, Service};
use tracing::debug;
use uuid::Uuid;

/// Header name for request ID.
pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Longest client-supplied id that is echoed back.
pub const MAX_REQUEST_ID_LENGTH: usize = 128;

/// Request ID layer for Tower middleware stack.
#[derive(Clone, Default)]
pub struct RequestIdLayer;

impl RequestIdLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

/// Request ID service wrapper.
#[derive(Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for RequestIdService<S>
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

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let request_id = accepted_request_id(&req).unwrap_or_else(generate_request_id);

        req.headers_mut()
            .insert(REQUEST_ID_HEADER.clone(), request_id.clone());
        debug!(request_id = ?request_id, "Processing request");

        let mut inner = self.inner.clone();

        Box::pin(async move {
            let mut response = inner.call(req).await?;
            response
                .headers_mut()
                .insert(REQUEST_ID_HEADER.clone(), request_id);
            Ok(response)
        })
    }
}

/// The client's id, if it is acceptable to echo.
fn accepted_request_id<B>(req: &Request<B>) -> Option<HeaderValue> {
    let value = req.headers().get(&REQUEST_ID_HEADER)?;
    let bytes = value.as_bytes();

    let acceptable = !bytes.is_empty()
        && bytes.len() <= MAX_REQUEST_ID_LENGTH
        && bytes.iter().all(|b| b.is_ascii_graphic());

    acceptable.then(|| value.clone())
}

fn generate_request_id() -> HeaderValue {
    // A hyphenated UUID is always a valid header value
    HeaderValue::from_str(&Uuid::new_v4().to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
}

/// Extension trait to read the request ID set by [`RequestIdLayer`].
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<&str> {
        self.headers()
            .get(&REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
    }
}
