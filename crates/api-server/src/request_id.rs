//! Per-request correlation ids for analysis calls.
//!
//! A caller (or the proxy in front of us) may pass `x-request-id`; it is kept
//! when it looks like an opaque token, otherwise a UUID v4 is minted. The id
//! lands on the `http_request` span, in handler extensions and on the response.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied id we accept.
const MAX_REQUEST_ID_LEN: usize = 128;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// The caller's id when usable, a fresh UUID v4 otherwise.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|id| is_acceptable(id))
            .map(|id| Self(id.to_string()))
            .unwrap_or_else(|| Self(Uuid::new_v4().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Bounded, printable, no whitespace. Keeps log lines and echoed headers sane.
fn is_acceptable(id: &str) -> bool {
    !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN && id.bytes().all(|b| b.is_ascii_graphic())
}

pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let id = RequestId::from_headers(request.headers());
    tracing::Span::current().record("request_id", id.as_str());

    let header = HeaderValue::from_str(id.as_str()).ok();
    request.extensions_mut().insert(id);

    let mut response = next.run(request).await;
    if let Some(header) = header {
        response.headers_mut().insert(REQUEST_ID_HEADER, header);
    }
    response
}
