//! Per-client request throttling.

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;

use crate::core::rate_limiter::{RateLimitDecision, RateLimiter};
use crate::web::error::{ceil_secs, ApiError};

const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");
const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Key used when neither a proxy header nor a peer address is available
const UNKNOWN_CLIENT: &str = "unknown";

/// Rejects requests over the configured quota with a normalized 429.
///
/// Rejections never reach the request logger or the route table; they are
/// recorded here instead.
pub async fn rate_limit(State(limiter): State<RateLimiter>, request: Request, next: Next) -> Response {
    let client = client_key(request.headers(), request.extensions().get::<ConnectInfo<SocketAddr>>());

    match limiter.check(&client) {
        RateLimitDecision::Limited { retry_after, .. } => {
            tracing::warn!(
                client = %client,
                method = %request.method(),
                path = %request.uri().path(),
                retry_after_ms = retry_after.as_millis() as u64,
                "rate limit exceeded, request rejected"
            );
            ApiError::RateLimited { retry_after }.into_response()
        }
        RateLimitDecision::Allowed {
            limit,
            remaining,
            reset_after,
        } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(RATELIMIT_LIMIT, HeaderValue::from(limit));
            headers.insert(RATELIMIT_REMAINING, HeaderValue::from(remaining));
            headers.insert(RATELIMIT_RESET, HeaderValue::from(ceil_secs(reset_after)));
            response
        }
    }
}

/// Identifies the caller: first `X-Forwarded-For` hop (the proxy is trusted),
/// then the socket peer address.
pub fn client_key(headers: &HeaderMap, peer: Option<&ConnectInfo<SocketAddr>>) -> String {
    let forwarded = headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match (forwarded, peer) {
        (Some(ip), _) => ip.to_string(),
        (None, Some(ConnectInfo(addr))) => addr.ip().to_string(),
        (None, None) => UNKNOWN_CLIENT.to_string(),
    }
}
