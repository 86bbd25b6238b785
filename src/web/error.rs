//! Error normalization for the HTTP pipeline.
//!
//! Every failure a client can observe leaves the server in the same shape (see
//! [`ServiceResponse`]). Handlers return [`ApiError`]; anything produced by the
//! framework itself (extractor rejections, 405, 413, panics) is rewritten by
//! [`normalize_errors`], which sits outermost in the pipeline.

use axum::body::{to_bytes, Body};
use axum::extract::Request;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::any::Any;
use std::time::Duration;
use thiserror::Error;

use crate::web::response::ServiceResponse;

/// Message sent for every 5xx; details stay in the logs
pub const INTERNAL_ERROR_MESSAGE: &str = "An error occurred while processing the request.";

/// Message sent for throttled requests
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later.";

/// Largest framework error body we are willing to read back as a message
const MAX_REASON_BYTES: usize = 4 * 1024;

/// Machine-readable failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    BadRequest,
    NotFound,
    MethodNotAllowed,
    PayloadTooLarge,
    UnsupportedMediaType,
    RateLimited,
    Internal,
}

impl ErrorKind {
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::NOT_FOUND => ErrorKind::NotFound,
            StatusCode::METHOD_NOT_ALLOWED => ErrorKind::MethodNotAllowed,
            StatusCode::PAYLOAD_TOO_LARGE => ErrorKind::PayloadTooLarge,
            StatusCode::UNSUPPORTED_MEDIA_TYPE => ErrorKind::UnsupportedMediaType,
            StatusCode::UNPROCESSABLE_ENTITY => ErrorKind::Validation,
            StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimited,
            s if s.is_server_error() => ErrorKind::Internal,
            _ => ErrorKind::BadRequest,
        }
    }
}

/// Marker placed in response extensions once a response has the uniform shape
#[derive(Debug, Clone, Copy)]
pub struct Normalized;

/// Client-visible request failures
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request input failed validation
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Resource or route does not exist
    #[error("{0}")]
    NotFound(String),

    /// Client exceeded its rate limit
    #[error("{}", RATE_LIMIT_MESSAGE)]
    RateLimited { retry_after: Duration },

    /// Any other non-success status, usually produced by the framework
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    /// Unexpected failure; the detail is logged, never sent
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Builds an error for a bare status code.
    ///
    /// 5xx statuses always become [`ApiError::Internal`]; `reason` is only used
    /// for client errors.
    pub fn from_status(status: StatusCode, reason: Option<String>) -> Self {
        if status.is_server_error() {
            return ApiError::Internal(format!("upstream status {}", status));
        }
        let message = reason.unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());
        match status {
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            _ => ApiError::Status { status, message },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Status { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::RateLimited { .. } => ErrorKind::RateLimited,
            ApiError::Status { status, .. } => ErrorKind::from_status(*status),
            ApiError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Text sent to the client
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!(error = %detail, "request failed");
        }

        let mut response = ServiceResponse::failure(self.kind(), self.public_message(), self.status()).into_response();

        if let ApiError::RateLimited { retry_after } = &self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(ceil_secs(*retry_after)));
        }

        response.extensions_mut().insert(Normalized);
        response
    }
}

/// Terminal stage: rewrites any non-normalized error response.
///
/// Headers set by inner stages (CORS, security, rate limit, request id) are kept;
/// only the body and its content headers are replaced.
pub async fn normalize_errors(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let status = response.status();

    if !(status.is_client_error() || status.is_server_error()) || response.extensions().get::<Normalized>().is_some() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let reason = if status.is_client_error() {
        plain_text_reason(&parts.headers, body).await
    } else {
        None
    };

    let (normalized_parts, normalized_body) = ApiError::from_status(status, reason).into_response().into_parts();

    parts.headers.remove(header::CONTENT_LENGTH);
    if let Some(content_type) = normalized_parts.headers.get(header::CONTENT_TYPE) {
        parts.headers.insert(header::CONTENT_TYPE, content_type.clone());
    }
    parts.extensions.insert(Normalized);

    Response::from_parts(parts, normalized_body)
}

/// Route table fallback for unmatched paths
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not Found".to_string())
}

/// Panic handler for `CatchPanicLayer`
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };
    ApiError::Internal(format!("handler panicked: {}", detail)).into_response()
}

async fn plain_text_reason(headers: &HeaderMap, body: Body) -> Option<String> {
    let is_text = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("text/plain"))
        .unwrap_or(false);
    if !is_text {
        return None;
    }

    let bytes = to_bytes(body, MAX_REASON_BYTES).await.ok()?;
    let text = String::from_utf8(bytes.to_vec()).ok()?;
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Whole seconds, rounded up, never below one
pub(crate) fn ceil_secs(duration: Duration) -> u64 {
    let millis = duration.as_millis() as u64;
    millis.div_ceil(1000).max(1)
}
