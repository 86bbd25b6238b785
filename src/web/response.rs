//! Uniform JSON envelope for every HTTP response

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::web::error::ErrorKind;

/// Body shape shared by successes and failures.
///
/// ```json
/// {"success":true,"message":"Users found","responseObject":[...],"statusCode":200}
/// {"success":false,"kind":"not_found","message":"Not Found","responseObject":null,"statusCode":404}
/// ```
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse<T: Serialize> {
    pub success: bool,
    /// Machine-readable failure kind; absent on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    pub message: String,
    pub response_object: Option<T>,
    pub status_code: u16,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ServiceResponse<T> {
    pub fn success(message: impl Into<String>, response_object: Option<T>) -> Self {
        Self {
            success: true,
            kind: None,
            message: message.into(),
            response_object,
            status_code: StatusCode::OK.as_u16(),
            status: StatusCode::OK,
        }
    }
}

impl ServiceResponse<()> {
    pub fn failure(kind: ErrorKind, message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            success: false,
            kind: Some(kind),
            message: message.into(),
            response_object: None,
            status_code: status.as_u16(),
            status,
        }
    }
}

impl<T: Serialize> IntoResponse for ServiceResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
