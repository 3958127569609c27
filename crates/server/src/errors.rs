use axum::extract::rejection::JsonRejection;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::ErrorBody;
use service::ServiceError;
use thiserror::Error;
use tracing::error;

pub const MSG_METHOD_NOT_ALLOWED: &str = "Method not allowed";
pub const MSG_STORAGE_ERROR: &str = "storage error";

/// HTTP-facing error: a status plus the `{"error": msg}` body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, MSG_METHOD_NOT_ALLOWED)
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Unauthorized(m) => Self::new(StatusCode::FORBIDDEN, m),
            ServiceError::Validation(m) => Self::new(StatusCode::BAD_REQUEST, m),
            // 未知 action 视为不支持的方法
            ServiceError::UnknownAction(_) => Self::method_not_allowed(),
            // 细节只写日志，不回给客户端
            ServiceError::Storage(detail) => {
                error!(error = %detail, "storage failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, MSG_STORAGE_ERROR)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, format!("invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, error = %self.message, "request failed");
        }
        let mut resp = (self.status, Json(ErrorBody::new(self.message))).into_response();
        if self.status == StatusCode::METHOD_NOT_ALLOWED {
            resp.headers_mut().insert(header::ALLOW, HeaderValue::from_static("GET, POST"));
        }
        resp
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("storage init failed: {0}")]
    Storage(#[from] ServiceError),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
