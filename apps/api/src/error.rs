//! Error responses for the HTTP API.
//!
//! ```text
//! EngineError ──► kind() ──► status     body
//!                 Validation  400        {"code": "VALIDATION_ERROR", "message": ...}
//!                 NotFound    404        {"code": "ORDER_NOT_FOUND",  "message": ...}
//!                 Conflict    409        {"code": "SOLD_OUT",         "message": ...}
//!                 Internal    500        {"code": "INTERNAL_ERROR",   "message": "Internal server error"}
//! ```
//!
//! Body rejections from axum (bad JSON, wrong types, wrong content type)
//! are folded into `VALIDATION_ERROR` instead of axum's plain-text 4xx.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use taquilla_core::ErrorKind;
use taquilla_engine::EngineError;
use tracing::{debug, error};

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Missing header: {0}")]
    MissingHeader(&'static str),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: String,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Engine(err) => err.kind(),
            ApiError::MissingHeader(_) | ApiError::InvalidBody(_) => ErrorKind::Validation,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Engine(err) => err.code(),
            ApiError::MissingHeader(_) | ApiError::InvalidBody(_) => "VALIDATION_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = ?self, "Internal error");
            "Internal server error".to_string()
        } else {
            debug!(error = %self, code = self.code(), "Request rejected");
            self.to_string()
        };

        let body = ErrorBody {
            code: self.code(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taquilla_core::CoreError;
    use taquilla_db::DbError;

    #[test]
    fn test_status_mapping() {
        let sold_out = ApiError::from(EngineError::from(CoreError::SoldOut {
            zone_id: "z".into(),
            available: 0,
            requested: 1,
        }));
        assert_eq!(sold_out.status_code(), StatusCode::CONFLICT);
        assert_eq!(sold_out.code(), "SOLD_OUT");

        let missing = ApiError::from(EngineError::from(CoreError::OrderNotFound("o".into())));
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

        let header = ApiError::MissingHeader("x-client-id");
        assert_eq!(header.status_code(), StatusCode::BAD_REQUEST);

        let body = ApiError::InvalidBody("missing field `lines`".into());
        assert_eq!(body.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(body.code(), "VALIDATION_ERROR");

        let storage = ApiError::from(EngineError::from(DbError::corrupt("orders.status", "bad")));
        assert_eq!(storage.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
