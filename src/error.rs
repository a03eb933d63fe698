use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<crate::orchestration::ProcessError> for AppError {
    fn from(err: crate::orchestration::ProcessError) -> Self {
        use crate::orchestration::ProcessError;
        match &err {
            ProcessError::UnknownReferralCode(_) => AppError::NotFound(err.to_string()),
            ProcessError::PartnerInactive(_) => AppError::BadRequest(err.to_string()),
            ProcessError::Db(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<crate::orchestration::RedemptionError> for AppError {
    fn from(err: crate::orchestration::RedemptionError) -> Self {
        use crate::orchestration::RedemptionError;
        match &err {
            RedemptionError::UnknownOrder(_) => AppError::NotFound(err.to_string()),
            RedemptionError::Db(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
