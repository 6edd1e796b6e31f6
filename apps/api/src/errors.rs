use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ranking::RankingError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {message}")]
    Validation { code: &'static str, message: String },

    #[error("Unprocessable entity: {message}")]
    UnprocessableEntity { code: &'static str, message: String },

    /// The model service failed or answered with something unusable.
    #[error("Upstream error: {message}")]
    BadGateway { code: &'static str, message: String },

    #[error("Upstream timeout: {message}")]
    GatewayTimeout { code: &'static str, message: String },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            code: "VALIDATION_ERROR",
            message: message.into(),
        }
    }
}

impl From<RankingError> for AppError {
    fn from(err: RankingError) -> Self {
        let code = err.code();
        let message = err.public_message();
        match &err {
            RankingError::Extract(_)
            | RankingError::InvalidCriteriaPayload(_)
            | RankingError::NoCriteria
            | RankingError::NoFiles
            | RankingError::EmptyDocument => AppError::Validation { code, message },
            RankingError::EmptyCriteria => AppError::UnprocessableEntity { code, message },
            RankingError::ModelService(e) if e.is_timeout() => {
                tracing::error!("Model service timed out: {err}");
                AppError::GatewayTimeout { code, message }
            }
            RankingError::ModelService(_)
            | RankingError::CriteriaParse(_)
            | RankingError::ScoreParse(_) => {
                tracing::error!("Model service error: {err}");
                AppError::BadGateway { code, message }
            }
            RankingError::Internal(detail) => AppError::Internal(anyhow::anyhow!("{detail}")),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Validation { code, message } => (StatusCode::BAD_REQUEST, code, message),
            AppError::UnprocessableEntity { code, message } => {
                (StatusCode::UNPROCESSABLE_ENTITY, code, message)
            }
            AppError::BadGateway { code, message } => (StatusCode::BAD_GATEWAY, code, message),
            AppError::GatewayTimeout { code, message } => {
                (StatusCode::GATEWAY_TIMEOUT, code, message)
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
