//! Mapping of domain errors onto HTTP responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use super::ApiResponse;
use crate::domain::DomainError;

/// Handler error; renders as an [`ApiResponse`] error envelope.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Domain(e) => match e {
                DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
                DomainError::Conflict(_) | DomainError::InvalidState(_) => StatusCode::CONFLICT,
                DomainError::Timing(_) => StatusCode::UNPROCESSABLE_ENTITY,
                DomainError::Unauthorized(_) => StatusCode::FORBIDDEN,
                DomainError::Provider(_) => StatusCode::BAD_GATEWAY,
                DomainError::Validation(_) => StatusCode::BAD_REQUEST,
                DomainError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Storage details stay in the logs
            AppError::Domain(DomainError::Storage(detail)) => {
                tracing::error!(error = %detail, "Storage failure while handling request");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}
