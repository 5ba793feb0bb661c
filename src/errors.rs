use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::catalog::CatalogError;
use crate::ingest::IngestError;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[source] anyhow::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict error: {0}")]
    Conflict(String),

    #[error("External service error: {0}")]
    ExternalService(#[source] anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Timeout error: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),

    #[error("An unexpected error occurred: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            AppError::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
            AppError::Conflict(message) => (StatusCode::CONFLICT, message.clone()),
            AppError::ExternalService(e) => {
                tracing::error!("External service error: {:?}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "An upstream service request failed".to_string(),
                )
            }
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message.clone()),
            AppError::Timeout(e) => {
                tracing::error!("Timeout error: {:?}", e);
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "The request timed out".to_string(),
                )
            }
            // anyhow's Debug output already includes the cause chain.
            AppError::Unexpected(e) => {
                tracing::error!("Unexpected error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "message": error_message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Resource already exists".to_string())
            }
            _ => AppError::Database(anyhow::Error::new(err)),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        AppError::Database(anyhow::Error::new(err))
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::InvalidUrl(message) => AppError::Validation(message),
            IngestError::Source(message) => {
                AppError::ExternalService(anyhow::anyhow!(message))
            }
            IngestError::EmptyFetch(message) => {
                AppError::ExternalService(anyhow::anyhow!(message))
            }
            IngestError::Storage(inner) => AppError::Database(anyhow::Error::new(inner)),
        }
    }
}
