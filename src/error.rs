use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::selection::SelectionError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    InvalidSelection(#[from] SelectionError),

    #[error("Blockchain RPC error: {0}")]
    BlockchainRPC(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String, Option<serde_json::Value>),

    #[error("Failed to generate image")]
    NoImageGenerated,

    #[error("External API error: {0}")]
    ExternalAPI(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidSelection(_) | AppError::BadRequest(_) | AppError::InvalidSignature => {
                StatusCode::BAD_REQUEST
            }
            AppError::Forbidden(..) => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, details) = match self {
            AppError::InvalidSelection(ref e) => (e.to_string(), None),
            AppError::BadRequest(msg) => (msg, None),
            AppError::InvalidSignature => ("Invalid signature".to_string(), None),
            AppError::Forbidden(msg, details) => (msg, details),
            AppError::NoImageGenerated => ("Failed to generate image".to_string(), None),
            other => {
                tracing::error!("request failed: {}", other);
                (
                    "Internal server error".to_string(),
                    Some(serde_json::Value::String(other.to_string())),
                )
            }
        };

        (status, Json(ErrorResponse { error, details })).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
