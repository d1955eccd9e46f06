use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;
use thiserror::Error;

use super::models::ErrorResponse;
use super::validation::{PayloadError, StyleOrPayloadError};
use crate::batch::BatchError;
use crate::content::ValidationError;
use crate::decoder::DecodeError;
use crate::render::{RenderError, StyleError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("payload invalid: {0}")]
    InvalidPayload(String),
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Style(#[from] StyleError),
    #[error("{0}")]
    Render(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Batch(#[from] BatchError),
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Validation(_)
            | ApiError::Style(_)
            | ApiError::Render(_)
            | ApiError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Batch(BatchError::Csv(_)) => StatusCode::BAD_REQUEST,
            ApiError::Batch(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidPayload(_) => "INVALID_PAYLOAD",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::Validation(_) => "INVALID_FIELDS",
            ApiError::Style(_) => "INVALID_STYLE",
            ApiError::Render(_) => "RENDER_FAILED",
            ApiError::Decode(DecodeError::NoSymbol) => "NO_QR_FOUND",
            ApiError::Decode(_) => "DECODE_FAILED",
            ApiError::Batch(_) => "BATCH_REJECTED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let body = ErrorResponse {
            code: self.code(),
            message: self.to_string(),
        };

        (status, Json(json!(body))).into_response()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        ApiError::InvalidPayload(value.to_string())
    }
}

impl From<RenderError> for ApiError {
    fn from(value: RenderError) -> Self {
        match value {
            RenderError::Style(e) => ApiError::Style(e),
            RenderError::Encode(e) => ApiError::Render(format!("payload cannot be encoded: {e}")),
            RenderError::Image(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<PayloadError> for ApiError {
    fn from(value: PayloadError) -> Self {
        ApiError::InvalidPayload(value.to_string())
    }
}

impl From<StyleOrPayloadError> for ApiError {
    fn from(value: StyleOrPayloadError) -> Self {
        match value {
            StyleOrPayloadError::Style(e) => ApiError::Style(e),
            StyleOrPayloadError::Payload(e) => e.into(),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(value: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("worker task failed: {value}"))
    }
}
