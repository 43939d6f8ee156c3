//! API error responses

use analyst_jobs::JobStoreError;
use analyst_pipeline::{DataError, PipelineError};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("任务不存在或已过期: {0}")]
    JobNotFound(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("任务存储不可用: {0}")]
    Store(#[from] JobStoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::JobNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Pipeline(PipelineError::Data(DataError::InvalidSymbol(_))) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Pipeline(PipelineError::Data(DataError::NotFound(_))) => StatusCode::NOT_FOUND,
            ApiError::Pipeline(PipelineError::Data(DataError::Timeout(_) | DataError::Provider(_))) => {
                StatusCode::BAD_GATEWAY
            }
            ApiError::Pipeline(PipelineError::Store(_)) | ApiError::Store(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest(_) => "INVALID_REQUEST",
            ApiError::JobNotFound(_) => "NOT_FOUND",
            ApiError::Pipeline(PipelineError::Data(DataError::InvalidSymbol(_))) => {
                "INVALID_SYMBOL"
            }
            ApiError::Pipeline(PipelineError::Data(DataError::NotFound(_))) => "DATA_NOT_FOUND",
            ApiError::Pipeline(PipelineError::Data(DataError::Timeout(_) | DataError::Provider(_))) => {
                "UPSTREAM_ERROR"
            }
            ApiError::Pipeline(PipelineError::Store(_)) | ApiError::Store(_) => {
                "STORE_UNAVAILABLE"
            }
            ApiError::Pipeline(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        let body = json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}
