use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::transfer::TransferError;
use tokendrop_metadata::MetadataError;
use tokendrop_storage::StorageError;

/// Errors surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Transfer(#[from] TransferError),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: String,
    message: String,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Transfer(e) => match e {
                TransferError::MalformedId(_) | TransferError::UnknownToken(_) => {
                    StatusCode::BAD_REQUEST
                }
                TransferError::NoFileBound(_) => StatusCode::NOT_FOUND,
                TransferError::Metadata(MetadataError::NoSuchToken(_)) => StatusCode::NOT_FOUND,
                TransferError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
                TransferError::Storage(StorageError::InvalidKey(_)) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal_error",
            Self::Transfer(e) => match e {
                TransferError::MalformedId(_) => "malformed_id",
                TransferError::UnknownToken(_) => "unknown_token",
                TransferError::NoFileBound(_) => "no_file_bound",
                TransferError::Metadata(_) => "metadata_error",
                TransferError::Storage(_) => "storage_error",
                TransferError::Codec(_) => "codec_error",
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
