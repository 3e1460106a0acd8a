//! Translation of every failure the service can hit into an HTTP response.
//!
//! Bad uploads are 4xx; engine bugs and storage failures are 5xx.
//! Bodies are `{"detail": "..."}`.

use crate::records::RecordStoreError;
use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use brightspot::{BrightspotError, PersistError};
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No file selected")]
    NoFileSelected,
    #[error("Invalid file type. Only .jpg and .png files are allowed")]
    InvalidFileType,
    #[error("Empty File Found")]
    EmptyFile,
    #[error("malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Engine(#[from] BrightspotError),
    #[error(transparent)]
    Records(#[from] RecordStoreError),
    #[error("analysis task did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("artifact could not be read: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PersistError> for ApiError {
    fn from(e: PersistError) -> Self {
        ApiError::Engine(e.into())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoFileSelected
            | ApiError::InvalidFileType
            | ApiError::EmptyFile
            | ApiError::Multipart(_) => StatusCode::BAD_REQUEST,
            ApiError::Engine(BrightspotError::Decode(_)) => StatusCode::BAD_REQUEST,
            ApiError::Engine(BrightspotError::Persist(PersistError::Escapes(_))) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Engine(BrightspotError::Persist(PersistError::NotFound(_))) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Engine(_) | ApiError::Records(_) | ApiError::Join(_) | ApiError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn detail(&self) -> String {
        match self {
            ApiError::Engine(BrightspotError::Decode(_)) => {
                "Invalid image file or unsupported format.".to_string()
            }
            ApiError::Engine(BrightspotError::Persist(PersistError::Escapes(_))) => {
                "Invalid file name".to_string()
            }
            ApiError::Engine(BrightspotError::Persist(PersistError::NotFound(_))) => {
                "File not found".to_string()
            }
            e if e.status().is_server_error() => format!("An unexpected error occurred: {e}"),
            e => e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(error = %self, status = status.as_u16(), "Request rejected");
        }
        let body = Json(serde_json::json!({ "detail": self.detail() }));
        (status, body).into_response()
    }
}
