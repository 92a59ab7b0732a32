//! Application error type mapping to HTTP status codes and envelope format.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use codeloom_types::error::{ProjectError, RepositoryError};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    Project(ProjectError),
    Repository(RepositoryError),
    Unauthorized(String),
    NotFound(String),
}

impl From<ProjectError> for AppError {
    fn from(e: ProjectError) -> Self {
        AppError::Project(e)
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        AppError::Repository(e)
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Project(ProjectError::InvalidFileName { .. }) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", self.message())
            }
            AppError::Project(ProjectError::FileNotFound(_)) => {
                (StatusCode::NOT_FOUND, "FILE_NOT_FOUND", self.message())
            }
            AppError::Project(ProjectError::Storage(_)) | AppError::Repository(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", self.message())
            }
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.message()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", self.message()),
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Project(e) => e.to_string(),
            AppError::Repository(e) => e.to_string(),
            AppError::Unauthorized(msg) | AppError::NotFound(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(code, %message, "request failed");
        }
        let body = ApiResponse::error(code, &message, uuid::Uuid::now_v7().to_string());
        (status, Json(body)).into_response()
    }
}
