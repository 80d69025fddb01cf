//! # Widget Routing Errors
//!
//! Two families live here. [`RouteError`] covers registration and listener
//! failures during startup and converts into the kernel error. [`HttpError`]
//! is produced while a request runs through its middleware chain; it never
//! aborts the process and is rendered by the error-handling stage.
use std::io;

use axum::http::StatusCode;
use thiserror::Error;

use crate::model::error::ModelError;
use crate::registry::error::RegistryError;

/// Route registration and server startup errors
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("Route path '{path}' must start with '/'")]
    InvalidPath { path: String },

    #[error("Route path '{path}' is not a valid pattern: {reason}")]
    InvalidPattern { path: String, reason: String },

    #[error("Route {verb} {path} conflicts with '{existing}': captures at the same position must share a name")]
    Conflict {
        verb: String,
        path: String,
        existing: String,
    },

    #[error("Route {verb} {path} has no handlers")]
    EmptyChain { verb: String, path: String },

    #[error("HTTP engine is not initialized; routes can only be added after server init")]
    EngineNotReady,

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("Server task failed: {0}")]
    Serve(String),
}

/// Failures raised by the upload collaborator while reading a multipart body
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Malformed multipart request: {0}")]
    Multipart(String),

    #[error("Failed to store upload at '{path}': {source}")]
    Storage {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Upload rejected: {0}")]
    Rejected(String),
}

impl From<axum::extract::multipart::MultipartError> for UploadError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        UploadError::Multipart(err.body_text())
    }
}

impl From<axum::extract::multipart::MultipartRejection> for UploadError {
    fn from(err: axum::extract::multipart::MultipartRejection) -> Self {
        UploadError::Multipart(err.body_text())
    }
}

/// Request-scoped error passed to the error-handling stage
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Upload failed: {0}")]
    Upload(#[from] UploadError),

    #[error("Invalid CSRF token")]
    Csrf,

    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("{0}")]
    Internal(String),
}

impl HttpError {
    /// Error carrying an explicit response status
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        HttpError::Status {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Response status for this error; anything unclassified is a 500.
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::Status { status, .. } => *status,
            HttpError::Csrf => StatusCode::FORBIDDEN,
            HttpError::Model(ModelError::PersistenceRace { .. }) => StatusCode::CONFLICT,
            HttpError::Model(ModelError::NotFound { .. }) => StatusCode::NOT_FOUND,
            HttpError::Registry(RegistryError::NotFound { .. }) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
