use std::collections::BTreeMap;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Slot unavailable: {0}")]
    SlotUnavailable(String),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable machine-readable kind carried in every error body.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::BadRequest(_) | Error::Json(_) => "bad_request",
            Error::Validation(_) => "validation_error",
            Error::Unauthorized(_) => "unauthorized",
            Error::Forbidden(_) => "forbidden",
            Error::NotFound(_) => "not_found",
            Error::Conflict(_) => "conflict",
            Error::InvalidTransition(_) => "invalid_transition",
            Error::SlotUnavailable(_) => "slot_unavailable",
            Error::Upstream(_) | Error::Reqwest(_) => "upstream_failure",
            Error::Config(_)
            | Error::Database(_)
            | Error::Anyhow(_)
            | Error::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) | Error::Json(_) | Error::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) | Error::InvalidTransition(_) | Error::SlotUnavailable(_) => {
                StatusCode::CONFLICT
            }
            Error::Upstream(_) | Error::Reqwest(_) => StatusCode::BAD_GATEWAY,
            Error::Config(_)
            | Error::Database(_)
            | Error::Anyhow(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn field_map(errors: &validator::ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let codes = errs.iter().map(|e| e.code.to_string()).collect();
            (field.to_string(), codes)
        })
        .collect()
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let kind = self.kind();

        let body = match &self {
            Error::Validation(errors) => json!({
                "error": kind,
                "message": "One or more fields are invalid",
                "fields": field_map(errors),
            }),
            Error::Upstream(msg) => json!({
                "error": kind,
                "message": msg,
                "retryable": true,
            }),
            Error::Reqwest(err) => json!({
                "error": kind,
                "message": format!("External service error: {}", err),
                "retryable": true,
            }),
            Error::Config(_) | Error::Database(_) | Error::Anyhow(_) | Error::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                json!({
                    "error": kind,
                    "message": "An unexpected error occurred",
                })
            }
            Error::BadRequest(msg)
            | Error::Unauthorized(msg)
            | Error::Forbidden(msg)
            | Error::NotFound(msg)
            | Error::Conflict(msg)
            | Error::InvalidTransition(msg)
            | Error::SlotUnavailable(msg) => json!({ "error": kind, "message": msg }),
            Error::Json(err) => json!({ "error": kind, "message": err.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}
