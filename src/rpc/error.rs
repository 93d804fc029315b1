//! RPC error taxonomy and its wire shape.
//!
//! Errors serialize as `{ defined, code, status, message, data? }` with the
//! HTTP status mirroring `status`, so clients can branch on `code` without
//! parsing messages.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use validator::ValidationErrors;

use crate::services::todo::TodoError;

/// One failed input constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub path: Vec<String>,
    pub message: String,
}

impl Issue {
    #[must_use]
    pub fn new(path: &[&str], message: impl Into<String>) -> Self {
        Self { path: path.iter().map(|p| (*p).to_owned()).collect(), message: message.into() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("Input validation failed")]
    InvalidInput(Vec<Issue>),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Procedure not found: {0}")]
    NotFound(String),
    #[error("Internal server error")]
    Internal,
}

impl RpcError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Internal => "INTERNAL_SERVER_ERROR",
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Log an unexpected failure and hide its details from the client.
    pub fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    defined: bool,
    code: &'static str,
    status: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<ErrorData<'a>>,
}

#[derive(Serialize)]
struct ErrorData<'a> {
    issues: &'a [Issue],
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            defined: false,
            code: self.code(),
            status: status.as_u16(),
            message: self.to_string(),
            data: match &self {
                Self::InvalidInput(issues) => Some(ErrorData { issues }),
                _ => None,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<TodoError> for RpcError {
    fn from(err: TodoError) -> Self {
        match err {
            TodoError::EmptyText => Self::InvalidInput(vec![Issue::new(&["text"], TodoError::EmptyText.to_string())]),
            TodoError::Database(e) => Self::internal("todo query failed", e),
        }
    }
}

/// Flatten `validator` field errors into issues, sorted by field.
#[must_use]
pub fn validation_issues(errors: &ValidationErrors) -> Vec<Issue> {
    let mut issues: Vec<Issue> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| Issue {
                path: vec![field.to_string()],
                message: e.message.as_ref().map_or_else(|| e.code.to_string(), ToString::to_string),
            })
        })
        .collect();
    issues.sort_by(|a, b| a.path.cmp(&b.path));
    issues
}
