use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Error enumeration for store failures shared by every repository trait.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    /// A conditional update found the record in a different state than expected.
    #[error("record changed concurrently: {0}")]
    Conflict(String),
    /// The patch would leave the record violating its invariants.
    #[error("patch rejected: {0}")]
    Rejected(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Typed failure returned by every workflow engine operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("store failure: {0}")]
    Store(String),
}

impl WorkflowError {
    pub const fn kind(&self) -> &'static str {
        match self {
            WorkflowError::Validation(_) => "validation",
            WorkflowError::NotFound(_) => "not_found",
            WorkflowError::Conflict(_) => "conflict",
            WorkflowError::InvalidState(_) => "invalid_state",
            WorkflowError::Store(_) => "store",
        }
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            WorkflowError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
            WorkflowError::Conflict(_) | WorkflowError::InvalidState(_) => StatusCode::CONFLICT,
            WorkflowError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<RepositoryError> for WorkflowError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => WorkflowError::NotFound("record not found".to_string()),
            RepositoryError::Conflict(reason) => WorkflowError::Conflict(reason),
            RepositoryError::Rejected(reason) => WorkflowError::Validation(reason),
            RepositoryError::Unavailable(reason) => WorkflowError::Store(reason),
        }
    }
}

impl IntoResponse for WorkflowError {
    fn into_response(self) -> Response {
        let payload = json!({
            "error": self.to_string(),
            "kind": self.kind(),
        });
        (self.status_code(), Json(payload)).into_response()
    }
}
