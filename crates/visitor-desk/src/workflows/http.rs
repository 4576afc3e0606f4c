//! Plumbing shared by the workflow routers: bounded store calls and JSON
//! responses.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::warn;

use super::WorkflowError;
use crate::config::WorkflowConfig;

/// Limits applied to every request handled by the workflow routers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSettings {
    pub store_timeout: Duration,
    pub default_page_size: usize,
}

impl Default for RouteSettings {
    fn default() -> Self {
        Self::from(&WorkflowConfig::default())
    }
}

impl From<&WorkflowConfig> for RouteSettings {
    fn from(config: &WorkflowConfig) -> Self {
        Self {
            store_timeout: config.store_timeout,
            default_page_size: config.default_page_size,
        }
    }
}

/// Runs a synchronous engine call off the async executor and gives up after
/// `limit`. A call that times out keeps running on the blocking pool, but the
/// caller sees `WorkflowError::Store` instead of hanging.
pub async fn run_bounded<T, F>(limit: Duration, work: F) -> Result<T, WorkflowError>
where
    F: FnOnce() -> Result<T, WorkflowError> + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::task::spawn_blocking(work);
    match tokio::time::timeout(limit, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(WorkflowError::Store(format!(
            "store call aborted: {join_error}"
        ))),
        Err(_) => {
            warn!(limit_ms = limit.as_millis() as u64, "store call timed out");
            Err(WorkflowError::Store(format!(
                "store call exceeded {}ms",
                limit.as_millis()
            )))
        }
    }
}

pub(crate) fn respond<T: Serialize>(result: Result<T, WorkflowError>, status: StatusCode) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_result_of_fast_calls() {
        let value = run_bounded(Duration::from_millis(500), || Ok::<_, WorkflowError>(7))
            .await
            .expect("fast call succeeds");
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn slow_calls_surface_as_store_errors() {
        let result = run_bounded(Duration::from_millis(20), || {
            std::thread::sleep(Duration::from_millis(300));
            Ok::<_, WorkflowError>(())
        })
        .await;

        match result {
            Err(WorkflowError::Store(message)) => assert!(message.contains("exceeded")),
            other => panic!("expected store timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn engine_errors_pass_through_unchanged() {
        let result: Result<(), _> = run_bounded(Duration::from_millis(500), || {
            Err(WorkflowError::Validation("bad input".to_string()))
        })
        .await;
        assert_eq!(result, Err(WorkflowError::Validation("bad input".to_string())));
    }
}
