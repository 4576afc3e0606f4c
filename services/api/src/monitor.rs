use crate::infra::DeskLifecycle;
use chrono::{Local, NaiveDateTime};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, warn};
use visitor_desk::workflows::{run_bounded, WorkflowError};

/// Polls the visit board for overstays. Reporting only; hosts resolve each
/// overstay through the visit routes.
pub(crate) fn spawn(
    lifecycle: Arc<DeskLifecycle>,
    every: Duration,
    store_timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let now = Local::now().naive_local();
            if let Err(err) = poll_once(Arc::clone(&lifecycle), store_timeout, now).await {
                error!(error = %err, "overstay poll failed");
            }
        }
    })
}

pub(crate) async fn poll_once(
    lifecycle: Arc<DeskLifecycle>,
    store_timeout: Duration,
    now: NaiveDateTime,
) -> Result<usize, WorkflowError> {
    let overstayed = run_bounded(store_timeout, move || lifecycle.overstays(now)).await?;
    for row in &overstayed {
        warn!(
            visit = %row.visit_id.0,
            token = %row.token,
            location = %row.current_location,
            scheduled_end = ?row.scheduled_end,
            "visitor overstayed"
        );
    }
    debug!(count = overstayed.len(), "overstay poll complete");
    Ok(overstayed.len())
}
