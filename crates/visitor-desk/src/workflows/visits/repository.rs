use chrono::{Duration, NaiveDateTime};

use super::domain::{AccessLogEntry, Token, Visit, VisitId, VisitStatus};
use crate::workflows::RepositoryError;

/// Mutation applied to a visit under the store's per-record lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitPatch {
    CheckIn { at: NaiveDateTime },
    CheckOut { at: NaiveDateTime },
    EndMeeting,
    /// Pushes the scheduled end back; successive extensions accumulate.
    ExtendBy { minutes: i64 },
}

impl VisitPatch {
    pub fn apply(&self, visit: &mut Visit) -> Result<(), RepositoryError> {
        let status = visit.status();
        if status.is_terminal() {
            return Err(RepositoryError::Conflict(format!(
                "visit {} has already ended",
                visit.id.0
            )));
        }

        match *self {
            VisitPatch::CheckIn { at } => {
                if status != VisitStatus::NotArrived {
                    return Err(RepositoryError::Conflict(format!(
                        "visit {} is already checked in",
                        visit.id.0
                    )));
                }
                visit.checkin_time = Some(at);
            }
            VisitPatch::CheckOut { at } => {
                let checkin = visit.checkin_time.ok_or_else(|| {
                    RepositoryError::Rejected(format!("visit {} never checked in", visit.id.0))
                })?;
                if at < checkin {
                    return Err(RepositoryError::Rejected(format!(
                        "checkout at {at} precedes check-in at {checkin}"
                    )));
                }
                visit.checkout_time = Some(at);
            }
            VisitPatch::EndMeeting => visit.manually_ended = true,
            VisitPatch::ExtendBy { minutes } => {
                if minutes <= 0 {
                    return Err(RepositoryError::Rejected(
                        "extension must be a positive number of minutes".to_string(),
                    ));
                }
                let end = visit.scheduled_end.ok_or_else(|| {
                    RepositoryError::Rejected(format!(
                        "visit {} has no scheduled end to extend",
                        visit.id.0
                    ))
                })?;
                let extended = Duration::try_minutes(minutes)
                    .and_then(|delta| end.checked_add_signed(delta))
                    .ok_or_else(|| {
                        RepositoryError::Rejected(format!(
                            "extending visit {} by {minutes} minutes leaves the calendar range",
                            visit.id.0
                        ))
                    })?;
                visit.scheduled_end = Some(extended);
            }
        }
        Ok(())
    }
}

/// Check-in/checkout storage.
pub trait VisitRepository: Send + Sync {
    /// Rejects a visit whose token already has an active visit.
    fn insert(&self, visit: Visit) -> Result<Visit, RepositoryError>;
    fn find_active_by_token(&self, token: &Token) -> Result<Option<Visit>, RepositoryError>;
    fn find_latest_by_token(&self, token: &Token) -> Result<Option<Visit>, RepositoryError>;
    fn list(&self) -> Result<Vec<Visit>, RepositoryError>;
    fn update(&self, id: &VisitId, patch: VisitPatch) -> Result<Visit, RepositoryError>;
}

/// Append-only access-control log.
pub trait AccessLogRepository: Send + Sync {
    fn append(&self, entry: AccessLogEntry) -> Result<(), RepositoryError>;
    /// Snapshot of every entry in insertion order.
    fn list(&self) -> Result<Vec<AccessLogEntry>, RepositoryError>;
}
