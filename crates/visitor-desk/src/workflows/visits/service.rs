use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use super::domain::{
    AccessLogEntry, OverstayAction, OverstayResolution, Token, Visit, VisitBoardRow, VisitId,
    VisitStatus, VisitorId,
};
use super::location::{current_location, LocationIndex};
use super::repository::{AccessLogRepository, VisitPatch, VisitRepository};
use crate::workflows::appointments::{AppointmentId, AppointmentRepository, ApprovalStatus};
use crate::workflows::WorkflowError;

static VISIT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_visit_id() -> VisitId {
    let id = VISIT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    VisitId(format!("visit-{id:06}"))
}

/// Drives visits from token issuance through check-in to the end of the meeting.
///
/// Overstays are only reported; resolving one is always an explicit host command.
pub struct VisitLifecycle<V, A, R> {
    visits: Arc<V>,
    access_log: Arc<A>,
    appointments: Arc<R>,
}

impl<V, A, R> VisitLifecycle<V, A, R>
where
    V: VisitRepository + 'static,
    A: AccessLogRepository + 'static,
    R: AppointmentRepository + 'static,
{
    pub fn new(visits: Arc<V>, access_log: Arc<A>, appointments: Arc<R>) -> Self {
        Self {
            visits,
            access_log,
            appointments,
        }
    }

    /// Bind a credential to an approved appointment, creating a Not Arrived visit.
    pub fn issue_token(
        &self,
        appointment_id: &AppointmentId,
        visitor_id: VisitorId,
        token: Token,
    ) -> Result<Visit, WorkflowError> {
        ensure_token(&token)?;
        let appointment = self.appointments.find(appointment_id)?.ok_or_else(|| {
            WorkflowError::NotFound(format!("appointment {appointment_id} does not exist"))
        })?;
        if appointment.approval_status != ApprovalStatus::Approved {
            return Err(WorkflowError::InvalidState(format!(
                "appointment {appointment_id} is {}; only approved appointments receive tokens",
                appointment.approval_status.label()
            )));
        }

        let visit = Visit {
            id: next_visit_id(),
            visitor_id,
            appointment_id: appointment_id.clone(),
            token,
            checkin_time: None,
            checkout_time: None,
            manually_ended: false,
            comments: String::new(),
            scheduled_end: appointment.scheduled_end(),
        };

        let stored = self.visits.insert(visit)?;
        info!(visit = %stored.id.0, token = %stored.token, appointment = %appointment_id, "token issued");
        Ok(stored)
    }

    pub fn check_in(&self, token: &Token, at: NaiveDateTime) -> Result<Visit, WorkflowError> {
        let visit = self.active(token)?;
        if visit.status() != VisitStatus::NotArrived {
            return Err(WorkflowError::InvalidState(format!(
                "visitor with token {token} is already checked in"
            )));
        }

        let updated = self.visits.update(&visit.id, VisitPatch::CheckIn { at })?;
        info!(visit = %updated.id.0, token = %token, "visitor checked in");
        Ok(updated)
    }

    pub fn check_out(&self, token: &Token, at: NaiveDateTime) -> Result<Visit, WorkflowError> {
        let visit = self.active(token)?;
        if visit.status() != VisitStatus::CheckedIn {
            return Err(WorkflowError::InvalidState(format!(
                "visitor with token {token} has not checked in"
            )));
        }

        let updated = self.visits.update(&visit.id, VisitPatch::CheckOut { at })?;
        info!(visit = %updated.id.0, token = %token, "visitor checked out");
        Ok(updated)
    }

    /// Host-initiated end. A second call on the same visit fails with `InvalidState`.
    pub fn end_meeting(&self, token: &Token) -> Result<Visit, WorkflowError> {
        ensure_token(token)?;
        let visit = match self.visits.find_active_by_token(token)? {
            Some(visit) => visit,
            None => {
                return Err(match self.visits.find_latest_by_token(token)? {
                    Some(ended) => WorkflowError::InvalidState(format!(
                        "meeting for visit {} has already ended",
                        ended.id.0
                    )),
                    None => WorkflowError::NotFound(format!("no visit for token {token}")),
                });
            }
        };

        let updated = self.visits.update(&visit.id, VisitPatch::EndMeeting)?;
        info!(visit = %updated.id.0, token = %token, "meeting ended");
        Ok(updated)
    }

    /// Push the scheduled end back by `additional_minutes`, returning the new end.
    pub fn extend_stay(
        &self,
        token: &Token,
        additional_minutes: i64,
    ) -> Result<NaiveDateTime, WorkflowError> {
        let updated = self.extend(token, additional_minutes)?;
        updated.scheduled_end.ok_or_else(|| {
            WorkflowError::InvalidState(format!("visit {} lost its scheduled end", updated.id.0))
        })
    }

    /// Apply the host's choice for an overstayed visit.
    pub fn resolve_overstay(
        &self,
        token: &Token,
        now: NaiveDateTime,
        resolution: OverstayResolution,
    ) -> Result<Visit, WorkflowError> {
        let visit = self.active(token)?;
        if !visit.is_overstayed(now) {
            return Err(WorkflowError::InvalidState(format!(
                "visit {} is not overstayed",
                visit.id.0
            )));
        }

        match resolution {
            OverstayResolution::End => self.end_meeting(token),
            OverstayResolution::Extend { minutes } => self.extend(token, minutes),
        }
    }

    /// Latest visit for `token`, active or not.
    pub fn visit(&self, token: &Token) -> Result<Visit, WorkflowError> {
        self.visits
            .find_latest_by_token(token)?
            .ok_or_else(|| WorkflowError::NotFound(format!("no visit for token {token}")))
    }

    pub fn record_scan(&self, entry: AccessLogEntry) -> Result<(), WorkflowError> {
        ensure_token(&entry.token)?;
        if entry.location.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "scan location is required".to_string(),
            ));
        }

        debug!(token = %entry.token, location = %entry.location, status = ?entry.status, "access scan recorded");
        self.access_log.append(entry)?;
        Ok(())
    }

    pub fn current_location(&self, token: &Token) -> Result<String, WorkflowError> {
        let log = self.access_log.list()?;
        Ok(current_location(token, &log).to_string())
    }

    /// Every visit with its derived status, location and overstay actions.
    pub fn visit_board(&self, now: NaiveDateTime) -> Result<Vec<VisitBoardRow>, WorkflowError> {
        let visits = self.visits.list()?;
        let log = self.access_log.list()?;
        let index = LocationIndex::build(&log);

        Ok(visits
            .into_iter()
            .map(|visit| board_row(visit, now, &index))
            .collect())
    }

    /// Read-only snapshot of the visits awaiting an overstay decision.
    pub fn overstays(&self, now: NaiveDateTime) -> Result<Vec<VisitBoardRow>, WorkflowError> {
        let overstayed: Vec<VisitBoardRow> = self
            .visit_board(now)?
            .into_iter()
            .filter(|row| row.overstayed)
            .collect();

        if !overstayed.is_empty() {
            warn!(count = overstayed.len(), "visitors past their scheduled end");
        }
        Ok(overstayed)
    }

    fn extend(&self, token: &Token, additional_minutes: i64) -> Result<Visit, WorkflowError> {
        if additional_minutes <= 0 {
            return Err(WorkflowError::Validation(
                "extension must be a positive number of minutes".to_string(),
            ));
        }

        let visit = self.active(token)?;
        if visit.scheduled_end.is_none() {
            return Err(WorkflowError::InvalidState(format!(
                "visit {} has no scheduled end to extend",
                visit.id.0
            )));
        }

        let updated = self.visits.update(
            &visit.id,
            VisitPatch::ExtendBy {
                minutes: additional_minutes,
            },
        )?;
        info!(visit = %updated.id.0, minutes = additional_minutes, end = ?updated.scheduled_end, "stay extended");
        Ok(updated)
    }

    fn active(&self, token: &Token) -> Result<Visit, WorkflowError> {
        ensure_token(token)?;
        self.visits
            .find_active_by_token(token)?
            .ok_or_else(|| WorkflowError::NotFound(format!("no active visit for token {token}")))
    }
}

fn ensure_token(token: &Token) -> Result<(), WorkflowError> {
    if token.0.trim().is_empty() {
        return Err(WorkflowError::Validation("token is required".to_string()));
    }
    Ok(())
}

fn board_row(visit: Visit, now: NaiveDateTime, index: &LocationIndex<'_>) -> VisitBoardRow {
    let status = visit.status();
    let overstayed = visit.is_overstayed(now);
    let actions = if overstayed {
        vec![OverstayAction::EndMeeting, OverstayAction::ExtendStay]
    } else {
        Vec::new()
    };
    let current_location = index.location_of(&visit.token).to_string();

    VisitBoardRow {
        visit_id: visit.id,
        visitor_id: visit.visitor_id,
        appointment_id: visit.appointment_id,
        token: visit.token,
        status,
        status_label: status.label(),
        checkin_time: visit.checkin_time,
        checkout_time: visit.checkout_time,
        scheduled_end: visit.scheduled_end,
        current_location,
        overstayed,
        actions,
    }
}
