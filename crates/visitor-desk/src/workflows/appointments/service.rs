use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use super::domain::{
    Appointment, AppointmentId, ApprovalPrompt, ApprovalStatus, DecisionDraft, LocationId,
    NewAppointment,
};
use super::repository::{
    AppointmentFilter, AppointmentPage, AppointmentPatch, AppointmentRepository,
    LocationDirectory,
};
use crate::workflows::WorkflowError;

const MAX_PAGE_SIZE: usize = 200;

static APPOINTMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_appointment_id() -> AppointmentId {
    let id = APPOINTMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    AppointmentId(format!("apt-{id:06}"))
}

/// Owns the pending -> approved/declined transition of appointment requests.
///
/// Approval and decline are two-phase: `request_*` opens an uncommitted draft
/// while the approver picks a location or writes a reason, `confirm_*` commits
/// through a conditional store update and `cancel_*` drops the draft. Drafts
/// never touch the store.
pub struct AppointmentWorkflow<R, L> {
    repository: Arc<R>,
    locations: Arc<L>,
    drafts: Mutex<HashMap<AppointmentId, DecisionDraft>>,
}

impl<R, L> AppointmentWorkflow<R, L>
where
    R: AppointmentRepository + 'static,
    L: LocationDirectory + 'static,
{
    pub fn new(repository: Arc<R>, locations: Arc<L>) -> Self {
        Self {
            repository,
            locations,
            drafts: Mutex::new(HashMap::new()),
        }
    }

    /// Record a new pending request.
    pub fn create(&self, request: NewAppointment) -> Result<Appointment, WorkflowError> {
        let NewAppointment {
            requester,
            host_id,
            purpose,
            requested_date,
            requested_time,
            duration_minutes,
        } = request;

        if requester.name.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "requester name is required".to_string(),
            ));
        }
        if host_id.0.trim().is_empty() {
            return Err(WorkflowError::Validation("host is required".to_string()));
        }
        if purpose.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "meeting purpose is required".to_string(),
            ));
        }
        if duration_minutes == Some(0) {
            return Err(WorkflowError::Validation(
                "duration must be at least one minute".to_string(),
            ));
        }

        let record = Appointment {
            id: next_appointment_id(),
            requester,
            host_id,
            purpose: purpose.trim().to_string(),
            requested_date,
            requested_time,
            duration_minutes,
            approval_status: ApprovalStatus::Pending,
            location_id: None,
            decline_comment: None,
        };
        if record.duration_minutes.is_some() && record.scheduled_end().is_none() {
            return Err(WorkflowError::Validation(
                "meeting end falls outside the supported calendar range".to_string(),
            ));
        }

        let stored = self.repository.insert(record)?;
        info!(appointment = %stored.id, host = %stored.host_id.0, "appointment requested");
        Ok(stored)
    }

    pub fn get(&self, id: &AppointmentId) -> Result<Appointment, WorkflowError> {
        self.repository
            .find(id)?
            .ok_or_else(|| WorkflowError::NotFound(format!("appointment {id} does not exist")))
    }

    /// Open the location picker for a pending appointment.
    pub fn request_approval(&self, id: &AppointmentId) -> Result<ApprovalPrompt, WorkflowError> {
        let appointment = self.pending(id)?;
        let locations = self.locations.locations_for_host(&appointment.host_id)?;
        self.drafts()?
            .insert(id.clone(), DecisionDraft::AwaitingLocation);

        debug!(appointment = %id, options = locations.len(), "awaiting approval location");
        Ok(ApprovalPrompt {
            appointment,
            locations,
        })
    }

    /// Commit an approval. Without a location the record is left pending.
    pub fn confirm_approval(
        &self,
        id: &AppointmentId,
        location_id: Option<LocationId>,
    ) -> Result<Appointment, WorkflowError> {
        let location_id = match location_id {
            Some(location) if !location.0.trim().is_empty() => location,
            _ => {
                warn!(appointment = %id, "approval rejected: no location selected");
                return Err(WorkflowError::Validation(
                    "a location is required to approve an appointment".to_string(),
                ));
            }
        };

        let appointment = self.get(id)?;
        self.ensure_pending(&appointment)?;

        let available = self.locations.locations_for_host(&appointment.host_id)?;
        if !available.iter().any(|location| location.id == location_id) {
            warn!(appointment = %id, location = %location_id.0, "approval rejected: unknown location");
            return Err(WorkflowError::Validation(format!(
                "location {} is not available to host {}",
                location_id.0, appointment.host_id.0
            )));
        }

        let updated = self
            .repository
            .update(id, AppointmentPatch::approve(location_id))?;
        self.drafts()?.remove(id);

        info!(appointment = %id, location = ?updated.location_id, "appointment approved");
        Ok(updated)
    }

    /// Drop the approval draft. Calling it without a draft is a no-op.
    pub fn cancel_approval(&self, id: &AppointmentId) -> Result<(), WorkflowError> {
        self.clear_draft(id, DecisionDraft::AwaitingLocation)
    }

    /// Open the decline-reason prompt for a pending appointment.
    pub fn request_decline(&self, id: &AppointmentId) -> Result<Appointment, WorkflowError> {
        let appointment = self.pending(id)?;
        self.drafts()?
            .insert(id.clone(), DecisionDraft::AwaitingComment);

        debug!(appointment = %id, "awaiting decline comment");
        Ok(appointment)
    }

    /// Commit a decline. The comment must contain more than whitespace.
    pub fn confirm_decline(
        &self,
        id: &AppointmentId,
        comment: &str,
    ) -> Result<Appointment, WorkflowError> {
        let comment = comment.trim();
        if comment.is_empty() {
            warn!(appointment = %id, "decline rejected: empty comment");
            return Err(WorkflowError::Validation(
                "a comment is required to decline an appointment".to_string(),
            ));
        }

        let appointment = self.get(id)?;
        self.ensure_pending(&appointment)?;

        let updated = self
            .repository
            .update(id, AppointmentPatch::decline(comment.to_string()))?;
        self.drafts()?.remove(id);

        info!(appointment = %id, "appointment declined");
        Ok(updated)
    }

    pub fn cancel_decline(&self, id: &AppointmentId) -> Result<(), WorkflowError> {
        self.clear_draft(id, DecisionDraft::AwaitingComment)
    }

    /// Draft currently open for `id`, if any. Drafts left behind by an
    /// appointment that is no longer pending are dropped here.
    pub fn draft(&self, id: &AppointmentId) -> Result<Option<DecisionDraft>, WorkflowError> {
        let still_pending = matches!(
            self.repository.find(id)?,
            Some(appointment) if appointment.approval_status == ApprovalStatus::Pending
        );
        let mut drafts = self.drafts()?;
        if !still_pending {
            if drafts.remove(id).is_some() {
                debug!(appointment = %id, "dropped draft for resolved appointment");
            }
            return Ok(None);
        }
        Ok(drafts.get(id).copied())
    }

    pub fn list_by_status(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<AppointmentPage, WorkflowError> {
        if filter.page == 0 {
            return Err(WorkflowError::Validation(
                "page numbers start at 1".to_string(),
            ));
        }
        if filter.page_size == 0 || filter.page_size > MAX_PAGE_SIZE {
            return Err(WorkflowError::Validation(format!(
                "page size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        let page = self.repository.list(filter)?;
        debug!(total = page.total, returned = page.rows.len(), "listed appointments");
        Ok(page)
    }

    fn pending(&self, id: &AppointmentId) -> Result<Appointment, WorkflowError> {
        match self.repository.find(id)? {
            Some(appointment) if appointment.approval_status == ApprovalStatus::Pending => {
                Ok(appointment)
            }
            _ => Err(WorkflowError::NotFound(format!(
                "no pending appointment {id}"
            ))),
        }
    }

    fn drafts(&self) -> Result<MutexGuard<'_, HashMap<AppointmentId, DecisionDraft>>, WorkflowError> {
        self.drafts
            .lock()
            .map_err(|_| WorkflowError::Store("decision drafts lock poisoned".to_string()))
    }

    /// A terminal record cannot be decided again; any draft it still has is discarded.
    fn ensure_pending(&self, appointment: &Appointment) -> Result<(), WorkflowError> {
        if appointment.approval_status.is_terminal() {
            self.drafts()?.remove(&appointment.id);
            return Err(WorkflowError::Conflict(format!(
                "appointment {} is already {}",
                appointment.id,
                appointment.approval_status.label()
            )));
        }
        Ok(())
    }

    fn clear_draft(&self, id: &AppointmentId, kind: DecisionDraft) -> Result<(), WorkflowError> {
        let mut drafts = self.drafts()?;
        if drafts.get(id) == Some(&kind) {
            drafts.remove(id);
        }
        Ok(())
    }
}
