use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{Appointment, AppointmentId, ApprovalStatus, HostId, Location, LocationId};
use crate::workflows::RepositoryError;

/// Listing predicate plus the pagination window applied after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentFilter {
    #[serde(default)]
    pub host_id: Option<HostId>,
    #[serde(default)]
    pub status: Option<ApprovalStatus>,
    /// One-based page index.
    pub page: usize,
    pub page_size: usize,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl Default for AppointmentFilter {
    fn default() -> Self {
        Self {
            host_id: None,
            status: None,
            page: 1,
            page_size: 10,
            search: None,
            date: None,
        }
    }
}

impl AppointmentFilter {
    pub fn with_status(status: ApprovalStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Row predicate shared by the count and the page so they cannot drift.
    pub fn matches(&self, appointment: &Appointment) -> bool {
        if let Some(host) = &self.host_id {
            if &appointment.host_id != host {
                return false;
            }
        }
        if let Some(status) = self.status {
            if appointment.approval_status != status {
                return false;
            }
        }
        if let Some(date) = self.date {
            if appointment.requested_date != date {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                appointment.requester.matches(&needle.to_lowercase())
            }
            _ => true,
        }
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

/// One window of a filtered listing alongside the full match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppointmentPage {
    pub rows: Vec<Appointment>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

impl AppointmentPage {
    /// Builds a page from every row matching `filter`, in listing order.
    pub fn slice(matching: Vec<Appointment>, filter: &AppointmentFilter) -> Self {
        let total = matching.len();
        let rows = matching
            .into_iter()
            .skip(filter.offset())
            .take(filter.page_size)
            .collect();

        Self {
            rows,
            total,
            page: filter.page,
            page_size: filter.page_size,
        }
    }
}

/// Conditional update: applied only while the record still holds `expected_status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentPatch {
    pub expected_status: ApprovalStatus,
    pub approval_status: ApprovalStatus,
    pub location_id: Option<LocationId>,
    pub decline_comment: Option<String>,
}

impl AppointmentPatch {
    pub fn approve(location_id: LocationId) -> Self {
        Self {
            expected_status: ApprovalStatus::Pending,
            approval_status: ApprovalStatus::Approved,
            location_id: Some(location_id),
            decline_comment: None,
        }
    }

    pub fn decline(comment: String) -> Self {
        Self {
            expected_status: ApprovalStatus::Pending,
            approval_status: ApprovalStatus::Declined,
            location_id: None,
            decline_comment: Some(comment),
        }
    }

    /// Applies the patch in place, leaving `record` untouched on any error.
    pub fn apply(&self, record: &mut Appointment) -> Result<(), RepositoryError> {
        if record.approval_status != self.expected_status {
            return Err(RepositoryError::Conflict(format!(
                "appointment {} is already {}",
                record.id,
                record.approval_status.label()
            )));
        }

        let mut candidate = record.clone();
        candidate.approval_status = self.approval_status;
        candidate.location_id = self.location_id.clone();
        candidate.decline_comment = self.decline_comment.clone();
        candidate.check_invariant().map_err(RepositoryError::Rejected)?;

        *record = candidate;
        Ok(())
    }
}

/// Storage abstraction so the workflow can be exercised in isolation.
pub trait AppointmentRepository: Send + Sync {
    fn insert(&self, record: Appointment) -> Result<Appointment, RepositoryError>;
    fn find(&self, id: &AppointmentId) -> Result<Option<Appointment>, RepositoryError>;
    fn list(&self, filter: &AppointmentFilter) -> Result<AppointmentPage, RepositoryError>;
    /// Must apply the patch atomically with respect to other updates of `id`.
    fn update(
        &self,
        id: &AppointmentId,
        patch: AppointmentPatch,
    ) -> Result<Appointment, RepositoryError>;
}

/// Source of the locations each host may assign.
pub trait LocationDirectory: Send + Sync {
    fn locations_for_host(&self, host: &HostId) -> Result<Vec<Location>, RepositoryError>;
}
