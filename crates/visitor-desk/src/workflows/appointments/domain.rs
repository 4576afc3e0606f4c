use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for appointment requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppointmentId(pub String);

/// Employee hosting the visit; approvals are scoped to the host's locations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub String);

impl std::fmt::Display for AppointmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of the person asking for the meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
}

impl Requester {
    /// Case-insensitive containment against every identity field.
    /// `needle` must already be lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        [Some(&self.id), Some(&self.name), Some(&self.email), self.company.as_ref()]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Declined,
}

impl ApprovalStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Declined => "declined",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, ApprovalStatus::Pending)
    }
}

/// A meeting request and its approval outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub requester: Requester,
    pub host_id: HostId,
    pub purpose: String,
    pub requested_date: NaiveDate,
    pub requested_time: NaiveTime,
    pub duration_minutes: Option<u32>,
    pub approval_status: ApprovalStatus,
    pub location_id: Option<LocationId>,
    pub decline_comment: Option<String>,
}

impl Appointment {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.requested_date.and_time(self.requested_time)
    }

    /// Start plus duration; `None` when the request carries no duration.
    /// `None` without a duration, or when start plus duration is not a
    /// representable timestamp (rejected at creation).
    pub fn scheduled_end(&self) -> Option<NaiveDateTime> {
        self.duration_minutes
            .and_then(|minutes| Duration::try_minutes(i64::from(minutes)))
            .and_then(|delta| self.starts_at().checked_add_signed(delta))
    }

    /// `location_id` is present iff approved, `decline_comment` iff declined.
    pub fn check_invariant(&self) -> Result<(), String> {
        let has_location = self
            .location_id
            .as_ref()
            .is_some_and(|location| !location.0.trim().is_empty());
        let has_comment = self
            .decline_comment
            .as_ref()
            .is_some_and(|comment| !comment.trim().is_empty());

        match (self.approval_status, has_location, has_comment) {
            (ApprovalStatus::Pending, false, false)
            | (ApprovalStatus::Approved, true, false)
            | (ApprovalStatus::Declined, false, true) => Ok(()),
            (ApprovalStatus::Approved, false, _) => {
                Err(format!("appointment {} cannot be approved without a location", self.id))
            }
            (ApprovalStatus::Declined, _, false) => {
                Err(format!("appointment {} cannot be declined without a comment", self.id))
            }
            (status, _, _) => Err(format!(
                "appointment {} carries fields that do not belong to status {}",
                self.id,
                status.label()
            )),
        }
    }
}

/// Intake payload for a new appointment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub requester: Requester,
    pub host_id: HostId,
    pub purpose: String,
    pub requested_date: NaiveDate,
    pub requested_time: NaiveTime,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

/// Meeting room or area a host may assign to an approved visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
}

/// Uncommitted secondary input an approver is currently providing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionDraft {
    AwaitingLocation,
    AwaitingComment,
}

impl DecisionDraft {
    pub const fn label(self) -> &'static str {
        match self {
            DecisionDraft::AwaitingLocation => "awaiting_location",
            DecisionDraft::AwaitingComment => "awaiting_comment",
        }
    }
}

/// Returned by `request_approval`: the pending record plus the picker options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalPrompt {
    pub appointment: Appointment,
    pub locations: Vec<Location>,
}
