use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::workflows::appointments::AppointmentId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitorId(pub String);

/// Credential (RFID badge) bound to one approved appointment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(pub String);

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    NotArrived,
    CheckedIn,
    MeetingEnded,
}

impl VisitStatus {
    pub const fn label(self) -> &'static str {
        match self {
            VisitStatus::NotArrived => "Not Arrived",
            VisitStatus::CheckedIn => "Checked In",
            VisitStatus::MeetingEnded => "Meeting Ended",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, VisitStatus::MeetingEnded)
    }
}

/// Check-in record for one visitor against one appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    pub id: VisitId,
    pub visitor_id: VisitorId,
    pub appointment_id: AppointmentId,
    pub token: Token,
    pub checkin_time: Option<NaiveDateTime>,
    pub checkout_time: Option<NaiveDateTime>,
    pub manually_ended: bool,
    #[serde(default)]
    pub comments: String,
    /// Appointment end copied at issuance and pushed back by stay extensions.
    pub scheduled_end: Option<NaiveDateTime>,
}

impl Visit {
    pub fn status(&self) -> VisitStatus {
        compute_status(self.checkin_time, self.checkout_time, self.manually_ended)
    }

    pub fn is_overstayed(&self, now: NaiveDateTime) -> bool {
        is_overstayed(self, now)
    }
}

/// Status is derived from the stored fields on every read.
pub fn compute_status(
    checkin_time: Option<NaiveDateTime>,
    checkout_time: Option<NaiveDateTime>,
    manually_ended: bool,
) -> VisitStatus {
    if manually_ended || checkout_time.is_some() {
        VisitStatus::MeetingEnded
    } else if checkin_time.is_some() {
        VisitStatus::CheckedIn
    } else {
        VisitStatus::NotArrived
    }
}

/// A visitor who never arrived is never overstayed.
pub fn is_overstayed(visit: &Visit, now: NaiveDateTime) -> bool {
    if visit.status().is_terminal() || visit.checkin_time.is_none() {
        return false;
    }
    match visit.scheduled_end {
        Some(end) => now > end,
        None => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessStatus {
    Allowed,
    Denied,
}

/// One credential scan at a physical access point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLogEntry {
    pub token: Token,
    pub location: String,
    pub status: AccessStatus,
    pub timestamp: NaiveDateTime,
}

/// Host's answer once a visit is flagged as overstayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OverstayResolution {
    End,
    Extend { minutes: i64 },
}

/// Commands offered on the board for an overstayed visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverstayAction {
    EndMeeting,
    ExtendStay,
}

impl OverstayAction {
    pub const fn label(self) -> &'static str {
        match self {
            OverstayAction::EndMeeting => "End Meeting",
            OverstayAction::ExtendStay => "Extend Stay",
        }
    }
}

/// Row of the visit board: raw temporal values plus derived columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitBoardRow {
    pub visit_id: VisitId,
    pub visitor_id: VisitorId,
    pub appointment_id: AppointmentId,
    pub token: Token,
    pub status: VisitStatus,
    pub status_label: &'static str,
    pub checkin_time: Option<NaiveDateTime>,
    pub checkout_time: Option<NaiveDateTime>,
    pub scheduled_end: Option<NaiveDateTime>,
    pub current_location: String,
    pub overstayed: bool,
    pub actions: Vec<OverstayAction>,
}
