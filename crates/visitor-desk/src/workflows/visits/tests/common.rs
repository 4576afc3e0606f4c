use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::workflows::appointments::{
    Appointment, AppointmentId, AppointmentRepository, ApprovalStatus, HostId, LocationId,
    Requester,
};
use crate::workflows::memory::{InMemoryAccessLog, InMemoryAppointmentStore, InMemoryVisitStore};
use crate::workflows::visits::{
    AccessLogEntry, AccessStatus, Token, Visit, VisitLifecycle, VisitorId,
};
use crate::workflows::RouteSettings;

pub(super) type MemoryLifecycle =
    VisitLifecycle<InMemoryVisitStore, InMemoryAccessLog, InMemoryAppointmentStore>;

pub(super) struct Desk {
    pub(super) lifecycle: MemoryLifecycle,
    pub(super) appointments: Arc<InMemoryAppointmentStore>,
    pub(super) visits: Arc<InMemoryVisitStore>,
}

pub(super) fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 10, 1)
        .expect("valid date")
        .and_hms_opt(hour, minute, 0)
        .expect("valid time")
}

pub(super) fn token(raw: &str) -> Token {
    Token(raw.to_string())
}

pub(super) fn appointment(id: &str, status: ApprovalStatus) -> Appointment {
    Appointment {
        id: AppointmentId(id.to_string()),
        requester: Requester {
            id: "req-1".to_string(),
            name: "Jane Smith".to_string(),
            email: "jane@visitors.test".to_string(),
            company: None,
        },
        host_id: HostId("host-1".to_string()),
        purpose: "Lab tour".to_string(),
        requested_date: NaiveDate::from_ymd_opt(2025, 10, 1).expect("valid date"),
        requested_time: NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
        duration_minutes: Some(30),
        approval_status: status,
        location_id: match status {
            ApprovalStatus::Approved => Some(LocationId("LOC-3".to_string())),
            _ => None,
        },
        decline_comment: match status {
            ApprovalStatus::Declined => Some("Host unavailable".to_string()),
            _ => None,
        },
    }
}

pub(super) fn desk() -> Desk {
    let appointments = Arc::new(InMemoryAppointmentStore::default());
    let visits = Arc::new(InMemoryVisitStore::default());
    let access_log = Arc::new(InMemoryAccessLog::default());

    for (id, status) in [
        ("apt-approved", ApprovalStatus::Approved),
        ("apt-second", ApprovalStatus::Approved),
        ("apt-pending", ApprovalStatus::Pending),
    ] {
        appointments
            .insert(appointment(id, status))
            .expect("seed appointment");
    }

    let lifecycle = VisitLifecycle::new(visits.clone(), access_log, appointments.clone());
    Desk {
        lifecycle,
        appointments,
        visits,
    }
}

/// Issues `raw` against the approved appointment and checks the visitor in at 09:00.
pub(super) fn checked_in(desk: &Desk, raw: &str) -> Visit {
    desk.lifecycle
        .issue_token(
            &AppointmentId("apt-approved".to_string()),
            VisitorId(format!("visitor-{raw}")),
            token(raw),
        )
        .expect("token issued");
    desk.lifecycle
        .check_in(&token(raw), at(9, 0))
        .expect("checked in")
}

pub(super) fn scan(raw: &str, location: &str, status: AccessStatus, when: NaiveDateTime) -> AccessLogEntry {
    AccessLogEntry {
        token: token(raw),
        location: location.to_string(),
        status,
        timestamp: when,
    }
}

pub(super) fn fast_settings() -> RouteSettings {
    RouteSettings {
        store_timeout: Duration::from_millis(250),
        default_page_size: 10,
    }
}
