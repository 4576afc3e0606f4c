use std::sync::Arc;
use std::time::Duration;

use axum::response::Response;
use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;

use crate::workflows::appointments::{
    Appointment, AppointmentFilter, AppointmentId, AppointmentPage, AppointmentPatch,
    AppointmentRepository, AppointmentWorkflow, HostId, Location, LocationDirectory, LocationId,
    NewAppointment, Requester,
};
use crate::workflows::memory::{InMemoryAppointmentStore, InMemoryLocationDirectory};
use crate::workflows::{RepositoryError, RouteSettings};

pub(super) type MemoryWorkflow =
    AppointmentWorkflow<InMemoryAppointmentStore, InMemoryLocationDirectory>;

pub(super) fn host() -> HostId {
    HostId("host-1".to_string())
}

pub(super) fn meeting_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 1).expect("valid date")
}

pub(super) fn location(id: &str, name: &str) -> Location {
    Location {
        id: LocationId(id.to_string()),
        name: name.to_string(),
    }
}

pub(super) fn directory() -> InMemoryLocationDirectory {
    InMemoryLocationDirectory::default().with_locations(
        host(),
        vec![
            location("LOC-1", "Boardroom"),
            location("LOC-2", "Lab"),
            location("LOC-3", "Meeting Room 3"),
        ],
    )
}

pub(super) fn requester(name: &str) -> Requester {
    let slug = name.to_lowercase().replace(' ', ".");
    Requester {
        id: format!("req-{slug}"),
        name: name.to_string(),
        email: format!("{slug}@visitors.test"),
        company: None,
    }
}

pub(super) fn new_appointment(name: &str, date: NaiveDate, hour: u32) -> NewAppointment {
    NewAppointment {
        requester: requester(name),
        host_id: host(),
        purpose: "Project sync".to_string(),
        requested_date: date,
        requested_time: NaiveTime::from_hms_opt(hour, 0, 0).expect("valid time"),
        duration_minutes: Some(30),
    }
}

pub(super) fn build_workflow() -> (MemoryWorkflow, Arc<InMemoryAppointmentStore>) {
    let store = Arc::new(InMemoryAppointmentStore::default());
    let workflow = AppointmentWorkflow::new(store.clone(), Arc::new(directory()));
    (workflow, store)
}

pub(super) fn pending(workflow: &MemoryWorkflow, name: &str) -> Appointment {
    workflow
        .create(new_appointment(name, meeting_day(), 9))
        .expect("appointment created")
}

pub(super) fn fast_settings() -> RouteSettings {
    RouteSettings {
        store_timeout: Duration::from_millis(250),
        default_page_size: 10,
    }
}

pub(super) struct UnavailableStore;

impl AppointmentRepository for UnavailableStore {
    fn insert(&self, _record: Appointment) -> Result<Appointment, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find(&self, _id: &AppointmentId) -> Result<Option<Appointment>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _filter: &AppointmentFilter) -> Result<AppointmentPage, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(
        &self,
        _id: &AppointmentId,
        _patch: AppointmentPatch,
    ) -> Result<Appointment, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Answers correctly, but only after the router has given up.
pub(super) struct SlowStore(pub(super) InMemoryAppointmentStore);

impl AppointmentRepository for SlowStore {
    fn insert(&self, record: Appointment) -> Result<Appointment, RepositoryError> {
        self.0.insert(record)
    }

    fn find(&self, id: &AppointmentId) -> Result<Option<Appointment>, RepositoryError> {
        self.0.find(id)
    }

    fn list(&self, filter: &AppointmentFilter) -> Result<AppointmentPage, RepositoryError> {
        std::thread::sleep(Duration::from_millis(1_000));
        self.0.list(filter)
    }

    fn update(
        &self,
        id: &AppointmentId,
        patch: AppointmentPatch,
    ) -> Result<Appointment, RepositoryError> {
        self.0.update(id, patch)
    }
}

pub(super) struct EmptyDirectory;

impl LocationDirectory for EmptyDirectory {
    fn locations_for_host(&self, _host: &HostId) -> Result<Vec<Location>, RepositoryError> {
        Ok(Vec::new())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
