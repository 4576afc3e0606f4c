use chrono::{NaiveDate, NaiveDateTime};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use visitor_desk::workflows::appointments::{AppointmentWorkflow, HostId, Location, LocationId};
use visitor_desk::workflows::memory::{
    InMemoryAccessLog, InMemoryAppointmentStore, InMemoryLocationDirectory, InMemoryVisitStore,
};
use visitor_desk::workflows::visits::VisitLifecycle;
use visitor_desk::workflows::RouteSettings;

pub(crate) type DeskWorkflow =
    AppointmentWorkflow<InMemoryAppointmentStore, InMemoryLocationDirectory>;
pub(crate) type DeskLifecycle =
    VisitLifecycle<InMemoryVisitStore, InMemoryAccessLog, InMemoryAppointmentStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Both engines over one shared appointment store.
#[derive(Clone)]
pub(crate) struct Desk {
    pub(crate) appointments: Arc<DeskWorkflow>,
    pub(crate) visits: Arc<DeskLifecycle>,
    pub(crate) settings: RouteSettings,
}

impl Desk {
    pub(crate) fn in_memory(directory: InMemoryLocationDirectory, settings: RouteSettings) -> Self {
        let store = Arc::new(InMemoryAppointmentStore::default());
        let appointments = Arc::new(AppointmentWorkflow::new(
            Arc::clone(&store),
            Arc::new(directory),
        ));
        let visits = Arc::new(VisitLifecycle::new(
            Arc::new(InMemoryVisitStore::default()),
            Arc::new(InMemoryAccessLog::default()),
            store,
        ));

        Self {
            appointments,
            visits,
            settings,
        }
    }
}

fn location(id: &str, name: &str) -> Location {
    Location {
        id: LocationId(id.to_string()),
        name: name.to_string(),
    }
}

/// Rooms available to the hosts known to a fresh in-memory desk.
pub(crate) fn seeded_directory() -> InMemoryLocationDirectory {
    InMemoryLocationDirectory::default()
        .with_locations(
            HostId("host-1".to_string()),
            vec![
                location("LOC-1", "Boardroom"),
                location("LOC-2", "Meeting Room 2"),
                location("LOC-3", "Lab"),
            ],
        )
        .with_locations(
            HostId("host-2".to_string()),
            vec![location("LOC-2", "Meeting Room 2"), location("LOC-4", "Cafe")],
        )
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn format_timestamp(value: Option<NaiveDateTime>) -> String {
    value
        .map(|value| value.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}
