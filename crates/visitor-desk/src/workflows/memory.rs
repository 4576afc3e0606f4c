//! Mutex-backed stores used by the demo binary, the HTTP service and tests.
//! Each store holds its lock for the whole of a conditional update, which is
//! what serializes competing writers on the same record.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use super::appointments::{
    Appointment, AppointmentFilter, AppointmentId, AppointmentPage, AppointmentPatch,
    AppointmentRepository, HostId, Location, LocationDirectory,
};
use super::visits::{
    AccessLogEntry, AccessLogRepository, Token, Visit, VisitId, VisitPatch, VisitRepository,
};
use super::RepositoryError;

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable(format!("{name} lock poisoned")))
}

#[derive(Default, Clone)]
pub struct InMemoryAppointmentStore {
    records: Arc<Mutex<BTreeMap<AppointmentId, Appointment>>>,
}

impl AppointmentRepository for InMemoryAppointmentStore {
    fn insert(&self, record: Appointment) -> Result<Appointment, RepositoryError> {
        let mut guard = lock(&self.records, "appointment store")?;
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict(format!(
                "appointment {} already exists",
                record.id
            )));
        }
        record.check_invariant().map_err(RepositoryError::Rejected)?;
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn find(&self, id: &AppointmentId) -> Result<Option<Appointment>, RepositoryError> {
        let guard = lock(&self.records, "appointment store")?;
        Ok(guard.get(id).cloned())
    }

    fn list(&self, filter: &AppointmentFilter) -> Result<AppointmentPage, RepositoryError> {
        let guard = lock(&self.records, "appointment store")?;
        let mut matching: Vec<Appointment> = guard
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        drop(guard);

        matching.sort_by(|a, b| (a.starts_at(), &a.id).cmp(&(b.starts_at(), &b.id)));
        Ok(AppointmentPage::slice(matching, filter))
    }

    fn update(
        &self,
        id: &AppointmentId,
        patch: AppointmentPatch,
    ) -> Result<Appointment, RepositoryError> {
        let mut guard = lock(&self.records, "appointment store")?;
        let record = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        patch.apply(record)?;
        Ok(record.clone())
    }
}

/// Static host -> locations table.
#[derive(Default, Clone)]
pub struct InMemoryLocationDirectory {
    by_host: Arc<Mutex<HashMap<HostId, Vec<Location>>>>,
}

impl InMemoryLocationDirectory {
    pub fn with_locations(self, host: HostId, locations: Vec<Location>) -> Self {
        if let Ok(mut guard) = self.by_host.lock() {
            guard.entry(host).or_default().extend(locations);
        }
        self
    }
}

impl LocationDirectory for InMemoryLocationDirectory {
    fn locations_for_host(&self, host: &HostId) -> Result<Vec<Location>, RepositoryError> {
        let guard = lock(&self.by_host, "location directory")?;
        Ok(guard.get(host).cloned().unwrap_or_default())
    }
}

/// Visits kept in insertion order so "latest for a token" is the last match.
#[derive(Default, Clone)]
pub struct InMemoryVisitStore {
    visits: Arc<Mutex<Vec<Visit>>>,
}

impl VisitRepository for InMemoryVisitStore {
    fn insert(&self, visit: Visit) -> Result<Visit, RepositoryError> {
        let mut guard = lock(&self.visits, "visit store")?;
        if guard.iter().any(|existing| existing.id == visit.id) {
            return Err(RepositoryError::Conflict(format!(
                "visit {} already exists",
                visit.id.0
            )));
        }
        if guard
            .iter()
            .any(|existing| existing.token == visit.token && !existing.status().is_terminal())
        {
            return Err(RepositoryError::Conflict(format!(
                "token {} already has an active visit",
                visit.token.0
            )));
        }
        guard.push(visit.clone());
        Ok(visit)
    }

    fn find_active_by_token(&self, token: &Token) -> Result<Option<Visit>, RepositoryError> {
        let guard = lock(&self.visits, "visit store")?;
        Ok(guard
            .iter()
            .rev()
            .find(|visit| &visit.token == token && !visit.status().is_terminal())
            .cloned())
    }

    fn find_latest_by_token(&self, token: &Token) -> Result<Option<Visit>, RepositoryError> {
        let guard = lock(&self.visits, "visit store")?;
        Ok(guard.iter().rev().find(|visit| &visit.token == token).cloned())
    }

    fn list(&self) -> Result<Vec<Visit>, RepositoryError> {
        let guard = lock(&self.visits, "visit store")?;
        Ok(guard.clone())
    }

    fn update(&self, id: &VisitId, patch: VisitPatch) -> Result<Visit, RepositoryError> {
        let mut guard = lock(&self.visits, "visit store")?;
        let visit = guard
            .iter_mut()
            .find(|visit| &visit.id == id)
            .ok_or(RepositoryError::NotFound)?;
        patch.apply(visit)?;
        Ok(visit.clone())
    }
}

/// Append-only scan log.
#[derive(Default, Clone)]
pub struct InMemoryAccessLog {
    entries: Arc<Mutex<Vec<AccessLogEntry>>>,
}

impl AccessLogRepository for InMemoryAccessLog {
    fn append(&self, entry: AccessLogEntry) -> Result<(), RepositoryError> {
        lock(&self.entries, "access log")?.push(entry);
        Ok(())
    }

    fn list(&self) -> Result<Vec<AccessLogEntry>, RepositoryError> {
        Ok(lock(&self.entries, "access log")?.clone())
    }
}
