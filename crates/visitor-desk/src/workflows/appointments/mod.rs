//! Appointment requests and their two-phase approval/decline workflow.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Appointment, AppointmentId, ApprovalPrompt, ApprovalStatus, DecisionDraft, HostId, Location,
    LocationId, NewAppointment, Requester,
};
pub use repository::{
    AppointmentFilter, AppointmentPage, AppointmentPatch, AppointmentRepository,
    LocationDirectory,
};
pub use router::appointment_router;
pub use service::AppointmentWorkflow;
