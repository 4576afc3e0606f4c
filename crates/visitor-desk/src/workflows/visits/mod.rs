//! Visit lifecycle: token issuance, check-in/out, overstay detection and
//! resolution, and visitor location derived from access-control scans.

pub mod domain;
pub mod location;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    compute_status, is_overstayed, AccessLogEntry, AccessStatus, OverstayAction,
    OverstayResolution, Token, Visit, VisitBoardRow, VisitId, VisitStatus, VisitorId,
};
pub use location::{current_location, LocationIndex, RECEPTION};
pub use repository::{AccessLogRepository, VisitPatch, VisitRepository};
pub use router::visit_router;
pub use service::VisitLifecycle;
