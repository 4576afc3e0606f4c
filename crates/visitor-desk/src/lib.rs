//! Front-desk visitor management: appointment approval, visit lifecycle and
//! overstay handling over pluggable stores.

pub mod config;
pub mod error;
pub mod export;
pub mod telemetry;
pub mod workflows;
