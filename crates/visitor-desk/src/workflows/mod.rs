pub mod appointments;
mod error;
pub mod http;
pub mod memory;
pub mod visits;

pub use error::{RepositoryError, WorkflowError};
pub use http::{run_bounded, RouteSettings};
