mod builtins;
pub mod error;
#[allow(clippy::module_inception)]
mod executor;
pub mod job_manager;

pub use executor::{Executor, Outcome};
pub use job_manager::JobManager;
