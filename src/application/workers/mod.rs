//! Long-running background tasks.

pub mod sweep_scheduler;
pub mod visit_worker;

pub use sweep_scheduler::run_sweep_scheduler;
pub use visit_worker::{VisitWorkerConfig, record_with_retry, run_visit_worker};
