//! Background jobs
//!
//! - [`retention`]: delete/anonymize records past their retention age
//! - [`rollup`]: daily analytics counts
//! - [`scheduler`]: periodic tick running both

pub mod retention;
pub mod rollup;
pub mod scheduler;

pub use retention::{run_retention_sweep, SweepReport};
pub use rollup::run_rollup;
pub use scheduler::{spawn_scheduler, Scheduler};
