//! Cron-driven scheduling of prompt batches plus the `geo-tracker` configuration
//!
//! The [`Scheduler`] owns a supervisor task that decides which schedules run,
//! while each run delegates to the executor's batch runner.

pub mod config;
pub mod core;
pub mod error;

pub use crate::core::{CronSchedule, Scheduler, SchedulerOptions};
pub use config::AppConfig;
pub use error::{SchedulerError, SchedulerResult};
