//! Cron evaluation and the schedule supervisor

pub mod cron;
pub mod scheduler;
mod supervisor;

pub use self::cron::CronSchedule;
pub use self::scheduler::{Scheduler, SchedulerOptions};
