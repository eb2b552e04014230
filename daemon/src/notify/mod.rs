//! Proactive notification module
//!
//! Provides the scheduled jobs (daily weather, battery check, news digest),
//! the actions they perform and the scheduler that fires them.

mod actions;
mod job;
mod scheduler;

pub use actions::ProactiveActions;
pub use scheduler::{NotificationScheduler, ScheduleSettings};
