/// Schedule management modules
mod birthday_tasks;
mod manager;
mod reminder_tasks;
mod types;

// Re-export public types and functions
pub use birthday_tasks::{announce_birthdays, recalculate_windows};
pub use manager::start_schedule_manager;
pub use reminder_tasks::run_reminder_sweep;
pub use types::{Cadence, Schedule, ScheduleType};
