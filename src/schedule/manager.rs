use chrono::{DateTime, Utc};
use tokio::time::{Duration, sleep};
use tracing::{error, info};

use super::birthday_tasks::{run_birthday_sweep, run_yearly_recompute};
use super::reminder_tasks::run_reminder_sweep;
use super::{Cadence, Schedule, ScheduleType};
use crate::constants::{BIRTHDAY_SWEEP_CRON, REMINDER_SWEEP_INTERVAL, YEARLY_RECOMPUTE_CRON};
use crate::models::{Data, Error};

/// Build the three sweeps with their default cadences
pub fn default_schedules(now: DateTime<Utc>) -> Result<Vec<Schedule>, Error> {
    Ok(vec![
        Schedule::new(
            ScheduleType::YearlyRecompute,
            Cadence::cron(YEARLY_RECOMPUTE_CRON)?,
            now,
        ),
        Schedule::new(
            ScheduleType::BirthdaySweep,
            Cadence::cron(BIRTHDAY_SWEEP_CRON)?,
            now,
        ),
        Schedule::new(
            ScheduleType::ReminderSweep,
            Cadence::Every(REMINDER_SWEEP_INTERVAL),
            now,
        ),
    ])
}

/// Start the schedule manager that runs the periodic sweeps
pub fn start_schedule_manager(data: Data) -> Result<(), Error> {
    let mut schedules = default_schedules(Utc::now())?;

    tokio::spawn(async move {
        info!("Schedule manager started");

        while let Some((index, wait_duration)) = find_next_schedule(&schedules, Utc::now()) {
            sleep(wait_duration).await;

            let schedule_type = schedules[index].schedule_type;
            let now = Utc::now();
            if let Err(e) = run_schedule(&data, schedule_type, now).await {
                error!("Failed to run {:?} schedule: {}", schedule_type, e);
            }
            schedules[index].advance(now);
        }

        info!("Schedule manager stopped: no upcoming schedules");
    });
    Ok(())
}

/// Index of the schedule due first and how long until it is due.
///
/// Ties go to the earlier schedule, so the recompute runs before the sweep sharing its instant.
pub fn find_next_schedule(schedules: &[Schedule], now: DateTime<Utc>) -> Option<(usize, Duration)> {
    schedules
        .iter()
        .enumerate()
        .filter_map(|(index, schedule)| {
            let next_run = schedule.next_run?;
            let wait_duration = (next_run - now).to_std().unwrap_or(Duration::ZERO);
            Some((index, next_run, wait_duration))
        })
        .min_by_key(|(index, next_run, _)| (*next_run, *index))
        .map(|(index, _, wait_duration)| (index, wait_duration))
}

/// Run a sweep based on its type
async fn run_schedule(
    data: &Data,
    schedule_type: ScheduleType,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    match schedule_type {
        ScheduleType::YearlyRecompute => run_yearly_recompute(data, now).await,
        ScheduleType::BirthdaySweep => run_birthday_sweep(data, now).await,
        ScheduleType::ReminderSweep => run_reminder_sweep(data, now).await,
    }
}
