use chrono::{DateTime, TimeDelta, Utc};
use std::str::FromStr;
use std::time::Duration;

/// Periodic sweep run by the schedule manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleType {
    /// Recompute every window once the year rolls over
    YearlyRecompute,
    /// Announce birthdays and walk the role lifecycle
    BirthdaySweep,
    /// Fire due reminders
    ReminderSweep,
}

/// When a sweep runs
#[derive(Debug, Clone)]
pub enum Cadence {
    /// Six-field cron expression evaluated in UTC (e.g. "0 */15 * * * *")
    Cron(cron::Schedule),
    /// Fixed delay after the previous run
    Every(Duration),
}

impl Cadence {
    pub fn cron(expression: &str) -> Result<Self, cron::error::Error> {
        cron::Schedule::from_str(expression).map(Cadence::Cron)
    }

    /// First firing strictly after `after`
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Cadence::Cron(schedule) => schedule.after(&after).next(),
            Cadence::Every(interval) => {
                after.checked_add_signed(TimeDelta::from_std(*interval).ok()?)
            }
        }
    }
}

/// A scheduled sweep and its next due instant
#[derive(Debug, Clone)]
pub struct Schedule {
    pub schedule_type: ScheduleType,
    pub cadence: Cadence,
    pub next_run: Option<DateTime<Utc>>,
}

impl Schedule {
    pub fn new(schedule_type: ScheduleType, cadence: Cadence, now: DateTime<Utc>) -> Self {
        let next_run = cadence.next_after(now);
        Self {
            schedule_type,
            cadence,
            next_run,
        }
    }

    /// Move `next_run` past `now`
    pub fn advance(&mut self, now: DateTime<Utc>) {
        self.next_run = self.cadence.next_after(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, min: u32, sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, h, min, sec).unwrap()
    }

    #[test]
    fn test_quarter_hour_cron() {
        let cadence = Cadence::cron("0 */15 * * * *").unwrap();
        assert_eq!(cadence.next_after(at(10, 7, 30)), Some(at(10, 15, 0)));
        assert_eq!(cadence.next_after(at(10, 15, 0)), Some(at(10, 30, 0)));
        assert_eq!(
            cadence.next_after(at(23, 50, 0)),
            Some(Utc.with_ymd_and_hms(2026, 5, 5, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_invalid_cron_is_rejected() {
        assert!(Cadence::cron("every quarter hour").is_err());
    }

    #[test]
    fn test_fixed_interval() {
        let cadence = Cadence::Every(Duration::from_secs(45));
        assert_eq!(cadence.next_after(at(10, 0, 0)), Some(at(10, 0, 45)));
    }

    #[test]
    fn test_schedule_advances() {
        let mut schedule = Schedule::new(
            ScheduleType::ReminderSweep,
            Cadence::Every(Duration::from_secs(45)),
            at(10, 0, 0),
        );
        assert_eq!(schedule.next_run, Some(at(10, 0, 45)));
        schedule.advance(at(10, 0, 50));
        assert_eq!(schedule.next_run, Some(at(10, 1, 35)));
    }
}
