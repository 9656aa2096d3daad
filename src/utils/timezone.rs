use chrono::{
    DateTime, Days, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone,
    Timelike, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for timezone operations
#[derive(Debug, Error)]
pub enum TimezoneError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
    #[error("Date {day}/{month}/{year} doesn't exist")]
    DateDoesNotExist { day: u32, month: u32, year: i32 },
}

/// One identifier per distinct UTC offset, in the order inference walks them.
/// On equal distance the earlier entry wins.
const KNOWN_TIMEZONES: &[&str] = &[
    "Greenwich",
    "Europe/London",
    "Europe/Amsterdam",
    "Europe/Moscow",
    "Asia/Dubai",
    "Iran",
    "Asia/Tashkent",
    "Asia/Calcutta",
    "Asia/Katmandu",
    "Asia/Dhaka",
    "Asia/Yangon",
    "Asia/Saigon",
    "Singapore",
    "Australia/Eucla",
    "Japan",
    "Australia/Darwin",
    "Australia/Sydney",
    "Australia/Lord_Howe",
    "Pacific/Norfolk",
    "Pacific/Auckland",
    "Pacific/Chatham",
    "Pacific/Apia",
    "Pacific/Kiritimati",
    "US/Aleutian",
    "US/Alaska",
    "America/New_York",
    "Brazil/East",
    "Canada/Central",
    "America/El_Salvador",
    "US/Arizona",
    "Atlantic/South_Georgia",
    "Canada/Newfoundland",
    "Atlantic/Cape_Verde",
    "US/Hawaii",
    "US/Samoa",
    "Etc/GMT+12",
    "Pacific/Marquesas",
];

/// UTC instants (milliseconds) bounding one year's birthday
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthdayWindow {
    /// Local midnight of the birthday
    pub start: i64,
    /// Local midnight of the following day; the title role expires here
    pub end: i64,
    /// Three local days after `start`; the badge role expires here
    pub finalize: i64,
}

impl BirthdayWindow {
    /// Whether `now_ms` falls inside `[start, end]`
    pub fn contains(&self, now_ms: i64) -> bool {
        now_ms >= self.start && now_ms <= self.end
    }
}

#[derive(Debug, Clone)]
pub struct TimezoneEntry {
    pub name: &'static str,
    pub tz: Tz,
}

impl TimezoneEntry {
    /// Current UTC offset in minutes
    pub fn offset_minutes(&self, now: DateTime<Utc>) -> i32 {
        offset_minutes(&self.tz, now)
    }
}

/// The fixed set of timezones used to infer a user's zone from their clock
#[derive(Debug, Clone)]
pub struct TimezoneTable {
    entries: Vec<TimezoneEntry>,
}

impl TimezoneTable {
    pub fn standard() -> Self {
        let entries = KNOWN_TIMEZONES
            .iter()
            .filter_map(|name| match name.parse::<Tz>() {
                Ok(tz) => Some(TimezoneEntry { name, tz }),
                Err(_) => {
                    tracing::warn!("Skipping unknown timezone identifier {}", name);
                    None
                }
            })
            .collect();
        Self { entries }
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[TimezoneEntry] {
        &self.entries
    }

    /// Find the timezone whose wall clock currently reads closest to `hour:minute`.
    ///
    /// The claim is placed on the evaluator's (UTC) calendar day, moved one day
    /// back or forward when it is 12 hours or more away from the evaluator's
    /// own clock.
    pub fn infer(&self, hour: u32, minute: u32, now: DateTime<Utc>) -> Option<&TimezoneEntry> {
        let claimed = NaiveTime::from_hms_opt(hour, minute, 0)?;

        let evaluator_minutes = (now.hour() * 60 + now.minute()) as i64;
        let claimed_minutes = (hour * 60 + minute) as i64;
        let same_day = (evaluator_minutes - claimed_minutes).abs() < 12 * 60;

        let mut date = now.date_naive();
        if !same_day {
            date = if hour > now.hour() {
                date.pred_opt()?
            } else {
                date.succ_opt()?
            };
        }
        let local = date.and_time(claimed);

        let mut closest: Option<(&TimezoneEntry, i64)> = None;
        for entry in &self.entries {
            let Some(candidate) = entry.tz.from_local_datetime(&local).earliest() else {
                continue;
            };
            let distance = (now - candidate.with_timezone(&Utc))
                .num_milliseconds()
                .abs();
            if closest.is_none_or(|(_, best)| distance < best) {
                closest = Some((entry, distance));
            }
        }

        closest.map(|(entry, _)| entry)
    }
}

impl Default for TimezoneTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Parse a timezone string
pub fn parse_timezone(tz_str: &str) -> Result<Tz, TimezoneError> {
    tz_str
        .parse()
        .map_err(|_| TimezoneError::InvalidTimezone(tz_str.to_string()))
}

/// Timezone identifiers are shown with spaces, e.g. "America/New York"
pub fn display_timezone(name: &str) -> String {
    name.replace('_', " ")
}

/// Current UTC offset of `tz` in minutes
pub fn offset_minutes(tz: &Tz, now: DateTime<Utc>) -> i32 {
    tz.offset_from_utc_datetime(&now.naive_utc())
        .fix()
        .local_minus_utc()
        / 60
}

/// UTC instant of local midnight on `date`.
///
/// A midnight skipped by a DST jump resolves to the first instant after the gap.
fn local_midnight(date: NaiveDate, tz: &Tz) -> Option<DateTime<Utc>> {
    let midnight: NaiveDateTime = date.and_time(NaiveTime::MIN);
    let local = match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => tz
            .from_local_datetime(&(midnight + TimeDelta::hours(1)))
            .earliest()?,
    };
    Some(local.with_timezone(&Utc))
}

/// Compute the birthday window of `day/month` in `year`, local to `tz`
pub fn compute_window(
    day: u32,
    month: u32,
    tz: &Tz,
    year: i32,
) -> Result<BirthdayWindow, TimezoneError> {
    let missing = || TimezoneError::DateDoesNotExist { day, month, year };

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(missing)?;
    let start = local_midnight(date, tz).ok_or_else(missing)?;
    let end = date
        .checked_add_days(Days::new(1))
        .and_then(|d| local_midnight(d, tz))
        .ok_or_else(missing)?;
    let finalize = date
        .checked_add_days(Days::new(3))
        .and_then(|d| local_midnight(d, tz))
        .ok_or_else(missing)?;

    Ok(BirthdayWindow {
        start: start.timestamp_millis(),
        end: end.timestamp_millis(),
        finalize: finalize.timestamp_millis(),
    })
}

/// Same as [`compute_window`] with the timezone given by name
pub fn compute_window_in(
    day: u32,
    month: u32,
    timezone: &str,
    year: i32,
) -> Result<BirthdayWindow, TimezoneError> {
    let tz = parse_timezone(timezone)?;
    compute_window(day, month, &tz, year)
}
