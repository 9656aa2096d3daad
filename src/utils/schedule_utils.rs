/// Pure reminder offset and renewal utilities (Discord-agnostic)
use chrono::{DateTime, Days, Months, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Seconds counted per unit when bounding an offset
const SECONDS_PER_YEAR: i64 = 31_104_000;
const SECONDS_PER_MONTH: i64 = 2_592_000;
const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_MINUTE: i64 = 60;

/// Shortest and longest offset a reminder accepts
pub const MIN_OFFSET_SECONDS: i64 = SECONDS_PER_MINUTE;
pub const MAX_OFFSET_SECONDS: i64 = SECONDS_PER_YEAR;

/// Subtracted from every renewed trigger so a poll cycle can't skip it
pub const RENEWAL_LEAD_SECONDS: i64 = 5;

/// Calendar unit of a reminder offset, ordered largest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Year,
    Month,
    Day,
    Hour,
    Minute,
}

impl TimeUnit {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "year" | "y" => Some(TimeUnit::Year),
            "month" | "mo" => Some(TimeUnit::Month),
            "day" | "d" => Some(TimeUnit::Day),
            "hour" | "h" => Some(TimeUnit::Hour),
            "minute" | "m" => Some(TimeUnit::Minute),
            _ => None,
        }
    }

    fn approx_seconds(self) -> i64 {
        match self {
            TimeUnit::Year => SECONDS_PER_YEAR,
            TimeUnit::Month => SECONDS_PER_MONTH,
            TimeUnit::Day => SECONDS_PER_DAY,
            TimeUnit::Hour => SECONDS_PER_HOUR,
            TimeUnit::Minute => SECONDS_PER_MINUTE,
        }
    }
}

/// Error types for reminder offsets
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReminderOffsetError {
    #[error("This time seems to be invalid")]
    Malformed,
    #[error("1 minute into the future is the earliest you can set a reminder to!")]
    TooSoon,
    #[error("1 year into the future is the latest you can set a reminder to!")]
    TooLate,
}

/// A set of `(unit, value)` pairs such as `1d10h20m`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderOffset {
    values: BTreeMap<TimeUnit, u32>,
}

/// Split `1d10h` into alternating digit and letter runs
fn tokenize(raw: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start: Option<(usize, bool)> = None;

    for (index, c) in raw.char_indices() {
        let kind = if c.is_ascii_digit() {
            Some(true)
        } else if c.is_ascii_alphabetic() {
            Some(false)
        } else {
            None
        };

        match (start, kind) {
            (Some((_, current)), Some(next)) if current == next => {}
            (Some((from, _)), _) => {
                tokens.push(&raw[from..index]);
                start = kind.map(|k| (index, k));
            }
            (None, _) => start = kind.map(|k| (index, k)),
        }
    }
    if let Some((from, _)) = start {
        tokens.push(&raw[from..]);
    }
    tokens
}

impl ReminderOffset {
    /// Parse and bound an offset like `1d10h20m` or `2 month`
    pub fn parse(raw: &str) -> Result<Self, ReminderOffsetError> {
        let lowered = raw.to_lowercase();
        let tokens = tokenize(&lowered);
        if tokens.is_empty() || tokens.len() % 2 != 0 {
            return Err(ReminderOffsetError::Malformed);
        }

        let mut values = BTreeMap::new();
        for pair in tokens.chunks(2) {
            let value = pair[0]
                .parse::<u32>()
                .map_err(|_| ReminderOffsetError::Malformed)?;
            let unit = TimeUnit::parse(pair[1]).ok_or(ReminderOffsetError::Malformed)?;
            if value == 0 || values.insert(unit, value).is_some() {
                return Err(ReminderOffsetError::Malformed);
            }
        }

        let offset = Self { values };
        let seconds = offset.approx_seconds();
        if seconds < MIN_OFFSET_SECONDS {
            return Err(ReminderOffsetError::TooSoon);
        }
        if seconds > MAX_OFFSET_SECONDS {
            return Err(ReminderOffsetError::TooLate);
        }
        Ok(offset)
    }

    #[cfg(test)]
    pub fn get(&self, unit: TimeUnit) -> Option<u32> {
        self.values.get(&unit).copied()
    }

    /// Length of the offset with fixed-size months and years
    pub fn approx_seconds(&self) -> i64 {
        self.values
            .iter()
            .map(|(unit, value)| unit.approx_seconds() * *value as i64)
            .sum()
    }

    /// `from` moved forward by the offset using calendar arithmetic
    pub fn apply(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.values
            .iter()
            .try_fold(from, |at, (unit, value)| match unit {
                TimeUnit::Year => at.checked_add_months(Months::new(value.checked_mul(12)?)),
                TimeUnit::Month => at.checked_add_months(Months::new(*value)),
                TimeUnit::Day => at.checked_add_days(Days::new(*value as u64)),
                TimeUnit::Hour => at.checked_add_signed(TimeDelta::hours(*value as i64)),
                TimeUnit::Minute => at.checked_add_signed(TimeDelta::minutes(*value as i64)),
            })
    }

    /// Next trigger of a periodic reminder fired at `now`
    pub fn next_trigger(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.apply(now)?
            .checked_sub_signed(TimeDelta::seconds(RENEWAL_LEAD_SECONDS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("1d10h20m"), vec!["1", "d", "10", "h", "20", "m"]);
        assert_eq!(tokenize("2month"), vec!["2", "month"]);
        assert_eq!(tokenize("3-d"), vec!["3", "d"]);
        assert!(tokenize("--").is_empty());
    }

    #[test]
    fn test_parse_valid_offsets() {
        let offset = ReminderOffset::parse("1d10h20m").unwrap();
        assert_eq!(offset.get(TimeUnit::Day), Some(1));
        assert_eq!(offset.get(TimeUnit::Hour), Some(10));
        assert_eq!(offset.get(TimeUnit::Minute), Some(20));
        assert_eq!(offset.approx_seconds(), 86_400 + 36_000 + 1_200);

        let offset = ReminderOffset::parse("2MO").unwrap();
        assert_eq!(offset.get(TimeUnit::Month), Some(2));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(ReminderOffset::parse(""), Err(ReminderOffsetError::Malformed));
        assert_eq!(ReminderOffset::parse("10"), Err(ReminderOffsetError::Malformed));
        assert_eq!(ReminderOffset::parse("d10"), Err(ReminderOffsetError::Malformed));
        assert_eq!(ReminderOffset::parse("5w"), Err(ReminderOffsetError::Malformed));
        assert_eq!(ReminderOffset::parse("1h2h"), Err(ReminderOffsetError::Malformed));
        assert_eq!(ReminderOffset::parse("0d"), Err(ReminderOffsetError::Malformed));
        // Aliases of one unit count as a duplicate
        assert_eq!(ReminderOffset::parse("1d2day"), Err(ReminderOffsetError::Malformed));
    }

    #[test]
    fn test_parse_enforces_bounds() {
        assert!(ReminderOffset::parse("1m").is_ok());
        assert!(ReminderOffset::parse("1y").is_ok());
        assert_eq!(ReminderOffset::parse("1y1m"), Err(ReminderOffsetError::TooLate));
        assert_eq!(ReminderOffset::parse("13mo"), Err(ReminderOffsetError::TooLate));
        assert!(ReminderOffset::parse("12mo").is_ok());
    }

    #[test]
    fn test_apply_uses_calendar_months() {
        let offset = ReminderOffset::parse("1mo").unwrap();
        assert_eq!(offset.apply(at(2026, 1, 31, 9, 0)), Some(at(2026, 2, 28, 9, 0)));
        assert_eq!(offset.apply(at(2026, 3, 15, 9, 0)), Some(at(2026, 4, 15, 9, 0)));
    }

    #[test]
    fn test_next_trigger_for_one_day() {
        let offset = ReminderOffset::parse("1d").unwrap();
        let fired = at(2026, 5, 1, 12, 0);
        assert_eq!(
            offset.next_trigger(fired),
            Some(at(2026, 5, 2, 12, 0) - TimeDelta::seconds(5))
        );
    }

    #[test]
    fn test_next_trigger_is_after_fire_time() {
        let offset = ReminderOffset::parse("1m").unwrap();
        let fired = at(2026, 5, 1, 12, 0);
        assert!(offset.next_trigger(fired).unwrap() > fired);
    }

    #[test]
    fn test_offset_serializes_as_unit_map() {
        let offset = ReminderOffset::parse("1d10h").unwrap();
        let value = serde_json::to_value(&offset).unwrap();
        assert_eq!(value, serde_json::json!({ "day": 1, "hour": 10 }));

        let back: ReminderOffset = serde_json::from_value(value).unwrap();
        assert_eq!(back, offset);
    }

    proptest::proptest! {
        #[test]
        fn renewal_always_moves_forward(
            minutes in 1u32..=59,
            hours in 1u32..=23,
            days in 1u32..=28,
            start in 1_600_000_000i64..1_900_000_000,
        ) {
            let raw = format!("{}d{}h{}m", days, hours, minutes);
            let offset = ReminderOffset::parse(&raw).unwrap();
            let fired = DateTime::<Utc>::from_timestamp(start, 0).unwrap();
            let next = offset.next_trigger(fired).unwrap();
            proptest::prop_assert!(next > fired);
            proptest::prop_assert_eq!(
                (next - fired).num_seconds(),
                offset.approx_seconds() - 5
            );
        }
    }
}
