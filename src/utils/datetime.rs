/// Pure date/time utility functions (Discord-agnostic)
use chrono::{DateTime, Datelike, Utc};

/// A wall-clock reading supplied by a user, e.g. "14:25" or "5:40 pm"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTime {
    pub hour: u32,
    pub minute: u32,
    /// Whether the user wrote the time with an am/pm suffix
    pub twelve_hour: bool,
}

/// Number of days a month can have, February counted with its leap day
pub fn days_in_month(month: u32) -> Option<u32> {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => Some(31),
        4 | 6 | 9 | 11 => Some(30),
        2 => Some(29),
        _ => None,
    }
}

/// Validate if a month/day combination is valid
pub fn is_valid_date(month: u32, day: u32) -> bool {
    days_in_month(month).is_some_and(|max_day| (1..=max_day).contains(&day))
}

/// Feb 29 is stored as Feb 28 so the birthday exists every year
pub fn normalize_leap_day(day: u32, month: u32) -> (u32, u32) {
    if day == 29 && month == 2 {
        (28, 2)
    } else {
        (day, month)
    }
}

/// Get month name from month number (1-12)
pub fn get_month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}

/// Resolve an English month name or abbreviation (lowercase) to its number
pub fn month_from_name(name: &str) -> Option<u32> {
    let month = match name {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sept" | "sep" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Format a date as "MonthName Day" (e.g., "July 20")
pub fn format_date_display(month: u32, day: u32) -> String {
    format!("{} {}", get_month_name(month), day)
}

fn strip_ordinal_suffix(token: &str) -> &str {
    ["st", "nd", "rd", "th"]
        .iter()
        .find_map(|suffix| token.strip_suffix(suffix))
        .unwrap_or(token)
}

/// Parse a birth date written as `30/1`, `July 20` or `July 20th`.
///
/// Returns `(day, month)` with Feb 29 already normalized to Feb 28.
pub fn parse_birth_date(raw: &str) -> Option<(u32, u32)> {
    let text = raw.trim().to_lowercase();

    let (day, month) = if text.contains('/') {
        let parts: Vec<&str> = text.split('/').collect();
        if parts.len() != 2 {
            return None;
        }
        let day = parts[0].trim().parse::<u32>().ok()?;
        let month = parts[1].trim().parse::<u32>().ok()?;
        (day, month)
    } else {
        let parts: Vec<&str> = text.split_whitespace().collect();
        if parts.len() != 2 {
            return None;
        }
        let month = month_from_name(parts[0])?;
        let day = strip_ordinal_suffix(parts[1]).parse::<u32>().ok()?;
        (day, month)
    };

    if !is_valid_date(month, day) {
        return None;
    }

    Some(normalize_leap_day(day, month))
}

fn twelve_to_twenty_four(hour: u32, is_pm: bool) -> Option<u32> {
    match (hour, is_pm) {
        (0, _) => None,
        (12, true) => Some(12),
        (12, false) => Some(0),
        (h, true) => Some(h + 12),
        (h, false) => Some(h),
    }
}

fn split_hour_minute(text: &str) -> Option<(u32, u32)> {
    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() != 2 {
        return None;
    }
    Some((parts[0].parse().ok()?, parts[1].parse().ok()?))
}

/// Parse a wall-clock time written as `14:25` or `5:40 pm`
pub fn parse_clock_time(raw: &str) -> Option<ClockTime> {
    let text = raw.trim().to_lowercase();
    let twelve_hour = text.contains("am") || text.contains("pm");

    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();

    let (hour, minute) = if twelve_hour {
        let is_pm = compact.contains("pm");
        let stripped = compact.replace("am", "").replace("pm", "");
        let (hour, minute) = split_hour_minute(&stripped)?;
        if hour > 12 {
            return None;
        }
        (twelve_to_twenty_four(hour, is_pm)?, minute)
    } else {
        split_hour_minute(&compact)?
    };

    if hour > 23 || minute > 59 {
        return None;
    }

    Some(ClockTime {
        hour,
        minute,
        twelve_hour,
    })
}

/// Format a clock reading the way the user wrote it
pub fn format_clock(hour: u32, minute: u32, twelve_hour: bool) -> String {
    if !twelve_hour {
        return format!("{}:{:02}", hour, minute);
    }
    let suffix = if hour >= 12 { "PM" } else { "AM" };
    let display_hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02} {}", display_hour, minute, suffix)
}

/// Is `now` the first day of the year (in UTC)
pub fn is_new_years_day(now: DateTime<Utc>) -> bool {
    now.month() == 1 && now.day() == 1
}
