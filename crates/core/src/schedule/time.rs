//! Time-slot labels for the schedule's left-hand column.

use once_cell::sync::Lazy;
use regex::Regex;

use super::TimeSettings;

static HOUR_DIGITS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)").expect("failed to compile hour regex"));

const PM_MARKERS: [&str; 2] = ["오후", "PM"];
const MINUTES_PER_DAY: u32 = 24 * 60;

/// Labels `h:mm-h:mm` for every time row.
///
/// Falls back to 1:00 in 30-minute steps when any start setting is blank or
/// unparsable.
pub fn slot_labels(settings: &TimeSettings) -> Vec<String> {
    let rows = settings.time_rows as usize;
    match parse_start(settings) {
        Some((hour, minute, interval)) => build_labels(hour, minute, interval, rows),
        None => build_labels(1, 0, 30, rows),
    }
}

/// Parse `"오전 9"`/`"오후 1"`/`"PM 3"` style hours into 0..24.
///
/// Hours past 23 (after the PM shift) are rejected.
pub fn parse_hour(raw: &str) -> Option<u32> {
    let digits = HOUR_DIGITS_RE.captures(raw)?.get(1)?.as_str();
    let mut hour: u32 = digits.parse().ok()?;
    if hour > 23 {
        return None;
    }
    let upper = raw.to_uppercase();
    let is_pm = PM_MARKERS.iter().any(|marker| upper.contains(marker));
    if is_pm && hour < 12 {
        hour += 12;
    }
    if !is_pm && hour == 12 {
        hour = 0;
    }
    Some(hour)
}

fn parse_start(settings: &TimeSettings) -> Option<(u32, u32, u32)> {
    if settings.start_hour.trim().is_empty()
        || settings.start_minute.trim().is_empty()
        || settings.interval.trim().is_empty()
    {
        return None;
    }
    let hour = parse_hour(&settings.start_hour)?;
    let minute: u32 = settings.start_minute.trim().parse().ok()?;
    let interval: u32 = settings.interval.trim().parse().ok()?;
    if minute > 59 || interval == 0 || interval > MINUTES_PER_DAY {
        return None;
    }
    Some((hour, minute, interval))
}

fn build_labels(hour: u32, minute: u32, interval: u32, rows: usize) -> Vec<String> {
    let mut total = (hour * 60 + minute) % MINUTES_PER_DAY;
    (0..rows)
        .map(|_| {
            let start = total;
            total = (total + interval) % MINUTES_PER_DAY;
            format!("{}-{}", format_clock(start), format_clock(total))
        })
        .collect()
}

fn format_clock(total_minutes: u32) -> String {
    let hour = (total_minutes / 60) % 24;
    let display = match hour {
        0 => 12,
        h if h > 12 => h - 12,
        h => h,
    };
    format!("{display}:{:02}", total_minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(hour: &str, minute: &str, interval: &str, rows: u32) -> TimeSettings {
        TimeSettings {
            start_hour: hour.into(),
            start_minute: minute.into(),
            interval: interval.into(),
            time_rows: rows,
        }
    }

    #[test]
    fn blank_settings_use_half_hour_defaults() {
        let labels = slot_labels(&settings("", "", "", 3));
        assert_eq!(labels, vec!["1:00-1:30", "1:30-2:00", "2:00-2:30"]);
    }

    #[test]
    fn afternoon_start_renders_twelve_hour_clock() {
        let labels = slot_labels(&settings("오후 1", "30", "50", 2));
        assert_eq!(labels, vec!["1:30-2:20", "2:20-3:10"]);
    }

    #[test]
    fn morning_noon_and_midnight_hours() {
        assert_eq!(parse_hour("오전 9"), Some(9));
        assert_eq!(parse_hour("오후 12"), Some(12));
        assert_eq!(parse_hour("오전 12"), Some(0));
        assert_eq!(parse_hour("pm 3"), Some(15));
        assert_eq!(parse_hour("오후"), None);
        let labels = slot_labels(&settings("오후 12", "00", "60", 2));
        assert_eq!(labels, vec!["12:00-1:00", "1:00-2:00"]);
    }

    #[test]
    fn out_of_range_settings_fall_back() {
        let defaults = vec!["1:00-1:30"];
        assert_eq!(slot_labels(&settings("오후 1", "4294967295", "30", 1)), defaults);
        assert_eq!(slot_labels(&settings("오후 1", "60", "30", 1)), defaults);
        assert_eq!(slot_labels(&settings("오후 1", "00", "4000000000", 1)), defaults);
        assert_eq!(slot_labels(&settings("오후 1", "00", "1441", 1)), defaults);
        assert_eq!(slot_labels(&settings("오후 1", "00", "0", 1)), defaults);
        assert_eq!(slot_labels(&settings("오후 24", "00", "30", 1)), defaults);
        assert_eq!(parse_hour("오후 4294967290"), None);
        assert_eq!(parse_hour("99999999999999999999"), None);
        assert_eq!(parse_hour("오후 13"), Some(13));
    }

    #[test]
    fn labels_wrap_past_midnight() {
        let labels = slot_labels(&settings("오후 11", "00", "1440", 2));
        assert_eq!(labels, vec!["11:00-11:00", "11:00-11:00"]);
        let labels = slot_labels(&settings("오후 11", "30", "60", 2));
        assert_eq!(labels, vec!["11:30-12:30", "12:30-1:30"]);
    }

    #[test]
    fn zero_rows_have_no_labels() {
        assert!(slot_labels(&settings("오전 9", "00", "30", 0)).is_empty());
        assert!(slot_labels(&settings("", "", "", 0)).is_empty());
    }

    #[test]
    fn unparsable_interval_falls_back() {
        let labels = slot_labels(&settings("오전 9", "00", "abc", 1));
        assert_eq!(labels, vec!["1:00-1:30"]);
    }
}
