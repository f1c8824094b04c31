//! Due-date parsing and relative formatting.
//!
//! Accepted inputs: `today`, `tomorrow`, `+Nd`, `DD MM YY` and `DD MM YYYY`.

use chrono::{Datelike, Duration, NaiveDate};

/// Latest year accepted in the `DD MM YYYY` form
const MAX_YEAR: u32 = 9999;

pub const FORMATS_HINT: &str = "Formats: 'tomorrow', 'today', 'DD MM YY', or '+3d'";

/// Parse a due date relative to `today`. Returns `None` for anything unrecognised.
pub fn parse_due_date(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = input.trim().to_lowercase();
    if s.is_empty() {
        return None;
    }
    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return today.succ_opt(),
        _ => {}
    }

    if let Some(days) = s.strip_prefix('+').and_then(|rest| rest.strip_suffix('d')) {
        let days: i64 = days.parse().ok()?;
        return today.checked_add_signed(Duration::try_days(days)?);
    }

    let parts: Vec<&str> = s.split_whitespace().collect();
    if let [day, month, year] = parts.as_slice() {
        let day: u32 = day.parse().ok()?;
        let month: u32 = month.parse().ok()?;
        let mut year: u32 = year.parse().ok()?;
        if year < 100 {
            year += 2000;
        }
        if year > MAX_YEAR {
            return None;
        }
        return NaiveDate::from_ymd_opt(year as i32, month, day);
    }

    None
}

/// Format a date for task lists: `Today`, `Tomorrow`, `Yesterday`, a weekday
/// within the past week, `Next <weekday>` within the coming week, else
/// `Tue 15 Oct`.
pub fn format_relative(date: NaiveDate, today: NaiveDate) -> String {
    let delta = (date - today).num_days();
    match delta {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        -6..=-2 => date.format("%A").to_string(),
        2..=7 => format!("Next {}", date.format("%A")),
        _ => format!("{} {} {}", date.format("%a"), date.day(), date.format("%b")),
    }
}

/// Local calendar date
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_keywords() {
        let today = d(2025, 10, 15);
        assert_eq!(parse_due_date("today", today), Some(today));
        assert_eq!(parse_due_date(" Tomorrow ", today), Some(d(2025, 10, 16)));
    }

    #[test]
    fn test_parse_relative_days() {
        let today = d(2025, 12, 30);
        assert_eq!(parse_due_date("+3d", today), Some(d(2026, 1, 2)));
        assert_eq!(parse_due_date("+0d", today), Some(today));
        assert_eq!(parse_due_date("+xd", today), None);
    }

    #[test]
    fn test_parse_day_month_year() {
        let today = d(2025, 1, 1);
        assert_eq!(parse_due_date("15 10 25", today), Some(d(2025, 10, 15)));
        assert_eq!(parse_due_date("1 2 2027", today), Some(d(2027, 2, 1)));
        assert_eq!(parse_due_date("31 02 25", today), None);
    }

    #[test]
    fn test_parse_out_of_range_is_none() {
        let today = d(2025, 1, 1);
        assert_eq!(parse_due_date("+99999999999999d", today), None);
        assert_eq!(parse_due_date("+9223372036854775807d", today), None);
        assert_eq!(parse_due_date("+-99999999999999d", today), None);
        assert_eq!(parse_due_date("1 1 10000", today), None);
        assert_eq!(parse_due_date("1 1 -5", today), None);
        assert_eq!(parse_due_date("1 1 4294967295", today), None);
        assert_eq!(parse_due_date("31 12 9999", today), Some(d(9999, 12, 31)));
    }

    #[test]
    fn test_parse_garbage_is_none() {
        let today = d(2025, 1, 1);
        assert_eq!(parse_due_date("next week", today), None);
        assert_eq!(parse_due_date("", today), None);
        assert_eq!(parse_due_date("15/10/25", today), None);
    }

    #[test]
    fn test_format_relative() {
        // 2025-10-15 is a Wednesday
        let today = d(2025, 10, 15);
        assert_eq!(format_relative(today, today), "Today");
        assert_eq!(format_relative(d(2025, 10, 16), today), "Tomorrow");
        assert_eq!(format_relative(d(2025, 10, 14), today), "Yesterday");
        assert_eq!(format_relative(d(2025, 10, 13), today), "Monday");
        assert_eq!(format_relative(d(2025, 10, 20), today), "Next Monday");
        assert_eq!(format_relative(d(2025, 10, 28), today), "Tue 28 Oct");
    }
}
