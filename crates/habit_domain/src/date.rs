use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

const MONTH_SHORT_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Canonical `YYYY-MM-DD` key built from calendar fields.
pub fn format_date(date: NaiveDate) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        date.month(),
        date.day()
    )
}

/// Inverse of [`format_date`]. Only the exact zero-padded form is accepted.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    let trimmed = key.trim();
    if trimmed.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, DATE_KEY_FORMAT).ok()
}

/// Every date from `start` to `end`, inclusive and ascending.
pub fn dates_in_range(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let span = end.signed_duration_since(start).num_days();
    let count = if span < 0 { 0 } else { span + 1 };
    (0..count).map(move |offset| start + Duration::days(offset))
}

pub fn date_keys_in_range(start: NaiveDate, end: NaiveDate) -> Vec<String> {
    dates_in_range(start, end).map(format_date).collect()
}

/// `Wednesday, January 1, 2025`
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

/// Three-letter month label for a 1-based month.
pub fn month_short_name(month: u32) -> &'static str {
    MONTH_SHORT_NAMES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("???")
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TrackedYear(i32);

impl TrackedYear {
    /// `None` for years chrono cannot represent end to end.
    pub fn new(year: i32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, 1, 1)?;
        NaiveDate::from_ymd_opt(year, 12, 31)?;
        Some(Self(year))
    }

    pub fn year(self) -> i32 {
        self.0
    }

    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.0, 1, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.0, 12, 31).unwrap_or(NaiveDate::MAX)
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.0
    }

    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        dates_in_range(self.first_day(), self.last_day())
    }

    pub fn len(self) -> usize {
        self.last_day().ordinal() as usize
    }

    /// 1-based position of `date` inside the year, `None` outside it.
    pub fn day_index(self, date: NaiveDate) -> Option<u32> {
        self.contains(date).then(|| date.ordinal())
    }
}

impl Default for TrackedYear {
    fn default() -> Self {
        Self(2025)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn formats_with_zero_padding() {
        assert_eq!(format_date(ymd(2025, 1, 5)), "2025-01-05");
        assert_eq!(format_date(ymd(2025, 12, 31)), "2025-12-31");
        assert_eq!(format_date(ymd(987, 3, 9)), "0987-03-09");
    }

    #[test]
    fn every_tracked_day_survives_a_parse() {
        let year = TrackedYear::new(2025).unwrap();
        for date in year.days() {
            let key = format_date(date);
            let parsed = parse_date_key(&key).expect("key parses");
            assert_eq!(format_date(parsed), key);
        }
    }

    #[test]
    fn rejects_unpadded_and_garbage_keys() {
        assert_eq!(parse_date_key("2025-1-5"), None);
        assert_eq!(parse_date_key("2025-02-30"), None);
        assert_eq!(parse_date_key("yesterday"), None);
        assert_eq!(parse_date_key(""), None);
    }

    #[test]
    fn range_is_inclusive_and_ordered() {
        let keys = date_keys_in_range(ymd(2024, 12, 30), ymd(2025, 1, 2));
        assert_eq!(
            keys,
            vec!["2024-12-30", "2024-12-31", "2025-01-01", "2025-01-02"]
        );
        assert!(date_keys_in_range(ymd(2025, 1, 2), ymd(2025, 1, 1)).is_empty());
        assert_eq!(date_keys_in_range(ymd(2025, 1, 1), ymd(2025, 1, 1)).len(), 1);
    }

    #[test]
    fn tracked_year_bounds_and_leap_years() {
        let year = TrackedYear::new(2025).unwrap();
        assert_eq!(year.len(), 365);
        assert_eq!(year.days().count(), 365);
        assert_eq!(TrackedYear::new(2024).unwrap().len(), 366);
        assert_eq!(year.day_index(ymd(2025, 1, 1)), Some(1));
        assert_eq!(year.day_index(ymd(2025, 12, 31)), Some(365));
        assert_eq!(year.day_index(ymd(2026, 1, 1)), None);
        assert!(!year.contains(ymd(2024, 12, 31)));
    }

    #[test]
    fn rejects_years_outside_chrono_range() {
        assert!(TrackedYear::new(300_000).is_none());
        assert!(TrackedYear::new(i32::MAX).is_none());
        assert!(TrackedYear::new(-300_000).is_none());
        let year = TrackedYear::new(2025).unwrap();
        assert!(year.contains(year.first_day()));
        assert!(year.contains(year.last_day()));
    }

    #[test]
    fn long_dates_and_month_names() {
        assert_eq!(format_long_date(ymd(2025, 1, 1)), "Wednesday, January 1, 2025");
        assert_eq!(month_short_name(1), "Jan");
        assert_eq!(month_short_name(12), "Dec");
    }
}
