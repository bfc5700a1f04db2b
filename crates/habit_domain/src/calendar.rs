use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::date::{month_short_name, TrackedYear};
use crate::habit::HabitId;

pub const DAYS_PER_WEEK: u32 = 7;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub habit_completions: BTreeMap<HabitId, bool>,
}

impl CalendarDay {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            habit_completions: BTreeMap::new(),
        }
    }

    pub fn completed_count(&self) -> usize {
        self.habit_completions.values().filter(|done| **done).count()
    }
}

/// One entry per day of the tracked year, keyed by date.
pub type CalendarMap = BTreeMap<NaiveDate, CalendarDay>;

pub fn seed_calendar(year: TrackedYear) -> CalendarMap {
    year.days().map(|date| (date, CalendarDay::new(date))).collect()
}

/// Where a date sits in the month-per-column heatmap grid.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct GridPosition {
    /// 0-based month column.
    pub month_column: u32,
    pub row: u32,
    /// 0 = Sunday.
    pub weekday_column: u32,
    /// Index inside the month grid, counting leading blanks.
    pub cell_index: u32,
}

pub fn grid_position(date: NaiveDate) -> GridPosition {
    let leading = leading_blanks(date.year(), date.month());
    let cell_index = leading + date.day() - 1;
    GridPosition {
        month_column: date.month0(),
        row: cell_index / DAYS_PER_WEEK,
        weekday_column: cell_index % DAYS_PER_WEEK,
        cell_index,
    }
}

/// Blank cells before the 1st of the month, Sunday-first weeks.
pub fn leading_blanks(year: i32, month: u32) -> u32 {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|first| first.weekday().num_days_from_sunday())
        .unwrap_or(0)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let next_month_start = if month == 12 {
        year
            .checked_add(1)
            .and_then(|next_year| NaiveDate::from_ymd_opt(next_year, 1, 1))
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next_month_start
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(30)
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MonthLayout {
    pub month: u32,
    pub name: &'static str,
    pub leading_blanks: u32,
    pub days: Vec<NaiveDate>,
}

impl MonthLayout {
    pub fn rows(&self) -> u32 {
        (self.leading_blanks + self.days.len() as u32).div_ceil(DAYS_PER_WEEK)
    }
}

pub fn month_layout(year: i32, month: u32) -> MonthLayout {
    let days = (1..=days_in_month(year, month))
        .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
        .collect();
    MonthLayout {
        month,
        name: month_short_name(month),
        leading_blanks: leading_blanks(year, month),
        days,
    }
}

pub fn year_layout(year: TrackedYear) -> Vec<MonthLayout> {
    (1..=12).map(|month| month_layout(year.year(), month)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn seeds_one_empty_day_per_date() {
        let calendar = seed_calendar(TrackedYear::new(2025).unwrap());
        assert_eq!(calendar.len(), 365);
        assert!(calendar.values().all(|day| day.habit_completions.is_empty()));
        assert_eq!(seed_calendar(TrackedYear::new(2024).unwrap()).len(), 366);
    }

    #[test]
    fn january_2025_starts_on_wednesday() {
        assert_eq!(leading_blanks(2025, 1), 3);
        let first = grid_position(ymd(2025, 1, 1));
        assert_eq!(first.month_column, 0);
        assert_eq!(first.row, 0);
        assert_eq!(first.weekday_column, 3);

        // Sunday the 5th wraps to the second row.
        let fifth = grid_position(ymd(2025, 1, 5));
        assert_eq!(fifth.row, 1);
        assert_eq!(fifth.weekday_column, 0);
    }

    #[test]
    fn weekday_column_matches_real_weekday() {
        for date in TrackedYear::new(2025).unwrap().days() {
            let position = grid_position(date);
            assert_eq!(position.weekday_column, date.weekday().num_days_from_sunday());
        }
    }

    #[test]
    fn june_2025_starts_on_sunday() {
        let june = month_layout(2025, 6);
        assert_eq!(june.leading_blanks, 0);
        assert_eq!(june.days.len(), 30);
        assert_eq!(june.name, "Jun");
        assert_eq!(june.rows(), 5);
    }

    #[test]
    fn february_follows_leap_rules() {
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2025, 12), 31);
        assert_eq!(days_in_month(i32::MAX, 12), 30);
        let layout = year_layout(TrackedYear::new(2025).unwrap());
        assert_eq!(layout.len(), 12);
        let total: usize = layout.iter().map(|month| month.days.len()).sum();
        assert_eq!(total, 365);
    }

    #[test]
    fn counts_only_true_completions() {
        let mut day = CalendarDay::new(ymd(2025, 1, 1));
        day.habit_completions.insert(1, true);
        day.habit_completions.insert(2, false);
        day.habit_completions.insert(3, true);
        assert_eq!(day.completed_count(), 2);
    }
}
