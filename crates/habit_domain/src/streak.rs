use chrono::{Duration, NaiveDate};

pub const DEFAULT_PROGRESS_TARGET_DAYS: u32 = 30;

/// Length of the completion run that ends on `current_day`, walking backward
/// until a missed day or until the walk would leave the range at `first_day`.
pub fn current_streak(
    is_completed: impl Fn(NaiveDate) -> bool,
    current_day: NaiveDate,
    first_day: NaiveDate,
) -> u32 {
    let mut streak = 0;
    let mut day = current_day;
    while day >= first_day && is_completed(day) {
        streak += 1;
        match day.checked_sub_signed(Duration::days(1)) {
            Some(previous) => day = previous,
            None => break,
        }
    }
    streak
}

/// Streak progress toward `target_days`, as a percentage capped at 100.
pub fn progress_percent(streak: u32, target_days: u32) -> f32 {
    let target = target_days.max(1) as f32;
    (streak as f32 / target * 100.0).min(100.0)
}
