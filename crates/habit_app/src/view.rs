use chrono::NaiveDate;
use habit_domain::{
    calendar::{self, MonthLayout},
    date::{format_date, format_long_date},
    habit::{Habit, HabitId},
    heatmap::{HeatColor, HeatTier, Palette},
    streak, HabitTracker,
};

#[derive(Debug, Clone, PartialEq)]
pub struct HabitCardView {
    pub id: HabitId,
    pub name: String,
    pub checked: bool,
    pub streak_label: String,
    pub progress: f32,
    pub progress_label: String,
    pub color: Option<String>,
}

impl HabitCardView {
    fn from_habit(habit: &Habit, palette: &Palette, target_days: u32) -> Self {
        let percent = streak::progress_percent(habit.streak, target_days);
        Self {
            id: habit.id,
            name: habit.name.clone(),
            checked: habit.completed_today,
            streak_label: format!(
                "Current streak: {} day{}",
                habit.streak,
                if habit.streak == 1 { "" } else { "s" }
            ),
            progress: percent / 100.0,
            progress_label: format!("{}%", percent.round() as u32),
            color: palette.base_color(&habit.color_tag).map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalendarCellView {
    Blank,
    Day {
        date: NaiveDate,
        date_key: String,
        tier: HeatTier,
        fill: Option<HeatColor>,
        tooltip: String,
        is_today: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarMonthView {
    pub name: &'static str,
    pub cells: Vec<CalendarCellView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub date_heading: String,
    pub day_index: u32,
    pub total_streak: u32,
    pub cards: Vec<HabitCardView>,
    pub months: Vec<CalendarMonthView>,
}

/// Project the tracker into renderer-agnostic rows and cells.
pub fn build_dashboard(tracker: &HabitTracker, target_days: u32) -> DashboardView {
    let snapshot = tracker.snapshot();
    let cards = snapshot
        .habits
        .iter()
        .map(|habit| HabitCardView::from_habit(habit, tracker.palette(), target_days))
        .collect();
    let months = calendar::year_layout(snapshot.year)
        .iter()
        .map(|layout| build_month(tracker, layout, snapshot.current_day))
        .collect();

    DashboardView {
        date_heading: format_long_date(snapshot.current_day),
        day_index: snapshot.day_index,
        total_streak: snapshot.total_streak,
        cards,
        months,
    }
}

fn build_month(tracker: &HabitTracker, layout: &MonthLayout, today: NaiveDate) -> CalendarMonthView {
    let mut cells = vec![CalendarCellView::Blank; layout.leading_blanks as usize];
    cells.extend(layout.days.iter().map(|date| {
        let heat = tracker.heat_cell(*date);
        CalendarCellView::Day {
            date: *date,
            date_key: format_date(*date),
            tier: heat.tier,
            fill: heat.color,
            tooltip: heat.tooltip,
            is_today: *date == today,
        }
    }));
    CalendarMonthView {
        name: layout.name,
        cells,
    }
}
