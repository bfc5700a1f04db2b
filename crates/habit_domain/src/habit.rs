use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::streak;

pub type HabitId = u32;

const DEFAULT_HABITS: [(HabitId, &str, &str); 5] = [
    (1, "Morning Exercise", "habit-1"),
    (2, "Read 30 Minutes", "habit-2"),
    (3, "Meditate", "habit-3"),
    (4, "Drink 8 Glasses of Water", "habit-4"),
    (5, "No Late-Night Snacking", "habit-5"),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    pub color_tag: String,
    pub streak: u32,
    pub completed_today: bool,
    pub history: BTreeMap<NaiveDate, bool>,
}

impl Habit {
    pub fn new(id: HabitId, name: impl Into<String>, color_tag: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color_tag: color_tag.into(),
            streak: 0,
            completed_today: false,
            history: BTreeMap::new(),
        }
    }

    pub fn is_completed_on(&self, date: NaiveDate) -> bool {
        self.history.get(&date).copied().unwrap_or(false)
    }

    /// Re-derive `streak` and `completed_today` for the given current day.
    pub(crate) fn refresh(&mut self, current_day: NaiveDate, first_day: NaiveDate) {
        self.completed_today = self.is_completed_on(current_day);
        self.streak = streak::current_streak(|day| self.is_completed_on(day), current_day, first_day);
    }
}

/// The fixed starting list: zero streaks, nothing completed, empty history.
pub fn default_habits() -> Vec<Habit> {
    DEFAULT_HABITS
        .iter()
        .map(|(id, name, tag)| Habit::new(*id, *name, *tag))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_five_fresh_habits() {
        let habits = default_habits();
        assert_eq!(habits.len(), 5);
        assert_eq!(habits[2].name, "Meditate");
        assert_eq!(habits[4].color_tag, "habit-5");
        assert!(habits
            .iter()
            .all(|habit| habit.streak == 0 && !habit.completed_today && habit.history.is_empty()));
        let ids: Vec<HabitId> = habits.iter().map(|habit| habit.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn refresh_derives_flags_from_history() {
        let first = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let second = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let mut habit = Habit::new(9, "Stretch", "habit-1");
        habit.history.insert(first, true);
        habit.history.insert(second, true);

        habit.refresh(second, first);
        assert!(habit.completed_today);
        assert_eq!(habit.streak, 2);

        habit.history.insert(second, false);
        habit.refresh(second, first);
        assert!(!habit.completed_today);
        assert_eq!(habit.streak, 0);
    }
}
