use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::calendar::CalendarMap;
use crate::date::{format_date, parse_date_key};
use crate::habit::{Habit, HabitId};

/// Serialized shape of the tracker state. Reading goes through
/// [`PersistedBlob::decode`].
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedBlob {
    pub habits: Vec<PersistedHabit>,
    pub calendar: BTreeMap<String, BTreeMap<HabitId, bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_day: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedHabit {
    pub id: HabitId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color_tag: Option<String>,
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub completed_today: bool,
    #[serde(default)]
    pub history: BTreeMap<String, bool>,
}

impl PersistedBlob {
    pub fn capture(habits: &[Habit], calendar: &CalendarMap, current_day: NaiveDate) -> Self {
        let habits = habits
            .iter()
            .map(|habit| PersistedHabit {
                id: habit.id,
                name: Some(habit.name.clone()),
                color_tag: Some(habit.color_tag.clone()),
                streak: habit.streak,
                completed_today: habit.completed_today,
                history: habit
                    .history
                    .iter()
                    .map(|(date, done)| (format_date(*date), *done))
                    .collect(),
            })
            .collect();
        let calendar = calendar
            .iter()
            .filter(|(_, day)| !day.habit_completions.is_empty())
            .map(|(date, day)| (format_date(*date), day.habit_completions.clone()))
            .collect();
        Self {
            habits,
            calendar,
            current_day: Some(format_date(current_day)),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Best-effort decode: every field that fails to parse is left at its
    /// default and malformed entries are skipped individually.
    pub fn decode(raw: &str) -> Self {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                debug!(%err, "persisted blob is not valid json");
                return Self::default();
            }
        };
        let Value::Object(fields) = value else {
            debug!("persisted blob is not an object");
            return Self::default();
        };

        let habits = match fields.get("habits") {
            Some(Value::Array(entries)) => entries
                .iter()
                .filter_map(|entry| serde_json::from_value::<PersistedHabit>(entry.clone()).ok())
                .collect(),
            _ => Vec::new(),
        };

        let mut calendar = BTreeMap::new();
        if let Some(Value::Object(days)) = fields.get("calendar") {
            for (key, completions) in days {
                let Value::Object(completions) = completions else {
                    continue;
                };
                let parsed: BTreeMap<HabitId, bool> = completions
                    .iter()
                    .filter_map(|(id, done)| Some((id.parse().ok()?, done.as_bool()?)))
                    .collect();
                calendar.insert(key.clone(), parsed);
            }
        }

        let current_day = fields
            .get("currentDay")
            .and_then(Value::as_str)
            .map(str::to_string);

        Self {
            habits,
            calendar,
            current_day,
        }
    }

    pub fn current_day(&self) -> Option<NaiveDate> {
        self.current_day.as_deref().and_then(parse_date_key)
    }
}
