use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::{
    calendar::{self, CalendarDay, CalendarMap},
    date::{format_date, parse_date_key, TrackedYear},
    habit::{self, Habit, HabitId},
    heatmap::{self, HeatCell, Palette},
    persist::PersistedBlob,
    storage::{KeyValueStore, MemoryStore, DATA_KEY, THEME_KEY},
    theme::Theme,
};

/// Read-only view handed to renderers.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TrackerSnapshot {
    pub year: TrackedYear,
    pub current_day: NaiveDate,
    pub day_index: u32,
    pub habits: Vec<Habit>,
    pub calendar: CalendarMap,
    pub total_streak: u32,
    pub theme: Theme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Advanced(NaiveDate),
    /// The pointer already sits on the last tracked day and stays there.
    EndOfYear,
}

pub struct HabitTracker {
    year: TrackedYear,
    habits: Vec<Habit>,
    calendar: CalendarMap,
    current_day: NaiveDate,
    theme: Theme,
    palette: Palette,
    prefers_dark: bool,
    store: Box<dyn KeyValueStore>,
}

pub struct HabitTrackerBuilder {
    year: TrackedYear,
    palette: Palette,
    prefers_dark: bool,
    store: Option<Box<dyn KeyValueStore>>,
}

impl HabitTrackerBuilder {
    pub fn new() -> Self {
        Self {
            year: TrackedYear::default(),
            palette: Palette::default(),
            prefers_dark: false,
            store: None,
        }
    }

    /// Years chrono cannot represent are ignored and the default is kept.
    pub fn year(mut self, year: i32) -> Self {
        match TrackedYear::new(year) {
            Some(tracked) => self.year = tracked,
            None => warn!(year, "unsupported tracked year, keeping default"),
        }
        self
    }

    pub fn with_store(mut self, store: Box<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// System preference used when no theme has been saved yet.
    pub fn prefers_dark(mut self, prefers_dark: bool) -> Self {
        self.prefers_dark = prefers_dark;
        self
    }

    pub fn build(self) -> HabitTracker {
        let store = self
            .store
            .unwrap_or_else(|| Box::new(MemoryStore::new()));
        let mut tracker = HabitTracker {
            year: self.year,
            habits: Vec::new(),
            calendar: CalendarMap::new(),
            current_day: self.year.first_day(),
            theme: Theme::resolve(None, self.prefers_dark),
            palette: self.palette,
            prefers_dark: self.prefers_dark,
            store,
        };
        tracker.initialize_defaults();
        let blob = tracker.read_key(DATA_KEY);
        tracker.load_persisted(blob.as_deref());
        tracker.load_theme();
        tracker
    }
}

impl Default for HabitTrackerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HabitTracker {
    pub fn builder() -> HabitTrackerBuilder {
        HabitTrackerBuilder::new()
    }

    /// Five fresh habits, an empty calendar for the whole year and the
    /// pointer back on January 1st.
    pub fn initialize_defaults(&mut self) {
        self.habits = habit::default_habits();
        self.calendar = calendar::seed_calendar(self.year);
        self.current_day = self.year.first_day();
        debug!(
            year = self.year.year(),
            days = self.calendar.len(),
            "initialized default habits"
        );
    }

    /// Overlay persisted state onto the current habits. Anything missing or
    /// unreadable keeps its default. Completions dated after the restored
    /// current day are dropped.
    #[instrument(skip(self, raw), fields(present = raw.is_some()))]
    pub fn load_persisted(&mut self, raw: Option<&str>) {
        let Some(raw) = raw else {
            debug!("no persisted state, keeping defaults");
            return;
        };
        let blob = PersistedBlob::decode(raw);
        let known: HashSet<HabitId> = self.habits.iter().map(|habit| habit.id).collect();

        if let Some(current) = blob.current_day().filter(|day| self.year.contains(*day)) {
            self.current_day = current;
        }

        for (key, completions) in &blob.calendar {
            let Some(day) = self.day_for_key_mut(key) else {
                continue;
            };
            for (id, done) in completions.iter().filter(|(id, _)| known.contains(*id)) {
                day.habit_completions.insert(*id, *done);
            }
        }

        for persisted in &blob.habits {
            let Some(index) = self.habit_index(persisted.id) else {
                debug!(id = persisted.id, "dropping unknown persisted habit");
                continue;
            };
            if let Some(name) = persisted.name.as_ref().filter(|name| !name.trim().is_empty()) {
                self.habits[index].name = name.clone();
            }
            if let Some(tag) = persisted.color_tag.as_ref().filter(|tag| !tag.trim().is_empty()) {
                self.habits[index].color_tag = tag.clone();
            }
            for (key, done) in &persisted.history {
                let Some(day) = self.day_for_key_mut(key) else {
                    continue;
                };
                day.habit_completions.entry(persisted.id).or_insert(*done);
            }
        }

        self.rebuild_histories();
        info!(
            current_day = %format_date(self.current_day),
            total_streak = self.total_streak(),
            "restored persisted state"
        );
    }

    /// Flip one habit's completion on `on_date`. Unknown habits, dates
    /// outside the tracked year and dates after the current day are ignored.
    #[instrument(skip(self), fields(date = %format_date(on_date)))]
    pub fn toggle_completion(&mut self, habit_id: HabitId, on_date: NaiveDate) -> Option<Habit> {
        let index = self.habit_index(habit_id)?;
        if !self.year.contains(on_date) {
            debug!("date outside tracked year, ignoring toggle");
            return None;
        }
        if on_date > self.current_day {
            debug!(
                current_day = %format_date(self.current_day),
                "date after current day, ignoring toggle"
            );
            return None;
        }

        let done = !self.habits[index].is_completed_on(on_date);
        self.habits[index].history.insert(on_date, done);
        self.calendar
            .entry(on_date)
            .or_insert_with(|| CalendarDay::new(on_date))
            .habit_completions
            .insert(habit_id, done);

        let (current_day, first_day) = (self.current_day, self.year.first_day());
        let habit = &mut self.habits[index];
        habit.refresh(current_day, first_day);
        info!(done, streak = habit.streak, "habit toggled");
        let updated = habit.clone();

        self.persist();
        Some(updated)
    }

    pub fn toggle_today(&mut self, habit_id: HabitId) -> Option<Habit> {
        self.toggle_completion(habit_id, self.current_day)
    }

    /// Move the simulated day forward by one. At December 31st the pointer
    /// is clamped and nothing changes.
    pub fn advance_day(&mut self) -> AdvanceOutcome {
        let next = match self.current_day.succ_opt() {
            Some(next) if self.year.contains(next) => next,
            _ => {
                info!(
                    current_day = %format_date(self.current_day),
                    "already on the last tracked day"
                );
                return AdvanceOutcome::EndOfYear;
            }
        };

        self.current_day = next;
        self.refresh_streaks();
        info!(
            current_day = %format_date(next),
            day_index = self.day_index(),
            "advanced to next day"
        );
        self.persist();
        AdvanceOutcome::Advanced(next)
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        if let Err(err) = self.store.set(THEME_KEY, self.theme.as_str()) {
            warn!(%err, "failed to persist theme preference");
        }
        self.theme
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn year(&self) -> TrackedYear {
        self.year
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn habit(&self, habit_id: HabitId) -> Option<&Habit> {
        self.habits.iter().find(|habit| habit.id == habit_id)
    }

    pub fn calendar(&self) -> &CalendarMap {
        &self.calendar
    }

    /// Completion data for a date; days outside the year have none.
    pub fn calendar_day(&self, date: NaiveDate) -> Option<&CalendarDay> {
        self.calendar.get(&date)
    }

    pub fn current_day(&self) -> NaiveDate {
        self.current_day
    }

    pub fn day_index(&self) -> u32 {
        self.year.day_index(self.current_day).unwrap_or(1)
    }

    pub fn total_streak(&self) -> u32 {
        self.habits.iter().map(|habit| habit.streak).sum()
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn heat_cell(&self, date: NaiveDate) -> HeatCell {
        match self.calendar.get(&date) {
            Some(day) => heatmap::colorize(day, &self.habits, &self.palette),
            None => heatmap::colorize(&CalendarDay::new(date), &self.habits, &self.palette),
        }
    }

    pub fn heatmap(&self) -> Vec<HeatCell> {
        self.calendar
            .values()
            .map(|day| heatmap::colorize(day, &self.habits, &self.palette))
            .collect()
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            year: self.year,
            current_day: self.current_day,
            day_index: self.day_index(),
            habits: self.habits.clone(),
            calendar: self.calendar.clone(),
            total_streak: self.total_streak(),
            theme: self.theme,
        }
    }
}

impl HabitTracker {
    fn habit_index(&self, habit_id: HabitId) -> Option<usize> {
        self.habits.iter().position(|habit| habit.id == habit_id)
    }

    /// Calendar slot for a persisted key, if it is not after the current day.
    fn day_for_key_mut(&mut self, key: &str) -> Option<&mut CalendarDay> {
        let date = parse_date_key(key).filter(|date| *date <= self.current_day)?;
        self.calendar.get_mut(&date)
    }

    /// The calendar is authoritative; habit histories mirror it.
    fn rebuild_histories(&mut self) {
        for habit in &mut self.habits {
            habit.history = self
                .calendar
                .iter()
                .filter_map(|(date, day)| {
                    day.habit_completions
                        .get(&habit.id)
                        .map(|done| (*date, *done))
                })
                .collect();
        }
        self.refresh_streaks();
    }

    fn refresh_streaks(&mut self) {
        let (current_day, first_day) = (self.current_day, self.year.first_day());
        for habit in &mut self.habits {
            habit.refresh(current_day, first_day);
        }
    }

    fn load_theme(&mut self) {
        let saved = self.read_key(THEME_KEY).as_deref().and_then(Theme::parse);
        self.theme = Theme::resolve(saved, self.prefers_dark);
    }

    fn read_key(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, %err, "failed to read persisted value");
                None
            }
        }
    }

    fn persist(&mut self) {
        let blob = PersistedBlob::capture(&self.habits, &self.calendar, self.current_day);
        let json = match blob.to_json() {
            Ok(json) => json,
            Err(err) => {
                warn!(%err, "failed to encode tracker state");
                return;
            }
        };
        if let Err(err) = self.store.set(DATA_KEY, &json) {
            warn!(%err, "failed to persist tracker state");
        }
    }
}
