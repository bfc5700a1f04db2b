pub mod calendar;
pub mod date;
pub mod habit;
pub mod heatmap;
pub mod persist;
pub mod service;
pub mod storage;
pub mod streak;
pub mod theme;

pub use crate::service::{AdvanceOutcome, HabitTracker, HabitTrackerBuilder, TrackerSnapshot};
