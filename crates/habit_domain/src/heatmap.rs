use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::CalendarDay;
use crate::date::{format_date, format_long_date};
use crate::habit::Habit;

const DEFAULT_PALETTE: [(&str, &str); 5] = [
    ("habit-1", "#4caf50"),
    ("habit-2", "#2196f3"),
    ("habit-3", "#9c27b0"),
    ("habit-4", "#ff9800"),
    ("habit-5", "#f44336"),
];

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum HeatTier {
    None,
    Low,
    Medium,
    High,
}

impl HeatTier {
    pub fn for_count(completed: usize) -> Self {
        match completed {
            0 => HeatTier::None,
            1..=2 => HeatTier::Low,
            3..=4 => HeatTier::Medium,
            _ => HeatTier::High,
        }
    }

    pub fn level(self) -> u8 {
        match self {
            HeatTier::None => 0,
            HeatTier::Low => 1,
            HeatTier::Medium => 2,
            HeatTier::High => 3,
        }
    }

    pub fn opacity(self) -> Option<f32> {
        match self {
            HeatTier::None => None,
            HeatTier::Low => Some(0.3),
            HeatTier::Medium => Some(0.6),
            HeatTier::High => Some(1.0),
        }
    }
}

/// Colour tag to base colour lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: BTreeMap<String, String>,
}

impl Palette {
    pub fn empty() -> Self {
        Self {
            colors: BTreeMap::new(),
        }
    }

    pub fn with_color(mut self, tag: impl Into<String>, color: impl Into<String>) -> Self {
        self.insert(tag, color);
        self
    }

    pub fn insert(&mut self, tag: impl Into<String>, color: impl Into<String>) {
        self.colors.insert(tag.into(), color.into());
    }

    pub fn base_color(&self, tag: &str) -> Option<&str> {
        self.colors.get(tag).map(String::as_str)
    }
}

impl Default for Palette {
    fn default() -> Self {
        let mut palette = Self::empty();
        for (tag, color) in DEFAULT_PALETTE {
            palette.insert(tag, color);
        }
        palette
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum HeatColor {
    Rgba { r: u8, g: u8, b: u8, alpha: f32 },
    /// Non-hex base colours are handed through untouched.
    Raw(String),
}

impl fmt::Display for HeatColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeatColor::Rgba { r, g, b, alpha } => write!(f, "rgba({r}, {g}, {b}, {alpha})"),
            HeatColor::Raw(raw) => f.write_str(raw),
        }
    }
}

/// Apply `opacity` to a `#RRGGBB` / `#RGB` colour.
pub fn blend(base: &str, opacity: f32) -> HeatColor {
    match parse_hex(base.trim()) {
        Some((r, g, b)) => HeatColor::Rgba {
            r,
            g,
            b,
            alpha: opacity,
        },
        None => HeatColor::Raw(base.to_string()),
    }
}

fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let digits = color.strip_prefix('#')?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match digits.len() {
        6 => Some((
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        )),
        3 => {
            let expand = |i: usize| channel(&digits[i..i + 1]).map(|v| v * 17);
            Some((expand(0)?, expand(1)?, expand(2)?))
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HeatCell {
    pub date: NaiveDate,
    pub date_key: String,
    pub completed: usize,
    pub tier: HeatTier,
    pub color_tag: Option<String>,
    pub color: Option<HeatColor>,
    pub tooltip: String,
}

/// Colour a day by how many habits were completed on it. The colour comes from
/// the habit at position `min(count, habits) - 1`, not from the habits done.
pub fn colorize(day: &CalendarDay, habits: &[Habit], palette: &Palette) -> HeatCell {
    let completed = day.completed_count();
    let tier = HeatTier::for_count(completed);

    let color_tag = if completed == 0 || habits.is_empty() {
        None
    } else {
        let index = completed.min(habits.len()) - 1;
        Some(habits[index].color_tag.clone())
    };
    let color = match (tier.opacity(), color_tag.as_deref()) {
        (Some(opacity), Some(tag)) => palette
            .base_color(tag)
            .map(|base| blend(base, opacity)),
        _ => None,
    };

    HeatCell {
        date: day.date,
        date_key: format_date(day.date),
        completed,
        tier,
        color_tag,
        color,
        tooltip: tooltip(day.date, completed),
    }
}

pub fn tooltip(date: NaiveDate, completed: usize) -> String {
    let heading = format_long_date(date);
    match completed {
        0 => format!("{heading}\nNo habits completed"),
        1 => format!("{heading}\n1 habit completed"),
        n => format!("{heading}\n{n} habits completed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::default_habits;

    fn day_with(count: usize) -> CalendarDay {
        let mut day = CalendarDay::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        for id in 1..=count as u32 {
            day.habit_completions.insert(id, true);
        }
        day
    }

    #[test]
    fn tier_boundaries() {
        let expected = [
            (0, 0),
            (1, 1),
            (2, 1),
            (3, 2),
            (4, 2),
            (5, 3),
            (6, 3),
        ];
        for (count, level) in expected {
            assert_eq!(HeatTier::for_count(count).level(), level, "count {count}");
        }
        assert_eq!(HeatTier::None.opacity(), None);
        assert_eq!(HeatTier::Low.opacity(), Some(0.3));
        assert_eq!(HeatTier::Medium.opacity(), Some(0.6));
        assert_eq!(HeatTier::High.opacity(), Some(1.0));
    }

    #[test]
    fn four_of_five_uses_fourth_habit_color() {
        let habits = default_habits();
        let cell = colorize(&day_with(4), &habits, &Palette::default());
        assert_eq!(cell.tier, HeatTier::Medium);
        assert_eq!(cell.color_tag.as_deref(), Some("habit-4"));
        assert_eq!(
            cell.color,
            Some(HeatColor::Rgba {
                r: 0xff,
                g: 0x98,
                b: 0x00,
                alpha: 0.6
            })
        );
        assert_eq!(cell.tooltip, "Wednesday, January 1, 2025\n4 habits completed");
    }

    #[test]
    fn empty_day_has_no_color() {
        let cell = colorize(&day_with(0), &default_habits(), &Palette::default());
        assert_eq!(cell.tier, HeatTier::None);
        assert_eq!(cell.color, None);
        assert_eq!(cell.color_tag, None);
        assert!(cell.tooltip.ends_with("No habits completed"));
    }

    #[test]
    fn count_above_habit_total_clamps_to_last_habit() {
        let habits: Vec<Habit> = default_habits().into_iter().take(2).collect();
        let cell = colorize(&day_with(3), &habits, &Palette::default());
        assert_eq!(cell.tier, HeatTier::Medium);
        assert_eq!(cell.color_tag.as_deref(), Some("habit-2"));
    }

    #[test]
    fn single_completion_tooltip_is_singular() {
        let cell = colorize(&day_with(1), &default_habits(), &Palette::default());
        assert!(cell.tooltip.ends_with("\n1 habit completed"));
        assert_eq!(cell.color.unwrap().to_string(), "rgba(76, 175, 80, 0.3)");
    }

    #[test]
    fn non_hex_colors_pass_through() {
        assert_eq!(
            blend("rgb(1, 2, 3)", 0.6),
            HeatColor::Raw("rgb(1, 2, 3)".into())
        );
        assert_eq!(blend("#zzzzzz", 1.0), HeatColor::Raw("#zzzzzz".into()));
        assert_eq!(blend("#fff", 1.0).to_string(), "rgba(255, 255, 255, 1)");

        let palette = Palette::empty().with_color("habit-1", "tomato");
        let cell = colorize(&day_with(1), &default_habits(), &palette);
        assert_eq!(cell.color, Some(HeatColor::Raw("tomato".into())));
    }
}
