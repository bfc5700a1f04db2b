use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use egui::{Color32, RichText, Sense, Stroke, StrokeKind};
use habit_domain::{
    date::TrackedYear,
    habit::HabitId,
    heatmap::{HeatColor, HeatTier},
    storage::{FileStore, KeyValueStore, MemoryStore},
    streak::DEFAULT_PROGRESS_TARGET_DAYS,
    theme::Theme,
    AdvanceOutcome, HabitTracker,
};
use tracing::{debug, info, warn};

use crate::view::{self, CalendarCellView, CalendarMonthView, DashboardView, HabitCardView};

const CELL_SIZE: f32 = 12.0;
const CELL_GAP: f32 = 2.0;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub(crate) data_dir: PathBuf,
    pub(crate) tracked_year: i32,
    pub(crate) progress_target_days: u32,
    pub(crate) prefers_dark: bool,
    pub(crate) ephemeral: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var("HABIT_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }
        if let Ok(year) = std::env::var("HABIT_TRACKED_YEAR") {
            match parse_tracked_year(&year) {
                Some(value) => config.tracked_year = value,
                None => warn!(value = %year, "ignoring unusable HABIT_TRACKED_YEAR"),
            }
        }
        if let Ok(target) = std::env::var("HABIT_PROGRESS_TARGET_DAYS") {
            if let Ok(value) = target.trim().parse::<u32>() {
                config.progress_target_days = value.max(1);
            }
        }
        if let Ok(flag) = std::env::var("HABIT_PREFER_DARK") {
            config.prefers_dark = parse_flag(&flag);
        }
        if let Ok(flag) = std::env::var("HABIT_EPHEMERAL") {
            config.ephemeral = parse_flag(&flag);
        }
        Ok(config)
    }

    fn open_store(&self) -> Result<Box<dyn KeyValueStore>> {
        if self.ephemeral {
            info!("using in-memory storage");
            return Ok(Box::new(MemoryStore::new()));
        }
        let store = FileStore::open(&self.data_dir)
            .with_context(|| format!("unable to prepare {}", self.data_dir.display()))?;
        info!(path = %store.root().display(), "using file storage");
        Ok(Box::new(store))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".habit-heatmap");
        Self {
            data_dir,
            tracked_year: 2025,
            progress_target_days: DEFAULT_PROGRESS_TARGET_DAYS,
            prefers_dark: false,
            ephemeral: false,
        }
    }
}

fn parse_tracked_year(raw: &str) -> Option<i32> {
    let year = raw.trim().parse::<i32>().ok()?;
    TrackedYear::new(year).map(TrackedYear::year)
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

enum UiAction {
    ToggleHabit(HabitId),
    AdvanceDay,
    ToggleTheme,
}

struct HabitTrackerApp {
    tracker: HabitTracker,
    config: AppConfig,
    dashboard: DashboardView,
    status: String,
}

impl HabitTrackerApp {
    fn new(cc: &eframe::CreationContext<'_>, tracker: HabitTracker, config: AppConfig) -> Self {
        apply_theme(&cc.egui_ctx, tracker.theme());
        let dashboard = view::build_dashboard(&tracker, config.progress_target_days);
        Self {
            tracker,
            config,
            dashboard,
            status: String::from("Ready"),
        }
    }

    fn refresh(&mut self) {
        let start = Instant::now();
        self.dashboard = view::build_dashboard(&self.tracker, self.config.progress_target_days);
        debug!(elapsed_us = %start.elapsed().as_micros(), "dashboard refreshed");
    }

    fn apply(&mut self, ctx: &egui::Context, action: UiAction) {
        match action {
            UiAction::ToggleHabit(id) => match self.tracker.toggle_today(id) {
                Some(habit) => {
                    self.status = if habit.completed_today {
                        format!("{} done for today", habit.name)
                    } else {
                        format!("{} unmarked", habit.name)
                    };
                }
                None => self.status = String::from("Unable to locate habit"),
            },
            UiAction::AdvanceDay => match self.tracker.advance_day() {
                AdvanceOutcome::Advanced(day) => {
                    self.status = format!("Moved to day {} ({})", self.tracker.day_index(), day);
                }
                AdvanceOutcome::EndOfYear => {
                    self.status = String::from("Already on the last day of the year");
                }
            },
            UiAction::ToggleTheme => {
                let theme = self.tracker.toggle_theme();
                apply_theme(ctx, theme);
                self.status = format!("Switched to {} mode", theme.as_str());
            }
        }
        self.refresh();
    }
}

impl eframe::App for HabitTrackerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut actions: Vec<UiAction> = Vec::new();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Habit Heatmap");
                ui.separator();
                ui.label(&self.dashboard.date_heading);
                ui.separator();
                ui.label(format!("Day {}", self.dashboard.day_index));
                ui.label(format!("Total streak: {}", self.dashboard.total_streak));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let theme_label = match self.tracker.theme() {
                        Theme::Dark => "Light Mode",
                        Theme::Light => "Dark Mode",
                    };
                    if ui.button(theme_label).clicked() {
                        actions.push(UiAction::ToggleTheme);
                    }
                    if ui.button("Next Day").clicked() {
                        actions.push(UiAction::AdvanceDay);
                    }
                });
            });
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.label(&self.status);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                for card in &self.dashboard.cards {
                    if let Some(action) = habit_card(ui, card) {
                        actions.push(action);
                    }
                }
                ui.add_space(12.0);
                ui.heading("Activity");
                calendar_grid(ui, &self.dashboard.months);
            });
        });

        for action in actions {
            self.apply(ctx, action);
        }
    }
}

fn apply_theme(ctx: &egui::Context, theme: Theme) {
    let visuals = match theme {
        Theme::Dark => egui::Visuals::dark(),
        Theme::Light => egui::Visuals::light(),
    };
    ctx.set_visuals(visuals);
}

fn habit_card(ui: &mut egui::Ui, card: &HabitCardView) -> Option<UiAction> {
    let mut action = None;
    let accent = card
        .color
        .as_deref()
        .and_then(|hex| Color32::from_hex(hex).ok())
        .unwrap_or(ui.visuals().selection.bg_fill);
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.horizontal(|ui| {
            let mut checked = card.checked;
            if ui.checkbox(&mut checked, "").changed() {
                action = Some(UiAction::ToggleHabit(card.id));
            }
            ui.vertical(|ui| {
                ui.label(RichText::new(&card.name).strong());
                ui.label(&card.streak_label);
            });
            ui.add(
                egui::ProgressBar::new(card.progress)
                    .desired_width(180.0)
                    .fill(accent)
                    .text(format!("Progress {}", card.progress_label)),
            );
        });
    });
    action
}

fn calendar_grid(ui: &mut egui::Ui, months: &[CalendarMonthView]) {
    egui::ScrollArea::horizontal().show(ui, |ui| {
        ui.horizontal_top(|ui| {
            for month in months {
                ui.vertical(|ui| {
                    ui.label(RichText::new(month.name).small());
                    egui::Grid::new(("month", month.name))
                        .spacing([CELL_GAP, CELL_GAP])
                        .show(ui, |ui| {
                            for (index, cell) in month.cells.iter().enumerate() {
                                day_cell(ui, cell);
                                if index % 7 == 6 {
                                    ui.end_row();
                                }
                            }
                        });
                });
                ui.add_space(6.0);
            }
        });
    });
}

fn day_cell(ui: &mut egui::Ui, cell: &CalendarCellView) {
    let (rect, response) = ui.allocate_exact_size(egui::vec2(CELL_SIZE, CELL_SIZE), Sense::hover());
    let CalendarCellView::Day {
        tier,
        fill,
        tooltip,
        is_today,
        ..
    } = cell
    else {
        return;
    };

    let painter = ui.painter();
    let background = match fill {
        Some(color) => heat_color(color, *tier),
        None => ui.visuals().faint_bg_color,
    };
    painter.rect_filled(rect, 2.0, background);
    if *is_today {
        painter.rect_stroke(
            rect,
            2.0,
            Stroke::new(1.5, ui.visuals().strong_text_color()),
            StrokeKind::Inside,
        );
    }
    response.on_hover_text(tooltip);
}

fn heat_color(color: &HeatColor, tier: HeatTier) -> Color32 {
    match color {
        HeatColor::Rgba { r, g, b, alpha } => {
            Color32::from_rgba_unmultiplied(*r, *g, *b, (alpha * 255.0).round() as u8)
        }
        // egui cannot paint arbitrary CSS colour names; fall back to grey.
        HeatColor::Raw(_) => {
            let alpha = tier.opacity().unwrap_or(0.0);
            Color32::from_rgba_unmultiplied(128, 128, 128, (alpha * 255.0).round() as u8)
        }
    }
}

pub fn run(config: AppConfig) -> Result<()> {
    info!(
        year = config.tracked_year,
        data_dir = %config.data_dir.display(),
        "starting habit tracker"
    );
    let store = config.open_store()?;
    let tracker = HabitTracker::builder()
        .year(config.tracked_year)
        .prefers_dark(config.prefers_dark)
        .with_store(store)
        .build();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Habit Heatmap")
            .with_inner_size([1180.0, 760.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Habit Heatmap",
        options,
        Box::new(move |cc| Ok(Box::new(HabitTrackerApp::new(cc, tracker, config)))),
    )
    .map_err(|err| anyhow::anyhow!("{err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_common_truthy_values() {
        assert!(parse_flag("1"));
        assert!(parse_flag(" TRUE "));
        assert!(parse_flag("yes"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("nope"));
    }

    #[test]
    fn tracked_year_must_fit_the_calendar() {
        assert_eq!(parse_tracked_year(" 2024 "), Some(2024));
        assert_eq!(parse_tracked_year("300000"), None);
        assert_eq!(parse_tracked_year(&i32::MAX.to_string()), None);
        assert_eq!(parse_tracked_year("next year"), None);
    }

    #[test]
    fn default_config_tracks_2025() {
        let config = AppConfig::default();
        assert_eq!(config.tracked_year, 2025);
        assert_eq!(config.progress_target_days, 30);
        assert!(config.data_dir.ends_with(".habit-heatmap"));
        assert!(!config.ephemeral);
    }

    #[test]
    fn rgba_fill_maps_alpha_to_bytes() {
        let color = HeatColor::Rgba {
            r: 10,
            g: 20,
            b: 30,
            alpha: 0.6,
        };
        assert_eq!(
            heat_color(&color, HeatTier::Medium),
            Color32::from_rgba_unmultiplied(10, 20, 30, 153)
        );
        assert_eq!(
            heat_color(&HeatColor::Raw("tomato".into()), HeatTier::High),
            Color32::from_rgba_unmultiplied(128, 128, 128, 255)
        );
    }
}
