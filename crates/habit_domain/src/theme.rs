use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// A saved preference wins; otherwise fall back to the system preference.
    pub fn resolve(saved: Option<Theme>, prefers_dark: bool) -> Self {
        match saved {
            Some(theme) => theme,
            None if prefers_dark => Theme::Dark,
            None => Theme::Light,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Accepts both the bare word and its JSON string form.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        serde_json::from_str(trimmed)
            .or_else(|_| serde_json::from_value(Value::String(trimmed.to_string())))
            .ok()
    }
}
