use serde::{Deserialize, Serialize};
use space_types::{ThemeProperties, ThemeSnapshot};
use std::collections::BTreeMap;

pub const DEFAULT_THEME_ID: &str = "default";

/// Shared theme table overlaid onto every tenant config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThemeLibrary(BTreeMap<String, ThemeSnapshot>);

impl ThemeLibrary {
    pub fn new(themes: impl IntoIterator<Item = ThemeSnapshot>) -> Self {
        Self(
            themes
                .into_iter()
                .map(|theme| (theme.id.clone(), theme))
                .collect(),
        )
    }

    /// Built-in table shipped with the application.
    pub fn shared() -> Self {
        Self::new([
            theme(
                DEFAULT_THEME_ID,
                "Default",
                "Inter",
                "#0f172a",
                "#ffffff",
                "#ffffff",
            ),
            theme(
                "nounish",
                "Nounish",
                "Londrina Solid",
                "#333333",
                "#e1d7d5",
                "#ffffff",
            ),
            theme("midnight", "Midnight", "Roboto", "#f1f5f9", "#020617", "#0f172a"),
            theme("retro", "Retro", "VT323", "#22c55e", "#000000", "#111111"),
        ])
    }

    pub fn get(&self, id: &str) -> Option<&ThemeSnapshot> {
        self.0.get(id)
    }

    pub fn default_theme(&self) -> Option<&ThemeSnapshot> {
        self.get(DEFAULT_THEME_ID)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ThemeLibrary {
    fn default() -> Self {
        Self::shared()
    }
}

fn theme(
    id: &str,
    name: &str,
    font: &str,
    font_color: &str,
    background: &str,
    fidget_background: &str,
) -> ThemeSnapshot {
    ThemeSnapshot {
        id: id.to_string(),
        name: name.to_string(),
        properties: ThemeProperties {
            font: Some(font.to_string()),
            font_color: Some(font_color.to_string()),
            headings_font: Some(font.to_string()),
            headings_font_color: Some(font_color.to_string()),
            background: Some(background.to_string()),
            fidget_background: Some(fidget_background.to_string()),
            fidget_border_width: Some("1px".to_string()),
            fidget_border_color: Some("#eeeeee".to_string()),
            fidget_shadow: Some("none".to_string()),
            fidget_border_radius: Some("12px".to_string()),
            grid_spacing: Some("16".to_string()),
            ..Default::default()
        },
    }
}
