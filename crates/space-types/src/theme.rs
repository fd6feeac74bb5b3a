use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Theme captured into a tab document at edit time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeSnapshot {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub properties: ThemeProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headings_font: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headings_font_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(
        default,
        rename = "backgroundHTML",
        skip_serializing_if = "Option::is_none"
    )]
    pub background_html: Option<String>,
    #[serde(default, rename = "musicURL", skip_serializing_if = "Option::is_none")]
    pub music_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fidget_background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fidget_border_width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fidget_border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fidget_shadow: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fidget_border_radius: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_spacing: Option<String>,
    /// Properties this model does not name yet; kept so they survive a
    /// load/commit cycle untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
