use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

pub type FidgetId = String;

/// One widget placed on a tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FidgetInstance {
    pub id: FidgetId,
    pub fidget_type: String,
    #[serde(default)]
    pub config: FidgetConfig,
}

impl FidgetInstance {
    pub fn new(id: impl Into<FidgetId>, fidget_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fidget_type: fidget_type.into(),
            config: FidgetConfig::default(),
        }
    }

    pub fn kind(&self) -> FidgetKind {
        FidgetKind::from_type(&self.fidget_type)
    }

    /// Typed view over the settings for kinds with a known schema.
    pub fn settings_view(&self) -> SettingsView<'_> {
        self.config.settings.view(&self.kind())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FidgetConfig {
    #[serde(default = "default_editable")]
    pub editable: bool,
    #[serde(default)]
    pub settings: FidgetSettings,
    #[serde(default)]
    pub data: Map<String, Value>,
}

fn default_editable() -> bool {
    true
}

impl Default for FidgetConfig {
    fn default() -> Self {
        Self {
            editable: true,
            settings: FidgetSettings::default(),
            data: Map::new(),
        }
    }
}

/// Fidget types with a settings schema this crate understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FidgetKind {
    Text,
    Gallery,
    Links,
    Feed,
    Other(String),
}

impl FidgetKind {
    pub fn from_type(fidget_type: &str) -> Self {
        match fidget_type {
            "text" => FidgetKind::Text,
            "gallery" => FidgetKind::Gallery,
            "links" => FidgetKind::Links,
            "feed" => FidgetKind::Feed,
            other => FidgetKind::Other(other.to_string()),
        }
    }
}

/// Per-instance settings. Stored as an open key/value map so unknown and
/// legacy keys round-trip; [`FidgetSettings::view`] gives typed access.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FidgetSettings(pub Map<String, Value>);

impl FidgetSettings {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn view(&self, kind: &FidgetKind) -> SettingsView<'_> {
        let typed = match kind {
            FidgetKind::Text => self.decode().map(SettingsView::Text),
            FidgetKind::Gallery => self.decode().map(SettingsView::Gallery),
            FidgetKind::Links => self.decode().map(SettingsView::Links),
            FidgetKind::Feed => self.decode().map(SettingsView::Feed),
            FidgetKind::Other(_) => None,
        };
        typed.unwrap_or(SettingsView::Opaque(&self.0))
    }

    fn decode<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_value(Value::Object(self.0.clone())).ok()
    }
}

impl From<Map<String, Value>> for FidgetSettings {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

/// Settings decoded against a known schema, or the raw map when the kind is
/// unknown or the stored keys do not fit the schema.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsView<'a> {
    Text(TextSettings),
    Gallery(GallerySettings),
    Links(LinksSettings),
    Feed(FeedSettings),
    Opaque(&'a Map<String, Value>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSettings {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub font_color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GallerySettings {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub redirection_url: Option<String>,
    #[serde(default)]
    pub scale: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinksSettings {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub links: Vec<LinkEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkEntry {
    pub text: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSettings {
    #[serde(default)]
    pub feed_type: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}
