use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use space_types::{TabDocument, TenantId};
use std::collections::BTreeMap;

use crate::themes::ThemeLibrary;

pub const HOME_PAGE_SLOT: &str = "home";
pub const EXPLORE_PAGE_SLOT: &str = "explore";

/// Normalized configuration of one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantConfig {
    pub tenant_id: TenantId,
    pub brand: BrandConfig,
    pub assets: AssetsConfig,
    /// Always the shared theme table, never per-tenant data.
    pub theme: ThemeLibrary,
    pub community: CommunityConfig,
    pub fidgets_allowlist: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation: Option<NavigationConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui: Option<UiConfig>,
    pub pages: BTreeMap<String, PageDefinition>,
    /// `pages["home"]`, for callers that predate the slot dictionary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_page: Option<PageDefinition>,
    /// `pages["explore"]`, for callers that predate the slot dictionary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explore_page: Option<PageDefinition>,
}

impl TenantConfig {
    pub fn page(&self, slot: &str) -> Option<&PageDefinition> {
        self.pages.get(slot)
    }

    pub fn is_fidget_allowed(&self, fidget_type: &str) -> bool {
        self.fidgets_allowlist.is_empty()
            || self.fidgets_allowlist.iter().any(|allowed| allowed == fidget_type)
    }

    /// Default tab of a page slot, used to seed a Space that has no tabs yet.
    pub fn initial_tab(&self, slot: &str) -> Option<(String, TabDocument)> {
        let page = self.page(slot)?;
        let doc = page.tabs.get(&page.default_tab)?;
        Some((page.default_tab.clone(), doc.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandConfig {
    pub display_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mini_app_tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetsConfig {
    pub logos: LogoSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoSet {
    pub main: String,
    pub icon: String,
    #[serde(default)]
    pub favicon: Option<String>,
    #[serde(default)]
    pub apple_touch: Option<String>,
    #[serde(default)]
    pub og: Option<String>,
    #[serde(default)]
    pub splash: Option<String>,
}

/// Community links and on-chain references. Governance and token blocks vary
/// per community and stay as open maps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityConfig {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub urls: BTreeMap<String, String>,
    #[serde(default)]
    pub social: BTreeMap<String, String>,
    #[serde(default)]
    pub contracts: BTreeMap<String, String>,
    #[serde(default)]
    pub governance: Map<String, Value>,
    #[serde(default)]
    pub tokens: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationConfig {
    #[serde(default)]
    pub items: Vec<NavItem>,
    #[serde(default)]
    pub logo_tooltip: Option<String>,
    #[serde(default)]
    pub show_music_player: Option<bool>,
    #[serde(default)]
    pub show_socials: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavItem {
    pub id: String,
    pub label: String,
    pub href: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub open_in_new_tab: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiConfig {
    #[serde(default)]
    pub primary_color: Option<String>,
    #[serde(default)]
    pub primary_hover_color: Option<String>,
    #[serde(default)]
    pub primary_active_color: Option<String>,
    #[serde(default)]
    pub font_color: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
}

/// A tenant-defined page: its tabs and their initial documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDefinition {
    pub default_tab: String,
    #[serde(default)]
    pub tab_order: Vec<String>,
    #[serde(default)]
    pub tabs: BTreeMap<String, TabDocument>,
}
