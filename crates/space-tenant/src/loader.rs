use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use space_types::TenantId;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use crate::config::{
    AssetsConfig, BrandConfig, CommunityConfig, EXPLORE_PAGE_SLOT, HOME_PAGE_SLOT,
    NavigationConfig, PageDefinition, TenantConfig, UiConfig,
};
use crate::error::TenantConfigError;
use crate::themes::ThemeLibrary;

/// Source of raw tenant records (an RPC against the tenant table).
#[async_trait]
pub trait TenantRecordStore: Send + Sync {
    async fn get_active_tenant_config(&self, tenant: &TenantId) -> anyhow::Result<Option<Value>>;
}

/// In-memory record table.
#[derive(Debug, Clone, Default)]
pub struct MemTenantRecords {
    records: Arc<RwLock<HashMap<TenantId, Value>>>,
}

impl MemTenantRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, tenant: impl Into<TenantId>, record: Value) {
        self.records
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(tenant.into(), record);
    }
}

#[async_trait]
impl TenantRecordStore for MemTenantRecords {
    async fn get_active_tenant_config(&self, tenant: &TenantId) -> anyhow::Result<Option<Value>> {
        let guard = self
            .records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(guard.get(tenant).cloned())
    }
}

pub struct TenantConfigLoader<R> {
    records: R,
    themes: ThemeLibrary,
}

impl<R: TenantRecordStore> TenantConfigLoader<R> {
    pub fn new(records: R) -> Self {
        Self::with_themes(records, ThemeLibrary::shared())
    }

    pub fn with_themes(records: R, themes: ThemeLibrary) -> Self {
        Self { records, themes }
    }

    pub fn themes(&self) -> &ThemeLibrary {
        &self.themes
    }

    pub async fn load(&self, tenant: &TenantId) -> Result<TenantConfig, TenantConfigError> {
        let raw = self
            .records
            .get_active_tenant_config(tenant)
            .await
            .map_err(|source| TenantConfigError::Store {
                tenant: tenant.clone(),
                source,
            })?;
        let raw = match raw {
            Some(Value::Null) | None => {
                tracing::warn!(tenant = %tenant, "no active tenant config");
                return Err(TenantConfigError::ConfigNotFound(tenant.clone()));
            }
            Some(raw) => raw,
        };
        match normalize_record(tenant, &raw, &self.themes) {
            Ok(config) => {
                tracing::info!(
                    tenant = %tenant,
                    pages = config.pages.len(),
                    "loaded tenant config"
                );
                Ok(config)
            }
            Err(err) => {
                tracing::warn!(tenant = %tenant, error = %err, "rejected tenant config");
                Err(err)
            }
        }
    }
}

/// Turn a raw tenant record into a [`TenantConfig`].
///
/// Folds legacy column names and page fields into the current schema, takes
/// theming from `themes` and mirrors the `home`/`explore` page slots onto the
/// named accessors. The record is only read.
pub fn normalize_record(
    tenant: &TenantId,
    raw: &Value,
    themes: &ThemeLibrary,
) -> Result<TenantConfig, TenantConfigError> {
    let invalid = |reason: String| TenantConfigError::ConfigInvalid {
        tenant: tenant.clone(),
        reason,
    };
    let record = raw
        .as_object()
        .ok_or_else(|| invalid("record is not an object".into()))?;

    let brand: BrandConfig = pick(record, &["brand", "brandConfig", "brand_config"])
        .ok_or_else(|| invalid("missing brand".into()))
        .and_then(|value| decode(tenant, "brand", value))?;
    let assets: AssetsConfig = pick(record, &["assets", "assetsConfig", "assets_config"])
        .ok_or_else(|| invalid("missing assets".into()))
        .and_then(|value| decode(tenant, "assets", value))?;

    let community: CommunityConfig =
        match pick(record, &["community", "communityConfig", "community_config"]) {
            Some(value) => decode(tenant, "community", value)?,
            None => CommunityConfig::default(),
        };
    let navigation: Option<NavigationConfig> =
        match pick(record, &["navigation", "navigationConfig", "navigation_config"]) {
            Some(value) => Some(decode(tenant, "navigation", value)?),
            None => None,
        };
    let ui: Option<UiConfig> = match pick(record, &["ui", "uiConfig", "ui_config"]) {
        Some(value) => Some(decode(tenant, "ui", value)?),
        None => None,
    };
    let fidgets_allowlist = match pick(
        record,
        &["fidgetsAllowlist", "fidgets", "fidgetsConfig", "fidgets_config"],
    ) {
        Some(value) => allowlist(value).ok_or_else(|| invalid("malformed fidgets".into()))?,
        None => Vec::new(),
    };

    let mut pages: BTreeMap<String, PageDefinition> = match pick(record, &["pages"]) {
        Some(value) => decode(tenant, "pages", value)?,
        None => BTreeMap::new(),
    };
    for (slot, keys) in [
        (HOME_PAGE_SLOT, ["homePage", "home_page"]),
        (EXPLORE_PAGE_SLOT, ["explorePage", "explore_page"]),
    ] {
        if pages.contains_key(slot) {
            continue;
        }
        if let Some(value) = pick(record, &keys) {
            pages.insert(slot.to_string(), decode(tenant, slot, value)?);
        }
    }

    Ok(TenantConfig {
        tenant_id: tenant.clone(),
        brand,
        assets,
        theme: themes.clone(),
        community,
        fidgets_allowlist,
        navigation,
        ui,
        home_page: pages.get(HOME_PAGE_SLOT).cloned(),
        explore_page: pages.get(EXPLORE_PAGE_SLOT).cloned(),
        pages,
    })
}

fn pick<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find(|value| !value.is_null())
}

fn decode<T: DeserializeOwned>(
    tenant: &TenantId,
    field: &str,
    value: &Value,
) -> Result<T, TenantConfigError> {
    serde_json::from_value(value.clone()).map_err(|err| TenantConfigError::ConfigInvalid {
        tenant: tenant.clone(),
        reason: format!("{field}: {err}"),
    })
}

/// Accepts either a plain list of fidget types or the older
/// `{ "enabled": [...] }` shape.
fn allowlist(value: &Value) -> Option<Vec<String>> {
    let list = match value {
        Value::Array(items) => items,
        Value::Object(map) => map.get("enabled")?.as_array()?,
        _ => return None,
    };
    list.iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}
