use async_trait::async_trait;
use serde_json::{Value, json};
use space_tenant::{
    MemTenantRecords, TenantConfigError, TenantConfigLoader, TenantId, TenantRecordStore,
    ThemeLibrary,
};

fn full_record() -> Value {
    json!({
        "brand": {
            "displayName": "Nouns",
            "name": "nouns",
            "description": "Funding ideas",
            "miniAppTags": ["nouns", "dao"]
        },
        "assets": {
            "logos": {
                "main": "/images/nouns/logo.svg",
                "icon": "/images/nouns/noggles.svg",
                "favicon": "/images/favicon.ico"
            }
        },
        "theme": { "bogus": { "id": "bogus" } },
        "community": {
            "type": "nouns",
            "urls": { "website": "https://nouns.wtf" },
            "contracts": { "token": "0x9c8f" },
            "governance": { "proposals": "https://nouns.wtf/vote" }
        },
        "fidgets": { "enabled": ["text", "gallery", "feed"], "disabled": ["iframe"] },
        "navigation": {
            "items": [
                { "id": "home", "label": "Home", "href": "/home" },
                { "id": "explore", "label": "Explore", "href": "/explore", "openInNewTab": false }
            ],
            "showMusicPlayer": true
        },
        "ui": { "primaryColor": "rgb(37, 99, 235)" },
        "pages": {
            "home": {
                "defaultTab": "Nouns",
                "tabOrder": ["Nouns", "Socials"],
                "tabs": {
                    "Nouns": {
                        "fidgetInstances": {
                            "intro": { "id": "intro", "fidgetType": "text", "config": { "editable": false, "settings": { "title": "Welcome" }, "data": {} } }
                        },
                        "layout": { "engine": "grid", "grid": [ { "id": "intro", "x": 0, "y": 0, "w": 6, "h": 4 } ] },
                        "isEditable": false,
                        "timestamp": "2024-01-01T00:00:00.000Z"
                    }
                }
            }
        }
    })
}

#[tokio::test]
async fn missing_record_is_config_not_found() {
    let loader = TenantConfigLoader::new(MemTenantRecords::new());
    let err = loader.load(&TenantId::from("ghost")).await.unwrap_err();
    assert!(matches!(err, TenantConfigError::ConfigNotFound(id) if id.as_str() == "ghost"));
}

#[tokio::test]
async fn null_record_is_config_not_found() {
    let records = MemTenantRecords::new();
    records.insert("nouns", Value::Null);
    let loader = TenantConfigLoader::new(records);
    assert!(matches!(
        loader.load(&"nouns".into()).await,
        Err(TenantConfigError::ConfigNotFound(_))
    ));
}

#[tokio::test]
async fn missing_brand_or_assets_is_config_invalid() {
    for field in ["brand", "assets"] {
        let mut raw = full_record();
        raw.as_object_mut().unwrap().remove(field);
        let records = MemTenantRecords::new();
        records.insert("nouns", raw);
        let loader = TenantConfigLoader::new(records);
        match loader.load(&"nouns".into()).await {
            Err(TenantConfigError::ConfigInvalid { reason, .. }) => {
                assert!(reason.contains(field), "reason '{reason}' should name {field}")
            }
            other => panic!("expected ConfigInvalid for missing {field}, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn malformed_brand_is_config_invalid() {
    let mut raw = full_record();
    raw["brand"] = json!({ "name": "no display name" });
    let records = MemTenantRecords::new();
    records.insert("nouns", raw);
    let loader = TenantConfigLoader::new(records);
    assert!(matches!(
        loader.load(&"nouns".into()).await,
        Err(TenantConfigError::ConfigInvalid { .. })
    ));
}

#[tokio::test]
async fn theme_comes_from_shared_table() {
    let records = MemTenantRecords::new();
    records.insert("nouns", full_record());
    let loader = TenantConfigLoader::new(records);
    let config = loader.load(&"nouns".into()).await.unwrap();
    assert_eq!(config.theme, ThemeLibrary::shared());
    assert!(config.theme.get("bogus").is_none());
    assert!(config.theme.default_theme().is_some());
}

#[tokio::test]
async fn pages_are_mirrored_onto_named_accessors() {
    let records = MemTenantRecords::new();
    records.insert("nouns", full_record());
    let loader = TenantConfigLoader::new(records);
    let config = loader.load(&"nouns".into()).await.unwrap();

    let home = config.home_page.as_ref().expect("home page");
    assert_eq!(home, config.page("home").unwrap());
    assert_eq!(home.tab_order, vec!["Nouns", "Socials"]);
    assert!(config.explore_page.is_none());

    let (name, doc) = config.initial_tab("home").expect("initial tab");
    assert_eq!(name, "Nouns");
    assert!(doc.fidget_instances.contains_key("intro"));
    assert!(!doc.is_editable);
}

#[tokio::test]
async fn optional_sections_are_decoded() {
    let records = MemTenantRecords::new();
    records.insert("nouns", full_record());
    let config = TenantConfigLoader::new(records)
        .load(&"nouns".into())
        .await
        .unwrap();
    assert_eq!(config.brand.display_name, "Nouns");
    assert_eq!(config.assets.logos.icon, "/images/nouns/noggles.svg");
    assert_eq!(config.community.kind.as_deref(), Some("nouns"));
    assert_eq!(config.fidgets_allowlist, vec!["text", "gallery", "feed"]);
    assert!(config.is_fidget_allowed("gallery"));
    assert!(!config.is_fidget_allowed("iframe"));
    let nav = config.navigation.expect("navigation");
    assert_eq!(nav.items.len(), 2);
    assert_eq!(nav.show_music_player, Some(true));
    assert_eq!(
        config.ui.and_then(|ui| ui.primary_color).as_deref(),
        Some("rgb(37, 99, 235)")
    );
}

#[tokio::test]
async fn legacy_record_shape_is_normalized() {
    let legacy = json!({
        "brand_config": { "displayName": "Clanker" },
        "assets_config": { "logos": { "main": "/c.svg", "icon": "/ci.svg" } },
        "fidgets_config": ["text"],
        "homePage": { "defaultTab": "Home", "tabs": {} },
        "explorePage": { "defaultTab": "Tokens", "tabOrder": ["Tokens"] }
    });
    let records = MemTenantRecords::new();
    records.insert("clanker", legacy.clone());
    let config = TenantConfigLoader::new(records)
        .load(&"clanker".into())
        .await
        .unwrap();
    assert_eq!(config.brand.display_name, "Clanker");
    assert_eq!(config.fidgets_allowlist, vec!["text"]);
    assert_eq!(config.pages.len(), 2);
    assert_eq!(config.home_page.unwrap().default_tab, "Home");
    assert_eq!(config.explore_page.unwrap().tab_order, vec!["Tokens"]);
}

#[tokio::test]
async fn pages_dictionary_wins_over_legacy_fields() {
    let mut raw = full_record();
    raw["homePage"] = json!({ "defaultTab": "Legacy" });
    let records = MemTenantRecords::new();
    records.insert("nouns", raw);
    let config = TenantConfigLoader::new(records)
        .load(&"nouns".into())
        .await
        .unwrap();
    assert_eq!(config.home_page.unwrap().default_tab, "Nouns");
}

#[tokio::test]
async fn raw_record_is_left_untouched() {
    let raw = full_record();
    let snapshot = raw.clone();
    let config = space_tenant::normalize_record(&"nouns".into(), &raw, &ThemeLibrary::shared())
        .unwrap();
    assert_eq!(raw, snapshot);
    assert_eq!(config.tenant_id.as_str(), "nouns");
}

struct FailingRecords;

#[async_trait]
impl TenantRecordStore for FailingRecords {
    async fn get_active_tenant_config(&self, _tenant: &TenantId) -> anyhow::Result<Option<Value>> {
        anyhow::bail!("connection refused")
    }
}

#[tokio::test]
async fn store_failures_are_surfaced() {
    let loader = TenantConfigLoader::new(FailingRecords);
    let err = loader.load(&"nouns".into()).await.unwrap_err();
    assert!(matches!(err, TenantConfigError::Store { .. }));
    assert!(err.to_string().contains("connection refused"));
}
