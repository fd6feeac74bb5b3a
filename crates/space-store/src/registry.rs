use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use space_types::SpaceId;
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

/// What a Space is attached to. Each criteria maps to at most one Space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "spaceType", rename_all = "camelCase")]
pub enum SpaceCriteria {
    Profile {
        fid: u64,
    },
    #[serde(rename_all = "camelCase")]
    Channel { channel_id: String },
    #[serde(rename_all = "camelCase")]
    Token {
        contract_address: String,
        network: String,
    },
    #[serde(rename_all = "camelCase")]
    Proposal { proposal_id: String },
}

impl SpaceCriteria {
    /// Contract addresses are hex and compare case-insensitively.
    pub fn normalized(self) -> Self {
        match self {
            SpaceCriteria::Token {
                contract_address,
                network,
            } => SpaceCriteria::Token {
                contract_address: contract_address.to_ascii_lowercase(),
                network: network.to_ascii_lowercase(),
            },
            other => other,
        }
    }
}

#[async_trait]
pub trait SpaceRegistry: Send + Sync {
    async fn find_space_id(&self, criteria: &SpaceCriteria) -> anyhow::Result<Option<SpaceId>>;

    /// Return the Space for `criteria`, minting one if none exists yet.
    async fn register_space(&self, criteria: SpaceCriteria) -> anyhow::Result<SpaceId>;
}

#[derive(Debug, Clone, Default)]
pub struct MemSpaceRegistry {
    spaces: Arc<RwLock<HashMap<SpaceCriteria, SpaceId>>>,
}

impl MemSpaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SpaceRegistry for MemSpaceRegistry {
    async fn find_space_id(&self, criteria: &SpaceCriteria) -> anyhow::Result<Option<SpaceId>> {
        let key = criteria.clone().normalized();
        let guard = self.spaces.read().unwrap_or_else(|p| p.into_inner());
        Ok(guard.get(&key).cloned())
    }

    async fn register_space(&self, criteria: SpaceCriteria) -> anyhow::Result<SpaceId> {
        let key = criteria.normalized();
        let mut guard = self.spaces.write().unwrap_or_else(|p| p.into_inner());
        let id = guard
            .entry(key.clone())
            .or_insert_with(|| SpaceId::new(uuid::Uuid::new_v4().to_string()))
            .clone();
        tracing::debug!(?key, space = %id, "space registered");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_is_idempotent_per_criteria() {
        let registry = MemSpaceRegistry::new();
        let profile = SpaceCriteria::Profile { fid: 42 };
        assert_eq!(registry.find_space_id(&profile).await.expect("find"), None);
        let first = registry.register_space(profile.clone()).await.expect("register");
        let second = registry.register_space(profile.clone()).await.expect("register");
        assert_eq!(first, second);
        assert_eq!(
            registry.find_space_id(&profile).await.expect("find"),
            Some(first.clone())
        );
        let other = registry
            .register_space(SpaceCriteria::Profile { fid: 43 })
            .await
            .expect("register");
        assert_ne!(first, other);
    }

    #[tokio::test]
    async fn token_addresses_match_case_insensitively() {
        let registry = MemSpaceRegistry::new();
        let id = registry
            .register_space(SpaceCriteria::Token {
                contract_address: "0xABCdef".into(),
                network: "Base".into(),
            })
            .await
            .expect("register");
        let found = registry
            .find_space_id(&SpaceCriteria::Token {
                contract_address: "0xabcDEF".into(),
                network: "base".into(),
            })
            .await
            .expect("find");
        assert_eq!(found, Some(id));
    }

    #[test]
    fn criteria_wire_shape() {
        let json = serde_json::to_value(SpaceCriteria::Channel {
            channel_id: "nouns".into(),
        })
        .expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"spaceType": "channel", "channelId": "nouns"})
        );
    }
}
