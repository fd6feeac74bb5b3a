use space_canon::{
    Authorship, Digest, EnvelopeSigner, decode_envelope, digest, encode_envelope, open, seal,
};
use space_layout::{ReconcileReport, reconcile};
use serde::{Deserialize, Serialize};
use space_types::{SpaceId, TabDocument, TabDocumentPatch, TabOrderDocument};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use crate::{
    artifact::{
        ArtifactStore, ORDER_PAYLOAD_TYPE, PutOptions, TAB_PAYLOAD_TYPE, order_path, tab_path,
    },
    clock::MonotonicClock,
    config::StoreConfig,
    error::{SpaceError, SpaceResult},
    space::{SpaceState, validate_tab_name},
};

/// Outcome of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitReceipt {
    pub path: String,
    /// SHA-256 of the bytes written.
    pub digest: Digest,
    /// False when a newer committed copy was already held and the snapshot
    /// was not recorded as remote state.
    pub applied: bool,
}

#[derive(Debug, Clone)]
pub struct LoadedTab {
    /// The draft after loading.
    pub document: TabDocument,
    pub authorship: Authorship,
    /// The reconciler had to change the fetched document.
    pub repaired: bool,
    pub report: ReconcileReport,
    /// A draft newer than the artifact was left in place.
    pub kept_local_draft: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CommitKey {
    Tab(SpaceId, String),
    Order(SpaceId),
}

/// Drafts, committed copies and tab order of every Space, written through
/// to an [`ArtifactStore`] as signed envelopes.
///
/// Operations on one Space run one at a time. Commits of the same tab (or of
/// the same Space's order) queue behind a lock of their own, so a slow write
/// does not block editing while later commits still land in call order.
pub struct SpaceDocumentStore<A, S> {
    artifacts: A,
    signer: S,
    config: StoreConfig,
    clock: MonotonicClock,
    spaces: Mutex<HashMap<SpaceId, Arc<AsyncMutex<SpaceState>>>>,
    commit_locks: Mutex<HashMap<CommitKey, Arc<AsyncMutex<()>>>>,
}

impl<A, S> SpaceDocumentStore<A, S>
where
    A: ArtifactStore,
    S: EnvelopeSigner,
{
    pub fn new(artifacts: A, signer: S, config: StoreConfig) -> Self {
        Self {
            artifacts,
            signer,
            config,
            clock: MonotonicClock::new(),
            spaces: Mutex::new(HashMap::new()),
            commit_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn artifacts(&self) -> &A {
        &self.artifacts
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub async fn save_local_tab(
        &self,
        space: &SpaceId,
        tab: &str,
        patch: TabDocumentPatch,
        rename_to: Option<&str>,
    ) -> SpaceResult<()> {
        let state = self.space(space);
        let mut state = state.lock().await;
        state.save_local(
            tab,
            patch,
            rename_to,
            &self.config.initial_document,
            self.clock.now(),
        )?;
        if rename_to.is_some_and(|name| name != tab) {
            self.release_commit_lock(&CommitKey::Tab(space.clone(), tab.to_string()));
        }
        debug!(space = %space, tab, renamed_to = ?rename_to, "draft saved");
        Ok(())
    }

    /// Seal the current draft and write it. The remote copy only advances
    /// once the write succeeded, and never backwards.
    pub async fn commit_tab(&self, space: &SpaceId, tab: &str) -> SpaceResult<CommitReceipt> {
        validate_tab_name(tab)?;
        let lock = self.commit_lock(CommitKey::Tab(space.clone(), tab.to_string()));
        let _queued = lock.lock().await;

        let state = self.space(space);
        let snapshot = state.lock().await.snapshot_tab(tab)?;
        let path = tab_path(space, tab);
        let envelope = seal(
            &snapshot,
            TAB_PAYLOAD_TYPE,
            snapshot.timestamp.as_str(),
            &self.signer,
        )?;
        let bytes = encode_envelope(&envelope)?;
        let digest = digest(&bytes);

        debug!(space = %space, tab, %path, %digest, "committing tab");
        self.put(&path, bytes).await?;

        let applied = state.lock().await.apply_remote_tab(tab, snapshot);
        if applied {
            info!(space = %space, tab, %path, %digest, "tab committed");
        } else {
            debug!(space = %space, tab, %path, "newer committed copy already held");
        }
        Ok(CommitReceipt {
            path,
            digest,
            applied,
        })
    }

    pub async fn reset_tab(&self, space: &SpaceId, tab: &str) -> SpaceResult<()> {
        let state = self.space(space);
        let mut state = state.lock().await;
        state.reset(tab, &self.config.initial_document, self.clock.now())?;
        debug!(space = %space, tab, "draft reset");
        Ok(())
    }

    pub async fn create_tab(
        &self,
        space: &SpaceId,
        tab: &str,
        initial: TabDocument,
    ) -> SpaceResult<()> {
        let state = self.space(space);
        let mut state = state.lock().await;
        state.create(tab, initial, self.clock.now())?;
        debug!(space = %space, tab, "tab created");
        Ok(())
    }

    /// Remove the draft locally. The committed artifact stays where it is and
    /// drops out of view once the order is committed.
    pub async fn delete_tab(&self, space: &SpaceId, tab: &str) -> SpaceResult<()> {
        let state = self.space(space);
        let mut state = state.lock().await;
        state.delete(tab, self.clock.now())?;
        self.release_commit_lock(&CommitKey::Tab(space.clone(), tab.to_string()));
        debug!(space = %space, tab, "tab deleted");
        Ok(())
    }

    pub async fn update_local_order(&self, space: &SpaceId, order: Vec<String>) -> SpaceResult<()> {
        let state = self.space(space);
        let mut state = state.lock().await;
        state.set_order(order, self.clock.now())?;
        debug!(space = %space, order = ?state.local_order(), "tab order updated");
        Ok(())
    }

    pub async fn commit_order(&self, space: &SpaceId) -> SpaceResult<CommitReceipt> {
        let lock = self.commit_lock(CommitKey::Order(space.clone()));
        let _queued = lock.lock().await;

        let state = self.space(space);
        let snapshot = state.lock().await.snapshot_order();
        let path = order_path(space);
        let envelope = seal(
            &snapshot,
            ORDER_PAYLOAD_TYPE,
            snapshot.timestamp.as_str(),
            &self.signer,
        )?;
        let bytes = encode_envelope(&envelope)?;
        let digest = digest(&bytes);

        debug!(space = %space, %path, %digest, "committing tab order");
        self.put(&path, bytes).await?;

        let applied = state.lock().await.apply_remote_order(snapshot);
        if applied {
            info!(space = %space, %path, %digest, "tab order committed");
        } else {
            debug!(space = %space, %path, "newer committed order already held");
        }
        Ok(CommitReceipt {
            path,
            digest,
            applied,
        })
    }

    /// Fetch, verify and reconcile one committed tab. `Ok(None)` when the tab
    /// was never committed.
    pub async fn load_tab(&self, space: &SpaceId, tab: &str) -> SpaceResult<Option<LoadedTab>> {
        validate_tab_name(tab)?;
        let path = tab_path(space, tab);
        let Some(bytes) = self.fetch(&path).await? else {
            return Ok(None);
        };
        let (fetched, authorship): (TabDocument, Authorship) =
            self.open_artifact(&path, &bytes, TAB_PAYLOAD_TYPE)?;

        let reconciled = reconcile(fetched.clone(), &self.config.reserved_regions);
        let repaired = if reconciled.changed {
            warn!(
                space = %space,
                tab,
                report = ?reconciled.report,
                "committed layout needed repair"
            );
            let mut document = reconciled.document;
            document.timestamp = self.clock.now();
            Some(document)
        } else {
            None
        };
        let was_repaired = repaired.is_some();

        let (document, kept_local_draft) = {
            let state = self.space(space);
            let mut state = state.lock().await;
            let replaced = state.install_loaded(tab, fetched, repaired);
            let document = state.snapshot_tab(tab)?;
            (document, !replaced)
        };
        if kept_local_draft {
            debug!(space = %space, tab, "kept newer local draft over fetched tab");
        } else if was_repaired && self.config.commit_repairs {
            self.commit_tab(space, tab).await?;
        }
        Ok(Some(LoadedTab {
            document,
            authorship,
            repaired: was_repaired,
            report: reconciled.report,
            kept_local_draft,
        }))
    }

    pub async fn load_order(&self, space: &SpaceId) -> SpaceResult<Option<TabOrderDocument>> {
        let path = order_path(space);
        let Some(bytes) = self.fetch(&path).await? else {
            return Ok(None);
        };
        let (order, _): (TabOrderDocument, Authorship) =
            self.open_artifact(&path, &bytes, ORDER_PAYLOAD_TYPE)?;
        if &order.space_id != space {
            return Err(SpaceError::SpaceMismatch {
                path,
                expected: space.clone(),
                found: order.space_id,
            });
        }
        let state = self.space(space);
        if !state.lock().await.apply_remote_order(order.clone()) {
            debug!(space = %space, "fetched tab order older than the one held");
        }
        Ok(Some(order))
    }

    /// Load the committed order and every tab it names, then adopt that order
    /// locally unless it was edited since. Returns the resulting local order.
    pub async fn load_space(&self, space: &SpaceId) -> SpaceResult<Vec<String>> {
        let names = self
            .load_order(space)
            .await?
            .map(|order| order.tab_order)
            .unwrap_or_default();
        for name in &names {
            if let Err(err) = validate_tab_name(name) {
                warn!(space = %space, error = %err, "skipping unusable tab name in order");
                continue;
            }
            if self.load_tab(space, name).await?.is_none() {
                warn!(space = %space, tab = %name, "ordered tab has no artifact");
            }
        }
        let state = self.space(space);
        let mut state = state.lock().await;
        state.adopt_remote_order();
        info!(space = %space, tabs = state.local_order().len(), "space loaded");
        Ok(state.local_order().to_vec())
    }

    pub async fn local_tab(&self, space: &SpaceId, tab: &str) -> Option<TabDocument> {
        let state = self.existing_space(space)?;
        let state = state.lock().await;
        state.local_tab(tab).cloned()
    }

    pub async fn remote_tab(&self, space: &SpaceId, tab: &str) -> Option<TabDocument> {
        let state = self.existing_space(space)?;
        let state = state.lock().await;
        state.remote_tab(tab).cloned()
    }

    pub async fn local_order(&self, space: &SpaceId) -> Vec<String> {
        match self.existing_space(space) {
            Some(state) => state.lock().await.local_order().to_vec(),
            None => Vec::new(),
        }
    }

    pub async fn remote_order(&self, space: &SpaceId) -> Option<TabOrderDocument> {
        let state = self.existing_space(space)?;
        let state = state.lock().await;
        state.remote_order().cloned()
    }

    pub async fn has_unsaved_changes(&self, space: &SpaceId, tab: &str) -> bool {
        match self.existing_space(space) {
            Some(state) => state.lock().await.has_unsaved_changes(tab),
            None => false,
        }
    }

    /// State of a Space already touched by a write or load. Reads go through
    /// here so they never allocate state.
    fn existing_space(&self, space: &SpaceId) -> Option<Arc<AsyncMutex<SpaceState>>> {
        let spaces = self.spaces.lock().unwrap_or_else(|p| p.into_inner());
        spaces.get(space).cloned()
    }

    fn space(&self, space: &SpaceId) -> Arc<AsyncMutex<SpaceState>> {
        let mut spaces = self.spaces.lock().unwrap_or_else(|p| p.into_inner());
        spaces
            .entry(space.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(SpaceState::new(space.clone()))))
            .clone()
    }

    fn commit_lock(&self, key: CommitKey) -> Arc<AsyncMutex<()>> {
        let mut locks = self.commit_locks.lock().unwrap_or_else(|p| p.into_inner());
        locks.entry(key).or_default().clone()
    }

    /// Drop the lock of a tab that is gone, unless a commit still holds it.
    fn release_commit_lock(&self, key: &CommitKey) {
        let mut locks = self.commit_locks.lock().unwrap_or_else(|p| p.into_inner());
        if locks.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(key);
        }
    }

    async fn put(&self, path: &str, bytes: Vec<u8>) -> SpaceResult<()> {
        self.artifacts
            .put_object(path, bytes, PutOptions::UPSERT)
            .await
            .map_err(|source| {
                warn!(%path, error = %source, "artifact write failed");
                SpaceError::CommitFailure {
                    path: path.to_string(),
                    source,
                }
            })
    }

    async fn fetch(&self, path: &str) -> SpaceResult<Option<Vec<u8>>> {
        self.artifacts
            .get_object(path)
            .await
            .map_err(|source| SpaceError::Fetch {
                path: path.to_string(),
                source,
            })
    }

    fn open_artifact<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        bytes: &[u8],
        payload_type: &str,
    ) -> SpaceResult<(T, Authorship)> {
        let envelope = decode_envelope(bytes).map_err(|source| SpaceError::Decode {
            path: path.to_string(),
            source,
        })?;
        open(&envelope, payload_type, self.config.trust_policy).map_err(|err| {
            warn!(%path, error = %err, "rejected artifact");
            SpaceError::from_open(path.to_string(), err)
        })
    }
}

impl<A: std::fmt::Debug, S> std::fmt::Debug for SpaceDocumentStore<A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let spaces = self.spaces.lock().map(|s| s.len()).unwrap_or_default();
        f.debug_struct("SpaceDocumentStore")
            .field("artifacts", &self.artifacts)
            .field("config", &self.config)
            .field("spaces", &spaces)
            .finish()
    }
}
