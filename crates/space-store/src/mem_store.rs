use async_trait::async_trait;
use std::{
    collections::BTreeMap,
    sync::{
        Arc, RwLock,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use crate::artifact::{ArtifactError, ArtifactStore, PutOptions};

/// In-memory artifact store. Clones share the same objects.
#[derive(Clone, Default)]
pub struct MemArtifactStore {
    objects: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
    fail_puts: Arc<AtomicBool>,
    puts: Arc<AtomicUsize>,
}

impl std::fmt::Debug for MemArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemArtifactStore")
            .field("objects", &self.read().len())
            .field("puts", &self.put_count())
            .finish()
    }
}

impl MemArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `put_object` fail until switched back.
    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Successful writes so far.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.read().get(path).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Write bytes directly, bypassing failure injection.
    pub fn insert_raw(&self, path: impl Into<String>, bytes: Vec<u8>) {
        self.write().insert(path.into(), bytes);
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.objects
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.objects
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ArtifactStore for MemArtifactStore {
    async fn put_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        options: PutOptions,
    ) -> anyhow::Result<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            anyhow::bail!("injected put failure for '{path}'");
        }
        let mut guard = self.write();
        if !options.upsert && guard.contains_key(path) {
            return Err(ArtifactError::AlreadyExists(path.to_string()).into());
        }
        guard.insert(path.to_string(), bytes);
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_object(&self, path: &str) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.object(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_round_trip() {
        let store = MemArtifactStore::new();
        store
            .put_object("s/tabs/a", b"one".to_vec(), PutOptions::UPSERT)
            .await
            .expect("put");
        assert_eq!(
            store.get_object("s/tabs/a").await.expect("get"),
            Some(b"one".to_vec())
        );
        assert_eq!(store.get_object("s/tabs/b").await.expect("get"), None);
    }

    #[tokio::test]
    async fn create_refuses_overwrite() {
        let store = MemArtifactStore::new();
        store
            .put_object("p", b"1".to_vec(), PutOptions::CREATE)
            .await
            .expect("first");
        let err = store
            .put_object("p", b"2".to_vec(), PutOptions::CREATE)
            .await
            .expect_err("second create should fail");
        assert!(err.downcast_ref::<ArtifactError>().is_some());
        store
            .put_object("p", b"3".to_vec(), PutOptions::UPSERT)
            .await
            .expect("upsert");
        assert_eq!(store.object("p"), Some(b"3".to_vec()));
    }

    #[tokio::test]
    async fn injected_failures_leave_objects_alone() {
        let store = MemArtifactStore::new();
        store.insert_raw("p", b"keep".to_vec());
        store.set_fail_puts(true);
        assert!(
            store
                .put_object("p", b"lost".to_vec(), PutOptions::UPSERT)
                .await
                .is_err()
        );
        assert_eq!(store.object("p"), Some(b"keep".to_vec()));
        assert_eq!(store.put_count(), 0);
    }
}
