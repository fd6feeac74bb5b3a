use async_trait::async_trait;
use space_types::SpaceId;
use std::{io, path::PathBuf};

/// `payloadType` of a sealed tab document.
pub const TAB_PAYLOAD_TYPE: &str = "spaceTab";
/// `payloadType` of a sealed tab order.
pub const ORDER_PAYLOAD_TYPE: &str = "tabOrder";

/// Object storage holding sealed artifacts. Timeouts and retries are the
/// implementation's business.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn put_object(&self, path: &str, bytes: Vec<u8>, options: PutOptions)
    -> anyhow::Result<()>;

    /// `Ok(None)` when nothing is stored at `path`.
    async fn get_object(&self, path: &str) -> anyhow::Result<Option<Vec<u8>>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutOptions {
    /// Overwrite an existing object instead of failing.
    pub upsert: bool,
}

impl PutOptions {
    pub const UPSERT: PutOptions = PutOptions { upsert: true };
    pub const CREATE: PutOptions = PutOptions { upsert: false };
}

pub fn tab_path(space: &SpaceId, tab: &str) -> String {
    format!("{space}/tabs/{tab}")
}

pub fn order_path(space: &SpaceId) -> String {
    format!("{space}/tabOrder")
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid object path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },
    #[error("object '{0}' already exists")]
    AlreadyExists(String),
}

pub(crate) fn io_error(path: impl Into<PathBuf>, err: io::Error) -> ArtifactError {
    ArtifactError::Io {
        path: path.into(),
        source: err,
    }
}
