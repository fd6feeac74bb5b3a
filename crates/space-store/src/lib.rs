//! Draft/commit persistence for Space tabs.
//!
//! [`SpaceDocumentStore`] keeps a mutable local draft and the last committed
//! copy of every tab, seals commits into signed envelopes and writes them to
//! an [`ArtifactStore`]. Backends: [`MemArtifactStore`] and
//! [`FsArtifactStore`].

mod artifact;
mod clock;
mod config;
mod documents;
mod error;
mod fs_store;
mod mem_store;
mod registry;
mod space;

pub use artifact::{
    ArtifactError, ArtifactStore, ORDER_PAYLOAD_TYPE, PutOptions, TAB_PAYLOAD_TYPE, order_path,
    tab_path,
};
pub use clock::MonotonicClock;
pub use config::StoreConfig;
pub use documents::{CommitReceipt, LoadedTab, SpaceDocumentStore};
pub use error::{SpaceError, SpaceResult};
pub use fs_store::FsArtifactStore;
pub use mem_store::MemArtifactStore;
pub use registry::{MemSpaceRegistry, SpaceCriteria, SpaceRegistry};
pub use space::{MAX_TAB_NAME_LEN, SpaceState, validate_tab_name};
