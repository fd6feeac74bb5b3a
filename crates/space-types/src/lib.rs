//! Shared data model for tenant-scoped Spaces: tab documents, grid layouts,
//! fidget instances, tab orders and the identifiers that key them.

mod document;
mod fidget;
mod ids;
mod theme;
mod timestamp;

pub use document::{GridItem, Layout, TabDocument, TabDocumentPatch, TabOrderDocument};
pub use fidget::{
    FeedSettings, FidgetConfig, FidgetId, FidgetInstance, FidgetKind, FidgetSettings,
    GallerySettings, LinkEntry, LinksSettings, SettingsView, TextSettings,
};
pub use ids::{SpaceId, TenantId};
pub use theme::{ThemeProperties, ThemeSnapshot};
pub use timestamp::Timestamp;

/// Default layout engine name for grid-based tabs.
pub const GRID_LAYOUT_ENGINE: &str = "grid";
