use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{FidgetId, FidgetInstance, GRID_LAYOUT_ENGINE, SpaceId, ThemeSnapshot, Timestamp};

/// One tab of a Space: the fidgets placed on it and how they are laid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabDocument {
    #[serde(default)]
    pub fidget_instances: BTreeMap<FidgetId, FidgetInstance>,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default = "default_true")]
    pub is_editable: bool,
    #[serde(default)]
    pub tray_contents: Vec<FidgetInstance>,
    #[serde(default)]
    pub theme: ThemeSnapshot,
    #[serde(default)]
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_fid: Option<u64>,
}

fn default_true() -> bool {
    true
}

impl Default for TabDocument {
    fn default() -> Self {
        Self {
            fidget_instances: BTreeMap::new(),
            layout: Layout::default(),
            is_editable: true,
            tray_contents: Vec::new(),
            theme: ThemeSnapshot::default(),
            timestamp: Timestamp::epoch(),
            tab_names: None,
            owner_fid: None,
        }
    }
}

impl TabDocument {
    /// Empty editable grid tab.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Place a fidget at the given cell rectangle.
    pub fn with_fidget(mut self, instance: FidgetInstance, x: u32, y: u32, w: u32, h: u32) -> Self {
        self.layout.grid.push(GridItem::new(instance.id.clone(), x, y, w, h));
        self.fidget_instances.insert(instance.id.clone(), instance);
        self
    }

    /// Shallow merge: every field present in the patch replaces the whole
    /// field here. The timestamp is never taken from the patch.
    pub fn apply_patch(&mut self, patch: TabDocumentPatch) {
        let TabDocumentPatch {
            fidget_instances,
            layout,
            is_editable,
            tray_contents,
            theme,
            tab_names,
            owner_fid,
        } = patch;
        if let Some(value) = fidget_instances {
            self.fidget_instances = value;
        }
        if let Some(value) = layout {
            self.layout = value;
        }
        if let Some(value) = is_editable {
            self.is_editable = value;
        }
        if let Some(value) = tray_contents {
            self.tray_contents = value;
        }
        if let Some(value) = theme {
            self.theme = value;
        }
        if let Some(value) = tab_names {
            self.tab_names = Some(value);
        }
        if let Some(value) = owner_fid {
            self.owner_fid = Some(value);
        }
    }
}

/// Partial update for [`TabDocument::apply_patch`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabDocumentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fidget_instances: Option<BTreeMap<FidgetId, FidgetInstance>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_editable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tray_contents: Option<Vec<FidgetInstance>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_fid: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub engine: String,
    #[serde(default)]
    pub grid: Vec<GridItem>,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            engine: GRID_LAYOUT_ENGINE.to_string(),
            grid: Vec::new(),
        }
    }
}

impl Layout {
    pub fn ids(&self) -> impl Iterator<Item = &FidgetId> {
        self.grid.iter().map(|item| &item.id)
    }
}

/// Placement of one fidget in grid cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridItem {
    /// Older documents use the grid library's `i` key.
    #[serde(alias = "i")]
    pub id: FidgetId,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_w: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_w: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_h: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_h: Option<u32>,
    #[serde(default, rename = "static", skip_serializing_if = "Option::is_none")]
    pub is_static: Option<bool>,
}

impl GridItem {
    pub fn new(id: impl Into<FidgetId>, x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            w,
            h,
            min_w: None,
            max_w: None,
            min_h: None,
            max_h: None,
            is_static: None,
        }
    }

    pub fn area(&self) -> u64 {
        u64::from(self.w) * u64::from(self.h)
    }
}

/// Ordered tab names of one Space, committed as its own artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabOrderDocument {
    pub space_id: SpaceId,
    pub timestamp: Timestamp,
    pub tab_order: Vec<String>,
}
