//! Structural repair of tab documents.
//!
//! [`reconcile`] runs once on a freshly loaded document. It is total: any
//! document that deserialized comes out consistent, and `changed` tells the
//! caller whether the repaired version needs to be saved and committed.

mod region;

pub use region::Region;

use space_types::{FidgetId, FidgetInstance, TabDocument};
use std::collections::BTreeSet;

/// Deprecated per-instance setting keys and their current names.
pub const LEGACY_SETTING_KEYS: &[(&str, &str)] = &[("fidgetBackground", "background")];

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub document: TabDocument,
    pub changed: bool,
    pub report: ReconcileReport,
}

/// What a reconciliation pass removed or renamed, in the order it happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Layout entries with no instance.
    pub orphan_placements: Vec<FidgetId>,
    /// Second and later layout entries for an id already placed.
    pub duplicate_placements: Vec<FidgetId>,
    /// Instances with no layout entry.
    pub orphan_instances: Vec<FidgetId>,
    pub reserved_conflicts: Vec<FidgetId>,
    pub overlap_losers: Vec<FidgetId>,
    pub migrated_keys: Vec<KeyMigration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMigration {
    pub fidget: FidgetId,
    pub from: &'static str,
    pub to: &'static str,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.orphan_placements.is_empty()
            && self.duplicate_placements.is_empty()
            && self.orphan_instances.is_empty()
            && self.reserved_conflicts.is_empty()
            && self.overlap_losers.is_empty()
            && self.migrated_keys.is_empty()
    }
}

pub fn reconcile(mut document: TabDocument, reserved: &[Region]) -> Reconciled {
    let mut report = ReconcileReport::default();
    remove_orphans(&mut document, &mut report);
    remove_reserved_conflicts(&mut document, reserved, &mut report);
    resolve_overlaps(&mut document, &mut report);
    migrate_setting_keys(&mut document, &mut report);
    Reconciled {
        changed: !report.is_empty(),
        document,
        report,
    }
}

fn remove_orphans(doc: &mut TabDocument, report: &mut ReconcileReport) {
    let mut placed = BTreeSet::new();
    let instances = &doc.fidget_instances;
    doc.layout.grid.retain(|item| {
        if !instances.contains_key(&item.id) {
            report.orphan_placements.push(item.id.clone());
            false
        } else if !placed.insert(item.id.clone()) {
            report.duplicate_placements.push(item.id.clone());
            false
        } else {
            true
        }
    });
    doc.fidget_instances.retain(|id, _| {
        let keep = placed.contains(id);
        if !keep {
            report.orphan_instances.push(id.clone());
        }
        keep
    });
}

fn remove_reserved_conflicts(
    doc: &mut TabDocument,
    reserved: &[Region],
    report: &mut ReconcileReport,
) {
    if reserved.is_empty() {
        return;
    }
    let mut removed = Vec::new();
    doc.layout.grid.retain(|item| {
        let area = Region::from(item);
        let conflict = reserved.iter().any(|region| region.intersects(&area));
        if conflict {
            removed.push(item.id.clone());
        }
        !conflict
    });
    for id in &removed {
        doc.fidget_instances.remove(id);
    }
    report.reserved_conflicts.extend(removed);
}

// Pairs are scanned in layout order. The larger area survives; an exact tie
// keeps the earlier item. Each round removes one item, so this terminates.
fn resolve_overlaps(doc: &mut TabDocument, report: &mut ReconcileReport) {
    while let Some(loser) = first_overlap_loser(doc) {
        let item = doc.layout.grid.remove(loser);
        doc.fidget_instances.remove(&item.id);
        report.overlap_losers.push(item.id);
    }
}

fn first_overlap_loser(doc: &TabDocument) -> Option<usize> {
    let grid = &doc.layout.grid;
    for (i, first) in grid.iter().enumerate() {
        let first_area = Region::from(first);
        for (offset, second) in grid[i + 1..].iter().enumerate() {
            if first_area.intersects(&Region::from(second)) {
                let j = i + 1 + offset;
                return Some(if second.area() > first.area() { i } else { j });
            }
        }
    }
    None
}

fn migrate_setting_keys(doc: &mut TabDocument, report: &mut ReconcileReport) {
    let instances = doc
        .fidget_instances
        .values_mut()
        .chain(doc.tray_contents.iter_mut());
    for instance in instances {
        migrate_instance(instance, report);
    }
}

fn migrate_instance(instance: &mut FidgetInstance, report: &mut ReconcileReport) {
    let settings = &mut instance.config.settings;
    for &(from, to) in LEGACY_SETTING_KEYS {
        let Some(value) = settings.remove(from) else {
            continue;
        };
        // A value already stored under the current name wins.
        if !settings.contains_key(to) {
            settings.insert(to, value);
        }
        report.migrated_keys.push(KeyMigration {
            fidget: instance.id.clone(),
            from,
            to,
        });
    }
}
