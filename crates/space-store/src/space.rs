use space_types::{SpaceId, TabDocument, TabDocumentPatch, TabOrderDocument, Timestamp};
use std::collections::{BTreeMap, HashSet};

use crate::error::{SpaceError, SpaceResult};

pub const MAX_TAB_NAME_LEN: usize = 64;

/// Tab names become object path segments.
pub fn validate_tab_name(name: &str) -> SpaceResult<()> {
    let reason = if name.is_empty() {
        Some("empty")
    } else if name.chars().count() > MAX_TAB_NAME_LEN {
        Some("longer than 64 characters")
    } else if name == "." || name == ".." {
        Some("relative path segment")
    } else if name.contains(['/', '\\']) {
        Some("contains a path separator")
    } else if name.chars().any(char::is_control) {
        Some("contains control characters")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(SpaceError::InvalidTabName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Drafts and committed copies of one Space.
///
/// Every tab in `local_tabs` appears exactly once in `local_order` and vice
/// versa. Remote state only changes through [`SpaceState::apply_remote_tab`]
/// and [`SpaceState::apply_remote_order`], which refuse older data.
#[derive(Debug, Clone)]
pub struct SpaceState {
    space: SpaceId,
    local_tabs: BTreeMap<String, TabDocument>,
    remote_tabs: BTreeMap<String, TabDocument>,
    local_order: Vec<String>,
    local_order_stamp: Timestamp,
    remote_order: Option<TabOrderDocument>,
}

impl SpaceState {
    pub fn new(space: SpaceId) -> Self {
        Self {
            space,
            local_tabs: BTreeMap::new(),
            remote_tabs: BTreeMap::new(),
            local_order: Vec::new(),
            local_order_stamp: Timestamp::epoch(),
            remote_order: None,
        }
    }

    pub fn space(&self) -> &SpaceId {
        &self.space
    }

    pub fn local_tab(&self, tab: &str) -> Option<&TabDocument> {
        self.local_tabs.get(tab)
    }

    pub fn remote_tab(&self, tab: &str) -> Option<&TabDocument> {
        self.remote_tabs.get(tab)
    }

    pub fn local_order(&self) -> &[String] {
        &self.local_order
    }

    pub fn remote_order(&self) -> Option<&TabOrderDocument> {
        self.remote_order.as_ref()
    }

    /// A draft exists and differs from the committed copy.
    pub fn has_unsaved_changes(&self, tab: &str) -> bool {
        match (self.local_tabs.get(tab), self.remote_tabs.get(tab)) {
            (Some(local), Some(remote)) => local != remote,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Shallow-merge `patch` into the draft, creating it from `initial` when
    /// absent. With `rename_to` the draft moves and keeps its order slot.
    pub fn save_local(
        &mut self,
        tab: &str,
        patch: TabDocumentPatch,
        rename_to: Option<&str>,
        initial: &TabDocument,
        now: Timestamp,
    ) -> SpaceResult<()> {
        validate_tab_name(tab)?;
        let target = match rename_to {
            Some(new_name) if new_name != tab => {
                validate_tab_name(new_name)?;
                if self.local_tabs.contains_key(new_name) {
                    return Err(self.exists(new_name));
                }
                new_name
            }
            _ => tab,
        };

        let mut document = self
            .local_tabs
            .remove(tab)
            .unwrap_or_else(|| initial.clone());
        document.apply_patch(patch);
        document.timestamp = now.clone();
        self.local_tabs.insert(target.to_string(), document);

        if target != tab {
            match self.local_order.iter().position(|name| name == tab) {
                Some(slot) => self.local_order[slot] = target.to_string(),
                None => self.local_order.push(target.to_string()),
            }
            self.local_order_stamp = now;
        } else if !self.local_order.iter().any(|name| name == tab) {
            self.local_order.push(tab.to_string());
            self.local_order_stamp = now;
        }
        Ok(())
    }

    pub fn create(
        &mut self,
        tab: &str,
        mut initial: TabDocument,
        now: Timestamp,
    ) -> SpaceResult<()> {
        validate_tab_name(tab)?;
        if self.local_tabs.contains_key(tab) {
            return Err(self.exists(tab));
        }
        initial.timestamp = now.clone();
        self.local_tabs.insert(tab.to_string(), initial);
        self.local_order.push(tab.to_string());
        self.local_order_stamp = now;
        Ok(())
    }

    /// Drop the draft and its order slot. The committed copy stays until the
    /// next order commit leaves it unreferenced.
    pub fn delete(&mut self, tab: &str, now: Timestamp) -> SpaceResult<TabDocument> {
        let removed = self
            .local_tabs
            .remove(tab)
            .ok_or_else(|| self.not_found(tab))?;
        self.local_order.retain(|name| name != tab);
        self.local_order_stamp = now;
        Ok(removed)
    }

    /// Replace the draft with the committed copy, or a fresh `initial` when
    /// nothing was ever committed.
    pub fn reset(&mut self, tab: &str, initial: &TabDocument, now: Timestamp) -> SpaceResult<()> {
        validate_tab_name(tab)?;
        let document = match self.remote_tabs.get(tab) {
            Some(remote) => remote.clone(),
            None => {
                let mut fresh = initial.clone();
                fresh.timestamp = now.clone();
                fresh
            }
        };
        self.local_tabs.insert(tab.to_string(), document);
        if !self.local_order.iter().any(|name| name == tab) {
            self.local_order.push(tab.to_string());
            self.local_order_stamp = now;
        }
        Ok(())
    }

    /// Reorder tabs. The new order must name every draft exactly once.
    pub fn set_order(&mut self, order: Vec<String>, now: Timestamp) -> SpaceResult<()> {
        let mut seen = HashSet::with_capacity(order.len());
        for name in &order {
            if !seen.insert(name.as_str()) {
                return Err(self.mismatch(format!("tab '{name}' listed twice")));
            }
            if !self.local_tabs.contains_key(name) {
                return Err(self.mismatch(format!("tab '{name}' has no document")));
            }
        }
        if let Some(missing) = self.local_tabs.keys().find(|tab| !seen.contains(tab.as_str())) {
            return Err(self.mismatch(format!("tab '{missing}' missing from order")));
        }
        self.local_order = order;
        self.local_order_stamp = now;
        Ok(())
    }

    pub fn snapshot_tab(&self, tab: &str) -> SpaceResult<TabDocument> {
        self.local_tabs
            .get(tab)
            .cloned()
            .ok_or_else(|| self.not_found(tab))
    }

    pub fn snapshot_order(&self) -> TabOrderDocument {
        TabOrderDocument {
            space_id: self.space.clone(),
            timestamp: self.local_order_stamp.clone(),
            tab_order: self.local_order.clone(),
        }
    }

    /// Record a committed or fetched copy unless a newer one is already held.
    pub fn apply_remote_tab(&mut self, tab: &str, document: TabDocument) -> bool {
        if let Some(current) = self.remote_tabs.get(tab) {
            if document.timestamp.is_older_than(&current.timestamp) {
                return false;
            }
        }
        self.remote_tabs.insert(tab.to_string(), document);
        true
    }

    pub fn apply_remote_order(&mut self, order: TabOrderDocument) -> bool {
        if let Some(current) = &self.remote_order {
            if order.timestamp.is_older_than(&current.timestamp) {
                return false;
            }
        }
        self.remote_order = Some(order);
        true
    }

    /// Install a fetched tab as remote copy and draft. A draft edited after
    /// `fetched` was written is kept; returns whether the draft was replaced.
    pub fn install_loaded(
        &mut self,
        tab: &str,
        fetched: TabDocument,
        repaired: Option<TabDocument>,
    ) -> bool {
        let keep_draft = self
            .local_tabs
            .get(tab)
            .is_some_and(|draft| fetched.timestamp.is_older_than(&draft.timestamp));
        self.apply_remote_tab(tab, fetched.clone());
        if keep_draft {
            return false;
        }
        self.local_tabs
            .insert(tab.to_string(), repaired.unwrap_or(fetched));
        if !self.local_order.iter().any(|name| name == tab) {
            self.local_order.push(tab.to_string());
        }
        true
    }

    /// Take the committed order as the local one unless the local order was
    /// edited since. Names without a document are dropped and drafts the
    /// order does not mention keep their slot at the end.
    pub fn adopt_remote_order(&mut self) -> bool {
        let Some(remote) = &self.remote_order else {
            return false;
        };
        if remote.timestamp.is_older_than(&self.local_order_stamp) {
            return false;
        }
        let mut order: Vec<String> = Vec::with_capacity(self.local_tabs.len());
        for name in &remote.tab_order {
            if self.local_tabs.contains_key(name) && !order.contains(name) {
                order.push(name.clone());
            }
        }
        for name in &self.local_order {
            if !order.contains(name) {
                order.push(name.clone());
            }
        }
        self.local_order = order;
        self.local_order_stamp = remote.timestamp.clone();
        true
    }

    fn not_found(&self, tab: &str) -> SpaceError {
        SpaceError::TabNotFound {
            space: self.space.clone(),
            tab: tab.to_string(),
        }
    }

    fn exists(&self, tab: &str) -> SpaceError {
        SpaceError::TabExists {
            space: self.space.clone(),
            tab: tab.to_string(),
        }
    }

    fn mismatch(&self, reason: String) -> SpaceError {
        SpaceError::OrderMismatch {
            space: self.space.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::from(s)
    }

    const T1: &str = "2024-05-01T10:00:00.000001Z";
    const T2: &str = "2024-05-01T10:00:00.000002Z";
    const T3: &str = "2024-05-01T10:00:00.000003Z";

    fn state() -> SpaceState {
        SpaceState::new(SpaceId::from("space-1"))
    }

    fn editable(flag: bool) -> TabDocumentPatch {
        TabDocumentPatch {
            is_editable: Some(flag),
            ..Default::default()
        }
    }

    #[test]
    fn tab_name_rules() {
        for ok in ["Profile", "My Tab", "tab-2", "ünïcode"] {
            validate_tab_name(ok).expect(ok);
        }
        let long = "x".repeat(65);
        for bad in ["", ".", "..", "a/b", "a\\b", "tab\n", long.as_str()] {
            assert!(
                matches!(validate_tab_name(bad), Err(SpaceError::InvalidTabName { .. })),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn save_creates_from_initial_and_orders() {
        let mut state = state();
        state
            .save_local("Profile", editable(false), None, &TabDocument::empty(), ts(T1))
            .expect("save");
        let draft = state.local_tab("Profile").expect("draft");
        assert!(!draft.is_editable);
        assert_eq!(draft.timestamp, ts(T1));
        assert_eq!(state.local_order(), ["Profile"]);
        assert!(state.remote_tab("Profile").is_none());
        assert!(state.has_unsaved_changes("Profile"));
    }

    #[test]
    fn rename_keeps_order_slot() {
        let mut state = state();
        let initial = TabDocument::empty();
        for (name, at) in [("A", T1), ("B", T2)] {
            state.create(name, initial.clone(), ts(at)).expect("create");
        }
        state
            .save_local("A", TabDocumentPatch::default(), Some("Z"), &initial, ts(T3))
            .expect("rename");
        assert_eq!(state.local_order(), ["Z", "B"]);
        assert!(state.local_tab("A").is_none());
        assert!(state.local_tab("Z").is_some());
    }

    #[test]
    fn rename_onto_existing_tab_fails_without_change() {
        let mut state = state();
        let initial = TabDocument::empty();
        state.create("A", initial.clone(), ts(T1)).expect("create");
        state.create("B", initial.clone(), ts(T2)).expect("create");
        let err = state
            .save_local("A", editable(false), Some("B"), &initial, ts(T3))
            .expect_err("collision");
        assert!(matches!(err, SpaceError::TabExists { .. }));
        assert!(state.local_tab("A").expect("A").is_editable);
        assert_eq!(state.local_order(), ["A", "B"]);
    }

    #[test]
    fn create_and_delete_keep_order_in_step() {
        let mut state = state();
        state.create("A", TabDocument::empty(), ts(T1)).expect("create");
        assert!(matches!(
            state.create("A", TabDocument::empty(), ts(T2)),
            Err(SpaceError::TabExists { .. })
        ));
        state.delete("A", ts(T2)).expect("delete");
        assert!(state.local_order().is_empty());
        assert!(matches!(
            state.delete("A", ts(T3)),
            Err(SpaceError::TabNotFound { .. })
        ));
    }

    #[test]
    fn order_must_match_documents() {
        let mut state = state();
        state.create("A", TabDocument::empty(), ts(T1)).expect("create");
        state.create("B", TabDocument::empty(), ts(T1)).expect("create");
        for bad in [vec!["A"], vec!["A", "A", "B"], vec!["A", "B", "C"]] {
            let order = bad.into_iter().map(String::from).collect();
            assert!(matches!(
                state.set_order(order, ts(T2)),
                Err(SpaceError::OrderMismatch { .. })
            ));
        }
        state
            .set_order(vec!["B".into(), "A".into()], ts(T3))
            .expect("reorder");
        let snapshot = state.snapshot_order();
        assert_eq!(snapshot.tab_order, ["B", "A"]);
        assert_eq!(snapshot.timestamp, ts(T3));
    }

    #[test]
    fn older_remote_copy_is_refused() {
        let mut state = state();
        let mut newer = TabDocument::empty();
        newer.timestamp = ts(T2);
        let mut older = TabDocument::empty();
        older.timestamp = ts(T1);
        older.is_editable = false;
        assert!(state.apply_remote_tab("A", newer.clone()));
        assert!(!state.apply_remote_tab("A", older));
        assert_eq!(state.remote_tab("A"), Some(&newer));
    }

    #[test]
    fn reset_prefers_remote_then_initial() {
        let mut state = state();
        let initial = TabDocument::empty();
        state
            .save_local("A", editable(false), None, &initial, ts(T1))
            .expect("save");
        state.reset("A", &initial, ts(T2)).expect("reset");
        let draft = state.local_tab("A").expect("draft");
        assert!(draft.is_editable);
        assert_eq!(draft.timestamp, ts(T2));

        let mut remote = TabDocument::empty();
        remote.timestamp = ts(T2);
        remote.is_editable = false;
        state.apply_remote_tab("A", remote.clone());
        state
            .save_local("A", editable(true), None, &initial, ts(T3))
            .expect("save");
        state.reset("A", &initial, ts(T3)).expect("reset");
        assert_eq!(state.local_tab("A"), Some(&remote));
        assert!(!state.has_unsaved_changes("A"));
    }

    #[test]
    fn loading_keeps_newer_draft() {
        let mut state = state();
        state
            .save_local("A", editable(false), None, &TabDocument::empty(), ts(T3))
            .expect("save");
        let mut fetched = TabDocument::empty();
        fetched.timestamp = ts(T1);
        assert!(!state.install_loaded("A", fetched.clone(), None));
        assert!(!state.local_tab("A").expect("draft").is_editable);
        assert_eq!(state.remote_tab("A"), Some(&fetched));
    }

    #[test]
    fn remote_order_adopted_until_local_edit() {
        let mut state = state();
        for name in ["A", "B"] {
            let mut doc = TabDocument::empty();
            doc.timestamp = ts(T1);
            state.install_loaded(name, doc, None);
        }
        state.apply_remote_order(TabOrderDocument {
            space_id: state.space().clone(),
            timestamp: ts(T2),
            tab_order: vec!["B".into(), "Gone".into(), "A".into()],
        });
        assert!(state.adopt_remote_order());
        assert_eq!(state.local_order(), ["B", "A"]);

        state
            .set_order(vec!["A".into(), "B".into()], ts(T3))
            .expect("reorder");
        assert!(!state.adopt_remote_order());
        assert_eq!(state.local_order(), ["A", "B"]);
    }
}
