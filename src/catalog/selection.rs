use std::collections::BTreeSet;

use crate::catalog::{flatten_files, ClientGroup, NodeLevel};

/// Which files are selected and which tree nodes are expanded.
///
/// Both sets are keyed by stable ids, so filtering only changes what is
/// visible, never which entries are selected. Every query over the tree
/// is re-derived from the tree passed in; nothing is cached.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    selected: BTreeSet<String>,
    expanded: BTreeSet<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_expand(&mut self, node_id: &str) {
        if !self.expanded.remove(node_id) {
            self.expanded.insert(node_id.to_string());
        }
    }

    pub fn is_expanded(&self, node_id: &str) -> bool {
        self.expanded.contains(node_id)
    }

    pub fn toggle_file(&mut self, file_id: &str) {
        if !self.selected.remove(file_id) {
            self.selected.insert(file_id.to_string());
        }
    }

    pub fn is_selected(&self, file_id: &str) -> bool {
        self.selected.contains(file_id)
    }

    pub fn selected_ids(&self) -> &BTreeSet<String> {
        &self.selected
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Every file id visible in the given (already filtered) tree.
    pub fn visible_file_ids(tree: &[ClientGroup]) -> Vec<String> {
        flatten_files(tree).iter().map(|f| f.id.clone()).collect()
    }

    /// Select every visible file, or clear the selection when it already
    /// equals the visible set. "All" means "all visible": previously
    /// selected files outside the current view are dropped on select-all.
    pub fn toggle_select_all(&mut self, tree: &[ClientGroup]) {
        let visible: BTreeSet<String> = Self::visible_file_ids(tree).into_iter().collect();
        if self.selected == visible {
            self.selected.clear();
        } else {
            self.selected = visible;
        }
    }

    pub fn is_all_selected(&self, tree: &[ClientGroup]) -> bool {
        let visible = Self::visible_file_ids(tree);
        !visible.is_empty() && visible.iter().all(|id| self.selected.contains(id))
    }

    /// Select-remaining semantics: a partially selected subtree becomes
    /// fully selected; only a fully selected subtree is deselected.
    pub fn toggle_node(&mut self, tree: &[ClientGroup], node_id: &str, level: NodeLevel) {
        let ids = ids_under_node(tree, node_id, level);
        if ids.is_empty() {
            return;
        }
        if ids.iter().all(|id| self.selected.contains(id)) {
            for id in &ids {
                self.selected.remove(id);
            }
        } else {
            self.selected.extend(ids);
        }
    }

    /// An empty subtree (all files filtered out) is never "fully selected".
    pub fn is_node_fully_selected(
        &self,
        tree: &[ClientGroup],
        node_id: &str,
        level: NodeLevel,
    ) -> bool {
        let ids = ids_under_node(tree, node_id, level);
        !ids.is_empty() && ids.iter().all(|id| self.selected.contains(id))
    }
}

/// File ids in the subtree rooted at `node_id`, in tree order. Empty when
/// the node does not exist at that level.
pub fn ids_under_node(tree: &[ClientGroup], node_id: &str, level: NodeLevel) -> Vec<String> {
    match level {
        NodeLevel::Client => tree
            .iter()
            .filter(|client| client.id == node_id)
            .flat_map(|client| flatten_files(std::slice::from_ref(client)))
            .map(|f| f.id.clone())
            .collect(),
        NodeLevel::Year => tree
            .iter()
            .flat_map(|client| &client.years)
            .filter(|year| year.id == node_id)
            .flat_map(|year| &year.months)
            .flat_map(|month| &month.files)
            .map(|f| f.id.clone())
            .collect(),
        NodeLevel::Month => tree
            .iter()
            .flat_map(|client| &client.years)
            .flat_map(|year| &year.months)
            .filter(|month| month.id == node_id)
            .flat_map(|month| &month.files)
            .map(|f| f.id.clone())
            .collect(),
    }
}
