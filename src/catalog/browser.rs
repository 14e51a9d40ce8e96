use crate::catalog::{
    flatten_files, ids_under_node, ClientGroup, DteFile, FilterCriteria, NodeLevel, SelectionState,
};

/// Facade over the catalog: holds the unfiltered master tree, the live
/// filter criteria and the selection state, and keeps the two views
/// consistent. Selection operations always work against the filtered
/// tree; resolution for export always works against the master.
#[derive(Debug, Default)]
pub struct DocumentBrowser {
    master: Vec<ClientGroup>,
    criteria: FilterCriteria,
    selection: SelectionState,
}

impl DocumentBrowser {
    pub fn new(groups: Vec<ClientGroup>) -> Self {
        Self {
            master: groups,
            criteria: FilterCriteria::default(),
            selection: SelectionState::new(),
        }
    }

    /// Replace the master tree after a re-fetch. Selection and expansion
    /// survive because ids are stable for the same backend dataset.
    pub fn refresh(&mut self, groups: Vec<ClientGroup>) {
        self.master = groups;
    }

    pub fn master(&self) -> &[ClientGroup] {
        &self.master
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.criteria.search_term = term.into();
    }

    pub fn set_start_date(&mut self, date: impl Into<String>) {
        self.criteria.start_date = date.into();
    }

    pub fn set_end_date(&mut self, date: impl Into<String>) {
        self.criteria.end_date = date.into();
    }

    /// The filtered tree, re-derived on every call.
    pub fn visible(&self) -> Vec<ClientGroup> {
        self.criteria.apply(&self.master)
    }

    pub fn visible_file_ids(&self) -> Vec<String> {
        SelectionState::visible_file_ids(&self.visible())
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn toggle_expand(&mut self, node_id: &str) {
        self.selection.toggle_expand(node_id);
    }

    pub fn toggle_file(&mut self, file_id: &str) {
        self.selection.toggle_file(file_id);
    }

    pub fn toggle_select_all(&mut self) {
        let visible = self.visible();
        self.selection.toggle_select_all(&visible);
    }

    pub fn is_all_selected(&self) -> bool {
        self.selection.is_all_selected(&self.visible())
    }

    pub fn toggle_node(&mut self, node_id: &str, level: NodeLevel) {
        let visible = self.visible();
        self.selection.toggle_node(&visible, node_id, level);
    }

    pub fn is_node_fully_selected(&self, node_id: &str, level: NodeLevel) -> bool {
        self.selection
            .is_node_fully_selected(&self.visible(), node_id, level)
    }

    /// File ids under a node of the filtered tree; empty for unknown nodes.
    pub fn node_file_ids(&self, node_id: &str, level: NodeLevel) -> Vec<String> {
        ids_under_node(&self.visible(), node_id, level)
    }

    /// Resolve the selection against the unfiltered master list, in tree
    /// order. Files hidden by the current filter still resolve; ids that
    /// no longer exist in the master are silently dropped.
    pub fn selected_files(&self) -> Vec<DteFile> {
        flatten_files(&self.master)
            .into_iter()
            .filter(|file| self.selection.is_selected(&file.id))
            .cloned()
            .collect()
    }
}
