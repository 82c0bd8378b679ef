use std::collections::HashSet;

use crate::models::agenda_item::ItemId;

/// Row selection for bulk actions, keyed by id and limited to the page on
/// screen.
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    displayed: Vec<ItemId>,
    selected: HashSet<ItemId>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt a freshly fetched page. Returns how many selected ids were dropped.
    pub fn reconcile(&mut self, displayed: &[ItemId]) -> usize {
        self.displayed = displayed.to_vec();
        let before = self.selected.len();
        let visible: HashSet<ItemId> = displayed.iter().copied().collect();
        self.selected.retain(|id| visible.contains(id));
        before - self.selected.len()
    }

    /// Ids not on the displayed page are ignored.
    pub fn toggle(&mut self, id: ItemId) {
        if !self.displayed.contains(&id) {
            return;
        }
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
    }

    /// Select the whole page unless it is already fully selected, then clear.
    pub fn toggle_all(&mut self) {
        if self.all_selected() {
            self.selected.clear();
        } else {
            self.selected.extend(self.displayed.iter().copied());
        }
    }

    pub fn all_selected(&self) -> bool {
        !self.displayed.is_empty() && self.displayed.iter().all(|id| self.selected.contains(id))
    }

    pub fn is_selected(&self, id: ItemId) -> bool {
        self.selected.contains(&id)
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn count(&self) -> usize {
        self.selected.len()
    }

    /// Selected ids in ascending order.
    pub fn selected_ids(&self) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self.selected.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}
