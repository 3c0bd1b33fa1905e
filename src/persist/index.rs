use std::collections::BTreeMap;

use crate::{foundation::core::OverlayId, persist::payload::LabelEntry};

/// Synchronous in-memory label side table kept consistent by the bridge.
pub trait LabelIndex {
    /// Insert or replace the entry for `entry.overlay_id`.
    fn add_label(&mut self, entry: LabelEntry);
    /// Remove the entry for `id`; absent ids are ignored.
    fn remove_label(&mut self, id: &OverlayId);
}

/// Label index backed by an ordered map, for tests and single-process hosts.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLabelIndex {
    entries: BTreeMap<OverlayId, LabelEntry>,
}

impl InMemoryLabelIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &OverlayId) -> Option<&LabelEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries belonging to `field`, ordered by overlay id.
    pub fn by_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a LabelEntry> + 'a {
        self.entries.values().filter(move |e| e.field == field)
    }
}

impl LabelIndex for InMemoryLabelIndex {
    fn add_label(&mut self, entry: LabelEntry) {
        self.entries.insert(entry.overlay_id.clone(), entry);
    }

    fn remove_label(&mut self, id: &OverlayId) {
        self.entries.remove(id);
    }
}
