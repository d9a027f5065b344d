// Keyed store of the latest snapshot per resource, with a deterministic display order

use std::collections::HashMap;

use crate::models::MetricSnapshot;

/// Last-writer-wins store keyed by resource id.
///
/// Entries are only ever replaced, never removed, until [`MetricReconciler::reset`].
#[derive(Debug, Default)]
pub struct MetricReconciler {
    store: HashMap<String, MetricSnapshot>,
}

impl MetricReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts every snapshot of `batch` in order and returns the whole store sorted by
    /// (name, id). Resources missing from a partial batch keep their previous snapshot.
    pub fn merge(&mut self, batch: Vec<MetricSnapshot>) -> Vec<MetricSnapshot> {
        for snapshot in batch {
            self.store.insert(snapshot.resource.id.clone(), snapshot);
        }
        self.view()
    }

    /// Current store in display order: name ascending (byte-wise, case-sensitive), then id.
    pub fn view(&self) -> Vec<MetricSnapshot> {
        let mut ordered: Vec<MetricSnapshot> = self.store.values().cloned().collect();
        ordered.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id().cmp(b.id())));
        ordered
    }

    pub fn get(&self, id: &str) -> Option<&MetricSnapshot> {
        self.store.get(id)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn reset(&mut self) {
        self.store.clear();
    }
}
