//! Application state: the current dataset snapshot.
//!
//! A snapshot is never mutated after it is built. Synchronization builds a
//! complete new snapshot and swaps it in, so readers holding the previous
//! `Arc` keep a consistent view.

use crate::models::{Dataset, SourceKind};
use std::collections::BTreeMap;
use std::sync::Arc;

/// The loaded datasets, keyed by source. Absent sources have no entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    datasets: BTreeMap<SourceKind, Dataset>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, used while assembling a snapshot.
    pub fn with(mut self, kind: SourceKind, dataset: Dataset) -> Self {
        self.datasets.insert(kind, dataset);
        self
    }

    pub fn get(&self, kind: SourceKind) -> Option<&Dataset> {
        self.datasets.get(&kind)
    }

    /// Sources present in this snapshot, in source order.
    pub fn loaded_sources(&self) -> Vec<SourceKind> {
        self.datasets.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SourceKind, &Dataset)> {
        self.datasets.iter().map(|(k, d)| (*k, d))
    }
}

impl FromIterator<(SourceKind, Dataset)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (SourceKind, Dataset)>>(iter: I) -> Self {
        Self {
            datasets: iter.into_iter().collect(),
        }
    }
}

/// Holds the current snapshot.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    snapshot: Arc<Snapshot>,
}

impl AppState {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
        }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Replace the whole snapshot.
    pub fn replace(&mut self, snapshot: Snapshot) {
        self.snapshot = Arc::new(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;

    fn one_row() -> Dataset {
        let mut ds = Dataset::new(vec!["USUARIO".to_string()]);
        ds.push(Record::from_pairs([("USUARIO", "Ana")]));
        ds
    }

    #[test]
    fn test_snapshot_presence() {
        let snapshot = Snapshot::new().with(SourceKind::Rips, one_row());
        assert!(snapshot.get(SourceKind::Rips).is_some());
        assert!(snapshot.get(SourceKind::Ppl).is_none());
        assert_eq!(snapshot.loaded_sources(), vec![SourceKind::Rips]);
    }

    #[test]
    fn test_replace_keeps_old_readers_consistent() {
        let mut state = AppState::new(Snapshot::new().with(SourceKind::Ppl, one_row()));
        let before = state.snapshot();

        state.replace(Snapshot::new().with(SourceKind::Rips, one_row()));
        let after = state.snapshot();

        assert!(before.get(SourceKind::Ppl).is_some());
        assert!(before.get(SourceKind::Rips).is_none());
        assert!(after.get(SourceKind::Ppl).is_none());
        assert!(after.get(SourceKind::Rips).is_some());
    }
}
