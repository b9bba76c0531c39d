use super::atom::{AtomIdentity, DatasetAtomRecord};
use std::collections::HashMap;

/// Per-atom metric records for a single higher-dose dataset, keyed by atom
/// identity.
///
/// One table per dataset, ordered externally by increasing dose. Tables are
/// the hand-off artifact from the map-processing stage to the combine stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetMetricTable {
    records: HashMap<AtomIdentity, DatasetAtomRecord>,
}

impl DatasetMetricTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record, replacing any previous record with the same identity.
    pub fn insert(&mut self, record: DatasetAtomRecord) {
        self.records.insert(record.identity.clone(), record);
    }

    pub fn get(&self, identity: &AtomIdentity) -> Option<&DatasetAtomRecord> {
        self.records.get(identity)
    }

    pub fn contains(&self, identity: &AtomIdentity) -> bool {
        self.records.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DatasetAtomRecord> {
        self.records.values()
    }
}
