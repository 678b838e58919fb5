//! Selection over the loaded logo records.
//!
//! The reference logo of a search is locked: it is selected as soon as it is
//! loaded and no toggle can clear it. Every operation builds a new record
//! list and swaps it in; records are never edited in place.

use std::collections::HashSet;

use crate::model::{LogoId, LogoRecord};

/// `records` with `id` flipped, unless `id` is the locked reference or absent.
pub fn toggle(records: &[LogoRecord], id: LogoId, locked: Option<LogoId>) -> Vec<LogoRecord> {
    if locked == Some(id) {
        return records.to_vec();
    }
    records
        .iter()
        .map(|record| {
            if record.id == id {
                record.with_selected(!record.selected)
            } else {
                record.clone()
            }
        })
        .collect()
}

/// `records` with every logo selected.
pub fn select_all(records: &[LogoRecord]) -> Vec<LogoRecord> {
    records.iter().map(|r| r.with_selected(true)).collect()
}

/// `records` with only the locked reference selected.
pub fn unselect_all(records: &[LogoRecord], locked: Option<LogoId>) -> Vec<LogoRecord> {
    records
        .iter()
        .map(|r| r.with_selected(Some(r.id) == locked))
        .collect()
}

/// Loaded records plus the locked reference id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionStore {
    records: Vec<LogoRecord>,
    locked: Option<LogoId>,
}

impl SelectionStore {
    /// Fresh store from a full load: only the reference logo is selected.
    pub fn pristine(records: Vec<LogoRecord>, locked: Option<LogoId>) -> Self {
        Self {
            records: unselect_all(&records, locked),
            locked,
        }
    }

    pub fn records(&self) -> &[LogoRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn locked_id(&self) -> Option<LogoId> {
        self.locked
    }

    pub fn ids(&self) -> Vec<LogoId> {
        self.records.iter().map(|r| r.id).collect()
    }

    /// The loaded record of the reference logo, if it is loaded.
    pub fn reference_logo(&self) -> Option<&LogoRecord> {
        let locked = self.locked?;
        self.records.iter().find(|r| r.id == locked)
    }

    pub fn toggle(&mut self, id: LogoId) {
        self.records = toggle(&self.records, id, self.locked);
    }

    pub fn select_all(&mut self) {
        self.records = select_all(&self.records);
    }

    /// Back to the pristine selection.
    pub fn unselect_all(&mut self) {
        self.records = unselect_all(&self.records, self.locked);
    }

    /// Append unselected records, skipping ids already held.
    ///
    /// Returns how many were added.
    pub fn append(&mut self, new_records: Vec<LogoRecord>) -> usize {
        let mut held: HashSet<LogoId> = self.records.iter().map(|r| r.id).collect();
        let mut records = self.records.clone();
        let before = records.len();
        records.extend(
            new_records
                .into_iter()
                .filter(|r| held.insert(r.id))
                .map(|r| r.with_selected(Some(r.id) == self.locked)),
        );
        let added = records.len() - before;
        self.records = records;
        added
    }

    pub fn selected_records(&self) -> Vec<&LogoRecord> {
        self.records.iter().filter(|r| r.selected).collect()
    }

    pub fn selected_ids(&self) -> Vec<LogoId> {
        self.records
            .iter()
            .filter(|r| r.selected)
            .map(|r| r.id)
            .collect()
    }

    pub fn selected_count(&self) -> usize {
        self.records.iter().filter(|r| r.selected).count()
    }

    /// Whether unselecting would change anything: false when nothing is
    /// selected or the only selection is the locked reference.
    pub fn can_unselect_all(&self) -> bool {
        match self.selected_ids().as_slice() {
            [] => false,
            [only] => Some(*only) != self.locked,
            _ => true,
        }
    }
}
