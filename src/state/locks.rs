//! Advisory lock set: cells another client is currently editing.

use std::collections::HashSet;

use crate::coords::CellCoord;

/// Only realtime presence events mutate this set; fetches never touch it.
#[derive(Debug, Clone, Default)]
pub struct LockSet {
    cells: HashSet<CellCoord>,
}

impl LockSet {
    /// Returns `true` if the cell was not already locked.
    pub fn insert(&mut self, cell: CellCoord) -> bool {
        self.cells.insert(cell)
    }

    /// Returns `true` if the cell was locked.
    pub fn remove(&mut self, cell: CellCoord) -> bool {
        self.cells.remove(&cell)
    }

    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        self.cells.contains(&cell)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub(crate) fn to_set(&self) -> HashSet<CellCoord> {
        self.cells.clone()
    }
}
