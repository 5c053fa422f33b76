//! Cell cache: coordinate → latest observed cell.

#[cfg(test)]
#[path = "cells_test.rs"]
mod cells_test;

use std::collections::HashMap;

use crate::coords::{CellCoord, CellRange};
use crate::net::types::Cell;

/// At most one live cell per coordinate. Whichever write lands last wins,
/// whether it came from a fetch or a realtime push.
#[derive(Debug, Clone, Default)]
pub struct CellCache {
    cells: HashMap<CellCoord, Cell>,
}

impl CellCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the cell at its coordinate. Returns the replaced cell.
    pub fn upsert(&mut self, cell: Cell) -> Option<Cell> {
        self.cells.insert(cell.coord(), cell)
    }

    /// Merge a batch of cells, keyed by coordinate.
    pub fn merge(&mut self, cells: impl IntoIterator<Item = Cell>) -> usize {
        let mut merged = 0;
        for cell in cells {
            self.upsert(cell);
            merged += 1;
        }
        merged
    }

    pub fn remove(&mut self, coord: CellCoord) -> Option<Cell> {
        self.cells.remove(&coord)
    }

    #[must_use]
    pub fn get(&self, coord: CellCoord) -> Option<&Cell> {
        self.cells.get(&coord)
    }

    #[must_use]
    pub fn contains(&self, coord: CellCoord) -> bool {
        self.cells.contains_key(&coord)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cached cells inside `range`, sorted by coordinate.
    #[must_use]
    pub fn in_range(&self, range: CellRange) -> Vec<&Cell> {
        let mut cells: Vec<&Cell> = self.cells.values().filter(|c| range.contains(c.coord())).collect();
        cells.sort_by_key(|c| c.coord());
        cells
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellCoord, &Cell)> {
        self.cells.iter()
    }

    pub(crate) fn to_map(&self) -> HashMap<CellCoord, Cell> {
        self.cells.clone()
    }
}
