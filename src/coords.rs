//! Discrete grid coordinates.
//!
//! DESIGN
//! ======
//! Three coordinate spaces share the same integer-pair shape but are kept as
//! distinct types so they cannot be mixed up:
//! - [`CellCoord`]: one grid cell, `(row, col)`.
//! - [`FetchChunk`]: a 10 × 10 block of cells, the unit of grid fetching.
//! - [`HeatmapChunk`]: a 9 × 9 block of cells, the unit of heat aggregation.
//!
//! Every type has a canonical `"a,b"` key used on the wire and in logs.
//! Division is always flooring (`div_euclid`), so negative cells land in
//! negative chunks instead of being truncated toward zero.

#[cfg(test)]
#[path = "coords_test.rs"]
mod coords_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::{FETCH_CHUNK_CELLS, HEATMAP_CHUNK_CELLS};

/// Error returned when a `"a,b"` key cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoordParseError {
    /// The key does not contain exactly one comma.
    #[error("expected `a,b` coordinate key, got `{0}`")]
    Shape(String),
    /// One side of the key is not an integer.
    #[error("invalid integer `{value}` in coordinate key `{key}`")]
    Number { key: String, value: String },
}

fn parse_pair(key: &str) -> Result<(i64, i64), CoordParseError> {
    let mut parts = key.split(',');
    let (Some(a), Some(b), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(CoordParseError::Shape(key.to_owned()));
    };
    let parse = |value: &str| {
        value.trim().parse::<i64>().map_err(|_| CoordParseError::Number {
            key: key.to_owned(),
            value: value.to_owned(),
        })
    };
    Ok((parse(a)?, parse(b)?))
}

// =============================================================================
// CELL
// =============================================================================

/// One addressable cell of the infinite grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    #[serde(rename = "rowIndex")]
    pub row: i64,
    #[serde(rename = "colIndex")]
    pub col: i64,
}

impl CellCoord {
    #[must_use]
    pub fn new(row: i64, col: i64) -> Self {
        Self { row, col }
    }

    /// Canonical `"row,col"` key.
    #[must_use]
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// The fetch chunk containing this cell.
    #[must_use]
    pub fn fetch_chunk(&self) -> FetchChunk {
        FetchChunk::containing(*self)
    }

    /// The heatmap chunk containing this cell.
    #[must_use]
    pub fn heatmap_chunk(&self) -> HeatmapChunk {
        HeatmapChunk::containing(*self)
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

impl FromStr for CellCoord {
    type Err = CoordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (row, col) = parse_pair(s)?;
        Ok(Self { row, col })
    }
}

// =============================================================================
// CELL RANGE
// =============================================================================

/// Inclusive rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRange {
    pub start_row: i64,
    pub end_row: i64,
    pub start_col: i64,
    pub end_col: i64,
}

impl CellRange {
    #[must_use]
    pub fn new(start_row: i64, end_row: i64, start_col: i64, end_col: i64) -> Self {
        Self { start_row, end_row, start_col, end_col }
    }

    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        (self.start_row..=self.end_row).contains(&cell.row) && (self.start_col..=self.end_col).contains(&cell.col)
    }

    /// Every cell in the range, row-major.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        (self.start_row..=self.end_row)
            .flat_map(move |row| (self.start_col..=self.end_col).map(move |col| CellCoord::new(row, col)))
    }

    /// Smallest range covering every chunk in `chunks`, or `None` if empty.
    #[must_use]
    pub fn covering(chunks: &[FetchChunk]) -> Option<Self> {
        chunks.iter().map(FetchChunk::cell_range).reduce(|acc, r| Self {
            start_row: acc.start_row.min(r.start_row),
            end_row: acc.end_row.max(r.end_row),
            start_col: acc.start_col.min(r.start_col),
            end_col: acc.end_col.max(r.end_col),
        })
    }

    /// Fetch chunks covering the range, row-major.
    #[must_use]
    pub fn fetch_chunks(&self) -> Vec<FetchChunk> {
        let first = FetchChunk::containing(CellCoord::new(self.start_row, self.start_col));
        let last = FetchChunk::containing(CellCoord::new(self.end_row, self.end_col));
        (first.row..=last.row)
            .flat_map(|row| (first.col..=last.col).map(move |col| FetchChunk::new(row, col)))
            .collect()
    }

    /// Heatmap chunks covering the range, ordered by `grid_y` then `grid_x`.
    #[must_use]
    pub fn heatmap_chunks(&self) -> Vec<HeatmapChunk> {
        let first = HeatmapChunk::containing(CellCoord::new(self.start_row, self.start_col));
        let last = HeatmapChunk::containing(CellCoord::new(self.end_row, self.end_col));
        (first.grid_y..=last.grid_y)
            .flat_map(|grid_y| (first.grid_x..=last.grid_x).map(move |grid_x| HeatmapChunk::new(grid_x, grid_y)))
            .collect()
    }
}

// =============================================================================
// FETCH CHUNK
// =============================================================================

/// A 10 × 10 block of cells; the unit of grid fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FetchChunk {
    pub row: i64,
    pub col: i64,
}

impl FetchChunk {
    #[must_use]
    pub fn new(row: i64, col: i64) -> Self {
        Self { row, col }
    }

    #[must_use]
    pub fn containing(cell: CellCoord) -> Self {
        Self {
            row: cell.row.div_euclid(FETCH_CHUNK_CELLS),
            col: cell.col.div_euclid(FETCH_CHUNK_CELLS),
        }
    }

    /// The cells covered by this chunk.
    #[must_use]
    pub fn cell_range(&self) -> CellRange {
        let start_row = self.row.saturating_mul(FETCH_CHUNK_CELLS);
        let start_col = self.col.saturating_mul(FETCH_CHUNK_CELLS);
        CellRange::new(
            start_row,
            start_row.saturating_add(FETCH_CHUNK_CELLS - 1),
            start_col,
            start_col.saturating_add(FETCH_CHUNK_CELLS - 1),
        )
    }

    /// Canonical `"chunkRow,chunkCol"` key.
    #[must_use]
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FetchChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

impl FromStr for FetchChunk {
    type Err = CoordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (row, col) = parse_pair(s)?;
        Ok(Self { row, col })
    }
}

// =============================================================================
// HEATMAP CHUNK
// =============================================================================

/// A 9 × 9 block of cells holding one aggregate heat value.
///
/// `grid_x` follows columns and `grid_y` follows rows, matching the server's
/// `gridX,gridY` ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeatmapChunk {
    pub grid_x: i64,
    pub grid_y: i64,
}

impl HeatmapChunk {
    #[must_use]
    pub fn new(grid_x: i64, grid_y: i64) -> Self {
        Self { grid_x, grid_y }
    }

    #[must_use]
    pub fn containing(cell: CellCoord) -> Self {
        Self {
            grid_x: cell.col.div_euclid(HEATMAP_CHUNK_CELLS),
            grid_y: cell.row.div_euclid(HEATMAP_CHUNK_CELLS),
        }
    }

    /// Canonical `"gridX,gridY"` key.
    #[must_use]
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for HeatmapChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.grid_x, self.grid_y)
    }
}

impl FromStr for HeatmapChunk {
    type Err = CoordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (grid_x, grid_y) = parse_pair(s)?;
        Ok(Self { grid_x, grid_y })
    }
}

/// Join heatmap chunk keys into the `;`-separated list the server expects.
#[must_use]
pub fn join_heatmap_keys(chunks: &[HeatmapChunk]) -> String {
    chunks.iter().map(HeatmapChunk::key).collect::<Vec<_>>().join(";")
}
