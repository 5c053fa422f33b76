//! Heatmap cache: heatmap chunk → aggregate activity intensity.

#[cfg(test)]
#[path = "heatmap_test.rs"]
mod heatmap_test;

use std::collections::HashMap;

use crate::consts::{HEAT_HOT_THRESHOLD, HEAT_WARM_THRESHOLD};
use crate::coords::{CellCoord, HeatmapChunk};
use crate::net::types::HeatValue;

/// Display tier of a heat value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeatTier {
    Cold,
    Warm,
    Hot,
}

impl HeatTier {
    /// Tier for `value`, or `None` for a chunk with no activity.
    #[must_use]
    pub fn classify(value: u32) -> Option<Self> {
        match value {
            0 => None,
            v if v >= HEAT_HOT_THRESHOLD => Some(Self::Hot),
            v if v >= HEAT_WARM_THRESHOLD => Some(Self::Warm),
            _ => Some(Self::Cold),
        }
    }

    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::Hot => "#FF4500",
            Self::Warm => "#FFD700",
            Self::Cold => "#1E90FF",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Hot => "hot",
            Self::Warm => "warm",
            Self::Cold => "cold",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HeatmapCache {
    values: HashMap<HeatmapChunk, u32>,
}

impl HeatmapCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, chunk: HeatmapChunk, value: u32) {
        self.values.insert(chunk, value);
    }

    pub fn merge(&mut self, values: &[HeatValue]) {
        for value in values {
            self.set(value.chunk(), value.heat_value);
        }
    }

    #[must_use]
    pub fn get(&self, chunk: HeatmapChunk) -> Option<u32> {
        self.values.get(&chunk).copied()
    }

    /// Adjust the heat of the chunk containing `cell`, saturating at 0.
    /// Returns the new value.
    pub fn bump(&mut self, cell: CellCoord, increment: i64) -> u32 {
        let entry = self.values.entry(cell.heatmap_chunk()).or_insert(0);
        let next = (i64::from(*entry) + increment).clamp(0, i64::from(u32::MAX));
        *entry = u32::try_from(next).unwrap_or(u32::MAX);
        *entry
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn to_map(&self) -> HashMap<HeatmapChunk, u32> {
        self.values.clone()
    }
}
