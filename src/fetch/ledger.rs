//! Per-chunk fetch status.

#[cfg(test)]
#[path = "ledger_test.rs"]
mod ledger_test;

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStatus {
    Unfetched,
    /// Claimed by an in-flight request. No other request may claim it.
    Pending,
    /// Fetched successfully. Never fetched again this session.
    Loaded,
}

/// Tri-state ledger: `Unfetched → Pending → Loaded`, or `Pending → Unfetched`
/// on failure.
#[derive(Debug, Clone)]
pub struct ChunkLedger<K> {
    status: HashMap<K, ChunkStatus>,
}

impl<K> Default for ChunkLedger<K> {
    fn default() -> Self {
        Self { status: HashMap::new() }
    }
}

impl<K: Copy + Eq + Hash> ChunkLedger<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn status(&self, key: K) -> ChunkStatus {
        self.status.get(&key).copied().unwrap_or(ChunkStatus::Unfetched)
    }

    /// The subset of `keys` still unfetched, in input order, deduplicated.
    #[must_use]
    pub fn unfetched(&self, keys: &[K]) -> Vec<K> {
        let mut out: Vec<K> = Vec::new();
        for &key in keys {
            if self.status(key) == ChunkStatus::Unfetched && !out.contains(&key) {
                out.push(key);
            }
        }
        out
    }

    /// Move every unfetched key to `Pending` and return the ones claimed.
    pub fn claim(&mut self, keys: &[K]) -> Vec<K> {
        let claimed = self.unfetched(keys);
        for &key in &claimed {
            self.status.insert(key, ChunkStatus::Pending);
        }
        claimed
    }

    pub fn mark_loaded(&mut self, keys: &[K]) {
        for &key in keys {
            self.status.insert(key, ChunkStatus::Loaded);
        }
    }

    /// Return pending keys to `Unfetched` so a later trigger retries them.
    /// Loaded keys are left alone.
    pub fn rollback(&mut self, keys: &[K]) {
        for key in keys {
            if self.status.get(key) == Some(&ChunkStatus::Pending) {
                self.status.remove(key);
            }
        }
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.status.values().any(|s| *s == ChunkStatus::Pending)
    }

    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.status.values().filter(|s| **s == ChunkStatus::Loaded).count()
    }

    pub fn clear(&mut self) {
        self.status.clear();
    }
}
