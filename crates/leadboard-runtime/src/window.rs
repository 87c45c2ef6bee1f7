#![forbid(unsafe_code)]

//! Per-column incremental reveal (virtualization window).
//!
//! Each stage column renders only a prefix of its bucket. The cursor resets
//! to one batch whenever the stage's lead count changes (a move in or out,
//! or a filter change) and grows by one batch on explicit "load more".

use ahash::AHashMap;

use leadboard_core::{Lead, Stage};

/// Default reveal batch size.
pub const DEFAULT_BATCH: usize = 20;

/// Per-stage visible-count cursors.
#[derive(Debug, Clone)]
pub struct VirtualWindow {
    batch: usize,
    counts: AHashMap<Stage, usize>,
}

impl VirtualWindow {
    /// Window with the given batch size (clamped to at least 1).
    #[must_use]
    pub fn new(batch: usize) -> Self {
        Self {
            batch: batch.max(1),
            counts: AHashMap::new(),
        }
    }

    /// The configured batch size.
    #[must_use]
    pub fn batch(&self) -> usize {
        self.batch
    }

    /// Current visible count for a stage (one batch until grown).
    #[must_use]
    pub fn visible_count(&self, stage: Stage) -> usize {
        self.counts.get(&stage).copied().unwrap_or(self.batch)
    }

    /// Reset one stage's cursor to a single batch. Called whenever that
    /// stage's lead count changes; the previously revealed window is no
    /// longer meaningful after a structural change.
    pub fn reset(&mut self, stage: Stage) {
        self.counts.remove(&stage);
    }

    /// Reset every stage's cursor (wholesale refresh, filter change).
    pub fn reset_all(&mut self) {
        self.counts.clear();
    }

    /// Grow a stage's cursor by one batch, capped at `total`. A cursor
    /// already at or past `total` is left unchanged.
    pub fn load_more(&mut self, stage: Stage, total: usize) -> usize {
        let current = self.visible_count(stage);
        if current >= total {
            return current;
        }
        let grown = current.saturating_add(self.batch).min(total);
        self.counts.insert(stage, grown);
        grown
    }

    /// The first `visible_count` leads of a stage's bucket. Ordering within
    /// the bucket is the caller's display order, untouched here.
    #[must_use]
    pub fn visible_slice<'a>(&self, stage: Stage, leads: &'a [Lead]) -> &'a [Lead] {
        let count = self.visible_count(stage).min(leads.len());
        &leads[..count]
    }
}

impl Default for VirtualWindow {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH)
    }
}
