#![forbid(unsafe_code)]

//! Collapsed/expanded state per stage column.
//!
//! Each stage is `Expanded ⇄ Collapsed`, initially Expanded unless restored
//! from the key-value store. Fold policies compute a full replacement set in
//! one step (never incremental toggles) so applying the same policy twice is
//! idempotent. Policy requests carry a monotonically increasing sequence
//! number; a request whose number is not strictly greater than the last one
//! applied is dropped, making duplicate external triggers safe.
//!
//! Persistence is synchronous best-effort: collapse state is a view
//! preference, not data of record, so a failing store is debug-logged and
//! swallowed.

use ahash::AHashSet;

use leadboard_core::Stage;

use crate::store::KeyValueStore;

/// One-step fold policies over the whole board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldPolicy {
    /// Expand every column.
    ExpandAll,
    /// Collapse exactly the empty columns.
    FoldEmpty,
    /// Collapse exactly the columns with `count <= threshold`.
    FoldAtOrBelow(usize),
}

/// Tracks which stage columns are collapsed and persists the set.
#[derive(Debug)]
pub struct CollapseManager {
    key: String,
    collapsed: AHashSet<Stage>,
    last_seq: u64,
}

impl CollapseManager {
    /// Fresh manager (everything expanded) persisting under `key`.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            collapsed: AHashSet::new(),
            last_seq: 0,
        }
    }

    /// Manager restored from the store; garbage or absent state yields the
    /// all-expanded default.
    #[must_use]
    pub fn restore(key: impl Into<String>, store: &dyn KeyValueStore) -> Self {
        let key = key.into();
        let collapsed = store
            .get(&key)
            .and_then(|raw| serde_json::from_str::<Vec<Stage>>(&raw).ok())
            .map(|stages| stages.into_iter().collect())
            .unwrap_or_default();
        Self {
            key,
            collapsed,
            last_seq: 0,
        }
    }

    #[must_use]
    pub fn is_collapsed(&self, stage: Stage) -> bool {
        self.collapsed.contains(&stage)
    }

    /// Stages currently collapsed, sorted for stable output.
    #[must_use]
    pub fn collapsed(&self) -> Vec<Stage> {
        let mut stages: Vec<Stage> = self.collapsed.iter().copied().collect();
        stages.sort();
        stages
    }

    /// Flip one stage and persist immediately.
    pub fn toggle(&mut self, stage: Stage, store: &mut dyn KeyValueStore) {
        if !self.collapsed.remove(&stage) {
            self.collapsed.insert(stage);
        }
        self.persist(store);
    }

    /// Replace the collapsed set per `policy` over the given bucket counts.
    /// Returns whether the request was applied; stale sequence numbers are
    /// dropped.
    pub fn apply_policy(
        &mut self,
        policy: FoldPolicy,
        counts: &[(Stage, usize)],
        seq: u64,
        store: &mut dyn KeyValueStore,
    ) -> bool {
        if seq <= self.last_seq {
            tracing::debug!(
                target: "leadboard.collapse",
                seq,
                last_seq = self.last_seq,
                "stale fold policy request dropped"
            );
            return false;
        }
        self.last_seq = seq;

        self.collapsed = match policy {
            FoldPolicy::ExpandAll => AHashSet::new(),
            FoldPolicy::FoldEmpty => counts
                .iter()
                .filter(|(_, n)| *n == 0)
                .map(|(s, _)| *s)
                .collect(),
            FoldPolicy::FoldAtOrBelow(threshold) => counts
                .iter()
                .filter(|(_, n)| *n <= threshold)
                .map(|(s, _)| *s)
                .collect(),
        };
        self.persist(store);
        true
    }

    fn persist(&self, store: &mut dyn KeyValueStore) {
        let raw = match serde_json::to_string(&self.collapsed()) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(target: "leadboard.collapse", error = %e, "collapse state serialization failed");
                return;
            }
        };
        if let Err(e) = store.set(&self.key, &raw) {
            tracing::debug!(
                target: "leadboard.collapse",
                key = %self.key,
                error = %e,
                "collapse state not persisted"
            );
        }
    }
}
