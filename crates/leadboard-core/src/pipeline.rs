#![forbid(unsafe_code)]

//! Grouping leads into per-stage buckets and the pure move transform.
//!
//! # Invariants
//!
//! 1. [`group_by_stage`] places every input lead in exactly one bucket;
//!    flattening the buckets reconstructs a multiset equal to the input.
//! 2. A lead whose stage is not a member of the registry (scoped boards)
//!    lands in the registry's default bucket rather than being dropped.
//! 3. [`with_moved_lead`] never mutates its input; the no-op cases are
//!    signaled, not silent.

use ahash::AHashMap;

use crate::lead::{Lead, LeadId};
use crate::stage::{Stage, StageRegistry};

/// Per-stage ordered buckets over one board's leads.
#[derive(Debug, Clone)]
pub struct StageBuckets {
    order: Vec<Stage>,
    buckets: AHashMap<Stage, Vec<Lead>>,
}

impl StageBuckets {
    /// Leads in `stage`'s bucket, in display order. Empty for stages not on
    /// the board.
    #[must_use]
    pub fn stage(&self, stage: Stage) -> &[Lead] {
        self.buckets.get(&stage).map_or(&[], Vec::as_slice)
    }

    /// Lead count for one stage.
    #[must_use]
    pub fn count(&self, stage: Stage) -> usize {
        self.stage(stage).len()
    }

    /// `(stage, count)` pairs in registry column order.
    #[must_use]
    pub fn counts(&self) -> Vec<(Stage, usize)> {
        self.order.iter().map(|&s| (s, self.count(s))).collect()
    }

    /// Buckets in registry column order.
    pub fn iter(&self) -> impl Iterator<Item = (Stage, &[Lead])> {
        self.order.iter().map(|&s| (s, self.stage(s)))
    }

    /// Total leads across all buckets.
    #[must_use]
    pub fn total(&self) -> usize {
        self.order.iter().map(|&s| self.count(s)).sum()
    }
}

/// Group a flat lead collection into per-stage buckets, keyed by each lead's
/// stage. Leads whose stage is not on this board go to the default (first)
/// bucket so malformed or out-of-scope data is never silently lost.
#[must_use]
pub fn group_by_stage(registry: &StageRegistry, leads: &[Lead]) -> StageBuckets {
    let mut buckets: AHashMap<Stage, Vec<Lead>> = AHashMap::with_capacity(registry.stages().len());
    for &stage in registry.stages() {
        buckets.entry(stage).or_default();
    }
    for lead in leads {
        let stage = if registry.is_valid_target(lead.stage) {
            lead.stage
        } else {
            registry.default_stage()
        };
        if let Some(bucket) = buckets.get_mut(&stage) {
            bucket.push(lead.clone());
        }
    }
    StageBuckets {
        order: registry.stages().to_vec(),
        buckets,
    }
}

/// Result of [`with_moved_lead`].
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// A new collection with exactly one lead's stage changed.
    Moved {
        /// The transformed collection.
        leads: Vec<Lead>,
        /// The stage the lead occupied before the move.
        from: Stage,
    },
    /// The lead is already in the requested stage; input left unchanged.
    SameStage(Stage),
    /// No lead with that id; input left unchanged.
    NotFound,
}

/// Pure move transform: a copy of `leads` with the lead matching `lead_id`
/// set to `new_stage`. Ordering and every other lead are untouched.
#[must_use]
pub fn with_moved_lead(leads: &[Lead], lead_id: LeadId, new_stage: Stage) -> MoveOutcome {
    let Some(index) = leads.iter().position(|l| l.id == lead_id) else {
        return MoveOutcome::NotFound;
    };
    let from = leads[index].stage;
    if from == new_stage {
        return MoveOutcome::SameStage(from);
    }
    let mut out = leads.to_vec();
    out[index].stage = new_stage;
    MoveOutcome::Moved { leads: out, from }
}
