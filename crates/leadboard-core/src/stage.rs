#![forbid(unsafe_code)]

//! Pipeline stages and the per-board stage registry.
//!
//! [`Stage`] is the fixed enumeration a lead occupies at any time. The main
//! progression runs `New → Contacted → Responded → Qualified → Booked →
//! Closed`; `Lost` and `Dnd` are terminal exception stages outside it.
//!
//! [`StageRegistry`] is the ordered stage list for one board instance. The
//! default board shows the full pipeline; a scoped board (e.g. a filtered
//! "opportunities" view) may show a subset. The registry is constant for
//! the life of the board and has no failure modes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One value of the fixed pipeline enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    /// Freshly imported or created lead.
    New,
    /// First outreach sent.
    Contacted,
    /// Lead replied.
    Responded,
    /// Qualified as a real opportunity.
    Qualified,
    /// Meeting or call booked.
    Booked,
    /// Won and closed.
    Closed,
    /// Lost (terminal exception stage).
    Lost,
    /// Do-not-disturb (terminal exception stage).
    Dnd,
}

impl Stage {
    /// Every stage, in pipeline order, exception stages last.
    pub const ALL: [Stage; 8] = [
        Stage::New,
        Stage::Contacted,
        Stage::Responded,
        Stage::Qualified,
        Stage::Booked,
        Stage::Closed,
        Stage::Lost,
        Stage::Dnd,
    ];

    /// Human-readable column label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Stage::New => "New",
            Stage::Contacted => "Contacted",
            Stage::Responded => "Responded",
            Stage::Qualified => "Qualified",
            Stage::Booked => "Booked",
            Stage::Closed => "Closed",
            Stage::Lost => "Lost",
            Stage::Dnd => "DND",
        }
    }

    /// Whether this is a terminal exception stage (`Lost` / `Dnd`) that sits
    /// outside the main progression.
    #[must_use]
    pub fn is_exception(self) -> bool {
        matches!(self, Stage::Lost | Stage::Dnd)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordered stage list for one board instance.
///
/// The move engine treats the registry as an unordered set of valid drop
/// targets; ordering matters only for [`progress_index`](Self::progress_index)
/// and for rendering columns.
#[derive(Debug, Clone)]
pub struct StageRegistry {
    stages: Vec<Stage>,
}

impl StageRegistry {
    /// Registry over the full pipeline, in [`Stage::ALL`] order.
    #[must_use]
    pub fn full_pipeline() -> Self {
        Self {
            stages: Stage::ALL.to_vec(),
        }
    }

    /// Registry over a subset of stages, in the given order.
    ///
    /// An empty list falls back to the full pipeline; a registry with no
    /// stages would have no default bucket to group into.
    #[must_use]
    pub fn scoped(stages: Vec<Stage>) -> Self {
        if stages.is_empty() {
            return Self::full_pipeline();
        }
        Self { stages }
    }

    /// The stages shown on this board, in column order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Whether `stage` is a valid drop target on this board.
    #[must_use]
    pub fn is_valid_target(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }

    /// The first stage; the bucket for leads whose stage is not a member of
    /// this registry.
    #[must_use]
    pub fn default_stage(&self) -> Stage {
        self.stages[0]
    }

    /// Position of `stage` in the main progression, `None` for exception
    /// stages or stages not on this board. Used by host UI for progress
    /// display; the move engine never consults it.
    #[must_use]
    pub fn progress_index(&self, stage: Stage) -> Option<usize> {
        if stage.is_exception() {
            return None;
        }
        self.stages
            .iter()
            .filter(|s| !s.is_exception())
            .position(|&s| s == stage)
    }
}

impl Default for StageRegistry {
    fn default() -> Self {
        Self::full_pipeline()
    }
}
