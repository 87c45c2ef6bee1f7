#![forbid(unsafe_code)]

//! The board's working copy of a lead.
//!
//! The engine only cares about `id` and `stage`; the remaining fields are
//! display attributes carried through verbatim. The lead of record lives in
//! the Lead Store.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::stage::Stage;

/// Stable lead identity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct LeadId(pub u64);

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lead#{}", self.0)
    }
}

/// One lead as displayed on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    /// Stable identity, owned by the Lead Store.
    pub id: LeadId,
    /// Current pipeline stage; exactly one at any time.
    pub stage: Stage,
    /// Display name.
    pub name: String,
    /// Optional score for card badges.
    #[serde(default)]
    pub score: Option<i32>,
    /// Display tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Lead {
    /// Create a lead with the display extras left empty.
    #[must_use]
    pub fn new(id: LeadId, stage: Stage, name: impl Into<String>) -> Self {
        Self {
            id,
            stage,
            name: name.into(),
            score: None,
            tags: Vec::new(),
        }
    }

    /// Set the score.
    #[must_use]
    pub fn with_score(mut self, score: i32) -> Self {
        self.score = Some(score);
        self
    }

    /// Set the tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}
