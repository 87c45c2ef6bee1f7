#![forbid(unsafe_code)]

//! Move confirmation ledger.
//!
//! Persistence of a move is a single asynchronous request against the Lead
//! Store. Asynchrony is modeled as explicit message passing: [`issue`]
//! returns the [`PatchRequest`] the host must execute, and the host feeds
//! the outcome back through [`resolve`]. The engine never blocks and never
//! retries; a failure is reported once and handled by the caller.
//!
//! [`issue`]: MoveConfirmation::issue
//! [`resolve`]: MoveConfirmation::resolve

use ahash::AHashMap;

use leadboard_core::{LeadId, Stage};

use crate::mutator::MoveId;

/// Identity of one in-flight confirmation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfirmationId(pub u64);

/// What the confirmation is persisting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmKind {
    /// The optimistic move itself.
    Original,
    /// The restorative move issued by an undo. Its failure offers no
    /// further undo (no unbounded chains).
    UndoRestore,
}

/// Result reported by the host after executing a patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Success,
    Failure { status: u16, message: String },
}

/// The stage patch the host must execute against the Lead Store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchRequest {
    pub lead_id: LeadId,
    pub stage: Stage,
}

/// Bookkeeping for one outstanding confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMove {
    pub move_id: MoveId,
    pub lead_id: LeadId,
    pub stage: Stage,
    pub kind: ConfirmKind,
}

/// Ledger of in-flight confirmation calls.
///
/// Confirmations are not cancelable once issued; an undo does not abort the
/// original call, both complete and resolve independently.
#[derive(Debug, Default)]
pub struct MoveConfirmation {
    next: u64,
    pending: AHashMap<ConfirmationId, PendingMove>,
}

impl MoveConfirmation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an outstanding confirmation and produce the patch the host
    /// must execute.
    pub fn issue(&mut self, pending: PendingMove) -> (ConfirmationId, PatchRequest) {
        self.next += 1;
        let id = ConfirmationId(self.next);
        let request = PatchRequest {
            lead_id: pending.lead_id,
            stage: pending.stage,
        };
        self.pending.insert(id, pending);
        (id, request)
    }

    /// Mark a confirmation resolved, returning its bookkeeping. Unknown or
    /// already-resolved ids return `None` (at-most-once resolution).
    pub fn resolve(&mut self, id: ConfirmationId) -> Option<PendingMove> {
        let pending = self.pending.remove(&id);
        if pending.is_none() {
            tracing::debug!(
                target: "leadboard.confirm",
                confirmation = id.0,
                "unknown or duplicate confirmation resolution ignored"
            );
        }
        pending
    }

    /// Number of confirmations still in flight.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_pending(&self, id: ConfirmationId) -> bool {
        self.pending.contains_key(&id)
    }
}
