#![forbid(unsafe_code)]

//! The board controller: the single owner of board state.
//!
//! Wires the drag session, optimistic mutator, confirmation ledger, undo
//! coordinator, collapse manager, virtualization window, and notice queue
//! into the move protocol:
//!
//! ```text
//! drop accepted ──▶ snapshot + mutate ──▶ undo offered ──▶ PatchStage effect
//!                                                              │
//!                              host executes patch, reports ───┘
//!                                                              ▼
//!                               Success: commit     Failure: rollback + notice
//! ```
//!
//! The controller is single-threaded and event-driven: every method runs
//! synchronously inside a host event handler and returns the
//! [`BoardEffect`]s the host must act on. Asynchronous persistence is
//! explicit message passing - the host executes each `PatchStage` against
//! its Lead Store and feeds the outcome back through
//! [`resolve_confirmation`](BoardController::resolve_confirmation).
//!
//! # Refresh suppression
//!
//! Wholesale working-set replacement is refused while a drag session is
//! active, while any confirmation is outstanding, and for a settle window
//! after the last confirmation resolves. The engine never merges a stale
//! refresh; the host refetches once [`refresh`](BoardController::refresh)
//! accepts again.

use std::fmt;
use std::time::Duration;

use ahash::AHashMap;
use web_time::Instant;

use leadboard_core::{
    DragConfig, DragEvent, DragSession, Lead, LeadId, PointerInput, Stage, StageBuckets,
    StageRegistry, group_by_stage,
};

use crate::collapse::{CollapseManager, FoldPolicy};
use crate::confirm::{
    ConfirmKind, ConfirmOutcome, ConfirmationId, MoveConfirmation, PatchRequest, PendingMove,
};
use crate::mutator::{MoveId, MoveRecord, OptimisticMutator};
use crate::notice::{NoticeConfig, NoticeId, NoticeKind, NoticeQueue};
use crate::store::KeyValueStore;
use crate::undo::{DEFAULT_UNDO_WINDOW, UndoCoordinator};
use crate::window::{DEFAULT_BATCH, VirtualWindow};
use crate::working_set::WorkingSet;

/// Board tuning.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Drag activation thresholds.
    pub drag: DragConfig,
    /// Undo offer lifetime (default: 4000ms).
    pub undo_window: Duration,
    /// How long after the last confirmation resolves refreshes stay
    /// suppressed (default: 1000ms).
    pub settle_window: Duration,
    /// Virtualization reveal batch (default: 20).
    pub batch: usize,
    /// Key-value namespace for this board's collapse state; distinguishes
    /// e.g. the general pipeline board from a filtered opportunities view.
    pub collapse_key: String,
    /// Notice queue tuning.
    pub notices: NoticeConfig,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            drag: DragConfig::default(),
            undo_window: DEFAULT_UNDO_WINDOW,
            settle_window: Duration::from_millis(1000),
            batch: DEFAULT_BATCH,
            collapse_key: "leadboard.collapse.pipeline".to_string(),
            notices: NoticeConfig::default(),
        }
    }
}

/// What the host must act on after a controller call.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardEffect {
    /// Execute this patch against the Lead Store and report the outcome via
    /// `resolve_confirmation`.
    PatchStage {
        confirmation: ConfirmationId,
        request: PatchRequest,
    },
    /// A lead changed stage locally. Fired optimistically at drop time and
    /// again on an invoked undo (the restorative move).
    LeadMoved {
        lead_id: LeadId,
        from: Stage,
        to: Stage,
    },
    /// A confirmation failed and the board rolled back.
    MoveFailed {
        lead_id: LeadId,
        from: Stage,
        to: Stage,
    },
    /// Show an undo affordance until `deadline`.
    UndoOffered { move_id: MoveId, deadline: Instant },
    /// Remove the undo affordance (expired, superseded, invoked, or its
    /// move failed).
    UndoRetired { move_id: MoveId },
    /// Show a transient, dismissible notice.
    Notice {
        id: NoticeId,
        kind: NoticeKind,
        message: String,
    },
}

/// Owner of all board state for one pipeline view.
///
/// Constructed when the board mounts, torn down when it unmounts.
pub struct BoardController {
    config: BoardConfig,
    working: WorkingSet,
    drag: DragSession,
    mutator: OptimisticMutator,
    confirm: MoveConfirmation,
    undo: UndoCoordinator,
    collapse: CollapseManager,
    window: VirtualWindow,
    notices: NoticeQueue,
    prefs: Box<dyn KeyValueStore>,
    /// Records for moves whose original confirmation is still in flight.
    records: AHashMap<MoveId, MoveRecord>,
    settle_until: Option<Instant>,
}

impl fmt::Debug for BoardController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoardController")
            .field("leads", &self.working.len())
            .field("dragging", &self.drag.is_dragging())
            .field("outstanding", &self.confirm.outstanding())
            .finish()
    }
}

impl BoardController {
    /// Build a board over `registry`, restoring collapse state from `prefs`.
    #[must_use]
    pub fn new(registry: StageRegistry, config: BoardConfig, prefs: Box<dyn KeyValueStore>) -> Self {
        let collapse = CollapseManager::restore(config.collapse_key.clone(), prefs.as_ref());
        Self {
            drag: DragSession::new(config.drag.clone()),
            undo: UndoCoordinator::new(config.undo_window),
            window: VirtualWindow::new(config.batch),
            notices: NoticeQueue::new(config.notices.clone()),
            mutator: OptimisticMutator::new(registry),
            working: WorkingSet::new(),
            confirm: MoveConfirmation::new(),
            collapse,
            prefs,
            records: AHashMap::new(),
            settle_until: None,
            config,
        }
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    /// Drive the drag session with one pointer signal. A drop over a column
    /// runs the full move protocol.
    pub fn pointer(&mut self, input: PointerInput, now: Instant) -> Vec<BoardEffect> {
        let mut out = Vec::new();
        for event in self.drag.process(input, now) {
            if let DragEvent::Dropped { lead, target } = event {
                self.drop_lead(lead, target, now, &mut out);
            }
        }
        out
    }

    /// Periodic housekeeping: touch-hold promotion, undo expiry, notice
    /// expiry. Call from the host tick/timer.
    pub fn tick(&mut self, now: Instant) -> Vec<BoardEffect> {
        let mut out = Vec::new();
        // Touch presses promote here; the host reads `drag()` for proxy
        // rendering state.
        let _ = self.drag.check_hold(now);
        if let Some(expired) = self.undo.expire(now) {
            out.push(BoardEffect::UndoRetired { move_id: expired });
        }
        self.notices.tick(now);
        out
    }

    /// Report the outcome of a previously emitted `PatchStage` effect.
    pub fn resolve_confirmation(
        &mut self,
        id: ConfirmationId,
        outcome: ConfirmOutcome,
        now: Instant,
    ) -> Vec<BoardEffect> {
        let mut out = Vec::new();
        let Some(pending) = self.confirm.resolve(id) else {
            return out;
        };
        if self.confirm.outstanding() == 0 {
            self.settle_until = Some(now + self.config.settle_window);
        }
        match (outcome, pending.kind) {
            (ConfirmOutcome::Success, ConfirmKind::Original) => {
                if let Some(record) = self.records.remove(&pending.move_id) {
                    self.mutator.commit(record);
                }
                // Any undo offer simply runs out its countdown.
            }
            (ConfirmOutcome::Success, ConfirmKind::UndoRestore) => {
                tracing::debug!(
                    target: "leadboard.board",
                    move_id = pending.move_id.0,
                    "undo restoration confirmed"
                );
            }
            (ConfirmOutcome::Failure { status, message }, ConfirmKind::Original) => {
                self.fail_original(pending, status, &message, now, &mut out);
            }
            (ConfirmOutcome::Failure { status, message }, ConfirmKind::UndoRestore) => {
                // No automated recovery and no further undo chain; the user
                // re-drags if they still want the move.
                tracing::warn!(
                    target: "leadboard.board",
                    move_id = pending.move_id.0,
                    status,
                    %message,
                    "undo restoration failed"
                );
                self.push_notice(
                    NoticeKind::UndoFailed,
                    "Couldn't undo the move",
                    now,
                    &mut out,
                );
            }
        }
        out
    }

    /// Invoke the outstanding undo offer for `move_id`. Inert unless that
    /// exact offer is still live. The undo is, from the server's point of
    /// view, a second move: a restorative patch is issued, never a
    /// cancellation of the original call.
    pub fn invoke_undo(&mut self, move_id: MoveId, now: Instant) -> Vec<BoardEffect> {
        let mut out = Vec::new();
        let Some(record) = self.undo.invoke(move_id, now) else {
            tracing::debug!(
                target: "leadboard.board",
                move_id = move_id.0,
                "undo invoked after retirement; ignored"
            );
            return out;
        };
        // The undo supersedes the original move: if its confirmation is
        // still in flight, a later failure must not roll back a second time.
        self.records.remove(&record.move_id);
        self.mutator
            .rollback(&mut self.working, &mut self.window, &record);
        out.push(BoardEffect::UndoRetired { move_id });
        out.push(BoardEffect::LeadMoved {
            lead_id: record.lead_id,
            from: record.to,
            to: record.from,
        });
        let (confirmation, request) = self.confirm.issue(PendingMove {
            move_id: record.move_id,
            lead_id: record.lead_id,
            stage: record.from,
            kind: ConfirmKind::UndoRestore,
        });
        out.push(BoardEffect::PatchStage {
            confirmation,
            request,
        });
        out
    }

    /// Wholesale working-set replacement from fresh server data. Returns
    /// `false` (and changes nothing) while a move is in flight; see the
    /// module docs for the suppression rules.
    pub fn refresh(&mut self, leads: Vec<Lead>, now: Instant) -> bool {
        let held = !self.drag.is_idle()
            || self.confirm.outstanding() > 0
            || self.settle_until.is_some_and(|until| now < until);
        if held {
            tracing::debug!(
                target: "leadboard.board",
                dragging = !self.drag.is_idle(),
                outstanding = self.confirm.outstanding(),
                "refresh suppressed while move in flight"
            );
            return false;
        }
        self.settle_until = None;
        self.working.replace(leads);
        self.window.reset_all();
        true
    }

    // ------------------------------------------------------------------
    // Collapse and virtualization pass-throughs
    // ------------------------------------------------------------------

    /// Flip one column and persist.
    pub fn toggle_collapse(&mut self, stage: Stage) {
        self.collapse.toggle(stage, self.prefs.as_mut());
    }

    /// Apply a fold policy over current bucket counts. `seq` must be
    /// strictly greater than the last applied sequence number.
    pub fn apply_fold_policy(&mut self, policy: FoldPolicy, seq: u64) -> bool {
        let counts = self.buckets().counts();
        self.collapse
            .apply_policy(policy, &counts, seq, self.prefs.as_mut())
    }

    #[must_use]
    pub fn is_collapsed(&self, stage: Stage) -> bool {
        self.collapse.is_collapsed(stage)
    }

    /// Grow one column's reveal window by a batch.
    pub fn load_more(&mut self, stage: Stage) -> usize {
        let total = self.buckets().count(stage);
        self.window.load_more(stage, total)
    }

    /// The leads to render for one column (virtualized prefix of its
    /// bucket).
    #[must_use]
    pub fn visible(&self, stage: Stage) -> Vec<Lead> {
        let buckets = self.buckets();
        self.window.visible_slice(stage, buckets.stage(stage)).to_vec()
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Current per-stage buckets over the working set.
    #[must_use]
    pub fn buckets(&self) -> StageBuckets {
        group_by_stage(self.mutator.registry(), self.working.leads())
    }

    /// Per-stage lead counts in column order (collapsed-header badges).
    #[must_use]
    pub fn counts(&self) -> Vec<(Stage, usize)> {
        self.buckets().counts()
    }

    #[must_use]
    pub fn registry(&self) -> &StageRegistry {
        self.mutator.registry()
    }

    #[must_use]
    pub fn working(&self) -> &WorkingSet {
        &self.working
    }

    /// Drag state, for proxy rendering and drop-target highlighting.
    #[must_use]
    pub fn drag(&self) -> &DragSession {
        &self.drag
    }

    #[must_use]
    pub fn notices(&self) -> &NoticeQueue {
        &self.notices
    }

    /// The live undo offer, if any.
    #[must_use]
    pub fn undo_outstanding(&self) -> Option<(MoveId, Instant)> {
        self.undo.outstanding()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn drop_lead(&mut self, lead_id: LeadId, target: Stage, now: Instant, out: &mut Vec<BoardEffect>) {
        let record = match self
            .mutator
            .apply_move(&mut self.working, &mut self.window, lead_id, target)
        {
            Ok(record) => record,
            Err(e) => {
                // NoopMove and LeadNotFound are silent; InvalidTarget is
                // unreachable given UI construction.
                tracing::debug!(target: "leadboard.board", error = %e, "drop rejected");
                return;
            }
        };
        let (move_id, from, to) = (record.move_id, record.from, record.to);
        self.records.insert(move_id, record.clone());
        let (deadline, retired) = self.undo.offer(record, now);
        if let Some(old) = retired {
            out.push(BoardEffect::UndoRetired { move_id: old });
        }
        let (confirmation, request) = self.confirm.issue(PendingMove {
            move_id,
            lead_id,
            stage: to,
            kind: ConfirmKind::Original,
        });
        out.push(BoardEffect::LeadMoved { lead_id, from, to });
        out.push(BoardEffect::UndoOffered { move_id, deadline });
        out.push(BoardEffect::PatchStage {
            confirmation,
            request,
        });
    }

    fn fail_original(
        &mut self,
        pending: PendingMove,
        status: u16,
        message: &str,
        now: Instant,
        out: &mut Vec<BoardEffect>,
    ) {
        let Some(record) = self.records.remove(&pending.move_id) else {
            // Superseded by an invoked undo; the board already restored the
            // prior state and the restorative patch is in flight.
            tracing::debug!(
                target: "leadboard.board",
                move_id = pending.move_id.0,
                "failure of a superseded move ignored"
            );
            return;
        };
        tracing::warn!(
            target: "leadboard.board",
            move_id = record.move_id.0,
            lead_id = record.lead_id.0,
            status,
            %message,
            "move confirmation failed; rolling back"
        );
        self.mutator
            .rollback(&mut self.working, &mut self.window, &record);
        if let Some(retired) = self.undo.retire(record.move_id) {
            out.push(BoardEffect::UndoRetired { move_id: retired });
        }
        out.push(BoardEffect::MoveFailed {
            lead_id: record.lead_id,
            from: record.from,
            to: record.to,
        });
        self.push_notice(
            NoticeKind::MoveFailed,
            "Couldn't move lead — status reverted",
            now,
            out,
        );
    }

    fn push_notice(
        &mut self,
        kind: NoticeKind,
        message: &str,
        now: Instant,
        out: &mut Vec<BoardEffect>,
    ) {
        if let Some(id) = self.notices.push(kind, message, now) {
            out.push(BoardEffect::Notice {
                id,
                kind,
                message: message.to_string(),
            });
        }
    }
}
