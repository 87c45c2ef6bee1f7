#![forbid(unsafe_code)]

//! E2E test for the full move protocol against a scripted lead store.
//!
//! Covers:
//! 1. Optimistic move, confirmation success, quiet undo expiry
//! 2. Confirmation failure: rollback, offer retired, failure notice
//! 3. Undo within the window issues a restorative patch
//! 4. Fold policies: idempotent re-application, stale sequence dropped
//! 5. Virtualization: 45-lead column reveals in batches of 20
//! 6. Refresh concurrency: suppressed during drag, in flight, and settle
//!
//! Run:
//!   cargo test -p leadboard-runtime --test e2e_move_protocol

use std::collections::VecDeque;
use std::time::Duration;

use web_time::Instant;

use leadboard_core::{Lead, LeadId, PointerInput, PointerKind, PointerPos, Stage, StageRegistry};
use leadboard_runtime::{
    BoardConfig, BoardController, BoardEffect, ConfirmOutcome, FoldPolicy, LeadStore, MemoryStore,
    NoticeKind, StoreError,
};

// ============================================================================
// Scripted store
// ============================================================================

/// A lead store whose patch outcomes are scripted in advance. Each
/// `patch_lead_stage` call pops the next scripted result; running off the
/// end of the script succeeds.
#[derive(Debug, Default)]
struct ScriptedStore {
    leads: Vec<Lead>,
    script: VecDeque<Result<(), StoreError>>,
    patches: Vec<(LeadId, Stage)>,
}

impl ScriptedStore {
    fn with_leads(leads: Vec<Lead>) -> Self {
        Self {
            leads,
            ..Self::default()
        }
    }

    fn fail_next(&mut self, status: u16, message: &str) {
        self.script
            .push_back(Err(StoreError::with_status(status, message)));
    }
}

impl LeadStore for ScriptedStore {
    fn list_leads(&self, _filter: &str) -> Result<Vec<Lead>, StoreError> {
        Ok(self.leads.clone())
    }

    fn patch_lead_stage(&mut self, lead_id: LeadId, stage: Stage) -> Result<(), StoreError> {
        self.patches.push((lead_id, stage));
        match self.script.pop_front() {
            Some(result) => result,
            None => {
                if let Some(lead) = self.leads.iter_mut().find(|l| l.id == lead_id) {
                    lead.stage = stage;
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// Host harness
// ============================================================================

/// Minimal host loop: executes `PatchStage` effects against the store and
/// feeds outcomes back, collecting everything else.
struct Host {
    board: BoardController,
    store: ScriptedStore,
}

impl Host {
    fn new(leads: Vec<Lead>) -> (Self, Instant) {
        let store = ScriptedStore::with_leads(leads.clone());
        let mut board = BoardController::new(
            StageRegistry::full_pipeline(),
            BoardConfig::default(),
            Box::new(MemoryStore::new()),
        );
        let t = Instant::now();
        assert!(board.refresh(leads, t));
        (Self { board, store }, t)
    }

    /// Execute any `PatchStage` effects, resolving their confirmations at
    /// `now`. Returns every effect seen, including those produced by the
    /// resolutions themselves.
    fn run(&mut self, effects: Vec<BoardEffect>, now: Instant) -> Vec<BoardEffect> {
        let mut seen = Vec::new();
        let mut queue = VecDeque::from(effects);
        while let Some(effect) = queue.pop_front() {
            if let BoardEffect::PatchStage {
                confirmation,
                request,
            } = &effect
            {
                let outcome = match self.store.patch_lead_stage(request.lead_id, request.stage) {
                    Ok(()) => ConfirmOutcome::Success,
                    Err(e) => ConfirmOutcome::Failure {
                        status: e.status.unwrap_or(0),
                        message: e.message.clone(),
                    },
                };
                queue.extend(self.board.resolve_confirmation(*confirmation, outcome, now));
            }
            seen.push(effect);
        }
        seen
    }

    fn drag(&mut self, lead: LeadId, target: Stage, t: Instant) -> Vec<BoardEffect> {
        let mut out = self.board.pointer(
            PointerInput::Down {
                lead,
                pos: PointerPos::new(0.0, 0.0),
                kind: PointerKind::Mouse,
            },
            t,
        );
        out.extend(self.board.pointer(
            PointerInput::Move {
                pos: PointerPos::new(80.0, 0.0),
                over: Some(target),
            },
            t + Duration::from_millis(16),
        ));
        out.extend(self.board.pointer(
            PointerInput::Up {
                pos: PointerPos::new(80.0, 0.0),
            },
            t + Duration::from_millis(32),
        ));
        out
    }
}

fn lead(id: u64, stage: Stage) -> Lead {
    Lead::new(LeadId(id), stage, format!("lead-{id}"))
}

fn stage_of(board: &BoardController, id: u64) -> Stage {
    board.working().lead(LeadId(id)).unwrap().stage
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn optimistic_move_confirms_and_offer_expires() {
    let (mut host, t) = Host::new(vec![lead(1, Stage::New), lead(2, Stage::Contacted)]);

    let effects = host.drag(LeadId(1), Stage::Qualified, t);
    // The card moved before anything hit the store.
    assert_eq!(stage_of(&host.board, 1), Stage::Qualified);

    let resolve_at = t + Duration::from_millis(120);
    let seen = host.run(effects, resolve_at);
    assert_eq!(host.store.patches, vec![(LeadId(1), Stage::Qualified)]);
    assert!(seen.iter().any(|e| matches!(e, BoardEffect::UndoOffered { .. })));
    assert!(!seen.iter().any(|e| matches!(e, BoardEffect::MoveFailed { .. })));

    // Nobody invokes the undo; it retires quietly at the deadline.
    let ticked = host.board.tick(resolve_at + Duration::from_secs(5));
    assert!(ticked.iter().any(|e| matches!(e, BoardEffect::UndoRetired { .. })));
    assert_eq!(stage_of(&host.board, 1), Stage::Qualified);
    assert!(host.board.notices().is_empty());
}

#[test]
fn failed_confirmation_rolls_back_with_notice() {
    let (mut host, t) = Host::new(vec![lead(1, Stage::New)]);
    host.store.fail_next(422, "stage transition rejected");

    let effects = host.drag(LeadId(1), Stage::Booked, t);
    assert_eq!(stage_of(&host.board, 1), Stage::Booked);

    let seen = host.run(effects, t + Duration::from_millis(120));
    assert_eq!(stage_of(&host.board, 1), Stage::New);
    assert!(seen.iter().any(|e| matches!(
        e,
        BoardEffect::MoveFailed {
            lead_id: LeadId(1),
            from: Stage::New,
            to: Stage::Booked,
        }
    )));
    assert!(seen.iter().any(|e| matches!(
        e,
        BoardEffect::Notice {
            kind: NoticeKind::MoveFailed,
            ..
        }
    )));
    // The offer went with the rollback.
    assert!(host.board.undo_outstanding().is_none());
}

#[test]
fn undo_within_window_issues_restorative_patch() {
    let (mut host, t) = Host::new(vec![lead(1, Stage::New)]);

    let effects = host.drag(LeadId(1), Stage::Qualified, t);
    host.run(effects, t + Duration::from_millis(50));
    let (move_id, deadline) = host.board.undo_outstanding().unwrap();
    assert!(deadline > t + Duration::from_secs(3));

    let undo_at = t + Duration::from_millis(2000);
    let effects = host.board.invoke_undo(move_id, undo_at);
    assert_eq!(stage_of(&host.board, 1), Stage::New);

    host.run(effects, undo_at + Duration::from_millis(50));
    assert_eq!(
        host.store.patches,
        vec![(LeadId(1), Stage::Qualified), (LeadId(1), Stage::New)]
    );
    assert!(host.board.undo_outstanding().is_none());
    assert!(host.board.notices().is_empty());
}

#[test]
fn undo_past_deadline_is_inert() {
    let (mut host, t) = Host::new(vec![lead(1, Stage::New)]);
    let effects = host.drag(LeadId(1), Stage::Qualified, t);
    host.run(effects, t + Duration::from_millis(50));
    let (move_id, _) = host.board.undo_outstanding().unwrap();

    let effects = host.board.invoke_undo(move_id, t + Duration::from_secs(6));
    assert!(effects.is_empty());
    assert_eq!(stage_of(&host.board, 1), Stage::Qualified);
    assert_eq!(host.store.patches.len(), 1);
}

#[test]
fn failed_undo_restoration_keeps_rolled_back_state() {
    let (mut host, t) = Host::new(vec![lead(1, Stage::New)]);
    let effects = host.drag(LeadId(1), Stage::Qualified, t);
    host.run(effects, t + Duration::from_millis(50));

    // The restorative patch fails; the board stays where the undo put it
    // and only a notice fires.
    host.store.fail_next(500, "boom");
    let (move_id, _) = host.board.undo_outstanding().unwrap();
    let effects = host.board.invoke_undo(move_id, t + Duration::from_millis(1000));
    let seen = host.run(effects, t + Duration::from_millis(1100));

    assert_eq!(stage_of(&host.board, 1), Stage::New);
    assert!(seen.iter().any(|e| matches!(
        e,
        BoardEffect::Notice {
            kind: NoticeKind::UndoFailed,
            ..
        }
    )));
    assert!(host.board.undo_outstanding().is_none());
}

#[test]
fn fold_policies_are_idempotent_and_sequenced() {
    let (mut host, _) = Host::new(vec![
        lead(1, Stage::Contacted),
        lead(2, Stage::Contacted),
        lead(3, Stage::Qualified),
    ]);

    assert!(host.board.apply_fold_policy(FoldPolicy::FoldEmpty, 1));
    assert!(host.board.is_collapsed(Stage::New));
    assert!(host.board.is_collapsed(Stage::Booked));
    assert!(!host.board.is_collapsed(Stage::Contacted));

    // Same policy, same counts, newer sequence: applied, no visible change.
    assert!(host.board.apply_fold_policy(FoldPolicy::FoldEmpty, 2));
    assert!(host.board.is_collapsed(Stage::New));

    // Stale sequence is dropped even though the policy differs.
    assert!(!host.board.apply_fold_policy(FoldPolicy::ExpandAll, 2));
    assert!(host.board.is_collapsed(Stage::New));

    // A threshold fold replaces the previous collapsed set wholesale.
    assert!(host.board.apply_fold_policy(FoldPolicy::FoldAtOrBelow(1), 3));
    assert!(host.board.is_collapsed(Stage::Qualified));
    assert!(!host.board.is_collapsed(Stage::Contacted));

    assert!(host.board.apply_fold_policy(FoldPolicy::ExpandAll, 4));
    assert!(!host.board.is_collapsed(Stage::New));
    assert!(!host.board.is_collapsed(Stage::Qualified));
}

#[test]
fn large_column_reveals_in_batches() {
    let leads: Vec<Lead> = (0..45).map(|i| lead(i, Stage::Contacted)).collect();
    let (mut host, _) = Host::new(leads);

    assert_eq!(host.board.visible(Stage::Contacted).len(), 20);
    assert_eq!(host.board.load_more(Stage::Contacted), 40);
    assert_eq!(host.board.visible(Stage::Contacted).len(), 40);
    assert_eq!(host.board.load_more(Stage::Contacted), 45);
    assert_eq!(host.board.visible(Stage::Contacted).len(), 45);
    // Saturated; further requests change nothing.
    assert_eq!(host.board.load_more(Stage::Contacted), 45);
}

#[test]
fn moving_a_lead_resets_both_columns_windows() {
    let mut leads: Vec<Lead> = (0..45).map(|i| lead(i, Stage::Contacted)).collect();
    leads.push(lead(100, Stage::New));
    let (mut host, t) = Host::new(leads);

    host.board.load_more(Stage::Contacted);
    assert_eq!(host.board.visible(Stage::Contacted).len(), 40);

    let effects = host.drag(LeadId(100), Stage::Contacted, t);
    host.run(effects, t + Duration::from_millis(50));

    // Back to one batch; the moved card is in the bucket.
    assert_eq!(host.board.visible(Stage::Contacted).len(), 20);
    assert_eq!(host.board.buckets().count(Stage::Contacted), 46);
}

#[test]
fn refresh_waits_for_drag_flight_and_settle() {
    let (mut host, t) = Host::new(vec![lead(1, Stage::New)]);

    // Mid-drag: refused.
    host.board.pointer(
        PointerInput::Down {
            lead: LeadId(1),
            pos: PointerPos::new(0.0, 0.0),
            kind: PointerKind::Mouse,
        },
        t,
    );
    host.board.pointer(
        PointerInput::Move {
            pos: PointerPos::new(80.0, 0.0),
            over: Some(Stage::Qualified),
        },
        t + Duration::from_millis(16),
    );
    assert!(!host.board.refresh(vec![], t + Duration::from_millis(20)));

    // Drop: confirmation in flight, still refused.
    let effects = host.board.pointer(
        PointerInput::Up {
            pos: PointerPos::new(80.0, 0.0),
        },
        t + Duration::from_millis(32),
    );
    assert!(!host.board.refresh(vec![], t + Duration::from_millis(40)));

    // Resolve, then wait out the settle window.
    let resolve_at = t + Duration::from_millis(100);
    host.run(effects, resolve_at);
    assert!(!host.board.refresh(vec![], resolve_at + Duration::from_millis(400)));

    let fresh = host.store.list_leads("pipeline").unwrap();
    assert!(host.board.refresh(fresh, resolve_at + Duration::from_millis(1200)));
    // The refreshed data already carries the confirmed move.
    assert_eq!(stage_of(&host.board, 1), Stage::Qualified);
}

#[test]
fn back_to_back_moves_keep_one_undo_offer() {
    let (mut host, t) = Host::new(vec![lead(1, Stage::New), lead(2, Stage::New)]);

    let effects = host.drag(LeadId(1), Stage::Qualified, t);
    host.run(effects, t + Duration::from_millis(50));
    let (first, _) = host.board.undo_outstanding().unwrap();

    let t2 = t + Duration::from_millis(500);
    let effects = host.drag(LeadId(2), Stage::Booked, t2);
    let seen = host.run(effects, t2 + Duration::from_millis(50));

    assert!(seen.iter().any(|e| matches!(
        e,
        BoardEffect::UndoRetired { move_id } if *move_id == first
    )));
    let (second, _) = host.board.undo_outstanding().unwrap();
    assert_ne!(first, second);

    // Only the newest move is undoable.
    assert!(host.board.invoke_undo(first, t2 + Duration::from_millis(100)).is_empty());
    let effects = host.board.invoke_undo(second, t2 + Duration::from_millis(200));
    assert!(!effects.is_empty());
    assert_eq!(stage_of(&host.board, 1), Stage::Qualified);
    assert_eq!(stage_of(&host.board, 2), Stage::New);
}
