#![forbid(unsafe_code)]

//! Leadboard Runtime
//!
//! This crate ties the pure board primitives from `leadboard-core` into a
//! complete, host-driven pipeline board engine.
//!
//! # Key Components
//!
//! - [`BoardController`] - Single owner of board state; runs the move protocol
//! - [`OptimisticMutator`] - Snapshot-then-mutate stage moves with rollback
//! - [`MoveConfirmation`] - Ledger of in-flight persistence calls
//! - [`UndoCoordinator`] - Time-boxed, single-slot undo offers
//! - [`CollapseManager`] - Persisted per-column collapse state
//! - [`VirtualWindow`] - Per-column reveal windows for large buckets
//! - [`NoticeQueue`] - Transient failure notices with dedup and expiry
//! - [`LeadStore`] / [`KeyValueStore`] - Host-implemented persistence seams
//!
//! # How it fits in the system
//! The runtime is deliberately UI-free. A host (web view, TUI, tests) feeds
//! it pointer input, clock ticks, and confirmation outcomes; it replies with
//! [`BoardEffect`]s the host executes. All clock-dependent behavior takes an
//! explicit `now`, so every timing rule is testable without sleeping.

pub mod board;
pub mod collapse;
pub mod confirm;
pub mod mutator;
pub mod notice;
pub mod store;
pub mod undo;
pub mod window;
pub mod working_set;

pub use board::{BoardConfig, BoardController, BoardEffect};
pub use collapse::{CollapseManager, FoldPolicy};
pub use confirm::{
    ConfirmKind, ConfirmOutcome, ConfirmationId, MoveConfirmation, PatchRequest, PendingMove,
};
pub use mutator::{MoveError, MoveId, MoveRecord, OptimisticMutator};
pub use notice::{Notice, NoticeConfig, NoticeId, NoticeKind, NoticeQueue};
pub use store::{FileStore, KeyValueStore, LeadStore, MemoryStore, StoreError};
pub use undo::{DEFAULT_UNDO_WINDOW, UndoCoordinator};
pub use window::{DEFAULT_BATCH, VirtualWindow};
pub use working_set::WorkingSet;
