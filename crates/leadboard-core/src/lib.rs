#![forbid(unsafe_code)]

//! Leadboard Core
//!
//! Pure data types and state machines for the pipeline (kanban) board:
//!
//! - [`Stage`] / [`StageRegistry`] - the fixed, ordered pipeline enumeration
//! - [`Lead`] / [`LeadId`] - the board's working copy of a lead
//! - [`pipeline`] - grouping leads into per-stage buckets and the pure
//!   "move lead to stage" transform
//! - [`DragSession`] - the drag-and-drop state machine, driven by abstract
//!   pointer/touch signals
//!
//! # Role in the system
//! This crate has no side effects: no I/O, no clock reads (callers pass
//! `now`), no logging. The stateful orchestration - optimistic mutation,
//! confirmation, undo, collapse, virtualization - lives in
//! `leadboard-runtime` and is built on top of these types.

pub mod drag;
pub mod lead;
pub mod pipeline;
pub mod pointer;
pub mod stage;

pub use drag::{DragConfig, DragEvent, DragPhase, DragSession};
pub use lead::{Lead, LeadId};
pub use pipeline::{MoveOutcome, StageBuckets, group_by_stage, with_moved_lead};
pub use pointer::{PointerInput, PointerKind, PointerPos};
pub use stage::{Stage, StageRegistry};
