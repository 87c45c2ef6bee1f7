#![forbid(unsafe_code)]

//! Drag session: the card drag-and-drop state machine.
//!
//! [`DragSession`] is a stateful processor that converts abstract
//! [`PointerInput`] signals into [`DragEvent`]s.
//!
//! # State Machine
//!
//! ```text
//! Idle ──Down on card──▶ Armed ──activation──▶ Dragging ──Up over column──▶ Dropped
//!   ▲                      │                      │
//!   │                      │ Up (tap) /           │ Up over nothing /
//!   │                      │ touch slop exceeded  │ explicit cancel
//!   └──────────────────────┴──────────────────────┴──▶ Cancelled
//! ```
//!
//! Activation guards against accidental taps: a mouse press promotes to
//! Dragging after a minimum movement distance; a touch press promotes after
//! a minimum hold delay, provided movement stayed within a slop tolerance.
//! Terminal outcomes (`Dropped` / `Cancelled`) return the session to Idle
//! synchronously.
//!
//! # Invariants
//!
//! 1. At most one session is active: a `Down` while not Idle is ignored.
//! 2. `Dropped` carries a target only while the pointer is over a column;
//!    releasing over nothing is `Cancelled` with no side effects.
//! 3. An `Up` while still Armed produces no event (the press was a tap and
//!    the host's click handling fires naturally).
//! 4. After any terminal event or [`reset`](DragSession::reset), the session
//!    is Idle.
//!
//! # Failure Modes
//!
//! - Touch movement beyond the slop tolerance before the hold delay elapses
//!   disarms the session silently (the gesture is a scroll, not a drag).
//! - The session never validates a drop target against the registry; the
//!   caller owns target validation.

use std::time::Duration;

use web_time::Instant;

use crate::lead::LeadId;
use crate::pointer::{PointerInput, PointerKind, PointerPos};
use crate::stage::Stage;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Activation thresholds for the drag session.
#[derive(Debug, Clone)]
pub struct DragConfig {
    /// Minimum pointer movement (px) before a mouse press becomes a drag
    /// (default: 5.0).
    pub drag_threshold_px: f32,
    /// Hold delay before a touch press becomes a drag (default: 150ms).
    pub touch_hold_delay: Duration,
    /// Movement tolerance (px) a touch press may drift during the hold delay
    /// (default: 10.0). Exceeding it disarms the session.
    pub touch_slop_px: f32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            drag_threshold_px: 5.0,
            touch_hold_delay: Duration::from_millis(150),
            touch_slop_px: 10.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Events and state
// ---------------------------------------------------------------------------

/// Semantic output of the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragEvent {
    /// Activation threshold met; the host should render the drag proxy.
    Started { lead: LeadId },
    /// Pointer moved while dragging.
    Moved {
        pos: PointerPos,
        over: Option<Stage>,
    },
    /// Released over a stage column.
    Dropped { lead: LeadId, target: Stage },
    /// Released over nothing, or explicitly cancelled. No side effects.
    Cancelled { lead: LeadId },
}

/// Coarse session phase, for host queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Armed,
    Dragging,
}

/// A press being tracked but not yet promoted to a drag.
#[derive(Debug, Clone)]
struct ArmedPress {
    lead: LeadId,
    origin: PointerPos,
    kind: PointerKind,
    pressed_at: Instant,
}

/// An active drag.
#[derive(Debug, Clone)]
struct ActiveDrag {
    lead: LeadId,
    over: Option<Stage>,
}

// ---------------------------------------------------------------------------
// DragSession
// ---------------------------------------------------------------------------

/// Stateful drag recognizer.
///
/// Call [`process`](Self::process) for each incoming [`PointerInput`] and
/// [`check_hold`](Self::check_hold) periodically (e.g. on tick) so touch
/// presses can promote once the hold delay elapses.
#[derive(Debug)]
pub struct DragSession {
    config: DragConfig,
    armed: Option<ArmedPress>,
    drag: Option<ActiveDrag>,
}

impl DragSession {
    /// Create a session with the given thresholds.
    #[must_use]
    pub fn new(config: DragConfig) -> Self {
        Self {
            config,
            armed: None,
            drag: None,
        }
    }

    /// Process one input signal, returning any semantic events produced.
    pub fn process(&mut self, input: PointerInput, now: Instant) -> Vec<DragEvent> {
        let mut out = Vec::with_capacity(2);
        match input {
            PointerInput::Down { lead, pos, kind } => {
                // Only one session at a time; ignore a second press.
                if self.phase() == DragPhase::Idle {
                    self.armed = Some(ArmedPress {
                        lead,
                        origin: pos,
                        kind,
                        pressed_at: now,
                    });
                }
            }
            PointerInput::Move { pos, over } => self.on_move(pos, over, now, &mut out),
            PointerInput::Up { pos: _ } => {
                self.armed = None;
                if let Some(drag) = self.drag.take() {
                    match drag.over {
                        Some(target) => out.push(DragEvent::Dropped {
                            lead: drag.lead,
                            target,
                        }),
                        None => out.push(DragEvent::Cancelled { lead: drag.lead }),
                    }
                }
                // Up while Armed: a tap, no event.
            }
            PointerInput::Cancel => {
                self.armed = None;
                if let Some(drag) = self.drag.take() {
                    out.push(DragEvent::Cancelled { lead: drag.lead });
                }
            }
        }
        out
    }

    /// Check the touch hold delay. Call periodically (e.g. on tick).
    ///
    /// Returns `Started` when a touch press has been held long enough to
    /// promote to Dragging.
    pub fn check_hold(&mut self, now: Instant) -> Option<DragEvent> {
        let armed = self.armed.as_ref()?;
        if armed.kind != PointerKind::Touch {
            return None;
        }
        if now.duration_since(armed.pressed_at) < self.config.touch_hold_delay {
            return None;
        }
        let armed = self.armed.take()?;
        self.drag = Some(ActiveDrag {
            lead: armed.lead,
            over: None,
        });
        Some(DragEvent::Started { lead: armed.lead })
    }

    /// Whether a drag is currently in progress.
    #[inline]
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Whether the session is fully idle (neither armed nor dragging).
    #[inline]
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.phase() == DragPhase::Idle
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> DragPhase {
        if self.drag.is_some() {
            DragPhase::Dragging
        } else if self.armed.is_some() {
            DragPhase::Armed
        } else {
            DragPhase::Idle
        }
    }

    /// The lead being dragged, if any.
    #[must_use]
    pub fn dragged_lead(&self) -> Option<LeadId> {
        self.drag.as_ref().map(|d| d.lead)
    }

    /// The candidate drop target under the pointer, if any.
    #[must_use]
    pub fn drop_target(&self) -> Option<Stage> {
        self.drag.as_ref().and_then(|d| d.over)
    }

    /// Return to Idle without emitting events (e.g. board teardown).
    pub fn reset(&mut self) {
        self.armed = None;
        self.drag = None;
    }

    /// Current thresholds.
    #[must_use]
    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    fn on_move(
        &mut self,
        pos: PointerPos,
        over: Option<Stage>,
        now: Instant,
        out: &mut Vec<DragEvent>,
    ) {
        if let Some(ref mut drag) = self.drag {
            drag.over = over;
            out.push(DragEvent::Moved { pos, over });
            return;
        }
        let Some(armed) = self.armed.clone() else {
            return;
        };
        let travelled = armed.origin.distance(pos);
        let promote = match armed.kind {
            PointerKind::Mouse => travelled >= self.config.drag_threshold_px,
            PointerKind::Touch => {
                if now.duration_since(armed.pressed_at) >= self.config.touch_hold_delay {
                    true
                } else {
                    if travelled > self.config.touch_slop_px {
                        // Scroll, not a drag.
                        self.armed = None;
                    }
                    false
                }
            }
        };
        if promote {
            self.armed = None;
            self.drag = Some(ActiveDrag {
                lead: armed.lead,
                over,
            });
            out.push(DragEvent::Started { lead: armed.lead });
            out.push(DragEvent::Moved { pos, over });
        }
    }
}

impl Default for DragSession {
    fn default() -> Self {
        Self::new(DragConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
