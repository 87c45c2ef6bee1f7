#![forbid(unsafe_code)]

//! Abstract pointer/touch input signals.
//!
//! Any UI runtime can drive the [`DragSession`](crate::drag::DragSession)
//! with these: the host performs its own hit-testing and reports which lead
//! card a press landed on and which stage column the pointer is over.

use crate::lead::LeadId;
use crate::stage::Stage;

/// Pointer position in host pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerPos {
    pub x: f32,
    pub y: f32,
}

impl PointerPos {
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position.
    #[must_use]
    pub fn distance(self, other: PointerPos) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Which input device produced the signal; controls the activation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    /// Mouse / trackpad pointer: promotes on movement distance.
    Mouse,
    /// Touch: promotes on hold delay within a movement tolerance.
    Touch,
}

/// One input signal for the drag session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    /// Pointer or touch down on a lead card.
    Down {
        lead: LeadId,
        pos: PointerPos,
        kind: PointerKind,
    },
    /// Pointer moved; `over` carries the host's hit-test of which stage
    /// column the pointer is currently above, if any.
    Move {
        pos: PointerPos,
        over: Option<Stage>,
    },
    /// Pointer or touch released.
    Up { pos: PointerPos },
    /// Explicit cancel (escape key, focus loss, system gesture).
    Cancel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = PointerPos::new(0.0, 0.0);
        let b = PointerPos::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < f32::EPSILON);
        assert!((b.distance(a) - 5.0).abs() < f32::EPSILON);
    }
}
