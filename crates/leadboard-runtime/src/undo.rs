#![forbid(unsafe_code)]

//! Single-slot, time-boxed undo offer.
//!
//! At most one undo may be pending at a time: a new offer immediately
//! retires the previous one, whose action becomes inert even if invoked
//! afterwards. Expiry removes the affordance only and never touches the
//! working set.

use std::time::Duration;

use web_time::Instant;

use crate::mutator::{MoveId, MoveRecord};

/// Default wall-clock lifetime of an undo offer.
pub const DEFAULT_UNDO_WINDOW: Duration = Duration::from_millis(4000);

#[derive(Debug)]
struct ActiveOffer {
    record: MoveRecord,
    deadline: Instant,
}

/// Offers a single time-boxed undo action per move.
#[derive(Debug)]
pub struct UndoCoordinator {
    window: Duration,
    active: Option<ActiveOffer>,
}

impl UndoCoordinator {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            active: None,
        }
    }

    /// Offer an undo for `record`. Returns the offer deadline and the id of
    /// any previous offer this one retires.
    pub fn offer(&mut self, record: MoveRecord, now: Instant) -> (Instant, Option<MoveId>) {
        let retired = self.active.take().map(|o| o.record.move_id);
        if let Some(old) = retired {
            tracing::debug!(
                target: "leadboard.undo",
                superseded = old.0,
                by = record.move_id.0,
                "undo offer superseded"
            );
        }
        let deadline = now + self.window;
        self.active = Some(ActiveOffer { record, deadline });
        (deadline, retired)
    }

    /// Invoke the undo for `move_id`. Valid only while the offer for that
    /// exact move is outstanding and unexpired; otherwise inert.
    pub fn invoke(&mut self, move_id: MoveId, now: Instant) -> Option<MoveRecord> {
        let offer = self.active.as_ref()?;
        if offer.record.move_id != move_id || now > offer.deadline {
            return None;
        }
        self.active.take().map(|o| o.record)
    }

    /// Expire the outstanding offer if its countdown has elapsed. Call from
    /// the host tick; removes the affordance, nothing else.
    pub fn expire(&mut self, now: Instant) -> Option<MoveId> {
        if self.active.as_ref().is_some_and(|o| now > o.deadline) {
            return self.active.take().map(|o| o.record.move_id);
        }
        None
    }

    /// Retire the offer for `move_id` early (e.g. its move failed and was
    /// rolled back).
    pub fn retire(&mut self, move_id: MoveId) -> Option<MoveId> {
        if self
            .active
            .as_ref()
            .is_some_and(|o| o.record.move_id == move_id)
        {
            return self.active.take().map(|o| o.record.move_id);
        }
        None
    }

    /// The outstanding offer, if any.
    #[must_use]
    pub fn outstanding(&self) -> Option<(MoveId, Instant)> {
        self.active
            .as_ref()
            .map(|o| (o.record.move_id, o.deadline))
    }
}

impl Default for UndoCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_WINDOW)
    }
}
