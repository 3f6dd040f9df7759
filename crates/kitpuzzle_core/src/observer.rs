use std::fmt;

use smallvec::SmallVec;

use crate::{PieceId, StepNumber, TrackerState};

/// Kind of transition that changed the tracker state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TrackerEventKind {
    /// All pieces were marked unused.
    Initialized,
    /// Specific pieces were placed.
    PiecesUsed,
    /// The pieces of the last placed step were taken back.
    StepReversed {
        /// Step whose pieces were taken back.
        step: StepNumber,
    },
    /// Every placed piece was taken back.
    PuzzleReset,
    /// Every remaining piece was placed.
    AllPiecesUsed,
    /// Placed pieces from a step onwards were taken back.
    ResetToStep {
        /// First step whose pieces were taken back.
        step: StepNumber,
    },
}

/// Notification sent to observers after the tracker state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerEvent {
    /// Transition that happened.
    pub kind: TrackerEventKind,
    /// Pieces that moved between the used and unused sets.
    pub moved: SmallVec<[PieceId; 4]>,
}

/// Receiver of tracker events.
///
/// Implemented for any `FnMut(&TrackerEvent, &TrackerState)`.
pub trait TrackerObserver {
    /// Called after every transition that changed the state.
    fn on_event(&mut self, event: &TrackerEvent, state: &TrackerState);
}
impl<F: FnMut(&TrackerEvent, &TrackerState)> TrackerObserver for F {
    fn on_event(&mut self, event: &TrackerEvent, state: &TrackerState) {
        self(event, state);
    }
}

/// Handle returned when subscribing, used to unsubscribe.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// List of observers.
#[derive(Default)]
pub(crate) struct Subscribers {
    next_id: u64,
    observers: Vec<(SubscriptionId, Box<dyn TrackerObserver>)>,
}
impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("len", &self.observers.len())
            .finish()
    }
}
impl Subscribers {
    pub fn subscribe(&mut self, observer: Box<dyn TrackerObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let len_before = self.observers.len();
        self.observers.retain(|(i, _)| *i != id);
        self.observers.len() != len_before
    }
    pub fn notify(&mut self, event: &TrackerEvent, state: &TrackerState) {
        for (_, observer) in &mut self.observers {
            observer.on_event(event, state);
        }
    }
}
