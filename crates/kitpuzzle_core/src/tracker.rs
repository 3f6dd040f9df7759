//! Assembly progress: which pieces have been placed and which haven't.

use std::collections::HashSet;

use itertools::Itertools;
use serde::Serialize;
use smallvec::SmallVec;

use crate::observer::Subscribers;
use crate::{
    PieceId, PuzzlePiece, PuzzleSpec, StepNumber, SubscriptionId, TrackerEvent, TrackerEventKind,
    TrackerObserver,
};

/// Partition of a puzzle's pieces into those that have been placed (used) and
/// those that haven't (unused).
///
/// Every piece is in exactly one of the two lists.
#[derive(Serialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackerState {
    /// Pieces not yet placed.
    pub unused_pieces: Vec<PuzzlePiece>,
    /// Placed pieces, in the order they were placed.
    pub used_pieces: Vec<PuzzlePiece>,
}
impl TrackerState {
    /// Returns the lowest step among unused pieces, which is the step currently
    /// being assembled. Returns `None` once every piece is placed.
    pub fn current_step(&self) -> Option<StepNumber> {
        self.unused_pieces.iter().map(|p| p.step).min()
    }
    /// Returns the highest step among used pieces.
    pub fn last_used_step(&self) -> Option<StepNumber> {
        self.used_pieces.iter().map(|p| p.step).max()
    }
    /// Returns the unused pieces that belong to [`Self::current_step()`].
    pub fn pieces_in_current_step(&self) -> Vec<&PuzzlePiece> {
        match self.current_step() {
            Some(step) => self
                .unused_pieces
                .iter()
                .filter(|p| p.step == step)
                .collect(),
            None => vec![],
        }
    }
    /// Returns whether there are no pieces at all.
    pub fn is_empty(&self) -> bool {
        self.unused_pieces.is_empty() && self.used_pieces.is_empty()
    }
    /// Returns whether every piece has been placed.
    pub fn is_complete(&self) -> bool {
        self.unused_pieces.is_empty() && !self.used_pieces.is_empty()
    }
}

/// Tracks assembly progress for one puzzle session.
///
/// All transitions are batch operations that either move pieces atomically or
/// do nothing. Observers are notified only when something actually moved.
#[derive(Debug, Default)]
pub struct AssemblyTracker {
    state: TrackerState,
    subscribers: Subscribers,
}
impl AssemblyTracker {
    /// Constructs a tracker with no pieces.
    pub fn new() -> Self {
        Self::default()
    }
    /// Constructs a tracker with every piece of `spec` unused.
    pub fn for_puzzle(spec: &PuzzleSpec) -> Self {
        let mut ret = Self::new();
        ret.initialize(spec.pieces.iter().cloned());
        ret
    }

    /// Returns the current state.
    pub fn state(&self) -> &TrackerState {
        &self.state
    }
    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> TrackerState {
        self.state.clone()
    }
    /// Returns the pieces not yet placed.
    pub fn unused_pieces(&self) -> &[PuzzlePiece] {
        &self.state.unused_pieces
    }
    /// Returns the placed pieces.
    pub fn used_pieces(&self) -> &[PuzzlePiece] {
        &self.state.used_pieces
    }
    /// See [`TrackerState::current_step()`].
    pub fn current_step(&self) -> Option<StepNumber> {
        self.state.current_step()
    }
    /// See [`TrackerState::last_used_step()`].
    pub fn last_used_step(&self) -> Option<StepNumber> {
        self.state.last_used_step()
    }
    /// See [`TrackerState::pieces_in_current_step()`].
    pub fn pieces_in_current_step(&self) -> Vec<&PuzzlePiece> {
        self.state.pieces_in_current_step()
    }
    /// See [`TrackerState::is_complete()`].
    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    /// Registers an observer that is notified after every state change.
    pub fn subscribe(&mut self, observer: impl TrackerObserver + 'static) -> SubscriptionId {
        self.subscribers.subscribe(Box::new(observer))
    }
    /// Removes an observer. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Marks every piece in `pieces` unused, discarding all progress. Returns
    /// whether the state changed.
    ///
    /// This does not check for existing progress; see
    /// [`Self::initialize_if_empty()`].
    pub fn initialize(&mut self, pieces: impl IntoIterator<Item = PuzzlePiece>) -> bool {
        let new_state = TrackerState {
            unused_pieces: pieces.into_iter().collect(),
            used_pieces: vec![],
        };
        if new_state == self.state {
            return false;
        }
        self.state = new_state;
        log::debug!(
            "initialized tracker with {} pieces",
            self.state.unused_pieces.len(),
        );
        let moved = self.state.unused_pieces.iter().map(|p| p.id).collect();
        self.notify(TrackerEventKind::Initialized, moved);
        true
    }
    /// Initializes the tracker only if it has no pieces, so that existing
    /// progress is never clobbered. Returns whether it was initialized.
    pub fn initialize_if_empty(&mut self, pieces: impl IntoIterator<Item = PuzzlePiece>) -> bool {
        if !self.state.is_empty() {
            log::debug!("tracker already initialized; keeping progress");
            return false;
        }
        self.initialize(pieces)
    }

    /// Moves the given pieces (matched by ID) from unused to used, appending
    /// them in the order given. Pieces that are not currently unused are
    /// ignored. Returns whether anything moved.
    pub fn use_pieces<'a>(&mut self, pieces: impl IntoIterator<Item = &'a PuzzlePiece>) -> bool {
        self.use_piece_ids(pieces.into_iter().map(|p| p.id))
    }
    /// Same as [`Self::use_pieces()`], but takes piece IDs.
    pub fn use_piece_ids(&mut self, ids: impl IntoIterator<Item = PieceId>) -> bool {
        let unused_ids: HashSet<PieceId> = self.state.unused_pieces.iter().map(|p| p.id).collect();
        let to_move: Vec<PieceId> = ids
            .into_iter()
            .filter(|id| unused_ids.contains(id))
            .unique()
            .collect();
        if to_move.is_empty() {
            log::trace!("use_pieces: nothing to move");
            return false;
        }

        let move_set: HashSet<PieceId> = to_move.iter().copied().collect();
        let (mut moving, remaining): (Vec<_>, Vec<_>) = std::mem::take(&mut self.state.unused_pieces)
            .into_iter()
            .partition(|p| move_set.contains(&p.id));
        moving.sort_by_key(|p| to_move.iter().position(|id| *id == p.id));
        self.state.unused_pieces = remaining;
        self.state.used_pieces.extend(moving);

        log::debug!("used pieces {}", to_move.iter().join(", "));
        self.notify(TrackerEventKind::PiecesUsed, to_move.into_iter().collect());
        true
    }

    /// Moves every used piece in the highest used step back to unused
    /// (prepended). Returns whether anything moved.
    ///
    /// This always reverses one whole step, even if the last call to
    /// [`Self::use_pieces()`] placed pieces from several steps at once.
    pub fn reverse_step(&mut self) -> bool {
        let Some(step) = self.state.last_used_step() else {
            log::trace!("reverse_step: no pieces used");
            return false;
        };
        let moved = self.move_used_to_unused(|p| p.step == step);
        log::debug!("reversed step {step}");
        self.notify(TrackerEventKind::StepReversed { step }, moved);
        true
    }

    /// Moves every used piece back to unused (prepended). Returns whether
    /// anything moved.
    pub fn reset_puzzle(&mut self) -> bool {
        if self.state.used_pieces.is_empty() {
            log::trace!("reset_puzzle: no pieces used");
            return false;
        }
        let moved = self.move_used_to_unused(|_| true);
        log::debug!("reset puzzle");
        self.notify(TrackerEventKind::PuzzleReset, moved);
        true
    }

    /// Moves every unused piece to used (appended). Returns whether anything
    /// moved.
    pub fn use_all_pieces(&mut self) -> bool {
        if self.state.unused_pieces.is_empty() {
            log::trace!("use_all_pieces: no pieces unused");
            return false;
        }
        let moving = std::mem::take(&mut self.state.unused_pieces);
        let moved = moving.iter().map(|p| p.id).collect();
        self.state.used_pieces.extend(moving);
        log::debug!("used all pieces");
        self.notify(TrackerEventKind::AllPiecesUsed, moved);
        true
    }

    /// Moves every used piece whose step is `step` or later back to unused
    /// (prepended), keeping pieces from earlier steps. Returns whether anything
    /// moved.
    pub fn reset_to_last(&mut self, step: StepNumber) -> bool {
        if !self.state.used_pieces.iter().any(|p| p.step >= step) {
            log::trace!("reset_to_last: nothing used at or after step {step}");
            return false;
        }
        let moved = self.move_used_to_unused(|p| p.step >= step);
        log::debug!("reset to step {step}");
        self.notify(TrackerEventKind::ResetToStep { step }, moved);
        true
    }

    /// Moves used pieces matching `predicate` to the front of the unused list,
    /// preserving their relative order. Returns the IDs of the moved pieces.
    fn move_used_to_unused(
        &mut self,
        predicate: impl Fn(&PuzzlePiece) -> bool,
    ) -> SmallVec<[PieceId; 4]> {
        let (moving, keeping): (Vec<_>, Vec<_>) = std::mem::take(&mut self.state.used_pieces)
            .into_iter()
            .partition(|p| predicate(p));
        let moved = moving.iter().map(|p| p.id).collect();
        self.state.used_pieces = keeping;
        let old_unused = std::mem::take(&mut self.state.unused_pieces);
        self.state.unused_pieces = moving.into_iter().chain(old_unused).collect();
        moved
    }

    fn notify(&mut self, kind: TrackerEventKind, moved: SmallVec<[PieceId; 4]>) {
        let event = TrackerEvent { kind, moved };
        self.subscribers.notify(&event, &self.state);
    }
}
