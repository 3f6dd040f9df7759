//! Step list controller that drives an [`AssemblyTracker`].

use std::collections::HashSet;
use std::sync::Arc;

use kitpuzzle_core::{AssemblyTracker, PieceId, PuzzleSpec, StepNumber};
use serde::Serialize;

use crate::{StepAction, StepOutcome};

/// Display status of a step in the step list.
#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// The step's pieces have been placed.
    Done,
    /// The step the user is working on.
    Open,
    /// A step after the open one.
    Locked,
}

/// Mismatch between the controller's open step and the step derived from the
/// tracker.
#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct StepDrift {
    /// Step the controller considers open, or `None` if it considers the
    /// puzzle complete.
    pub open_step: Option<StepNumber>,
    /// Lowest step that still has unused pieces.
    pub tracker_step: Option<StepNumber>,
}

/// Backward action that can be redone.
#[derive(Debug, Clone)]
struct RedoEntry {
    /// Pieces that the backward action took back.
    pieces: Vec<PieceId>,
    /// Open step before the backward action.
    open_step: StepNumber,
    /// Whether the puzzle was complete before the backward action.
    completed: bool,
}

/// Controller for the step list, which owns the open-step pointer and the
/// assembly tracker.
#[derive(Debug)]
pub struct StepController {
    spec: Arc<PuzzleSpec>,
    tracker: AssemblyTracker,

    /// Step the user is working on. When `completed` is set, this is the last
    /// step.
    open_step: StepNumber,
    /// Whether every step has been finalized.
    completed: bool,

    /// Stack of backward actions to redo.
    redo_stack: Vec<RedoEntry>,
}
impl StepController {
    /// Constructs a controller for a puzzle with every piece unused.
    pub fn new(spec: Arc<PuzzleSpec>) -> Self {
        let tracker = AssemblyTracker::for_puzzle(&spec);
        Self::with_tracker(spec, tracker)
    }
    /// Constructs a controller for an existing tracker. The open step is
    /// derived from the tracker state.
    pub fn with_tracker(spec: Arc<PuzzleSpec>, tracker: AssemblyTracker) -> Self {
        let mut ret = Self {
            spec,
            tracker,
            open_step: 1,
            completed: false,
            redo_stack: vec![],
        };
        ret.resync();
        ret
    }

    /// Returns the puzzle.
    pub fn spec(&self) -> &Arc<PuzzleSpec> {
        &self.spec
    }
    /// Returns the tracker.
    pub fn tracker(&self) -> &AssemblyTracker {
        &self.tracker
    }
    /// Returns the tracker mutably.
    ///
    /// Modifying the tracker directly may leave the open step out of sync with
    /// it; see [`Self::drift()`] and [`Self::resync()`].
    pub fn tracker_mut(&mut self) -> &mut AssemblyTracker {
        &mut self.tracker
    }

    /// Returns the step the user is working on.
    pub fn open_step(&self) -> StepNumber {
        self.open_step
    }
    /// Returns whether every step has been finalized.
    pub fn is_completed(&self) -> bool {
        self.completed
    }
    /// Returns the display status of a step.
    pub fn step_status(&self, step: StepNumber) -> StepStatus {
        if self.completed || step < self.open_step {
            StepStatus::Done
        } else if step == self.open_step {
            StepStatus::Open
        } else {
            StepStatus::Locked
        }
    }

    /// Returns whether there are placed pieces that can be taken back.
    pub fn has_undo(&self) -> bool {
        !self.tracker.used_pieces().is_empty()
    }
    /// Returns whether there is a backward action available to redo.
    pub fn has_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Returns the mismatch between the open step and the tracker, if any.
    pub fn drift(&self) -> Option<StepDrift> {
        let open_step = (!self.completed).then_some(self.open_step);
        let tracker_step = self.tracker.current_step();
        (open_step != tracker_step).then_some(StepDrift {
            open_step,
            tracker_step,
        })
    }
    /// Moves the open step to match the tracker and clears the redo history.
    /// Returns whether anything changed.
    pub fn resync(&mut self) -> bool {
        let Some(drift) = self.drift() else {
            return false;
        };
        log::debug!("resyncing open step from {drift:?}");
        match drift.tracker_step {
            Some(step) => {
                self.open_step = step;
                self.completed = false;
            }
            None => {
                self.open_step = self.spec.last_step();
                self.completed = true;
            }
        }
        self.redo_stack.clear();
        true
    }

    /// Applies an action.
    pub fn apply(&mut self, action: StepAction) -> StepOutcome {
        log::trace!("applying step action {action}");
        match action {
            StepAction::Finalize => self.finalize_step(),
            StepAction::GoBack => self.go_back(),
            StepAction::JumpTo(step) => self.jump_to(step),
            StepAction::Reset => self.reset(),
            StepAction::FinishAll => self.finish_all(),
            StepAction::Redo => self.redo(),
        }
    }

    /// Places the pieces of the open step and opens the next one. Finalizing
    /// the last step completes the puzzle.
    pub fn finalize_step(&mut self) -> StepOutcome {
        if self.completed {
            log::trace!("finalize_step: already completed");
            return StepOutcome::Unchanged;
        }
        self.redo_stack.clear();
        self.tracker
            .use_pieces(&self.spec.pieces_in_step(self.open_step));

        if self.open_step >= self.spec.last_step() {
            self.completed = true;
            log::debug!("completed puzzle {:?}", self.spec.id);
            StepOutcome::Completed
        } else {
            self.open_step += 1;
            StepOutcome::Advanced {
                step: self.open_step,
            }
        }
    }

    /// Takes back the pieces of the last placed step and opens the previous
    /// step.
    ///
    /// If the puzzle is complete, this only clears completion so that the last
    /// step is open again.
    pub fn go_back(&mut self) -> StepOutcome {
        let before = self.redo_entry();
        let moved = self.track_taken_back(|tracker| tracker.reverse_step());
        if moved.is_empty() && !self.completed && self.open_step <= 1 {
            log::trace!("go_back: nothing to take back");
            return StepOutcome::Unchanged;
        }

        if self.completed {
            self.completed = false;
        } else {
            self.open_step = self.open_step.saturating_sub(1).max(1);
        }
        self.push_redo(before, moved);
        StepOutcome::MovedBack {
            step: self.open_step,
        }
    }

    /// Opens `step`, placing the pieces of every step before it or taking
    /// back the pieces of `step` and every step after it.
    ///
    /// Jumping to the open step or to a step that doesn't exist does nothing.
    pub fn jump_to(&mut self, step: StepNumber) -> StepOutcome {
        if self.spec.step(step).is_none() {
            log::debug!("jump_to: no step {step} in puzzle {:?}", self.spec.id);
            return StepOutcome::Unchanged;
        }
        let position = self.position();
        if step > position {
            self.redo_stack.clear();
            self.tracker
                .use_pieces(&self.spec.pieces_in_steps(position..step));
            self.open_step = step;
            StepOutcome::Advanced { step }
        } else if step < position {
            let before = self.redo_entry();
            let moved = self.track_taken_back(|tracker| tracker.reset_to_last(step));
            self.open_step = step;
            self.completed = false;
            self.push_redo(before, moved);
            StepOutcome::MovedBack { step }
        } else {
            log::trace!("jump_to: step {step} is already open");
            StepOutcome::Unchanged
        }
    }

    /// Takes back every piece and opens the first step.
    pub fn reset(&mut self) -> StepOutcome {
        let changed = self.tracker.reset_puzzle() || self.completed || self.open_step != 1;
        self.open_step = 1;
        self.completed = false;
        self.redo_stack.clear();
        if changed {
            StepOutcome::Reset
        } else {
            StepOutcome::Unchanged
        }
    }

    /// Places every remaining piece and completes the puzzle.
    pub fn finish_all(&mut self) -> StepOutcome {
        if self.completed && self.tracker.is_complete() {
            return StepOutcome::Unchanged;
        }
        self.redo_stack.clear();
        self.tracker.use_all_pieces();
        self.open_step = self.spec.last_step();
        self.completed = true;
        log::debug!("completed puzzle {:?}", self.spec.id);
        StepOutcome::Completed
    }

    /// Re-applies the most recent backward action.
    pub fn redo(&mut self) -> StepOutcome {
        let Some(entry) = self.redo_stack.pop() else {
            log::trace!("redo: nothing to redo");
            return StepOutcome::Unchanged;
        };
        self.tracker.use_piece_ids(entry.pieces);
        self.open_step = entry.open_step;
        self.completed = entry.completed;
        if self.completed {
            StepOutcome::Completed
        } else {
            StepOutcome::Advanced {
                step: self.open_step,
            }
        }
    }

    /// Returns the step that the user is about to work on, counting
    /// completion as one step past the last.
    fn position(&self) -> StepNumber {
        if self.completed {
            self.spec.last_step() + 1
        } else {
            self.open_step
        }
    }

    fn redo_entry(&self) -> RedoEntry {
        RedoEntry {
            pieces: vec![],
            open_step: self.open_step,
            completed: self.completed,
        }
    }
    fn push_redo(&mut self, mut entry: RedoEntry, pieces: Vec<PieceId>) {
        entry.pieces = pieces;
        self.redo_stack.push(entry);
    }

    /// Runs a transition that takes pieces back and returns the IDs of the
    /// pieces it took back, in their original placement order.
    fn track_taken_back(
        &mut self,
        transition: impl FnOnce(&mut AssemblyTracker) -> bool,
    ) -> Vec<PieceId> {
        let used_before: Vec<PieceId> = self.tracker.used_pieces().iter().map(|p| p.id).collect();
        if !transition(&mut self.tracker) {
            return vec![];
        }
        let used_after: HashSet<PieceId> =
            self.tracker.used_pieces().iter().map(|p| p.id).collect();
        used_before
            .into_iter()
            .filter(|id| !used_after.contains(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use kitpuzzle_core::catalog;
    use pretty_assertions::assert_eq;

    use super::*;

    fn house_controller() -> StepController {
        StepController::new(catalog::house())
    }

    #[test]
    fn test_finalize_through_all_steps() {
        let mut c = house_controller();
        assert_eq!(c.open_step(), 1);
        for step in 2..=17 {
            assert_eq!(c.finalize_step(), StepOutcome::Advanced { step });
            assert_eq!(c.drift(), None);
        }
        assert_eq!(c.finalize_step(), StepOutcome::Completed);
        assert!(c.is_completed());
        assert!(c.tracker().is_complete());
        assert_eq!(c.drift(), None);
        assert_eq!(c.finalize_step(), StepOutcome::Unchanged);
        assert_eq!(c.step_status(17), StepStatus::Done);
    }

    #[test]
    fn test_step_status() {
        let mut c = house_controller();
        c.jump_to(5);
        assert_eq!(c.step_status(4), StepStatus::Done);
        assert_eq!(c.step_status(5), StepStatus::Open);
        assert_eq!(c.step_status(6), StepStatus::Locked);
    }

    #[test]
    fn test_go_back() {
        let mut c = house_controller();
        assert_eq!(c.go_back(), StepOutcome::Unchanged);
        assert!(!c.has_undo());

        c.finalize_step();
        c.finalize_step();
        assert_eq!(c.go_back(), StepOutcome::MovedBack { step: 2 });
        assert_eq!(c.tracker().used_pieces().len(), 1);
        assert_eq!(c.drift(), None);

        assert_eq!(c.go_back(), StepOutcome::MovedBack { step: 1 });
        assert!(c.tracker().used_pieces().is_empty());
        assert_eq!(c.go_back(), StepOutcome::Unchanged);
    }

    #[test]
    fn test_go_back_from_completion() {
        let mut c = house_controller();
        c.finish_all();
        assert_eq!(c.go_back(), StepOutcome::MovedBack { step: 17 });
        assert!(!c.is_completed());
        assert_eq!(c.step_status(17), StepStatus::Open);
        assert_eq!(c.tracker().current_step(), Some(17));
        assert_eq!(c.finalize_step(), StepOutcome::Completed);
    }

    #[test]
    fn test_jump_forward_and_back() {
        let mut c = house_controller();
        assert_eq!(c.jump_to(9), StepOutcome::Advanced { step: 9 });
        assert!(c.tracker().used_pieces().iter().all(|p| p.step < 9));
        assert_eq!(c.tracker().used_pieces().len(), 10);
        assert_eq!(c.drift(), None);

        assert_eq!(c.jump_to(9), StepOutcome::Unchanged);
        assert_eq!(c.jump_to(0), StepOutcome::Unchanged);
        assert_eq!(c.jump_to(18), StepOutcome::Unchanged);

        assert_eq!(c.jump_to(4), StepOutcome::MovedBack { step: 4 });
        assert_eq!(c.tracker().used_pieces().len(), 3);
        assert_eq!(c.tracker().current_step(), Some(4));

        c.finish_all();
        assert_eq!(c.jump_to(17), StepOutcome::MovedBack { step: 17 });
        assert_eq!(c.tracker().unused_pieces().len(), 1);
    }

    #[test]
    fn test_redo_after_go_back() {
        let mut c = house_controller();
        c.jump_to(6);
        let before = c.tracker().snapshot();

        c.go_back();
        c.go_back();
        assert!(c.has_redo());
        assert_eq!(c.open_step(), 4);

        assert_eq!(c.redo(), StepOutcome::Advanced { step: 5 });
        assert_eq!(c.redo(), StepOutcome::Advanced { step: 6 });
        assert_eq!(c.redo(), StepOutcome::Unchanged);
        assert_eq!(c.tracker().snapshot(), before);
    }

    #[test]
    fn test_redo_backward_jump_and_completion() {
        let mut c = house_controller();
        c.finish_all();
        c.jump_to(3);
        assert_eq!(c.redo(), StepOutcome::Completed);
        assert!(c.tracker().is_complete());
        assert!(c.is_completed());
    }

    #[test]
    fn test_forward_action_clears_redo() {
        let mut c = house_controller();
        c.jump_to(4);
        c.go_back();
        assert!(c.has_redo());
        c.finalize_step();
        assert!(!c.has_redo());

        c.go_back();
        c.reset();
        assert!(!c.has_redo());
        assert_eq!(c.open_step(), 1);
        assert_eq!(c.reset(), StepOutcome::Unchanged);
    }

    #[test]
    fn test_drift_and_resync() {
        let mut c = house_controller();
        c.jump_to(3);
        c.tracker_mut().use_all_pieces();
        assert_eq!(
            c.drift(),
            Some(StepDrift {
                open_step: Some(3),
                tracker_step: None,
            }),
        );
        assert!(c.resync());
        assert!(c.is_completed());
        assert!(!c.resync());

        c.tracker_mut().reset_to_last(8);
        assert!(c.resync());
        assert_eq!(c.open_step(), 8);
    }

    #[test]
    fn test_apply() {
        let mut c = house_controller();
        let actions = ["next", "next", "back", "jump:5", "redo", "all"];
        let outcomes: Vec<StepOutcome> = actions
            .iter()
            .map(|s| c.apply(s.parse().unwrap()))
            .collect();
        assert_eq!(
            outcomes,
            [
                StepOutcome::Advanced { step: 2 },
                StepOutcome::Advanced { step: 3 },
                StepOutcome::MovedBack { step: 2 },
                StepOutcome::Advanced { step: 5 },
                StepOutcome::Unchanged,
                StepOutcome::Completed,
            ],
        );
    }
}
