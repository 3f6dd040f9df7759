use std::sync::Arc;

use kitprefs::Preferences;
use kitpuzzle_core::{AssemblyTracker, PieceId, PuzzleSpec, StepNumber};
use serde::Serialize;
use web_time::Instant;

use crate::{
    PreviewBinding, RenderedPiece, StepAction, StepController, StepOutcome, StepStatus, Viewport,
};

/// Assembly session for one puzzle, created when the user selects it.
///
/// Owns the tracker (through the controller) and the preview, and keeps the
/// preview in sync after every action.
#[derive(Debug)]
pub struct AssemblySession {
    controller: StepController,
    preview: PreviewBinding,
    viewport: Viewport,
    /// Actions that changed something, in order.
    history: Vec<StepAction>,
}
impl AssemblySession {
    /// Starts a session with every piece unused.
    pub fn new(spec: Arc<PuzzleSpec>, prefs: &Preferences, viewport: Viewport, now: Instant) -> Self {
        log::info!("starting assembly session for puzzle {:?}", spec.id);
        let mut ret = Self {
            controller: StepController::new(spec),
            preview: PreviewBinding::new(prefs.animation.clone(), prefs.viewport.clone()),
            viewport,
            history: vec![],
        };
        ret.sync_preview(now);
        ret
    }

    /// Returns the puzzle.
    pub fn spec(&self) -> &Arc<PuzzleSpec> {
        self.controller.spec()
    }
    /// Returns the step controller.
    pub fn controller(&self) -> &StepController {
        &self.controller
    }
    /// Returns the tracker.
    pub fn tracker(&self) -> &AssemblyTracker {
        self.controller.tracker()
    }
    /// Returns the preview binding.
    pub fn preview(&self) -> &PreviewBinding {
        &self.preview
    }
    /// Returns the actions that changed something, in the order they were
    /// applied.
    pub fn history(&self) -> &[StepAction] {
        &self.history
    }

    /// Applies a step action and updates the preview.
    pub fn apply(&mut self, action: StepAction, now: Instant) -> StepOutcome {
        let outcome = self.controller.apply(action);
        if outcome != StepOutcome::Unchanged {
            self.history.push(action);
            self.sync_preview(now);
        }
        outcome
    }
    /// Modifies the tracker directly, then resyncs the controller and the
    /// preview.
    pub fn with_tracker_mut<R>(
        &mut self,
        now: Instant,
        f: impl FnOnce(&mut AssemblyTracker) -> R,
    ) -> R {
        let ret = f(self.controller.tracker_mut());
        self.controller.resync();
        self.sync_preview(now);
        ret
    }

    /// Resizes the viewport, which may change the device class.
    pub fn set_viewport(&mut self, viewport: Viewport, now: Instant) {
        self.viewport = viewport;
        self.sync_preview(now);
    }
    /// Applies new preferences to the preview.
    pub fn set_preferences(&mut self, prefs: &Preferences, now: Instant) {
        self.preview
            .set_preferences(prefs.animation.clone(), prefs.viewport.clone());
        self.sync_preview(now);
    }

    /// Returns the pieces to draw at time `now`.
    pub fn frame(&self, now: Instant) -> Vec<RenderedPiece> {
        self.preview.frame(now)
    }
    /// Returns whether the preview is animating at time `now`.
    pub fn needs_redraw(&self, now: Instant) -> bool {
        self.preview.needs_redraw(now)
    }

    /// Returns a serializable summary of the session.
    pub fn summary(&self) -> SessionSummary {
        let tracker = self.tracker();
        let spec = self.spec();
        SessionSummary {
            puzzle: spec.id.clone(),
            open_step: self.controller.open_step(),
            completed: self.controller.is_completed(),
            current_step: tracker.current_step(),
            used_pieces: tracker.used_pieces().iter().map(|p| p.id).collect(),
            unused_pieces: tracker.unused_pieces().iter().map(|p| p.id).collect(),
            steps: spec
                .steps
                .iter()
                .map(|step| StepSummary {
                    step: step.step_number,
                    description: step.description.clone(),
                    status: self.controller.step_status(step.step_number),
                })
                .collect(),
            history: self.history.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn sync_preview(&mut self, now: Instant) {
        let state = self.controller.tracker().state();
        self.preview.sync(state, self.viewport, now);
    }
}
impl Drop for AssemblySession {
    fn drop(&mut self) {
        log::debug!("closing assembly session for puzzle {:?}", self.spec().id);
    }
}

/// Serializable summary of an [`AssemblySession`].
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Puzzle ID.
    pub puzzle: String,
    /// Step the controller considers open.
    pub open_step: StepNumber,
    /// Whether every step has been finalized.
    pub completed: bool,
    /// Lowest step with unused pieces.
    pub current_step: Option<StepNumber>,
    /// Placed pieces, in placement order.
    pub used_pieces: Vec<PieceId>,
    /// Pieces not yet placed.
    pub unused_pieces: Vec<PieceId>,
    /// Step list.
    pub steps: Vec<StepSummary>,
    /// Actions applied so far.
    pub history: Vec<String>,
}

/// One entry in [`SessionSummary::steps`].
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StepSummary {
    /// Step number.
    pub step: StepNumber,
    /// Instructions.
    pub description: String,
    /// Display status.
    pub status: StepStatus,
}
