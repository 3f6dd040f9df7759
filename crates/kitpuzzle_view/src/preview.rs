//! One-way binding from tracker state to the pieces drawn in the 3D preview.

use cgmath::Vector3;
use itertools::Itertools;
use kitprefs::{AnimationPreferences, DeviceClass, ViewportPreferences};
use kitpuzzle_core::{PieceId, PuzzlePiece, StepNumber, TrackerState};
use serde::Serialize;
use smallvec::SmallVec;
use web_time::Instant;

/// Size of the preview viewport, in logical pixels.
#[derive(Serialize, Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}
impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}
impl Viewport {
    /// Constructs a viewport.
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Piece to draw in one frame of the preview.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderedPiece {
    /// Piece ID, stable across frames.
    pub id: PieceId,
    /// Reference to the 3D model.
    pub model_ref: String,
    /// Position of the piece in this frame.
    pub position: Vector3<f32>,
    /// Eased progress of the entry animation. This is 1.0 for placed pieces.
    pub progress: f32,
    /// Whether the piece is still moving.
    pub animating: bool,
}

/// Changes to the set of animated pieces caused by a call to
/// [`PreviewBinding::sync()`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncDiff {
    /// Pieces whose entry animation started.
    pub started: SmallVec<[PieceId; 4]>,
    /// Pieces whose entry animation was dropped.
    pub stopped: SmallVec<[PieceId; 4]>,
}
impl SyncDiff {
    /// Returns whether the animated set stayed the same.
    pub fn is_empty(&self) -> bool {
        self.started.is_empty() && self.stopped.is_empty()
    }
}

#[derive(Debug, Clone)]
struct EntryAnimation {
    piece: PuzzlePiece,
    start_time: Instant,
}

/// Binding from tracker state to the 3D preview.
///
/// Placed pieces are drawn at their final position. Unused pieces of the
/// current step play an entry animation from their start position to their
/// final position. On mobile devices, only pieces flagged for mobile are
/// drawn.
#[derive(Debug, Clone)]
pub struct PreviewBinding {
    animation_prefs: AnimationPreferences,
    viewport_prefs: ViewportPreferences,

    device: DeviceClass,
    step: Option<StepNumber>,
    committed: Vec<PuzzlePiece>,
    animated: Vec<EntryAnimation>,
}
impl PreviewBinding {
    /// Constructs an empty binding.
    pub fn new(animation_prefs: AnimationPreferences, viewport_prefs: ViewportPreferences) -> Self {
        Self {
            animation_prefs,
            viewport_prefs,

            device: DeviceClass::default(),
            step: None,
            committed: vec![],
            animated: vec![],
        }
    }

    /// Replaces the preferences. Running animations keep their start time.
    pub fn set_preferences(
        &mut self,
        animation_prefs: AnimationPreferences,
        viewport_prefs: ViewportPreferences,
    ) {
        self.animation_prefs = animation_prefs;
        self.viewport_prefs = viewport_prefs;
    }

    /// Returns the device class from the last sync.
    pub fn device(&self) -> DeviceClass {
        self.device
    }
    /// Returns the step being animated, as of the last sync.
    pub fn animated_step(&self) -> Option<StepNumber> {
        self.step
    }

    /// Updates the drawn pieces from the tracker state.
    ///
    /// Pieces that start animating use `now` as their start time; pieces that
    /// were already animating keep theirs.
    pub fn sync(&mut self, state: &TrackerState, viewport: Viewport, now: Instant) -> SyncDiff {
        self.device = self.viewport_prefs.device_class(viewport.width);
        let device = self.device;
        let is_visible = |piece: &PuzzlePiece| device == DeviceClass::Desktop || piece.is_mobile;

        self.committed = state
            .used_pieces
            .iter()
            .filter(|&p| is_visible(p))
            .cloned()
            .collect();

        let mut old_animated = std::mem::take(&mut self.animated);
        let mut diff = SyncDiff::default();
        self.step = state.current_step();
        for piece in state.pieces_in_current_step() {
            if !is_visible(piece) {
                continue;
            }
            let start_time = match old_animated.iter().position(|a| a.piece.id == piece.id) {
                Some(i) => old_animated.swap_remove(i).start_time,
                None => {
                    diff.started.push(piece.id);
                    now
                }
            };
            self.animated.push(EntryAnimation {
                piece: piece.clone(),
                start_time,
            });
        }
        diff.stopped = old_animated.iter().map(|a| a.piece.id).collect();
        diff.stopped.sort();

        if !diff.is_empty() {
            log::debug!(
                "preview animations started: [{}], stopped: [{}]",
                diff.started.iter().join(", "),
                diff.stopped.iter().join(", "),
            );
        }
        diff
    }

    /// Returns the pieces to draw at time `now`, placed pieces first.
    pub fn frame(&self, now: Instant) -> Vec<RenderedPiece> {
        let committed = self.committed.iter().map(|piece| RenderedPiece {
            id: piece.id,
            model_ref: piece.model_ref.clone(),
            position: piece.placement.end,
            progress: 1.0,
            animating: false,
        });
        let animated = self.animated.iter().map(|anim| {
            let elapsed = self.elapsed_secs(anim, now);
            let progress = self.animation_prefs.piece_entry_progress(elapsed);
            RenderedPiece {
                id: anim.piece.id,
                model_ref: anim.piece.model_ref.clone(),
                position: anim.piece.placement.lerp(progress),
                progress,
                animating: elapsed < self.animation_prefs.piece_entry_duration,
            }
        });
        committed.chain(animated).collect()
    }

    /// Returns whether any entry animation is still running at time `now`.
    pub fn needs_redraw(&self, now: Instant) -> bool {
        self.animated
            .iter()
            .any(|anim| self.elapsed_secs(anim, now) < self.animation_prefs.piece_entry_duration)
    }

    fn elapsed_secs(&self, anim: &EntryAnimation, now: Instant) -> f32 {
        now.saturating_duration_since(anim.start_time)
            .as_secs_f32()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use kitprefs::InterpolateFn;
    use kitpuzzle_core::{AssemblyTracker, catalog};
    use pretty_assertions::assert_eq;

    use super::*;

    const DESKTOP: Viewport = Viewport {
        width: 1280.0,
        height: 720.0,
    };
    const PHONE: Viewport = Viewport {
        width: 390.0,
        height: 844.0,
    };

    fn binding() -> PreviewBinding {
        let animation = AnimationPreferences {
            piece_entry_duration: 1.0,
            piece_entry_interpolation: InterpolateFn::EaseOutCubic,
        };
        PreviewBinding::new(animation, ViewportPreferences::default())
    }

    fn ids(pieces: &[RenderedPiece]) -> Vec<u32> {
        pieces.iter().map(|p| p.id.0).collect()
    }

    #[test]
    fn test_committed_and_animated_sets() {
        let house = catalog::house();
        let mut tracker = AssemblyTracker::for_puzzle(&house);
        tracker.use_pieces(&house.pieces_in_steps(1..=3));

        let mut preview = binding();
        let t0 = Instant::now();
        preview.sync(tracker.state(), DESKTOP, t0);
        let frame = preview.frame(t0);
        assert_eq!(ids(&frame), [1, 2, 3, 4, 5]);
        assert!(frame[..3].iter().all(|p| !p.animating && p.progress == 1.0));
        assert_eq!(frame[0].position, house.pieces[0].placement.end);
        assert!(frame[3..].iter().all(|p| p.animating && p.progress == 0.0));
        assert_eq!(frame[3].position, house.pieces[3].placement.start);
        assert_eq!(preview.animated_step(), Some(4));
    }

    #[test]
    fn test_ease_out_progress() {
        let house = catalog::house();
        let tracker = AssemblyTracker::for_puzzle(&house);
        let mut preview = binding();
        let t0 = Instant::now();
        preview.sync(tracker.state(), DESKTOP, t0);

        let halfway = &preview.frame(t0 + Duration::from_millis(500))[0];
        assert!(halfway.animating);
        assert!(halfway.progress > 0.5, "ease-out should be ahead of linear");
        assert!(preview.needs_redraw(t0 + Duration::from_millis(500)));

        let done = &preview.frame(t0 + Duration::from_secs(2))[0];
        assert!(!done.animating);
        assert_eq!(done.progress, 1.0);
        assert_eq!(done.position, house.pieces[0].placement.end);
        assert!(!preview.needs_redraw(t0 + Duration::from_secs(2)));
    }

    #[test]
    fn test_mobile_filtering() {
        let house = catalog::house();
        let mut tracker = AssemblyTracker::for_puzzle(&house);
        // Steps 1 through 7 placed; step 8 is the two window frames, which are
        // not drawn on mobile.
        tracker.use_pieces(&house.pieces_in_steps(..8));

        let mut preview = binding();
        let t0 = Instant::now();
        preview.sync(tracker.state(), PHONE, t0);
        assert_eq!(preview.device(), DeviceClass::Mobile);
        assert_eq!(ids(&preview.frame(t0)), [1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(!preview.needs_redraw(t0));

        preview.sync(tracker.state(), DESKTOP, t0);
        assert_eq!(preview.device(), DeviceClass::Desktop);
        assert_eq!(ids(&preview.frame(t0)), [1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);

        tracker.use_all_pieces();
        preview.sync(tracker.state(), PHONE, t0);
        let frame = preview.frame(t0);
        assert_eq!(frame.len(), 18);
        assert!(!ids(&frame).iter().any(|id| [9, 10, 16, 18].contains(id)));
    }

    #[test]
    fn test_clock_restarts_only_for_new_pieces() {
        let house = catalog::house();
        let mut tracker = AssemblyTracker::for_puzzle(&house);
        tracker.use_pieces(&house.pieces_in_steps(1..=3));

        let mut preview = binding();
        let t0 = Instant::now();
        let diff = preview.sync(tracker.state(), DESKTOP, t0);
        assert_eq!(diff.started.as_slice(), [PieceId(4), PieceId(5)]);
        assert!(diff.stopped.is_empty());

        // Same state later: existing animations keep running.
        let t1 = t0 + Duration::from_millis(300);
        assert!(preview.sync(tracker.state(), DESKTOP, t1).is_empty());
        let frame = preview.frame(t1);
        assert!(frame[3].progress > 0.0);

        // Next step: old animations are dropped, new ones start at `t1`.
        tracker.use_pieces(&house.pieces_in_step(4));
        let diff = preview.sync(tracker.state(), DESKTOP, t1);
        assert_eq!(diff.started.as_slice(), [PieceId(6)]);
        assert_eq!(diff.stopped.as_slice(), [PieceId(4), PieceId(5)]);
        let frame = preview.frame(t1);
        assert_eq!(ids(&frame), [1, 2, 3, 4, 5, 6]);
        assert_eq!(frame[5].progress, 0.0);
    }

    #[test]
    fn test_zero_duration_never_animates() {
        let house = catalog::house();
        let tracker = AssemblyTracker::for_puzzle(&house);
        let mut preview = binding();
        preview.set_preferences(
            AnimationPreferences {
                piece_entry_duration: 0.0,
                ..Default::default()
            },
            ViewportPreferences::default(),
        );
        let t0 = Instant::now();
        preview.sync(tracker.state(), DESKTOP, t0);
        assert!(!preview.needs_redraw(t0));
        let frame = preview.frame(t0);
        assert_eq!(frame[0].progress, 1.0);
        assert!(!frame[0].animating);
    }
}
