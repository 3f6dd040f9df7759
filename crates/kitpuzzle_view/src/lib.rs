//! Step controller, 3D preview binding, and assembly sessions for Kitshop
//! assembly puzzles.

mod action;
mod controller;
mod preview;
mod session;

pub use action::{ParseStepActionError, StepAction, StepOutcome};
pub use controller::{StepController, StepDrift, StepStatus};
pub use preview::{PreviewBinding, RenderedPiece, SyncDiff, Viewport};
pub use session::{AssemblySession, SessionSummary, StepSummary};
