use std::fmt;

use cgmath::Vector3;
use serde::{Deserialize, Serialize};

/// Step number. Steps are numbered contiguously starting from 1.
pub type StepNumber = u32;

/// ID of a piece, unique within a puzzle.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct PieceId(pub u32);
impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a piece comes from when it is revealed and where it ends up once
/// placed.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct Placement {
    /// Position that the entry animation starts from.
    pub start: Vector3<f32>,
    /// Final position of the piece in the assembled model.
    pub end: Vector3<f32>,
}
impl Placement {
    /// Returns the position at `t` in the range [0, 1] along the straight line
    /// from `start` to `end`.
    ///
    /// Returns exactly `end` when `t` is 1.
    pub fn lerp(&self, t: f32) -> Vector3<f32> {
        if t == 1.0 {
            return self.end;
        }
        self.start + (self.end - self.start) * t
    }
}

/// Immutable catalog entry for a single puzzle piece.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PuzzlePiece {
    /// Unique ID.
    pub id: PieceId,
    /// Assembly step that the piece belongs to.
    pub step: StepNumber,
    /// Human-friendly name of the part.
    pub part_name: String,
    /// 3D model of the piece.
    pub model_ref: String,
    /// Flat outline of the piece, shown in the step instructions.
    pub svg_ref: String,
    /// Entry animation path.
    pub placement: Placement,
    /// Whether the piece is rendered on mobile devices.
    pub is_mobile: bool,
}

/// Assembly step.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleStep {
    /// Step number, starting from 1.
    pub step_number: StepNumber,
    /// Instructions shown to the user.
    pub description: String,
}
