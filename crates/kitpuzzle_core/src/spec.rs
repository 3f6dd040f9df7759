use std::collections::{BTreeMap, HashSet};
use std::ops::RangeBounds;

use serde::{Deserialize, Serialize};

use crate::{PieceId, PuzzlePiece, PuzzleStep, StepNumber};

/// Error in the definition of a puzzle.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PuzzleSpecError {
    /// Puzzle has no pieces.
    #[error("puzzle {0:?} has no pieces")]
    NoPieces(String),
    /// Step numbers are not `1..=N` in order.
    #[error("expected step {expected} but found step {found}")]
    StepOutOfOrder {
        /// Step number that should be at this position.
        expected: StepNumber,
        /// Step number that is at this position.
        found: StepNumber,
    },
    /// Two pieces have the same ID.
    #[error("duplicate piece ID {0}")]
    DuplicatePiece(PieceId),
    /// Piece refers to a step that does not exist.
    #[error("piece {piece} refers to nonexistent step {step}")]
    NoSuchStep {
        /// Piece ID.
        piece: PieceId,
        /// Step number referenced by the piece.
        step: StepNumber,
    },
    /// Step has no pieces.
    #[error("step {0} has no pieces")]
    EmptyStep(StepNumber),
}

/// Definition of an assembly puzzle: its steps and the pieces placed in each
/// step.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PuzzleSpec {
    /// Internal ID.
    pub id: String,
    /// Human-friendly name.
    pub name: String,
    /// Steps, in order.
    pub steps: Vec<PuzzleStep>,
    /// Pieces, in catalog order.
    pub pieces: Vec<PuzzlePiece>,
}
impl PuzzleSpec {
    /// Checks that the steps are numbered `1..=N` with no gaps, that piece IDs
    /// are unique, and that every step has at least one piece and every piece
    /// belongs to a step.
    pub fn validate(&self) -> Result<(), PuzzleSpecError> {
        if self.pieces.is_empty() {
            return Err(PuzzleSpecError::NoPieces(self.id.clone()));
        }

        for (expected, step) in (1..).zip(&self.steps) {
            if step.step_number != expected {
                return Err(PuzzleSpecError::StepOutOfOrder {
                    expected,
                    found: step.step_number,
                });
            }
        }

        let mut seen = HashSet::new();
        for piece in &self.pieces {
            if !seen.insert(piece.id) {
                return Err(PuzzleSpecError::DuplicatePiece(piece.id));
            }
            if !(1..=self.last_step()).contains(&piece.step) {
                return Err(PuzzleSpecError::NoSuchStep {
                    piece: piece.id,
                    step: piece.step,
                });
            }
        }

        let counts = self.piece_counts_by_step();
        if let Some(step) = (1..=self.last_step()).find(|n| !counts.contains_key(n)) {
            return Err(PuzzleSpecError::EmptyStep(step));
        }

        Ok(())
    }

    /// Returns the number of the last step, or 0 if there are no steps.
    pub fn last_step(&self) -> StepNumber {
        self.steps.len() as StepNumber
    }
    /// Returns the step with the given number.
    pub fn step(&self, step_number: StepNumber) -> Option<&PuzzleStep> {
        let index = step_number.checked_sub(1)?;
        self.steps.get(index as usize)
    }

    /// Returns the pieces placed in a step, in catalog order.
    pub fn pieces_in_step(&self, step_number: StepNumber) -> Vec<PuzzlePiece> {
        self.pieces_in_steps(step_number..=step_number)
    }
    /// Returns the pieces placed in a range of steps, in catalog order.
    pub fn pieces_in_steps(&self, steps: impl RangeBounds<StepNumber>) -> Vec<PuzzlePiece> {
        self.pieces
            .iter()
            .filter(|piece| steps.contains(&piece.step))
            .cloned()
            .collect()
    }

    /// Returns the number of pieces in each step.
    pub fn piece_counts_by_step(&self) -> BTreeMap<StepNumber, usize> {
        let mut counts = BTreeMap::new();
        for piece in &self.pieces {
            *counts.entry(piece.step).or_default() += 1;
        }
        counts
    }
}
