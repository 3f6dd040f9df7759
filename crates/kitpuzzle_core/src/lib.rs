//! Assembly puzzles for Kitshop: the piece catalog and the tracker that
//! records which pieces have been placed.
//!
//! A puzzle is a sequence of numbered steps, each of which places one or more
//! pieces. [`AssemblyTracker`] partitions the pieces into used and unused sets
//! and moves them between the two in whole-step batches.

#[macro_use]
extern crate lazy_static;

pub mod catalog;
mod observer;
mod piece;
mod spec;
mod tracker;


pub use catalog::{HOUSE_PUZZLE_ID, PuzzleCatalog};
pub use observer::{SubscriptionId, TrackerEvent, TrackerEventKind, TrackerObserver};
pub use piece::{PieceId, Placement, PuzzlePiece, PuzzleStep, StepNumber};
pub use spec::{PuzzleSpec, PuzzleSpecError};
pub use tracker::{AssemblyTracker, TrackerState};

/// Re-export of `cgmath`.
pub use cgmath;
