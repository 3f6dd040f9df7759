//! Catalog of assembly puzzles, including the built-in ones.

use std::sync::Arc;

use cgmath::{Vector3, vec3};
use indexmap::IndexMap;

use crate::{PieceId, Placement, PuzzlePiece, PuzzleSpec, PuzzleSpecError, PuzzleStep, StepNumber};

/// ID of the built-in house puzzle.
pub const HOUSE_PUZZLE_ID: &str = "house";

/// Default distance that pieces fall from when they enter the scene.
const DROP_HEIGHT: f32 = 4.0;

lazy_static! {
    static ref HOUSE: Arc<PuzzleSpec> = Arc::new(house_puzzle());
}

/// Collection of puzzle specs, keyed by ID.
///
/// Specs are stored behind `Arc` so cloning this is cheap.
#[derive(Debug, Default, Clone)]
pub struct PuzzleCatalog {
    puzzles: IndexMap<String, Arc<PuzzleSpec>>,
}
impl PuzzleCatalog {
    /// Constructs an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }
    /// Constructs a catalog containing the built-in puzzles.
    pub fn with_builtins() -> Self {
        let mut ret = Self::new();
        ret.puzzles
            .insert(HOUSE_PUZZLE_ID.to_owned(), Arc::clone(&HOUSE));
        ret
    }

    /// Validates a puzzle and adds it to the catalog, replacing any existing
    /// puzzle with the same ID.
    pub fn add(&mut self, spec: PuzzleSpec) -> Result<Arc<PuzzleSpec>, PuzzleSpecError> {
        spec.validate()?;
        let spec = Arc::new(spec);
        if let Some(old) = self.puzzles.insert(spec.id.clone(), Arc::clone(&spec)) {
            log::warn!("replacing puzzle {:?} in catalog", old.id);
        }
        Ok(spec)
    }

    /// Returns the puzzle with the given ID.
    pub fn get(&self, id: &str) -> Option<Arc<PuzzleSpec>> {
        self.puzzles.get(id.trim()).map(Arc::clone)
    }
    /// Iterates over the puzzles in the order they were added.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<PuzzleSpec>> {
        self.puzzles.values()
    }
    /// Returns the number of puzzles.
    pub fn len(&self) -> usize {
        self.puzzles.len()
    }
    /// Returns whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }
}

/// Returns the built-in house puzzle.
pub fn house() -> Arc<PuzzleSpec> {
    Arc::clone(&HOUSE)
}

fn house_puzzle() -> PuzzleSpec {
    let steps = [
        "Lay the base plate on a flat surface.",
        "Slot the floor onto the base plate.",
        "Stand the back wall in the rear groove.",
        "Attach the left and right walls to the back wall.",
        "Close the house with the front wall.",
        "Slide the inner partition between the side walls.",
        "Hang the door in the front wall opening.",
        "Clip both window frames into the side walls.",
        "Lower the ceiling onto the walls.",
        "Fit the front and back roof trusses.",
        "Lay both roof panels across the trusses.",
        "Press the ridge cap along the top of the roof.",
        "Insert the chimney through the right roof panel.",
        "Put the cap on the chimney.",
        "Attach the porch deck below the door.",
        "Stand both porch pillars on the deck.",
        "Rest the porch roof on the pillars.",
    ];
    let steps = (1..)
        .zip(steps)
        .map(|(step_number, description)| PuzzleStep {
            step_number,
            description: description.to_owned(),
        })
        .collect();

    let up = vec3(0.0, DROP_HEIGHT, 0.0);
    let left = vec3(-DROP_HEIGHT, 0.0, 0.0);
    let right = vec3(DROP_HEIGHT, 0.0, 0.0);
    let front = vec3(0.0, 0.0, DROP_HEIGHT);

    #[rustfmt::skip]
    let pieces = vec![
        house_piece(1, 1, "Base plate", "base_plate", vec3(0.0, 0.0, 0.0), up, true),
        house_piece(2, 2, "Floor", "floor", vec3(0.0, 0.1, 0.0), up, true),
        house_piece(3, 3, "Back wall", "wall_back", vec3(0.0, 1.0, -1.5), up, true),
        house_piece(4, 4, "Left wall", "wall_left", vec3(-2.0, 1.0, 0.0), left, true),
        house_piece(5, 4, "Right wall", "wall_right", vec3(2.0, 1.0, 0.0), right, true),
        house_piece(6, 5, "Front wall", "wall_front", vec3(0.0, 1.0, 1.5), front, true),
        house_piece(7, 6, "Inner partition", "partition", vec3(0.0, 1.0, 0.0), up, true),
        house_piece(8, 7, "Door", "door", vec3(0.0, 0.7, 1.55), front, true),
        house_piece(9, 8, "Left window frame", "window_left", vec3(-2.05, 1.2, 0.0), left, false),
        house_piece(10, 8, "Right window frame", "window_right", vec3(2.05, 1.2, 0.0), right, false),
        house_piece(11, 9, "Ceiling", "ceiling", vec3(0.0, 2.0, 0.0), up, true),
        house_piece(12, 10, "Front roof truss", "truss_front", vec3(0.0, 2.6, 1.5), up, true),
        house_piece(13, 10, "Back roof truss", "truss_back", vec3(0.0, 2.6, -1.5), up, true),
        house_piece(14, 11, "Left roof panel", "roof_left", vec3(-1.1, 2.6, 0.0), left + up, true),
        house_piece(15, 11, "Right roof panel", "roof_right", vec3(1.1, 2.6, 0.0), right + up, true),
        house_piece(16, 12, "Ridge cap", "ridge_cap", vec3(0.0, 3.25, 0.0), up, false),
        house_piece(17, 13, "Chimney", "chimney", vec3(1.2, 3.2, -0.6), up, true),
        house_piece(18, 14, "Chimney cap", "chimney_cap", vec3(1.2, 3.75, -0.6), up, false),
        house_piece(19, 15, "Porch deck", "porch_deck", vec3(0.0, 0.05, 2.4), front, true),
        house_piece(20, 16, "Left porch pillar", "pillar_left", vec3(-0.8, 0.75, 2.9), up, true),
        house_piece(21, 16, "Right porch pillar", "pillar_right", vec3(0.8, 0.75, 2.9), up, true),
        house_piece(22, 17, "Porch roof", "porch_roof", vec3(0.0, 1.55, 2.6), up, true),
    ];

    PuzzleSpec {
        id: HOUSE_PUZZLE_ID.to_owned(),
        name: "Puzzle House".to_owned(),
        steps,
        pieces,
    }
}

fn house_piece(
    id: u32,
    step: StepNumber,
    part_name: &str,
    slug: &str,
    end: Vector3<f32>,
    entry_offset: Vector3<f32>,
    is_mobile: bool,
) -> PuzzlePiece {
    PuzzlePiece {
        id: PieceId(id),
        step,
        part_name: part_name.to_owned(),
        model_ref: format!("models/house/{slug}.glb"),
        svg_ref: format!("svg/house/{slug}.svg"),
        placement: Placement {
            start: end + entry_offset,
            end,
        },
        is_mobile,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_house_puzzle_is_valid() {
        let house = house();
        house.validate().unwrap();
        assert_eq!(house.pieces.len(), 22);
        assert_eq!(house.last_step(), 17);
        assert_eq!(house.pieces_in_step(1).len(), 1);
        assert_eq!(house.pieces_in_steps(9..).len(), 12);
    }

    #[test]
    fn test_catalog_add_and_get() {
        let mut catalog = PuzzleCatalog::with_builtins();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get(HOUSE_PUZZLE_ID).is_some());

        let mut broken = (*house()).clone();
        broken.id = "broken".to_owned();
        broken.steps.remove(4);
        assert_eq!(
            catalog.add(broken),
            Err(PuzzleSpecError::StepOutOfOrder {
                expected: 5,
                found: 6,
            }),
        );
        assert!(catalog.get("broken").is_none());

        let mut tiny = (*house()).clone();
        tiny.id = "tiny".to_owned();
        tiny.steps.truncate(1);
        tiny.pieces.truncate(1);
        catalog.add(tiny).unwrap();
        assert_eq!(
            catalog.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
            ["house", "tiny"],
        );
    }

    #[test]
    fn test_spec_validation_errors() {
        let mut spec = (*house()).clone();
        spec.pieces[1].id = PieceId(1);
        assert_eq!(spec.validate(), Err(PuzzleSpecError::DuplicatePiece(PieceId(1))));

        let mut spec = (*house()).clone();
        spec.pieces[0].step = 18;
        assert_eq!(
            spec.validate(),
            Err(PuzzleSpecError::NoSuchStep {
                piece: PieceId(1),
                step: 18,
            }),
        );

        let mut spec = (*house()).clone();
        spec.pieces.retain(|p| p.step != 12);
        assert_eq!(spec.validate(), Err(PuzzleSpecError::EmptyStep(12)));

        let mut spec = (*house()).clone();
        spec.pieces.clear();
        assert_eq!(
            spec.validate(),
            Err(PuzzleSpecError::NoPieces("house".to_owned())),
        );
    }
}
