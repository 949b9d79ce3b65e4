use crate::annotations::bounding_box::BoundingBox;
use serde::Serialize;

/// A single character detection on the pixel grid.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct CharacterBox {
    pub bounding_box: BoundingBox,
    pub class_index: usize,
}

/// One detected plate and the characters found inside it.
///
/// After grouping, `characters` is in reading order (ascending left edge). String
/// reconstruction relies on that order and does not sort again.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PlateGroup {
    pub plate: BoundingBox,
    pub characters: Vec<CharacterBox>,
}

impl PlateGroup {
    pub fn new(plate: BoundingBox) -> Self {
        PlateGroup {
            plate,
            characters: Vec::new(),
        }
    }
}

/// A predicted plate bound to the ground truth plate it overlaps.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct MatchedPlate {
    pub plate: BoundingBox,
    pub characters: Vec<CharacterBox>,
    pub ground_truth_index: usize,
}
