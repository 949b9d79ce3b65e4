use crate::annotations::bounding_box::{BoundingBox, BoundingBoxGeometry};
use crate::error::PlateEvalError;
use serde::Serialize;

/// A detection is what is produced as output from an object detection model.
///
/// A detection is a box in image coordinates, a confidence score (a probability value that
/// encodes the model's belief that the detection is true) and the index of the detected class.
/// One class index is reserved for whole plates; all others are character glyphs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Detection {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub confidence: f32,
    pub class_index: usize,
}

impl Detection {
    /// Builds a detection from the detector's (x1, y1, x2, y2, confidence, class) row.
    ///
    /// The class column is a float in raw detector output; it is truncated the same way the
    /// coordinates are when the detection is grouped.
    pub fn from_row(row: [f32; 6]) -> Result<Self, PlateEvalError> {
        if row.iter().any(|value| !value.is_finite()) {
            return Err(PlateEvalError::malformed(
                "detection",
                format!("non-finite value in {:?}", row),
            ));
        }
        if row[5] < 0.0 {
            return Err(PlateEvalError::malformed(
                "detection",
                format!("negative class index {}", row[5]),
            ));
        }
        Ok(Detection {
            left: row[0],
            top: row[1],
            right: row[2],
            bottom: row[3],
            confidence: row[4],
            class_index: row[5] as usize,
        })
    }

    /// Truncates the coordinates toward zero onto the pixel grid.
    pub fn pixel_box(&self) -> Result<BoundingBox, PlateEvalError> {
        BoundingBox::new(
            self.left as i32,
            self.top as i32,
            self.right as i32,
            self.bottom as i32,
        )
    }
}

impl BoundingBoxGeometry for Detection {
    fn as_xyxy(&self) -> (f64, f64, f64, f64) {
        (
            self.left as f64,
            self.top as f64,
            self.right as f64,
            self.bottom as f64,
        )
    }
}
