use crate::error::PlateEvalError;
use serde::Serialize;
use std::fmt;

/// A struct representing a bounding box in integer pixel coordinates.
///
/// Plates and characters are both annotated with bounding boxes. Ground truth labels are stored
/// as integers, and detector output is truncated to integers before it is grouped, so every box
/// the evaluation compares lives on the pixel grid.
///
/// This project uses the standard convention of the left side of the image being x=0 and the top
/// of the image being y=0.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub struct BoundingBox {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl BoundingBox {
    /// Checks if a box has valid parameters before constructing.
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Result<Self, PlateEvalError> {
        if left > right {
            Err(PlateEvalError::malformed(
                "bounding box",
                format!("value for left > value for right ({} > {}).", left, right),
            ))
        } else if top > bottom {
            Err(PlateEvalError::malformed(
                "bounding box",
                format!("value for top > value for bottom ({} > {}).", top, bottom),
            ))
        } else {
            Ok(BoundingBox {
                left,
                top,
                right,
                bottom,
            })
        }
    }

    pub fn left(&self) -> i32 {
        self.left
    }

    pub fn top(&self) -> i32 {
        self.top
    }

    pub fn right(&self) -> i32 {
        self.right
    }

    pub fn bottom(&self) -> i32 {
        self.bottom
    }

    /// Horizontal extent. Computed in i64 since the full i32 range spans more than i32::MAX.
    pub fn width(&self) -> u32 {
        (self.right as i64 - self.left as i64) as u32
    }

    pub fn height(&self) -> u32 {
        (self.bottom as i64 - self.top as i64) as u32
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// Geometry shared by everything that occupies an axis-aligned rectangle.
///
/// Implementors only provide their corners; area, overlap and containment are derived from
/// them. Both overlap tests refuse zero-area operands with `DegenerateGeometry`, since the IoU
/// of two empty boxes has no meaning and a zero-area container cannot cover anything.
pub trait BoundingBoxGeometry {
    /// (left, top, right, bottom).
    fn as_xyxy(&self) -> (f64, f64, f64, f64);

    fn area(&self) -> f64 {
        let (left, top, right, bottom) = self.as_xyxy();
        (right - left) * (bottom - top)
    }

    fn ensure_non_degenerate(&self) -> Result<(), PlateEvalError> {
        // Written as a negation so NaN areas are rejected too.
        if !(self.area() > 0.0) {
            let (left, top, right, bottom) = self.as_xyxy();
            return Err(PlateEvalError::DegenerateGeometry {
                left,
                top,
                right,
                bottom,
            });
        }
        Ok(())
    }

    /// Intersection over union, in [0, 1].
    ///
    /// Boxes whose intersection is empty on either axis return exactly 0.0 without dividing.
    /// Touching edges produce a zero-area intersection and therefore also 0.0.
    fn intersection_over_union<T: BoundingBoxGeometry + ?Sized>(
        &self,
        other: &T,
    ) -> Result<f64, PlateEvalError> {
        self.ensure_non_degenerate()?;
        other.ensure_non_degenerate()?;
        let (l1, t1, r1, b1) = self.as_xyxy();
        let (l2, t2, r2, b2) = other.as_xyxy();

        let x_left = l1.max(l2);
        let y_top = t1.max(t2);
        let x_right = r1.min(r2);
        let y_bottom = b1.min(b2);
        if x_right < x_left || y_bottom < y_top {
            return Ok(0.0);
        }

        let intersection = (x_right - x_left) * (y_bottom - y_top);
        let union = self.area() + other.area() - intersection;
        Ok(intersection / union)
    }

    /// Whether the smaller of the two boxes lies entirely inside the larger one.
    ///
    /// The larger-area operand is always treated as the container, so the answer does not depend
    /// on argument order. Edges are inclusive.
    fn contains<T: BoundingBoxGeometry + ?Sized>(&self, other: &T) -> Result<bool, PlateEvalError> {
        self.ensure_non_degenerate()?;
        other.ensure_non_degenerate()?;
        let (outer, inner) = if self.area() < other.area() {
            (other.as_xyxy(), self.as_xyxy())
        } else {
            (self.as_xyxy(), other.as_xyxy())
        };
        Ok(outer.0 <= inner.0 && outer.1 <= inner.1 && outer.2 >= inner.2 && outer.3 >= inner.3)
    }
}

impl BoundingBoxGeometry for BoundingBox {
    fn as_xyxy(&self) -> (f64, f64, f64, f64) {
        (
            self.left as f64,
            self.top as f64,
            self.right as f64,
            self.bottom as f64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(left: i32, top: i32, right: i32, bottom: i32) -> BoundingBox {
        BoundingBox::new(left, top, right, bottom).unwrap()
    }

    #[test]
    fn new_rejects_inverted_boxes() {
        assert!(BoundingBox::new(10, 0, 5, 5).is_err());
        assert!(BoundingBox::new(0, 10, 5, 5).is_err());
        assert!(BoundingBox::new(0, 0, 0, 0).is_ok());
    }

    #[test]
    fn extent_spans_the_full_coordinate_range() {
        let wide = bbox(i32::MIN, 0, i32::MAX, 10);
        assert_eq!(wide.width(), u32::MAX);
        assert_eq!(wide.height(), 10);
    }

    #[test]
    fn iou_is_symmetric() {
        let pairs = [
            (bbox(0, 0, 10, 10), bbox(5, 5, 15, 15)),
            (bbox(14, 71, 83, 105), bbox(10, 70, 80, 100)),
            (bbox(0, 0, 4, 4), bbox(0, 0, 5, 5)),
            (bbox(0, 0, 3, 3), bbox(20, 20, 30, 30)),
        ];
        for (a, b) in pairs {
            assert_eq!(
                a.intersection_over_union(&b).unwrap(),
                b.intersection_over_union(&a).unwrap()
            );
        }
    }

    #[test]
    fn iou_with_itself_is_one() {
        for a in [bbox(0, 0, 1, 1), bbox(14, 71, 83, 105), bbox(-5, -5, 5, 20)] {
            assert_eq!(a.intersection_over_union(&a).unwrap(), 1.0);
        }
    }

    #[test]
    fn iou_is_zero_for_disjoint_boxes_on_each_axis() {
        let a = bbox(0, 0, 10, 10);
        let right_of_a = bbox(11, 0, 20, 10);
        let below_a = bbox(0, 11, 10, 20);
        assert_eq!(a.intersection_over_union(&right_of_a).unwrap(), 0.0);
        assert_eq!(a.intersection_over_union(&below_a).unwrap(), 0.0);
    }

    #[test]
    fn iou_standard_overlap() {
        let a = bbox(0, 0, 10, 10);
        let b = bbox(5, 0, 15, 10);
        // 50 / (100 + 100 - 50)
        let iou = a.intersection_over_union(&b).unwrap();
        assert!((iou - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn iou_touching_edges_is_zero() {
        let a = bbox(0, 0, 10, 10);
        let b = bbox(10, 0, 20, 10);
        assert_eq!(a.intersection_over_union(&b).unwrap(), 0.0);
    }

    #[test]
    fn iou_rejects_degenerate_boxes() {
        let flat = bbox(5, 5, 5, 10);
        let err = flat.intersection_over_union(&flat).unwrap_err();
        assert!(matches!(err, PlateEvalError::DegenerateGeometry { .. }));
        assert!(bbox(0, 0, 10, 10).intersection_over_union(&flat).is_err());
    }

    #[test]
    fn contains_is_reflexive() {
        let a = bbox(40, 162, 142, 216);
        assert!(a.contains(&a).unwrap());
    }

    #[test]
    fn contains_ignores_argument_order() {
        let plate = bbox(40, 162, 142, 216);
        let character = bbox(45, 173, 64, 205);
        assert!(plate.contains(&character).unwrap());
        assert!(character.contains(&plate).unwrap());
    }

    #[test]
    fn equal_area_distinct_boxes_do_not_contain_each_other() {
        // Same area, different extent: neither covers the other.
        let a = bbox(0, 0, 10, 10);
        let b = bbox(1, 1, 11, 11);
        assert!(!a.contains(&b).unwrap());
        assert!(!b.contains(&a).unwrap());
    }

    #[test]
    fn contains_rejects_partial_overlap() {
        let plate = bbox(40, 162, 142, 216);
        let sticking_out = bbox(130, 170, 150, 200);
        assert!(!plate.contains(&sticking_out).unwrap());
    }

    #[test]
    fn contains_rejects_degenerate_boxes() {
        let plate = bbox(40, 162, 142, 216);
        let line = bbox(50, 170, 50, 200);
        assert!(plate.contains(&line).is_err());
    }
}
