use crate::annotations::bounding_box::BoundingBoxGeometry;
use crate::annotations::detection::Detection;
use ndarray::{ArrayView2, Axis};

/// Non maximum suppression is a way of removing duplicate detections.
///
/// Detections are visited by descending confidence; a detection is dropped when it overlaps an
/// already kept detection of the same class by more than `iou_threshold`. Zero-area detections
/// never suppress anything.
pub fn non_maximum_suppression(mut detections: Vec<Detection>, iou_threshold: f64) -> Vec<Detection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let mut detections_to_remove: Vec<bool> = vec![false; detections.len()];
    for (current_index, current_det) in detections.iter().enumerate() {
        if detections_to_remove[current_index] {
            continue;
        }
        for (other_index, other_det) in detections[current_index + 1..].iter().enumerate() {
            let other_index = current_index + other_index + 1;
            if detections_to_remove[other_index] {
                continue;
            }
            if current_det.class_index != other_det.class_index {
                continue;
            }
            let iou = current_det
                .intersection_over_union(other_det)
                .unwrap_or(0.0);
            if iou > iou_threshold {
                detections_to_remove[other_index] = true;
            }
        }
    }
    detections
        .into_iter()
        .zip(detections_to_remove)
        .filter_map(|(det, remove)| (!remove).then_some(det))
        .collect()
}

/// Decodes raw YOLO output rows of `[cx, cy, w, h, objectness, class scores...]`.
///
/// Every class whose `objectness * score` reaches `confidence` yields its own detection, so a
/// single row can produce several. Rows with a non-positive width or height are dropped.
pub fn decode_yolo_rows(rows: ArrayView2<f32>, confidence: f32) -> Vec<Detection> {
    let mut detections = Vec::new();
    for row in rows.axis_iter(Axis(0)) {
        if row.len() < 6 {
            continue;
        }
        let (cx, cy, w, h, objectness) = (row[0], row[1], row[2], row[3], row[4]);
        if !(w > 0.0 && h > 0.0) {
            continue;
        }
        for (class_index, class_score) in row.iter().skip(5).enumerate() {
            let score = objectness * class_score;
            if score < confidence {
                continue;
            }
            detections.push(Detection {
                left: cx - w / 2.0,
                top: cy - h / 2.0,
                right: cx + w / 2.0,
                bottom: cy + h / 2.0,
                confidence: score,
                class_index,
            });
        }
    }
    detections
}
