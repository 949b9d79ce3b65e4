use crate::annotations::detection::Detection;
use crate::error::PlateEvalError;
use crate::image_utils::image_conversion::convert_rgb_image_to_owned_array;
use crate::image_utils::letterbox::letterbox;
use crate::object_detection::object_detection_model::PlateDetector;
use crate::object_detection::object_detection_utils::{decode_yolo_rows, non_maximum_suppression};
use crate::object_detection::ort_inference_session::OrtInferenceSession;
use image::RgbImage;
use std::path::Path;
use tracing::debug;

/// A YOLO model that detects plates and characters in one pass.
pub struct YoloPlateDetector {
    ort_session: OrtInferenceSession,
    input_size: u32,
    confidence: f32,
    nms_iou_threshold: f64,
}

impl YoloPlateDetector {
    pub fn new(
        model_path: &Path,
        input_size: u32,
        confidence: f32,
        nms_iou_threshold: f64,
    ) -> Result<Self, PlateEvalError> {
        let ort_session = OrtInferenceSession::new(model_path)?;
        Ok(YoloPlateDetector {
            ort_session,
            input_size,
            confidence,
            nms_iou_threshold,
        })
    }
}

impl PlateDetector for YoloPlateDetector {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>, PlateEvalError> {
        let (boxed, meta) = letterbox(image, self.input_size);
        let input = convert_rgb_image_to_owned_array(&boxed);
        let rows = self.ort_session.run(&input)?;
        let candidates = decode_yolo_rows(rows.view(), self.confidence);
        let candidate_count = candidates.len();
        let detections: Vec<Detection> = non_maximum_suppression(candidates, self.nms_iou_threshold)
            .into_iter()
            .map(|det| meta.restore(det))
            .collect();
        debug!(candidate_count, kept = detections.len(), "decoded detector output");
        Ok(detections)
    }
}
