pub mod object_detection_model;
pub mod object_detection_utils;
#[cfg(feature = "onnx")]
pub mod ort_inference_session;
#[cfg(feature = "onnx")]
pub mod yolo_plate_detector;
