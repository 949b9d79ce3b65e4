//! Groups per-character plate detections into license plates and scores recognition accuracy
//! against ground truth.

pub mod annotations;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod grouping;
pub mod image_utils;
pub mod labels;
pub mod logging;
pub mod object_detection;
pub mod synthesis;

pub use annotations::bounding_box::{BoundingBox, BoundingBoxGeometry};
pub use annotations::detection::Detection;
pub use annotations::plate_group::{CharacterBox, MatchedPlate, PlateGroup};
pub use config::EvaluationConfig;
pub use error::PlateEvalError;
pub use evaluation::matcher::{MatchingStrategy, match_plates};
pub use evaluation::report::{EvaluationReport, Metric};
pub use evaluation::scorer::{AggregateStats, Scorer, ScoringSettings};
pub use grouping::plate_grouper::group_plates;
pub use grouping::string_reconstructor::reconstruct;
pub use labels::class_table::ClassTable;
pub use labels::label_file::{GroundTruth, GroundTruthPlate};
pub use object_detection::object_detection_model::{DetectionSource, PlateDetector};
