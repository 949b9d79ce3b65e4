use crate::error::PlateEvalError;
use crate::evaluation::matcher::MatchingStrategy;
use crate::evaluation::scorer::{DEFAULT_IOU_THRESHOLD, ScoringSettings};
use crate::labels::class_table::{ClassTable, DEFAULT_PLATE_CLASS_INDEX};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

fn default_iou_threshold() -> f64 {
    DEFAULT_IOU_THRESHOLD
}

fn default_plate_class_index() -> usize {
    DEFAULT_PLATE_CLASS_INDEX
}

fn default_input_size() -> u32 {
    1024
}

fn default_confidence() -> f32 {
    0.5
}

fn default_nms_iou_threshold() -> f64 {
    0.5
}

/// Everything one evaluation run needs.
///
/// Loaded from a JSON file where every field is optional, then overridden from the command
/// line.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluationConfig {
    #[serde(default)]
    pub labels: Option<PathBuf>,
    #[serde(default)]
    pub image_dir: Option<PathBuf>,
    #[serde(default)]
    pub detections_dir: Option<PathBuf>,
    /// ONNX model, used when no detections dir is given.
    #[serde(default)]
    pub model: Option<PathBuf>,
    #[serde(default)]
    pub class_table: Option<PathBuf>,
    #[serde(default = "default_plate_class_index")]
    pub plate_class_index: usize,
    #[serde(default = "default_iou_threshold")]
    pub iou_threshold: f64,
    #[serde(default)]
    pub matching: MatchingStrategy,
    #[serde(default = "default_input_size")]
    pub input_size: u32,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
    #[serde(default = "default_nms_iou_threshold")]
    pub nms_iou_threshold: f64,
    /// Malformed label lines abort the run instead of being skipped.
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub report: Option<PathBuf>,
    #[serde(default)]
    pub include_images: bool,
    #[serde(default)]
    pub render_dir: Option<PathBuf>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        EvaluationConfig {
            labels: None,
            image_dir: None,
            detections_dir: None,
            model: None,
            class_table: None,
            plate_class_index: default_plate_class_index(),
            iou_threshold: default_iou_threshold(),
            matching: MatchingStrategy::default(),
            input_size: default_input_size(),
            confidence: default_confidence(),
            nms_iou_threshold: default_nms_iou_threshold(),
            strict: false,
            report: None,
            include_images: false,
            render_dir: None,
        }
    }
}

fn check_unit_interval(name: &str, value: f64) -> Result<(), PlateEvalError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(PlateEvalError::invalid_config(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )))
    }
}

impl EvaluationConfig {
    pub fn from_json_file(filepath: &Path) -> Result<Self, PlateEvalError> {
        let text = fs::read_to_string(filepath)
            .map_err(|e| PlateEvalError::io(format!("reading config {}", filepath.display()), e))?;
        serde_json::from_str(&text)
            .map_err(|e| PlateEvalError::json(format!("parsing config {}", filepath.display()), e))
    }

    pub fn validate(&self) -> Result<(), PlateEvalError> {
        if self.labels.is_none() {
            return Err(PlateEvalError::invalid_config("no label file given"));
        }
        check_unit_interval("iou_threshold", self.iou_threshold)?;
        check_unit_interval("confidence", self.confidence as f64)?;
        check_unit_interval("nms_iou_threshold", self.nms_iou_threshold)?;
        if self.input_size == 0 {
            return Err(PlateEvalError::invalid_config("input_size must be positive"));
        }
        if self.detections_dir.is_none() && self.model.is_none() {
            return Err(PlateEvalError::invalid_config(
                "either a detections dir or a model is required",
            ));
        }
        if self.model.is_some() && self.detections_dir.is_none() && self.image_dir.is_none() {
            return Err(PlateEvalError::invalid_config(
                "running a model requires an image dir",
            ));
        }
        if self.render_dir.is_some() && self.image_dir.is_none() {
            return Err(PlateEvalError::invalid_config(
                "rendering requires an image dir",
            ));
        }
        Ok(())
    }

    pub fn scoring_settings(&self) -> ScoringSettings {
        ScoringSettings {
            iou_threshold: self.iou_threshold,
            plate_class_index: self.plate_class_index,
            matching: self.matching,
        }
    }

    /// The configured class table, or the built-in one.
    pub fn load_class_table(&self) -> Result<ClassTable, PlateEvalError> {
        let table = match &self.class_table {
            Some(path) => ClassTable::from_txt_file(path)?,
            None => ClassTable::default_plate_table(),
        };
        if let Some(index) = table.plate_index().filter(|i| *i != self.plate_class_index) {
            warn!(
                table_plate_index = index,
                plate_class_index = self.plate_class_index,
                "class table names a different plate class than the configured one"
            );
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn runnable() -> EvaluationConfig {
        EvaluationConfig {
            labels: Some(PathBuf::from("labels.txt")),
            detections_dir: Some(PathBuf::from("detections")),
            ..EvaluationConfig::default()
        }
    }

    #[test]
    fn empty_json_gives_defaults() {
        let config: EvaluationConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EvaluationConfig::default());
        assert_eq!(config.iou_threshold, 0.5);
        assert_eq!(config.plate_class_index, 34);
        assert_eq!(config.input_size, 1024);
        assert_eq!(config.matching, MatchingStrategy::Greedy);
    }

    #[test]
    fn reads_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"labels": "gt.txt", "detections_dir": "dets", "iou_threshold": 0.7, "matching": "one_to_one"}}"#
        )
        .unwrap();
        let config = EvaluationConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.labels, Some(PathBuf::from("gt.txt")));
        assert_eq!(config.iou_threshold, 0.7);
        assert_eq!(config.matching, MatchingStrategy::OneToOne);
        assert_eq!(config.plate_class_index, 34);
        config.validate().unwrap();
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = serde_json::from_str::<EvaluationConfig>(r#"{"iou": 0.5}"#);
        assert!(err.is_err());
    }

    #[test]
    fn validate_rejects_bad_thresholds() {
        let config = EvaluationConfig {
            iou_threshold: 1.5,
            ..runnable()
        };
        assert!(matches!(
            config.validate(),
            Err(PlateEvalError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn validate_requires_a_detection_source() {
        let config = EvaluationConfig {
            detections_dir: None,
            ..runnable()
        };
        assert!(config.validate().is_err());
        let config = EvaluationConfig {
            detections_dir: None,
            model: Some(PathBuf::from("model.onnx")),
            image_dir: Some(PathBuf::from("images")),
            ..runnable()
        };
        config.validate().unwrap();
    }

    #[test]
    fn scoring_settings_follow_config() {
        let config = EvaluationConfig {
            iou_threshold: 0.3,
            plate_class_index: 7,
            matching: MatchingStrategy::OneToOne,
            ..runnable()
        };
        assert_eq!(
            config.scoring_settings(),
            ScoringSettings {
                iou_threshold: 0.3,
                plate_class_index: 7,
                matching: MatchingStrategy::OneToOne,
            }
        );
    }
}
