use crate::error::PlateEvalError;
use crate::evaluation::matcher::MatchingStrategy;
use crate::evaluation::scorer::{AggregateStats, ImageScore, RecordFailure};
use serde::Serialize;
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// A ratio that may lack a denominator.
///
/// Empty datasets, runs without predictions and plates without ground truth characters all
/// produce `InsufficientData` rather than a division by zero.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Metric {
    Defined(f64),
    InsufficientData,
}

impl Metric {
    pub fn ratio(numerator: usize, denominator: usize) -> Self {
        if denominator == 0 {
            Metric::InsufficientData
        } else {
            Metric::Defined(numerator as f64 / denominator as f64)
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Metric::Defined(v) => Some(*v),
            Metric::InsufficientData => None,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, f.precision()) {
            (Metric::Defined(v), Some(precision)) => write!(f, "{:.*}", precision, v),
            (Metric::Defined(v), None) => write!(f, "{}", v),
            (Metric::InsufficientData, _) => write!(f, "N/A"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ReportSettings {
    pub iou_threshold: f64,
    pub plate_class_index: usize,
    pub matching: MatchingStrategy,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Metrics {
    pub recall: Metric,
    pub precision: Metric,
    pub character_error_rate: Metric,
    pub plate_accuracy_detected: Metric,
    pub plate_accuracy_ground_truth: Metric,
    pub character_overlap_accuracy: Metric,
}

impl Metrics {
    pub fn from_stats(stats: &AggregateStats) -> Self {
        Metrics {
            recall: Metric::ratio(stats.matched_plates, stats.ground_truth_plates),
            precision: Metric::ratio(stats.matched_plates, stats.predicted_plates),
            character_error_rate: Metric::ratio(
                stats.edit_distance,
                stats.matched_ground_truth_characters,
            ),
            plate_accuracy_detected: Metric::ratio(stats.perfect_plates, stats.matched_plates),
            plate_accuracy_ground_truth: Metric::ratio(
                stats.perfect_plates,
                stats.ground_truth_plates,
            ),
            character_overlap_accuracy: Metric::ratio(
                stats.overlap_correct_characters,
                stats.overlap_total_characters,
            ),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct EvaluationReport {
    pub schema_version: u32,
    pub settings: ReportSettings,
    pub counts: AggregateStats,
    pub metrics: Metrics,
    pub skipped_records: Vec<RecordFailure>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageScore>,
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts = &self.counts;
        let metrics = &self.metrics;
        writeln!(f, "Number of Correctly Detected Plates = {}", counts.matched_plates)?;
        writeln!(f, "Number of Detected Plates = {}", counts.predicted_plates)?;
        writeln!(f, "Number of All Plates = {}", counts.ground_truth_plates)?;
        writeln!(f, "Recall = {:.4}", metrics.recall)?;
        writeln!(f, "Precision = {:.4}", metrics.precision)?;
        writeln!(f)?;
        writeln!(
            f,
            "Characters in Detected Plates = {}",
            counts.matched_ground_truth_characters
        )?;
        writeln!(f, "Error Characters (Detected) = {}", counts.edit_distance)?;
        writeln!(
            f,
            "Character Error Rate (Detected) = {:.4}",
            metrics.character_error_rate
        )?;
        writeln!(
            f,
            "Character Overlap Accuracy = {:.4} ({}/{})",
            metrics.character_overlap_accuracy,
            counts.overlap_correct_characters,
            counts.overlap_total_characters
        )?;
        writeln!(f)?;
        writeln!(
            f,
            "Number of Perfectly Recognized Plates = {}",
            counts.perfect_plates
        )?;
        writeln!(f, "Accuracy(Detected) = {:.4}", metrics.plate_accuracy_detected)?;
        writeln!(
            f,
            "Accuracy(Groundtruth) = {:.4}",
            metrics.plate_accuracy_ground_truth
        )?;
        if !self.skipped_records.is_empty() {
            writeln!(f)?;
            writeln!(f, "Skipped Records = {}", self.skipped_records.len())?;
            for failure in &self.skipped_records {
                writeln!(f, "  {}: {}", failure.record, failure.reason)?;
            }
        }
        Ok(())
    }
}

pub fn write_report(path: &Path, report: &EvaluationReport) -> Result<(), PlateEvalError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            PlateEvalError::io(
                format!("creating report directory {}", parent.display()),
                e,
            )
        })?;
    }
    let context = format!("writing report {}", path.display());
    let mut file = File::create(path).map_err(|e| PlateEvalError::io(context.clone(), e))?;
    serde_json::to_writer_pretty(&mut file, report)
        .map_err(|e| PlateEvalError::json(context.clone(), e))?;
    file.write_all(b"\n")
        .map_err(|e| PlateEvalError::io(context, e))?;
    Ok(())
}
