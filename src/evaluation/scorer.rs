use crate::annotations::bounding_box::BoundingBoxGeometry;
use crate::annotations::detection::Detection;
use crate::error::PlateEvalError;
use crate::evaluation::edit_distance::{character_overlap, word_error_rate};
use crate::evaluation::matcher::{MatchingStrategy, match_plates};
use crate::evaluation::report::{
    EvaluationReport, Metric, Metrics, REPORT_SCHEMA_VERSION, ReportSettings,
};
use crate::grouping::plate_grouper::group_plates;
use crate::grouping::string_reconstructor::{character_labels, reconstruct};
use crate::labels::class_table::{ClassTable, DEFAULT_PLATE_CLASS_INDEX};
use crate::labels::label_file::{GroundTruth, GroundTruthPlate, MalformedLabel};
use crate::object_detection::object_detection_model::DetectionSource;
use serde::Serialize;
use tracing::{debug, info, warn};

pub const DEFAULT_IOU_THRESHOLD: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoringSettings {
    pub iou_threshold: f64,
    pub plate_class_index: usize,
    pub matching: MatchingStrategy,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        ScoringSettings {
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            plate_class_index: DEFAULT_PLATE_CLASS_INDEX,
            matching: MatchingStrategy::Greedy,
        }
    }
}

/// Running counters over the dataset.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct AggregateStats {
    pub images_scored: usize,
    pub ground_truth_plates: usize,
    pub predicted_plates: usize,
    pub matched_plates: usize,
    /// Ground truth characters over matched plates; the character error rate denominator.
    pub matched_ground_truth_characters: usize,
    pub edit_distance: usize,
    pub perfect_plates: usize,
    pub overlap_total_characters: usize,
    pub overlap_correct_characters: usize,
}

impl AggregateStats {
    pub fn merge(&mut self, other: &AggregateStats) {
        self.images_scored += other.images_scored;
        self.ground_truth_plates += other.ground_truth_plates;
        self.predicted_plates += other.predicted_plates;
        self.matched_plates += other.matched_plates;
        self.matched_ground_truth_characters += other.matched_ground_truth_characters;
        self.edit_distance += other.edit_distance;
        self.perfect_plates += other.perfect_plates;
        self.overlap_total_characters += other.overlap_total_characters;
        self.overlap_correct_characters += other.overlap_correct_characters;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlateScore {
    pub ground_truth_index: usize,
    pub ground_truth: String,
    pub predicted: String,
    pub edit_distance: usize,
    pub word_error_rate: Metric,
    pub perfect: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ImageScore {
    pub image_id: String,
    /// Reconstructed string of every predicted plate, in detection order.
    pub predicted: Vec<String>,
    pub matches: Vec<PlateScore>,
    pub stats: AggregateStats,
}

/// A record the run could not score, with the reason.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RecordFailure {
    pub record: String,
    pub reason: String,
}

/// Scores plate predictions against ground truth, one image at a time.
///
/// Each image is scored in isolation and only merged into the aggregate once it fully
/// succeeds, so an image with malformed detections contributes nothing and is listed in the
/// report's skipped records instead.
pub struct Scorer {
    settings: ScoringSettings,
    class_table: ClassTable,
    stats: AggregateStats,
    images: Vec<ImageScore>,
    failures: Vec<RecordFailure>,
}

impl Scorer {
    pub fn new(settings: ScoringSettings, class_table: ClassTable) -> Self {
        Scorer {
            settings,
            class_table,
            stats: AggregateStats::default(),
            images: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn stats(&self) -> &AggregateStats {
        &self.stats
    }

    pub fn failures(&self) -> &[RecordFailure] {
        &self.failures
    }

    /// Scores one image without touching the aggregate.
    ///
    /// `detections` is `None` when the detector produced nothing for the image at all; its
    /// ground truth plates then only count towards recall's denominator.
    pub fn score_image(
        &self,
        image_id: &str,
        ground_truth: &[GroundTruthPlate],
        detections: Option<&[Detection]>,
    ) -> Result<ImageScore, PlateEvalError> {
        let mut stats = AggregateStats {
            images_scored: 1,
            ground_truth_plates: ground_truth.len(),
            ..AggregateStats::default()
        };
        let Some(detections) = detections else {
            return Ok(ImageScore {
                image_id: image_id.to_string(),
                predicted: Vec::new(),
                matches: Vec::new(),
                stats,
            });
        };

        let groups = group_plates(detections, self.settings.plate_class_index)?;
        stats.predicted_plates = groups.len();
        let predicted = groups
            .iter()
            .map(|g| reconstruct(&g.characters, &self.class_table))
            .collect::<Result<Vec<_>, _>>()?;

        // Bag-of-characters agreement, over every overlapping pair.
        for gt in ground_truth {
            for (group, predicted_plate) in groups.iter().zip(&predicted) {
                if gt.bounding_box.intersection_over_union(&group.plate)?
                    >= self.settings.iou_threshold
                {
                    let (total, correct) = character_overlap(&gt.plate, predicted_plate);
                    stats.overlap_total_characters += total;
                    stats.overlap_correct_characters += correct;
                }
            }
        }

        // Edit distance, over matched plates only.
        let matched = match_plates(
            &groups,
            ground_truth,
            self.settings.iou_threshold,
            self.settings.matching,
        )?;
        stats.matched_plates = matched.len();
        let mut matches = Vec::with_capacity(matched.len());
        for plate in &matched {
            let gt = &ground_truth[plate.ground_truth_index];
            let reference: Vec<String> = gt.plate.chars().map(String::from).collect();
            let hypothesis: Vec<String> = character_labels(&plate.characters, &self.class_table)?
                .into_iter()
                .map(String::from)
                .collect();
            let wer = word_error_rate(&reference, &hypothesis);
            let perfect = wer.distance == 0;
            stats.edit_distance += wer.distance;
            stats.matched_ground_truth_characters += wer.total;
            if perfect {
                stats.perfect_plates += 1;
            }
            matches.push(PlateScore {
                ground_truth_index: plate.ground_truth_index,
                ground_truth: gt.plate.clone(),
                predicted: hypothesis.concat(),
                edit_distance: wer.distance,
                word_error_rate: wer.rate,
                perfect,
            });
        }

        Ok(ImageScore {
            image_id: image_id.to_string(),
            predicted,
            matches,
            stats,
        })
    }

    /// Scores one image and folds the outcome into the run.
    pub fn score_record(
        &mut self,
        image_id: &str,
        ground_truth: &[GroundTruthPlate],
        detections: Option<Result<Vec<Detection>, PlateEvalError>>,
    ) {
        let outcome = match detections {
            Some(Ok(detections)) => self.score_image(image_id, ground_truth, Some(&detections)),
            Some(Err(e)) => Err(e),
            None => self.score_image(image_id, ground_truth, None),
        };
        match outcome {
            Ok(score) => {
                debug!(
                    image_id,
                    predicted = score.stats.predicted_plates,
                    matched = score.stats.matched_plates,
                    perfect = score.stats.perfect_plates,
                    "scored image"
                );
                self.stats.merge(&score.stats);
                self.images.push(score);
            }
            Err(e) => self.record_failure(image_id, &e),
        }
    }

    pub fn record_failure(&mut self, record: &str, error: &PlateEvalError) {
        warn!(record, error = %error, "skipping record");
        self.failures.push(RecordFailure {
            record: record.to_string(),
            reason: error.to_string(),
        });
    }

    /// Lists label lines that were skipped while loading the ground truth.
    pub fn record_malformed_labels(&mut self, malformed: &[MalformedLabel]) {
        for label in malformed {
            self.record_failure(&label.record, &label.error);
        }
    }

    /// Scores every image of the ground truth, pulling detections from `source`.
    ///
    /// Detections for images without ground truth are never requested.
    pub fn score_dataset<S: DetectionSource + ?Sized>(
        &mut self,
        ground_truth: &GroundTruth,
        source: &mut S,
    ) {
        for (image_id, plates) in ground_truth.iter() {
            let detections = source.detections_for(image_id);
            self.score_record(image_id, plates, detections);
        }
        info!(
            images = self.stats.images_scored,
            skipped = self.failures.len(),
            "finished scoring"
        );
    }

    pub fn report(&self, include_images: bool) -> EvaluationReport {
        EvaluationReport {
            schema_version: REPORT_SCHEMA_VERSION,
            settings: ReportSettings {
                iou_threshold: self.settings.iou_threshold,
                plate_class_index: self.settings.plate_class_index,
                matching: self.settings.matching,
            },
            counts: self.stats,
            metrics: Metrics::from_stats(&self.stats),
            skipped_records: self.failures.clone(),
            images: if include_images {
                self.images.clone()
            } else {
                Vec::new()
            },
        }
    }
}
