use plate_eval::evaluation::report::write_report;
use plate_eval::labels::label_file::load_label_file;
use plate_eval::object_detection::object_detection_model::DetectionFileSource;
use plate_eval::{ClassTable, Metric, Scorer, ScoringSettings};
use std::fs;
use std::path::Path;

const FS799_DETECTIONS: &str = "\
14 71 83 105 0.95 34
56 75 66 100 0.9 9
16 75 26 100 0.9 15
28 75 38 100 0.9 26
68 75 78 100 0.9 9
42 75 52 100 0.9 7
";

fn write_dataset(root: &Path, labels: &str, detections: &[(&str, &str)]) {
    fs::write(root.join("labels.txt"), labels).unwrap();
    let det_dir = root.join("detections");
    fs::create_dir_all(&det_dir).unwrap();
    for (image_id, text) in detections {
        fs::write(det_dir.join(format!("{}.txt", image_id)), text).unwrap();
    }
}

fn run(root: &Path) -> Scorer {
    let parsed = load_label_file(&root.join("labels.txt")).unwrap();
    assert!(parsed.malformed.is_empty());
    let mut source = DetectionFileSource::open(&root.join("detections")).unwrap();
    let mut scorer = Scorer::new(ScoringSettings::default(), ClassTable::default_plate_table());
    scorer.score_dataset(&parsed.ground_truth, &mut source);
    scorer
}

#[test]
fn perfect_prediction_scores_one_everywhere() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(
        dir.path(),
        "img1 14,71,83,105,FS799\n",
        &[("img1", FS799_DETECTIONS)],
    );
    let report = run(dir.path()).report(true);
    assert_eq!(report.metrics.recall, Metric::Defined(1.0));
    assert_eq!(report.metrics.precision, Metric::Defined(1.0));
    assert_eq!(report.metrics.character_error_rate, Metric::Defined(0.0));
    assert_eq!(report.metrics.plate_accuracy_detected, Metric::Defined(1.0));
    assert_eq!(report.metrics.plate_accuracy_ground_truth, Metric::Defined(1.0));
    assert!(report.skipped_records.is_empty());
    assert_eq!(report.images[0].matches[0].predicted, "FS799");

    let report_path = dir.path().join("out/report.json");
    write_report(&report_path, &report).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(json["metrics"]["recall"]["status"], "defined");
    assert_eq!(json["metrics"]["recall"]["value"], 1.0);
    assert_eq!(json["counts"]["perfect_plates"], 1);
}

#[test]
fn missing_detections_leave_precision_undefined() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path(), "img1 14,71,83,105,FS799\n", &[]);
    let report = run(dir.path()).report(false);
    assert_eq!(report.counts.ground_truth_plates, 1);
    assert_eq!(report.metrics.recall, Metric::Defined(0.0));
    assert_eq!(report.metrics.precision, Metric::InsufficientData);
    assert!(report.to_string().contains("Precision = N/A"));
}

#[test]
fn bad_detection_file_skips_only_that_image() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(
        dir.path(),
        "img1 14,71,83,105,FS799\nimg2 14,71,83,105,FS799\n",
        &[("img1", FS799_DETECTIONS), ("img2", "14 71 83 oops 0.9 34\n")],
    );
    let scorer = run(dir.path());
    let report = scorer.report(false);
    assert_eq!(report.skipped_records.len(), 1);
    assert_eq!(report.skipped_records[0].record, "img2");
    assert_eq!(report.counts.images_scored, 1);
    assert_eq!(report.counts.ground_truth_plates, 1);
    assert_eq!(report.metrics.recall, Metric::Defined(1.0));
}

#[test]
fn detections_without_labels_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(
        dir.path(),
        "img1 14,71,83,105,FS799\n",
        &[("img1", FS799_DETECTIONS), ("unlabelled", FS799_DETECTIONS)],
    );
    let report = run(dir.path()).report(false);
    assert_eq!(report.counts.images_scored, 1);
    assert_eq!(report.counts.predicted_plates, 1);
}

#[test]
fn malformed_label_lines_follow_the_strict_setting() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(
        dir.path(),
        "img1 14,71,83,105,FS799\nimg2 14,71,83\n",
        &[("img1", FS799_DETECTIONS)],
    );
    let labels = dir.path().join("labels.txt");
    assert!(load_label_file(&labels).unwrap().enforce(true).is_err());

    let parsed = load_label_file(&labels).unwrap().enforce(false).unwrap();
    let mut source = DetectionFileSource::open(&dir.path().join("detections")).unwrap();
    let mut scorer = Scorer::new(ScoringSettings::default(), ClassTable::default_plate_table());
    scorer.record_malformed_labels(&parsed.malformed);
    scorer.score_dataset(&parsed.ground_truth, &mut source);
    let report = scorer.report(false);
    assert_eq!(report.skipped_records.len(), 1);
    assert!(report.skipped_records[0].record.ends_with("labels.txt:2"));
    assert_eq!(report.metrics.recall, Metric::Defined(1.0));
}
