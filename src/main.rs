use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use plate_eval::config::EvaluationConfig;
use plate_eval::error::PlateEvalError;
use plate_eval::evaluation::matcher::MatchingStrategy;
use plate_eval::evaluation::report::write_report;
use plate_eval::evaluation::scorer::Scorer;
use plate_eval::grouping::plate_grouper::group_plates;
use plate_eval::image_utils::image_io::{read_image_as_rgb8, save_rgb_image};
use plate_eval::image_utils::render::render_plate_groups;
use plate_eval::labels::detection_file::index_files_by_stem;
use plate_eval::labels::label_file::{GroundTruthPlate, load_label_file};
use plate_eval::logging::{LogFormat, init_logging};
use plate_eval::object_detection::object_detection_model::{
    DetectionFileSource, DetectionSource, IMAGE_EXTENSIONS,
};
use plate_eval::Detection;
use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Scores license plate recognition against a ground truth label file.
#[derive(Debug, Parser)]
#[command(name = "plate-eval", version, about)]
struct Cli {
    /// JSON config file; command line flags override its values.
    #[arg(long, env = "PLATE_EVAL_CONFIG")]
    config: Option<PathBuf>,
    /// Label file, one `<image_id> x1,y1,x2,y2,PLATE ...` line per image.
    #[arg(long, env = "PLATE_EVAL_LABELS")]
    labels: Option<PathBuf>,
    /// Directory of `<image_id>.txt` detection files.
    #[arg(long, env = "PLATE_EVAL_DETECTIONS_DIR")]
    detections_dir: Option<PathBuf>,
    #[arg(long, env = "PLATE_EVAL_IMAGE_DIR")]
    image_dir: Option<PathBuf>,
    /// ONNX detector, used when no detections dir is given.
    #[arg(long, env = "PLATE_EVAL_MODEL")]
    model: Option<PathBuf>,
    /// Class names, one per line.
    #[arg(long)]
    class_table: Option<PathBuf>,
    #[arg(long)]
    plate_class: Option<usize>,
    #[arg(long)]
    iou_threshold: Option<f64>,
    #[arg(long, value_enum)]
    matching: Option<MatchingStrategy>,
    #[arg(long)]
    input_size: Option<u32>,
    #[arg(long)]
    confidence: Option<f32>,
    #[arg(long)]
    nms_iou_threshold: Option<f64>,
    /// Where to write the JSON report; `-` prints it to stdout.
    #[arg(long)]
    report: Option<PathBuf>,
    /// Adds per-image scores to the JSON report.
    #[arg(long)]
    include_images: bool,
    /// Writes every image with its plate groups drawn on to this directory.
    #[arg(long)]
    render_dir: Option<PathBuf>,
    /// Fail on malformed label lines instead of skipping them.
    #[arg(long)]
    strict: bool,
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    #[arg(long, value_enum, env = "PLATE_EVAL_LOG_FORMAT", default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

impl Cli {
    fn into_config(self) -> Result<EvaluationConfig, PlateEvalError> {
        let mut config = match &self.config {
            Some(path) => EvaluationConfig::from_json_file(path)?,
            None => EvaluationConfig::default(),
        };
        if let Some(labels) = self.labels {
            config.labels = Some(labels);
        }
        if let Some(dir) = self.detections_dir {
            config.detections_dir = Some(dir);
        }
        if let Some(dir) = self.image_dir {
            config.image_dir = Some(dir);
        }
        if let Some(model) = self.model {
            config.model = Some(model);
        }
        if let Some(class_table) = self.class_table {
            config.class_table = Some(class_table);
        }
        if let Some(plate_class) = self.plate_class {
            config.plate_class_index = plate_class;
        }
        if let Some(threshold) = self.iou_threshold {
            config.iou_threshold = threshold;
        }
        if let Some(matching) = self.matching {
            config.matching = matching;
        }
        if let Some(size) = self.input_size {
            config.input_size = size;
        }
        if let Some(confidence) = self.confidence {
            config.confidence = confidence;
        }
        if let Some(threshold) = self.nms_iou_threshold {
            config.nms_iou_threshold = threshold;
        }
        if let Some(report) = self.report {
            config.report = Some(report);
        }
        if let Some(dir) = self.render_dir {
            config.render_dir = Some(dir);
        }
        config.include_images |= self.include_images;
        config.strict |= self.strict;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "onnx")]
fn open_detector(
    config: &EvaluationConfig,
    model: &Path,
) -> Result<Box<dyn DetectionSource>, PlateEvalError> {
    use plate_eval::object_detection::object_detection_model::DetectorSource;
    use plate_eval::object_detection::yolo_plate_detector::YoloPlateDetector;

    let image_dir = config
        .image_dir
        .as_deref()
        .ok_or_else(|| PlateEvalError::invalid_config("running a model requires an image dir"))?;
    let detector = YoloPlateDetector::new(
        model,
        config.input_size,
        config.confidence,
        config.nms_iou_threshold,
    )?;
    Ok(Box::new(DetectorSource::open(detector, image_dir)?))
}

#[cfg(not(feature = "onnx"))]
fn open_detector(
    _config: &EvaluationConfig,
    model: &Path,
) -> Result<Box<dyn DetectionSource>, PlateEvalError> {
    Err(PlateEvalError::detector(format!(
        "cannot run {}: plate-eval was built without the `onnx` feature",
        model.display()
    )))
}

fn open_source(config: &EvaluationConfig) -> Result<Box<dyn DetectionSource>, PlateEvalError> {
    match (&config.detections_dir, &config.model) {
        (Some(dir), _) => {
            let source = DetectionFileSource::open(dir)?;
            info!(files = source.len(), dir = %dir.display(), "reading detection files");
            Ok(Box::new(source))
        }
        (None, Some(model)) => open_detector(config, model),
        (None, None) => Err(PlateEvalError::invalid_config(
            "either a detections dir or a model is required",
        )),
    }
}

/// Draws the plate groups of one image into `render_dir`.
fn render_image(
    config: &EvaluationConfig,
    image_path: &Path,
    render_dir: &Path,
    image_id: &str,
    ground_truth: &[GroundTruthPlate],
    detections: &[Detection],
) -> Result<(), PlateEvalError> {
    let groups = group_plates(detections, config.plate_class_index)?;
    let mut image = read_image_as_rgb8(image_path)?;
    render_plate_groups(&mut image, ground_truth, &groups);
    save_rgb_image(&image, &render_dir.join(format!("{}.jpg", image_id)))
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format)?;
    let config = cli.into_config()?;

    let labels_path = config
        .labels
        .clone()
        .ok_or_else(|| PlateEvalError::invalid_config("no label file given"))?;
    let parsed = load_label_file(&labels_path)?.enforce(config.strict)?;
    let ground_truth = parsed.ground_truth;
    info!(
        images = ground_truth.image_count(),
        plates = ground_truth.plate_count(),
        characters = ground_truth.character_count(),
        labels = %labels_path.display(),
        "loaded ground truth"
    );

    let class_table = config.load_class_table()?;
    let mut source = open_source(&config)?;
    let mut scorer = Scorer::new(config.scoring_settings(), class_table);
    scorer.record_malformed_labels(&parsed.malformed);

    let render_targets: Option<(BTreeMap<String, PathBuf>, &Path)> =
        match (&config.render_dir, &config.image_dir) {
            (Some(render_dir), Some(image_dir)) => {
                fs::create_dir_all(render_dir).map_err(|source| PlateEvalError::Io {
                    context: format!("creating {}", render_dir.display()),
                    source,
                })?;
                Some((
                    index_files_by_stem(image_dir, &IMAGE_EXTENSIONS)?,
                    render_dir.as_path(),
                ))
            }
            _ => None,
        };

    let progress = ProgressBar::new(ground_truth.image_count() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?,
    );
    for (image_id, plates) in ground_truth.iter() {
        progress.set_message(image_id.to_string());
        let detections = source.detections_for(image_id);
        if let (Some((images, render_dir)), Some(Ok(dets))) = (&render_targets, &detections) {
            if let Some(image_path) = images.get(image_id) {
                if let Err(e) =
                    render_image(&config, image_path, render_dir, image_id, plates, dets)
                {
                    warn!(image_id, error = %e, "could not render image");
                }
            }
        }
        scorer.score_record(image_id, plates, detections);
        progress.inc(1);
    }
    progress.finish_and_clear();

    let report = scorer.report(config.include_images);
    info!(
        images = report.counts.images_scored,
        skipped = report.skipped_records.len(),
        "evaluation finished"
    );
    print!("{}", report);
    match config.report.as_deref() {
        Some(path) if path == Path::new("-") => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Some(path) => {
            write_report(path, &report)?;
            info!(report = %path.display(), "wrote report");
        }
        None => {}
    }
    Ok(())
}
