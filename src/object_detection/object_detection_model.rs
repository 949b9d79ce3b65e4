use crate::annotations::detection::Detection;
use crate::error::PlateEvalError;
use crate::image_utils::image_io::read_image_as_rgb8;
use crate::labels::detection_file::{index_files_by_stem, read_detection_file};
use image::RgbImage;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Defines a trait that all plate detection models must follow.
///
/// Detectors own their preprocessing. Whatever resizing or normalization a model needs happens
/// inside `detect`, and the returned detections are in the coordinates of `image`.
pub trait PlateDetector {
    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>, PlateEvalError>;
}

/// Anything that can hand out the detections of an image by id.
pub trait DetectionSource {
    /// `None` when the source has no entry for the image at all.
    fn detections_for(&mut self, image_id: &str)
    -> Option<Result<Vec<Detection>, PlateEvalError>>;
}

impl DetectionSource for HashMap<String, Vec<Detection>> {
    fn detections_for(
        &mut self,
        image_id: &str,
    ) -> Option<Result<Vec<Detection>, PlateEvalError>> {
        self.get(image_id).cloned().map(Ok)
    }
}

impl DetectionSource for BTreeMap<String, Vec<Detection>> {
    fn detections_for(
        &mut self,
        image_id: &str,
    ) -> Option<Result<Vec<Detection>, PlateEvalError>> {
        self.get(image_id).cloned().map(Ok)
    }
}

/// Detections saved to disk, one `<image_id>.txt` per image.
pub struct DetectionFileSource {
    files: BTreeMap<String, PathBuf>,
}

impl DetectionFileSource {
    pub fn open(dir: &Path) -> Result<Self, PlateEvalError> {
        let files = index_files_by_stem(dir, &["txt"])?;
        Ok(DetectionFileSource { files })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl DetectionSource for DetectionFileSource {
    fn detections_for(
        &mut self,
        image_id: &str,
    ) -> Option<Result<Vec<Detection>, PlateEvalError>> {
        self.files.get(image_id).map(|path| read_detection_file(path))
    }
}

/// Runs a detector over the images of a directory on demand.
pub struct DetectorSource<D: PlateDetector> {
    detector: D,
    images: BTreeMap<String, PathBuf>,
}

impl<D: PlateDetector> DetectorSource<D> {
    pub fn open(detector: D, image_dir: &Path) -> Result<Self, PlateEvalError> {
        let images = index_files_by_stem(image_dir, &IMAGE_EXTENSIONS)?;
        Ok(DetectorSource { detector, images })
    }
}

impl<D: PlateDetector> DetectionSource for DetectorSource<D> {
    fn detections_for(
        &mut self,
        image_id: &str,
    ) -> Option<Result<Vec<Detection>, PlateEvalError>> {
        let path = self.images.get(image_id)?;
        Some(read_image_as_rgb8(path).and_then(|image| self.detector.detect(&image)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    struct FixedDetector {
        calls: usize,
    }

    impl PlateDetector for FixedDetector {
        fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>, PlateEvalError> {
            self.calls += 1;
            let (w, h) = (image.width() as f32, image.height() as f32);
            Ok(vec![Detection::from_row([0.0, 0.0, w, h, 0.9, 34.0])?])
        }
    }

    #[test]
    fn file_source_reads_only_known_images() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("img1.txt"), "14 71 83 105 0.9 34\n").unwrap();
        fs::write(dir.path().join("broken.txt"), "14 71 83\n").unwrap();
        let mut source = DetectionFileSource::open(dir.path()).unwrap();
        assert_eq!(source.len(), 2);
        assert_eq!(source.detections_for("img1").unwrap().unwrap().len(), 1);
        assert!(source.detections_for("broken").unwrap().is_err());
        assert!(source.detections_for("missing").is_none());
    }

    #[test]
    fn detector_source_runs_the_detector_per_image() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::new(8, 4).save(dir.path().join("car.png")).unwrap();
        let mut source = DetectorSource::open(FixedDetector { calls: 0 }, dir.path()).unwrap();
        let dets = source.detections_for("car").unwrap().unwrap();
        assert_eq!((dets[0].right, dets[0].bottom), (8.0, 4.0));
        assert!(source.detections_for("bike").is_none());
        assert_eq!(source.detector.calls, 1);
    }
}
