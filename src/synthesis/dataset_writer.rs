use crate::error::PlateEvalError;
use crate::image_utils::image_io::save_rgb_image;
use image::RgbImage;
use std::fs;
use std::path::{Path, PathBuf};

/// One synthetic training sample: a plate image and its per-character label fields.
#[derive(Clone, Debug, PartialEq)]
pub struct PlateSample {
    pub image: RgbImage,
    /// One field list per character, for example `["F", "12", "30", "24", "50"]`.
    pub fields: Vec<Vec<String>>,
}

impl PlateSample {
    /// Flattens the per-character fields onto a single comma separated line.
    pub fn label_line(&self) -> String {
        self.fields
            .iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Writes samples as `00000000.jpg` / `00000000.txt` pairs, numbered in the order they arrive.
pub struct DatasetWriter {
    output_dir: PathBuf,
    next_index: usize,
}

impl DatasetWriter {
    pub fn new(output_dir: &Path) -> Result<Self, PlateEvalError> {
        fs::create_dir_all(output_dir).map_err(|e| {
            PlateEvalError::io(format!("creating {}", output_dir.display()), e)
        })?;
        Ok(DatasetWriter {
            output_dir: output_dir.to_path_buf(),
            next_index: 0,
        })
    }

    pub fn written(&self) -> usize {
        self.next_index
    }

    /// Writes the sample and returns the path of its image.
    pub fn write(&mut self, sample: &PlateSample) -> Result<PathBuf, PlateEvalError> {
        let base_filename = format!("{:08}", self.next_index);
        let image_path = self.output_dir.join(format!("{}.jpg", base_filename));
        let label_path = self.output_dir.join(format!("{}.txt", base_filename));
        save_rgb_image(&sample.image, &image_path)?;
        fs::write(&label_path, format!("{}\n", sample.label_line()))
            .map_err(|e| PlateEvalError::io(format!("writing {}", label_path.display()), e))?;
        self.next_index += 1;
        Ok(image_path)
    }
}
