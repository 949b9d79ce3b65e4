use crate::error::PlateEvalError;
use image::{self, RgbImage};
use std::path::Path;

pub fn read_image_as_rgb8(filepath: &Path) -> Result<RgbImage, PlateEvalError> {
    image::open(filepath)
        .map(|img| img.into_rgb8())
        .map_err(|e| PlateEvalError::image(format!("reading {}", filepath.display()), e))
}

pub fn save_rgb_image(image: &RgbImage, filepath: &Path) -> Result<(), PlateEvalError> {
    image
        .save(filepath)
        .map_err(|e| PlateEvalError::image(format!("writing {}", filepath.display()), e))
}
