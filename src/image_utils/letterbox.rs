use crate::annotations::detection::Detection;
use image::RgbImage;
use image::imageops::{self, FilterType};

/// Records how an image was letterboxed so detections can be mapped back onto it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LetterboxMeta {
    pub resized_width: u32,
    pub resized_height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
    pub original_width: u32,
    pub original_height: u32,
}

impl LetterboxMeta {
    pub fn identity(width: u32, height: u32) -> Self {
        LetterboxMeta {
            resized_width: width,
            resized_height: height,
            offset_x: 0,
            offset_y: 0,
            original_width: width,
            original_height: height,
        }
    }

    /// Maps a detection from letterboxed input coordinates to original image coordinates.
    pub fn restore(&self, detection: Detection) -> Detection {
        let scale_x = self.original_width as f32 / self.resized_width as f32;
        let scale_y = self.original_height as f32 / self.resized_height as f32;
        let (dx, dy) = (self.offset_x as f32, self.offset_y as f32);
        Detection {
            left: (detection.left - dx) * scale_x,
            top: (detection.top - dy) * scale_y,
            right: (detection.right - dx) * scale_x,
            bottom: (detection.bottom - dy) * scale_y,
            ..detection
        }
    }
}

/// Resizes an image to fit a `size` x `size` square, keeping its aspect ratio.
///
/// The resized image is centered on a black canvas. Images that are already square at `size`
/// are returned unchanged with an identity meta.
pub fn letterbox(image: &RgbImage, size: u32) -> (RgbImage, LetterboxMeta) {
    let (width, height) = image.dimensions();
    if width == size && height == size {
        return (image.clone(), LetterboxMeta::identity(width, height));
    }
    let ratio = (size as f64 / width as f64).min(size as f64 / height as f64);
    let resized_width = ((width as f64 * ratio) as u32).max(1);
    let resized_height = ((height as f64 * ratio) as u32).max(1);
    let resized = imageops::resize(image, resized_width, resized_height, FilterType::Triangle);

    let offset_x = (size - resized_width) / 2;
    let offset_y = (size - resized_height) / 2;
    let mut canvas = RgbImage::new(size, size);
    imageops::replace(&mut canvas, &resized, offset_x as i64, offset_y as i64);
    let meta = LetterboxMeta {
        resized_width,
        resized_height,
        offset_x,
        offset_y,
        original_width: width,
        original_height: height,
    };
    (canvas, meta)
}
