use crate::annotations::bounding_box::BoundingBox;
use crate::annotations::plate_group::PlateGroup;
use crate::labels::label_file::GroundTruthPlate;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

const GROUND_TRUTH_COLOR: Rgb<u8> = Rgb([0, 128, 255]);
const PLATE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const CHARACTER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// The part of `bbox` that can show up on a `width` x `height` canvas.
///
/// The outline is drawn on the left/top edge and one pixel inside the right/bottom edge. Edges
/// beyond the canvas are pulled in so that their outline lands one pixel outside it.
/// `None` when the box lies entirely off the canvas.
fn to_rect(bbox: &BoundingBox, width: u32, height: u32) -> Option<Rect> {
    let (width, height) = (width as i64, height as i64);
    let left = (bbox.left() as i64).max(-1);
    let top = (bbox.top() as i64).max(-1);
    let right = (bbox.right() as i64).min(width + 1);
    let bottom = (bbox.bottom() as i64).min(height + 1);
    if left >= width || top >= height || right < 0 || bottom < 0 {
        return None;
    }
    Some(
        Rect::at(left as i32, top as i32)
            .of_size((right - left).max(1) as u32, (bottom - top).max(1) as u32),
    )
}

fn draw_box(image: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
    let (width, height) = image.dimensions();
    if let Some(rect) = to_rect(bbox, width, height) {
        draw_hollow_rect_mut(image, rect, color);
    }
}

/// Draws ground truth plates, then predicted plates and their characters, onto `image`.
pub fn render_plate_groups(
    image: &mut RgbImage,
    ground_truth: &[GroundTruthPlate],
    groups: &[PlateGroup],
) {
    for gt in ground_truth {
        draw_box(image, &gt.bounding_box, GROUND_TRUTH_COLOR);
    }
    for group in groups {
        draw_box(image, &group.plate, PLATE_COLOR);
        for character in &group.characters {
            draw_box(image, &character.bounding_box, CHARACTER_COLOR);
        }
    }
}
