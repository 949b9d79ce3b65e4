use crate::annotations::bounding_box::BoundingBoxGeometry;
use crate::annotations::detection::Detection;
use crate::annotations::plate_group::{CharacterBox, PlateGroup};
use crate::error::PlateEvalError;

/// Groups each character detection into the plates that contain it.
///
/// Plate detections (those with `plate_class_index`) open a new, empty group in the order they
/// are encountered. Every other detection is a character candidate and is appended to each
/// group whose plate box contains it; a character inside two overlapping plates lands in both,
/// and a character outside every plate is dropped. Characters are finally sorted left to right.
///
/// Boxes are truncated to integer pixel coordinates before any comparison. A zero-area plate or
/// character box is a contract violation by the detector and fails the whole image.
pub fn group_plates(
    detections: &[Detection],
    plate_class_index: usize,
) -> Result<Vec<PlateGroup>, PlateEvalError> {
    let mut groups: Vec<PlateGroup> = Vec::new();
    let mut characters: Vec<CharacterBox> = Vec::new();
    for detection in detections {
        let bounding_box = detection.pixel_box()?;
        if detection.class_index == plate_class_index {
            groups.push(PlateGroup::new(bounding_box));
        } else {
            characters.push(CharacterBox {
                bounding_box,
                class_index: detection.class_index,
            });
        }
    }

    for character in &characters {
        for group in groups.iter_mut() {
            if group.plate.contains(&character.bounding_box)? {
                group.characters.push(*character);
            }
        }
    }

    for group in groups.iter_mut() {
        group.characters.sort_by_key(|c| c.bounding_box.left());
    }
    Ok(groups)
}
