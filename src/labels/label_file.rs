use crate::annotations::bounding_box::BoundingBox;
use crate::error::PlateEvalError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::warn;

/// One annotated plate: where it is and what it says.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct GroundTruthPlate {
    pub bounding_box: BoundingBox,
    pub plate: String,
}

/// All annotated plates of a dataset, keyed by image id.
#[derive(Clone, Debug, Default)]
pub struct GroundTruth {
    records: BTreeMap<String, Vec<GroundTruthPlate>>,
}

impl GroundTruth {
    /// Inserts the plates of one image, returning the plates it replaced if the id was seen.
    pub fn insert(
        &mut self,
        image_id: String,
        plates: Vec<GroundTruthPlate>,
    ) -> Option<Vec<GroundTruthPlate>> {
        self.records.insert(image_id, plates)
    }

    pub fn get(&self, image_id: &str) -> Option<&[GroundTruthPlate]> {
        self.records.get(image_id).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[GroundTruthPlate])> {
        self.records
            .iter()
            .map(|(id, plates)| (id.as_str(), plates.as_slice()))
    }

    pub fn image_count(&self) -> usize {
        self.records.len()
    }

    pub fn plate_count(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    /// Number of characters over every annotated plate.
    pub fn character_count(&self) -> usize {
        self.records
            .values()
            .flatten()
            .map(|p| p.plate.chars().count())
            .sum()
    }
}

/// A label line that could not be parsed, kept so the run can report it.
#[derive(Debug)]
pub struct MalformedLabel {
    /// `<source>:<line>`
    pub record: String,
    pub line_number: usize,
    pub error: PlateEvalError,
}

#[derive(Debug, Default)]
pub struct ParsedLabels {
    pub ground_truth: GroundTruth,
    pub malformed: Vec<MalformedLabel>,
}

impl ParsedLabels {
    /// In strict mode the first malformed line fails the whole file.
    pub fn enforce(mut self, strict: bool) -> Result<Self, PlateEvalError> {
        if strict && !self.malformed.is_empty() {
            return Err(self.malformed.swap_remove(0).error);
        }
        Ok(self)
    }
}

/// Parses one `x_min,y_min,x_max,y_max,plate` field.
pub fn parse_plate_field(field: &str, record: &str) -> Result<GroundTruthPlate, PlateEvalError> {
    let parts: Vec<&str> = field.split(',').collect();
    if parts.len() != 5 {
        return Err(PlateEvalError::malformed(
            record,
            format!(
                "expected 5 comma separated fields in '{}', found {}",
                field,
                parts.len()
            ),
        ));
    }
    let mut coords = [0_i32; 4];
    for (coord, part) in coords.iter_mut().zip(&parts[..4]) {
        *coord = part.parse().map_err(|_| {
            PlateEvalError::malformed(
                record,
                format!("coordinate '{}' in '{}' is not an integer", part, field),
            )
        })?;
    }
    let bounding_box = BoundingBox::new(coords[0], coords[1], coords[2], coords[3])
        .map_err(|e| PlateEvalError::malformed(record, e.to_string()))?;
    Ok(GroundTruthPlate {
        bounding_box,
        plate: parts[4].to_string(),
    })
}

/// Parses `<image_id> <box1> <box2> ...`. A line with only an id describes an image without
/// plates.
pub fn parse_label_line(
    line: &str,
    record: &str,
) -> Result<(String, Vec<GroundTruthPlate>), PlateEvalError> {
    let mut fields = line.split_whitespace();
    let image_id = fields
        .next()
        .ok_or_else(|| PlateEvalError::malformed(record, "missing image id"))?;
    let plates = fields
        .map(|field| parse_plate_field(field, record))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((image_id.to_string(), plates))
}

/// Parses a whole label file. Bad lines are collected rather than aborting the parse.
pub fn parse_label_text(text: &str, source_name: &str) -> ParsedLabels {
    let mut parsed = ParsedLabels::default();
    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        let record = format!("{}:{}", source_name, line_number);
        match parse_label_line(line, &record) {
            Ok((image_id, plates)) => {
                if parsed
                    .ground_truth
                    .insert(image_id.clone(), plates)
                    .is_some()
                {
                    warn!(%record, %image_id, "duplicate image id, keeping the later record");
                }
            }
            Err(error) => parsed.malformed.push(MalformedLabel {
                record,
                line_number,
                error,
            }),
        }
    }
    parsed
}

pub fn load_label_file(filepath: &Path) -> Result<ParsedLabels, PlateEvalError> {
    let text = fs::read_to_string(filepath).map_err(|e| {
        PlateEvalError::io(format!("reading label file {}", filepath.display()), e)
    })?;
    Ok(parse_label_text(&text, &filepath.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multi_plate_line() {
        let (id, plates) =
            parse_label_line("train_LE_33 14,71,83,105,FS799 215,188,324,240,DP4846", "t:1")
                .unwrap();
        assert_eq!(id, "train_LE_33");
        assert_eq!(plates.len(), 2);
        assert_eq!(plates[0].plate, "FS799");
        assert_eq!(plates[1].bounding_box, BoundingBox::new(215, 188, 324, 240).unwrap());
    }

    #[test]
    fn id_without_boxes_is_an_empty_image() {
        let (id, plates) = parse_label_line("empty_image", "t:1").unwrap();
        assert_eq!(id, "empty_image");
        assert!(plates.is_empty());
    }

    #[test]
    fn missing_field_is_malformed() {
        let err = parse_label_line("img 14,71,83,FS799", "labels.txt:7").unwrap_err();
        match err {
            PlateEvalError::MalformedInput { record, .. } => assert_eq!(record, "labels.txt:7"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn non_numeric_coordinate_is_malformed() {
        assert!(parse_label_line("img 14,7x,83,105,FS799", "t:1").is_err());
    }

    #[test]
    fn inverted_box_is_malformed() {
        assert!(parse_label_line("img 83,71,14,105,FS799", "t:1").is_err());
    }

    #[test]
    fn bad_lines_do_not_abort_the_file() {
        let text = "a 14,71,83,105,FS799\n\nb 1,2,3\nc 266,199,350,242,2972KK\n";
        let parsed = parse_label_text(text, "labels.txt");
        assert_eq!(parsed.ground_truth.image_count(), 2);
        assert_eq!(parsed.malformed.len(), 1);
        assert_eq!(parsed.malformed[0].line_number, 3);
        assert_eq!(parsed.malformed[0].record, "labels.txt:3");
        assert_eq!(parsed.ground_truth.plate_count(), 2);
        assert_eq!(parsed.ground_truth.character_count(), 11);
    }

    #[test]
    fn duplicate_ids_keep_the_later_record() {
        let parsed = parse_label_text("a 1,1,5,5,AB\na 2,2,6,6,CDE\n", "labels.txt");
        assert_eq!(parsed.ground_truth.get("a").unwrap()[0].plate, "CDE");
    }

    #[test]
    fn strict_mode_fails_on_the_first_bad_line() {
        let text = "a 14,71,83,105,FS799\nb 1,2,3\nc 1,2,3,x,AB\n";
        let err = parse_label_text(text, "labels.txt")
            .enforce(true)
            .unwrap_err();
        match err {
            PlateEvalError::MalformedInput { record, .. } => assert_eq!(record, "labels.txt:2"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn lenient_mode_keeps_bad_lines_for_the_report() {
        let text = "a 14,71,83,105,FS799\nb 1,2,3\n";
        let parsed = parse_label_text(text, "labels.txt").enforce(false).unwrap();
        assert_eq!(parsed.ground_truth.image_count(), 1);
        assert_eq!(parsed.malformed.len(), 1);
    }

    #[test]
    fn strict_mode_accepts_clean_files() {
        let parsed = parse_label_text("a 14,71,83,105,FS799\n", "labels.txt")
            .enforce(true)
            .unwrap();
        assert_eq!(parsed.ground_truth.plate_count(), 1);
    }
}
