use crate::annotations::detection::Detection;
use crate::error::PlateEvalError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Parses saved detector output: one `x1 y1 x2 y2 confidence class` row per line.
pub fn parse_detection_text(text: &str, record: &str) -> Result<Vec<Detection>, PlateEvalError> {
    let mut detections = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row_record = format!("{}:{}", record, index + 1);
        let values = line
            .split_whitespace()
            .map(|v| {
                v.parse::<f32>().map_err(|_| {
                    PlateEvalError::malformed(&row_record, format!("'{}' is not a number", v))
                })
            })
            .collect::<Result<Vec<f32>, _>>()?;
        let row: [f32; 6] = values.try_into().map_err(|v: Vec<f32>| {
            PlateEvalError::malformed(
                &row_record,
                format!("expected 6 values per detection, found {}", v.len()),
            )
        })?;
        let detection = Detection::from_row(row)
            .map_err(|e| PlateEvalError::malformed(&row_record, e.to_string()))?;
        detections.push(detection);
    }
    Ok(detections)
}

pub fn read_detection_file(filepath: &Path) -> Result<Vec<Detection>, PlateEvalError> {
    let text = fs::read_to_string(filepath).map_err(|e| {
        PlateEvalError::io(format!("reading detections {}", filepath.display()), e)
    })?;
    parse_detection_text(&text, &filepath.display().to_string())
}

/// Indexes files with one of `extensions` directly inside `dir` by file stem.
pub fn index_files_by_stem(
    dir: &Path,
    extensions: &[&str],
) -> Result<BTreeMap<String, PathBuf>, PlateEvalError> {
    let mut index = BTreeMap::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let message = e.to_string();
            PlateEvalError::io(
                format!("listing {}", dir.display()),
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other(message)),
            )
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let matches_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)));
        if !matches_extension {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            index.insert(stem.to_string(), path.to_path_buf());
        }
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows() {
        let text = "40.859 162.66 142.42 216.09 0.9668 34\n\n125.08 178.28 138.83 208.91 0.93213 6\n";
        let dets = parse_detection_text(text, "img.txt").unwrap();
        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].class_index, 34);
        assert_eq!(dets[1].class_index, 6);
    }

    #[test]
    fn short_row_is_malformed() {
        let err = parse_detection_text("1 2 3 4 0.5", "img.txt").unwrap_err();
        match err {
            PlateEvalError::MalformedInput { record, .. } => assert_eq!(record, "img.txt:1"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn indexes_directory_by_stem() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "").unwrap();
        fs::write(dir.path().join("a.TXT"), "").unwrap();
        fs::write(dir.path().join("c.jpg"), "").unwrap();
        fs::create_dir(dir.path().join("nested.txt")).unwrap();
        let index = index_files_by_stem(dir.path(), &["txt"]).unwrap();
        assert_eq!(index.keys().cloned().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
