use crate::error::PlateEvalError;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// The label the class table uses for whole-plate detections.
pub const PLATE_LABEL: &str = "plate";

/// Class index of the plate region in the default table.
pub const DEFAULT_PLATE_CLASS_INDEX: usize = 34;

/// Maps the class ids which come directly from the detector to printable labels.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClassTable {
    labels: Vec<String>,
}

impl ClassTable {
    pub fn new(labels: Vec<String>) -> Self {
        ClassTable { labels }
    }

    /// Digits, then the Latin alphabet without `I` and `O`, then the plate region at index 34.
    pub fn default_plate_table() -> Self {
        let labels = ('0'..='9')
            .chain(('A'..='Z').filter(|c| *c != 'I' && *c != 'O'))
            .map(String::from)
            .chain(std::iter::once(PLATE_LABEL.to_string()))
            .collect();
        ClassTable { labels }
    }

    /// Reads a file with one class name per line; the line number is the class index.
    ///
    /// Trailing blank lines are ignored, blank lines in the middle are kept as empty labels so
    /// the indices of later classes do not shift.
    pub fn from_txt_file(filepath: &Path) -> Result<Self, PlateEvalError> {
        let context = format!("reading class table {}", filepath.display());
        let file = File::open(filepath).map_err(|e| PlateEvalError::io(context.clone(), e))?;
        let mut labels: Vec<String> = BufReader::new(file)
            .lines()
            .map(|line| line.map(|l| l.trim().to_string()))
            .collect::<Result<_, _>>()
            .map_err(|e| PlateEvalError::io(context, e))?;
        while labels.last().is_some_and(|l| l.is_empty()) {
            labels.pop();
        }
        Ok(ClassTable { labels })
    }

    pub fn label(&self, class_index: usize) -> Result<&str, PlateEvalError> {
        self.labels
            .get(class_index)
            .map(String::as_str)
            .ok_or(PlateEvalError::ClassIndexOutOfRange {
                index: class_index,
                len: self.labels.len(),
            })
    }

    pub fn plate_index(&self) -> Option<usize> {
        self.labels.iter().position(|l| l == PLATE_LABEL)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for ClassTable {
    fn default() -> Self {
        Self::default_plate_table()
    }
}
