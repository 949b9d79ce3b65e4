use crate::annotations::plate_group::CharacterBox;
use crate::error::PlateEvalError;
use crate::labels::class_table::ClassTable;

/// Labels of `characters`, in the order given.
pub fn character_labels<'a>(
    characters: &[CharacterBox],
    class_table: &'a ClassTable,
) -> Result<Vec<&'a str>, PlateEvalError> {
    characters
        .iter()
        .map(|c| class_table.label(c.class_index))
        .collect()
}

/// Creates the plate string from individually detected characters.
///
/// The characters must already be in reading order; grouping sorts them.
pub fn reconstruct(
    characters: &[CharacterBox],
    class_table: &ClassTable,
) -> Result<String, PlateEvalError> {
    Ok(character_labels(characters, class_table)?.concat())
}
