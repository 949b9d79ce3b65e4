pub mod plate_grouper;
pub mod string_reconstructor;
