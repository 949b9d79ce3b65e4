pub mod class_table;
pub mod detection_file;
pub mod label_file;
