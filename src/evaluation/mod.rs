pub mod edit_distance;
pub mod matcher;
pub mod report;
pub mod scorer;
