pub mod cache;
pub mod dashboard;
pub mod dataset;
pub mod weekday;
