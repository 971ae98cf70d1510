//! Shaping of warehouse results into response JSON.

pub mod classification;
pub mod rows;

pub use classification::{aggregate_classification, CategorySummary, TypeCount};
pub use rows::{rows_to_json, value_to_json};
