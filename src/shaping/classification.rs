//! Grouping of classification rows into category buckets.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value as JsonValue;

use super::rows::value_to_json;
use crate::db::QueryResult;
use crate::error::{InventoryError, Result};

/// One resource type within a category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeCount {
    pub resource_type: JsonValue,
    pub total_count: i64,
}

/// A category with its summed count and its types in scan order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub resource_category: JsonValue,
    pub total_count: i64,
    pub types: Vec<TypeCount>,
}

/// Groups `(resource_category, resource_type, total_count)` rows by category.
///
/// Categories appear in the order first seen. Types are appended as scanned,
/// without merging repeats. A count that is not an integer fails the whole
/// aggregation.
pub fn aggregate_classification(result: &QueryResult) -> Result<Vec<CategorySummary>> {
    let mut summaries: Vec<CategorySummary> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (row_number, row) in result.rows.iter().enumerate() {
        let [category, resource_type, count, ..] = row.as_slice() else {
            return Err(InventoryError::query(format!(
                "Classification row {row_number} has {} columns, expected 3",
                row.len()
            )));
        };

        let count = count.as_i64().ok_or_else(|| {
            InventoryError::query(format!(
                "Classification row {row_number} has non-integer count '{count}'"
            ))
        })?;

        let category = value_to_json(category);
        let key = category.to_string();
        let position = *index.entry(key).or_insert_with(|| {
            summaries.push(CategorySummary {
                resource_category: category,
                total_count: 0,
                types: Vec::new(),
            });
            summaries.len() - 1
        });

        let summary = &mut summaries[position];
        summary.types.push(TypeCount {
            resource_type: value_to_json(resource_type),
            total_count: count,
        });
        summary.total_count = summary.total_count.saturating_add(count);
    }

    Ok(summaries)
}
