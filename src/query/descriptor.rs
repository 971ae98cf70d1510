//! Filter and sort descriptors sent by the data grid.
//!
//! The grid encodes its state as JSON in the `filter` and `sorting` query
//! parameters. Parsing is best effort: anything malformed is dropped and logged
//! at debug level, never reported back as an error.

use serde_json::{Map, Value as JsonValue};
use std::fmt;
use tracing::debug;

/// Comparison requested by a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Equals,
    DoesNotEqual,
    Contains,
}

impl FilterOperator {
    /// Returns the operator name as the grid spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::DoesNotEqual => "doesNotEqual",
            Self::Contains => "contains",
        }
    }

    /// Parses an operator name. Matching is exact, like the grid's own names.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "equals" => Some(Self::Equals),
            "doesNotEqual" => Some(Self::DoesNotEqual),
            "contains" => Some(Self::Contains),
            _ => None,
        }
    }

    /// SQL comparison operator.
    pub fn sql_operator(&self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::DoesNotEqual => "!=",
            Self::Contains => "LIKE",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One column filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDescriptor {
    pub field: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl FilterDescriptor {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Builds a descriptor from one grid filter item.
    ///
    /// Returns `None` when the field, operator, or value is missing or empty.
    /// Numbers and booleans are taken in their textual form.
    pub fn from_json(item: &Map<String, JsonValue>) -> Option<Self> {
        let field = item.get("field").and_then(|v| v.as_str()).unwrap_or("");
        let operator = item.get("operator").and_then(|v| v.as_str()).unwrap_or("");

        let value = match item.get("value") {
            Some(JsonValue::String(s)) => s.clone(),
            Some(JsonValue::Number(n)) => n.to_string(),
            Some(JsonValue::Bool(b)) => b.to_string(),
            _ => String::new(),
        };

        if field.is_empty() || operator.is_empty() || value.is_empty() {
            return None;
        }

        let Some(operator) = FilterOperator::parse(operator) else {
            debug!("Ignoring filter on '{}' with unknown operator '{}'", field, operator);
            return None;
        };

        Some(Self::new(field, operator, value))
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Returns the SQL keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Parses a direction case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            _ => None,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortDescriptor {
    pub field: String,
    pub direction: SortDirection,
}

impl SortDescriptor {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Builds a descriptor from one grid sort item (`{"field": .., "sort": ..}`).
    pub fn from_json(item: &Map<String, JsonValue>) -> Option<Self> {
        let field = item.get("field").and_then(|v| v.as_str()).unwrap_or("");
        if field.is_empty() {
            return None;
        }
        let direction = item
            .get("sort")
            .and_then(|v| v.as_str())
            .and_then(SortDirection::parse)?;
        Some(Self::new(field, direction))
    }
}

/// Parses the `filter` query parameter.
///
/// Accepts a JSON list of filter items or the grid's `{"items": [...]}` model.
/// Returns an empty list for empty, malformed, or non-list input.
pub fn parse_filters(raw: &str) -> Vec<FilterDescriptor> {
    let items = match parse_json(raw, "filter") {
        Some(JsonValue::Array(items)) => items,
        Some(JsonValue::Object(mut model)) => match model.remove("items") {
            Some(JsonValue::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    items
        .iter()
        .filter_map(|item| item.as_object())
        .filter_map(FilterDescriptor::from_json)
        .collect()
}

/// Parses the `sorting` query parameter.
///
/// Returns an empty list for empty, malformed, or non-list input.
pub fn parse_sorting(raw: &str) -> Vec<SortDescriptor> {
    let Some(JsonValue::Array(items)) = parse_json(raw, "sorting") else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| item.as_object())
        .filter_map(SortDescriptor::from_json)
        .collect()
}

fn parse_json(raw: &str, param: &str) -> Option<JsonValue> {
    if raw.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<JsonValue>(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Ignoring malformed {} parameter: {}", param, e);
            None
        }
    }
}
