//! WHERE and ORDER BY composition.
//!
//! Composed clauses keep their descriptors and only become SQL when rendered
//! for a dialect. [`WhereClause::render`] emits placeholders and pushes the
//! filter values onto a parameter list; values never end up in the SQL text.
//! [`WhereClause::render_inline`] produces the literal form used in logs.

use super::descriptor::{FilterDescriptor, FilterOperator, SortDescriptor};
use crate::config::QueryConfig;
use crate::db::dialect::{is_safe_identifier, quote_literal};
use crate::db::Dialect;
use tracing::debug;

/// Decides which column names clients may filter and sort on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnPolicy {
    allowed: Vec<String>,
}

impl ColumnPolicy {
    /// Any safe identifier is accepted.
    pub fn any() -> Self {
        Self::default()
    }

    /// Only the listed columns are accepted.
    pub fn allow_list<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &QueryConfig) -> Self {
        Self::allow_list(config.columns.iter().cloned())
    }

    /// Returns true if `field` may appear in a composed clause.
    pub fn permits(&self, field: &str) -> bool {
        is_safe_identifier(field)
            && (self.allowed.is_empty() || self.allowed.iter().any(|c| c == field))
    }
}

/// A conjunction of column filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhereClause {
    conditions: Vec<FilterDescriptor>,
}

impl WhereClause {
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[FilterDescriptor] {
        &self.conditions
    }

    /// Renders the clause with placeholders, appending values to `params`.
    ///
    /// Placeholders are numbered from the current length of `params`, so one
    /// parameter list can be shared by several rendered fragments.
    pub fn render(&self, dialect: Dialect, params: &mut Vec<String>) -> String {
        if self.is_empty() {
            return String::new();
        }

        let fragments: Vec<String> = self
            .conditions
            .iter()
            .map(|condition| {
                let placeholder = dialect.placeholder(params.len());
                params.push(bound_value(condition));
                format!(
                    "{} {} {}",
                    dialect.text_operand(&condition.field),
                    condition.operator.sql_operator(),
                    placeholder
                )
            })
            .collect();

        format!("WHERE {}", fragments.join(" AND "))
    }

    /// Renders the clause with values inlined as quoted literals.
    ///
    /// For logging only. Executed statements always use [`WhereClause::render`].
    pub fn render_inline(&self, dialect: Dialect) -> String {
        if self.is_empty() {
            return String::new();
        }

        let fragments: Vec<String> = self
            .conditions
            .iter()
            .map(|condition| {
                format!(
                    "{} {} {}",
                    dialect.quote_identifier(&condition.field),
                    condition.operator.sql_operator(),
                    quote_literal(&bound_value(condition))
                )
            })
            .collect();

        format!("WHERE {}", fragments.join(" AND "))
    }
}

fn bound_value(condition: &FilterDescriptor) -> String {
    match condition.operator {
        FilterOperator::Contains => format!("%{}%", condition.value),
        FilterOperator::Equals | FilterOperator::DoesNotEqual => condition.value.clone(),
    }
}

/// An ordered list of sort keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderByClause {
    keys: Vec<SortDescriptor>,
}

impl OrderByClause {
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[SortDescriptor] {
        &self.keys
    }

    pub fn render(&self, dialect: Dialect) -> String {
        if self.is_empty() {
            return String::new();
        }

        let keys: Vec<String> = self
            .keys
            .iter()
            .map(|key| format!("{} {}", dialect.quote_identifier(&key.field), key.direction))
            .collect();

        format!("ORDER BY {}", keys.join(", "))
    }
}

/// Builds a WHERE clause from filter descriptors, dropping any whose field the
/// policy does not permit.
pub fn compose_where(filters: &[FilterDescriptor], policy: &ColumnPolicy) -> WhereClause {
    let conditions = filters
        .iter()
        .filter(|filter| {
            let permitted = policy.permits(&filter.field);
            if !permitted {
                debug!("Dropping filter on disallowed column '{}'", filter.field);
            }
            permitted
        })
        .cloned()
        .collect();

    WhereClause { conditions }
}

/// Builds an ORDER BY clause from sort descriptors, dropping any whose field
/// the policy does not permit.
pub fn compose_order_by(sorts: &[SortDescriptor], policy: &ColumnPolicy) -> OrderByClause {
    let keys = sorts
        .iter()
        .filter(|sort| {
            let permitted = policy.permits(&sort.field);
            if !permitted {
                debug!("Dropping sort on disallowed column '{}'", sort.field);
            }
            permitted
        })
        .cloned()
        .collect();

    OrderByClause { keys }
}
