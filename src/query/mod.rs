//! Query shaping and execution for the inventory endpoints.
//!
//! Turns grid request parameters into SQL clauses and runs the resulting
//! statements against the warehouse.

pub mod compose;
pub mod descriptor;
pub mod executor;
pub mod page;

pub use compose::{compose_order_by, compose_where, ColumnPolicy, OrderByClause, WhereClause};
pub use descriptor::{
    parse_filters, parse_sorting, FilterDescriptor, FilterOperator, SortDescriptor, SortDirection,
};
pub use executor::{DataPage, DataQuery, QueryExecutor};
pub use page::PageRequest;
