//! Integration test suites.

pub mod common;
pub mod databricks_test;
pub mod postgres_test;
pub mod sqlite_test;
