pub mod backend;
pub mod integration;
pub mod schema;
pub mod tenant;

pub use backend::DuckDbBackend;

/// Re-export the `duckdb` crate so tests can use
/// `arbflow_duckdb::duckdb::params!` without an extra dependency.
pub use duckdb;
