pub mod duckdb;

pub use arbflow_metadata::CredentialStore;
pub use duckdb::DuckDbCredentialStore;
