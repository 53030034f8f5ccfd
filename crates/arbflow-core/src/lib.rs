pub mod aggregate;
pub mod config;
pub mod credential;
pub mod crypto;
pub mod dashboard;
pub mod error;
pub mod forecast;
pub mod metrics;
pub mod recommend;
