pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod metadata;
pub mod providers;
pub mod routes;
pub mod state;
