/// Re-export `Config` from `arbflow-core` for use within this crate.
///
/// All environment-variable parsing lives in `arbflow-core` so integration
/// tests can build a `Config` without touching the environment.
pub use arbflow_core::config::{Config, GoogleOAuthConfig};
