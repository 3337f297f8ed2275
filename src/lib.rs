// src/lib.rs

pub mod config;
pub mod error;
pub mod keys;
pub mod pages;
pub mod verifier;
pub mod web;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// The public prelude for the `fireside` crate.
///
/// Re-exports the most commonly used types for convenience.
pub mod prelude {
    pub use crate::config::{Config, ConfigError, FirebaseConfig};
    pub use crate::error::{AuthError, KeyFetchError};
    pub use crate::keys::KeyCache;
    pub use crate::verifier::{AuthenticatedUser, TokenVerifier};
}

/// Initializes the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` when set and defaults to `info`.
/// Production logs are JSON; `json = false` keeps the human-readable format
/// for local development.
pub fn setup_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
