// src/config.rs

use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {0}")]
    MissingVars(String),

    #[error("invalid PORT value {value:?}: {source}")]
    InvalidPort {
        value: String,
        source: std::num::ParseIntError,
    },
}

/// Firebase project settings consumed by the verifier and the HTML pages.
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    /// The Firebase project ID. Doubles as the expected token audience.
    pub project_id: String,
    /// Web API key, only ever embedded into the served pages.
    pub api_key: String,
    /// Auth domain for the client-side SDK, e.g. "my-project.firebaseapp.com".
    pub auth_domain: String,
    /// Auth emulator host, e.g. "firebase-emulator:9099". `None` in
    /// production; when set, token signatures are not verified.
    pub emulator_host: Option<String>,
}

/// Process configuration, read once at startup and immutable afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub firebase: FirebaseConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup, so tests
    /// never have to mutate the process environment.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let mut required = |name: &'static str| match lookup(name) {
            Some(value) if !value.is_empty() => value,
            _ => {
                missing.push(name);
                String::new()
            }
        };

        let port = required("PORT");
        let project_id = required("FIREBASE_PROJECT_ID");
        let api_key = required("FIREBASE_API_KEY");
        let auth_domain = required("FIREBASE_AUTH_DOMAIN");

        if !missing.is_empty() {
            return Err(ConfigError::MissingVars(missing.join(", ")));
        }

        let port = port.parse().map_err(|source| ConfigError::InvalidPort {
            value: port.clone(),
            source,
        })?;

        // An empty value means the emulator is not configured.
        let emulator_host = lookup("FIREBASE_AUTH_EMULATOR_HOST").filter(|host| !host.is_empty());

        Ok(Self {
            port,
            firebase: FirebaseConfig {
                project_id,
                api_key,
                auth_domain,
                emulator_host,
            },
        })
    }
}
