//! Environment variable handling.

use std::env;
use thiserror::Error;

/// Environment variable errors.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("required environment variable not set: {var}")]
    NotSet { var: String },

    #[error("invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },

    #[error("failed to load .env file: {0}")]
    DotenvError(#[from] dotenvy::Error),
}

/// Environment variable names.
pub mod vars {
    // Client overrides
    pub const COURIER_BASE_URL: &str = "COURIER_BASE_URL";
    pub const COURIER_MAX_REDIRECTS: &str = "COURIER_MAX_REDIRECTS";
    pub const COURIER_USER_AGENT: &str = "COURIER_USER_AGENT";

    // Configuration
    pub const COURIER_CONFIG_PATH: &str = "COURIER_CONFIG_PATH";
    pub const COURIER_ENV: &str = "COURIER_ENV";

    // Logging
    pub const COURIER_LOG_LEVEL: &str = "COURIER_LOG_LEVEL";
    pub const RUST_LOG: &str = "RUST_LOG";
}

/// Access to process environment variables.
pub struct Environment {
    _guard: (),
}

impl Environment {
    /// Load `.env`, `.env.local` and `.env.<COURIER_ENV>` from the working
    /// directory. Missing files are skipped; variables already set win.
    pub fn init() -> Result<Self, EnvError> {
        for file in [".env".to_string(), ".env.local".to_string()] {
            load_optional(&file)?;
        }
        if let Ok(name) = env::var(vars::COURIER_ENV) {
            load_optional(&format!(".env.{name}"))?;
        }
        Ok(Self { _guard: () })
    }

    /// Get a required string variable.
    pub fn require(var: &str) -> Result<String, EnvError> {
        env::var(var).map_err(|_| EnvError::NotSet { var: var.to_string() })
    }

    /// Get an optional string variable.
    pub fn get(var: &str) -> Option<String> {
        env::var(var).ok().filter(|v| !v.is_empty())
    }

    /// Get a variable with a default value.
    pub fn get_or(var: &str, default: &str) -> String {
        Self::get(var).unwrap_or_else(|| default.to_string())
    }

    /// Get a boolean variable.
    pub fn get_bool(var: &str) -> Option<bool> {
        Self::get(var).map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
    }

    /// Get an integer variable.
    pub fn get_int<T: std::str::FromStr>(var: &str) -> Result<Option<T>, EnvError> {
        match Self::get(var) {
            Some(v) => v.parse().map(Some).map_err(|_| EnvError::InvalidValue {
                var: var.to_string(),
                message: format!("expected integer, got {v:?}"),
            }),
            None => Ok(None),
        }
    }
}

fn load_optional(file: &str) -> Result<(), EnvError> {
    match dotenvy::from_filename(file) {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}
