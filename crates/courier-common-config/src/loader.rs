//! Configuration file loading and parsing.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::env::{vars, Environment};
use crate::types::CourierConfig;

/// Directory holding the config file, relative to the project directory.
pub const CONFIG_DIR: &str = ".courier";
/// Config file name.
pub const CONFIG_FILE: &str = "config.yaml";

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },
}

fn env_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").expect("env pattern is valid")
    })
}

/// Configuration loader.
pub struct ConfigLoader {
    base_path: PathBuf,
}

impl ConfigLoader {
    /// Create a loader for the given project directory.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            base_path: project_dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the config file this loader reads.
    pub fn config_path(&self) -> PathBuf {
        self.base_path.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Load configuration from `.courier/config.yaml`, then apply
    /// environment overrides.
    ///
    /// A missing file yields defaults.
    pub fn load(&self) -> Result<CourierConfig, ConfigError> {
        let mut config = self.load_file()?;
        apply_env_overrides(&mut config)?;
        self.validate(&config)?;
        Ok(config)
    }

    /// Load `path` explicitly; unlike [`ConfigLoader::load`] the file must
    /// exist.
    pub fn load_from(&self, path: impl AsRef<Path>) -> Result<CourierConfig, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let mut config = self.parse(&std::fs::read_to_string(path)?)?;
        apply_env_overrides(&mut config)?;
        self.validate(&config)?;
        Ok(config)
    }

    fn load_file(&self) -> Result<CourierConfig, ConfigError> {
        let config_path = self.config_path();
        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(CourierConfig::default());
        }
        self.parse(&std::fs::read_to_string(&config_path)?)
    }

    fn parse(&self, contents: &str) -> Result<CourierConfig, ConfigError> {
        let expanded = self.expand_env_vars(contents)?;
        serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
            line: e.location().map(|l| l.line()),
            message: e.to_string(),
        })
    }

    /// Expand environment variables in the form `${VAR}` or `${VAR:-default}`.
    fn expand_env_vars(&self, content: &str) -> Result<String, ConfigError> {
        let mut missing = None;
        let expanded = env_pattern().replace_all(content, |cap: &regex::Captures<'_>| {
            let var_name = &cap[1];
            match (std::env::var(var_name), cap.get(2)) {
                (Ok(value), _) => value,
                (Err(_), Some(default)) => default.as_str().to_string(),
                (Err(_), None) => {
                    missing.get_or_insert_with(|| var_name.to_string());
                    String::new()
                }
            }
        });

        match missing {
            Some(var) => Err(ConfigError::EnvVarNotFound { var }),
            None => Ok(expanded.into_owned()),
        }
    }

    /// Validate configuration values.
    fn validate(&self, config: &CourierConfig) -> Result<(), ConfigError> {
        if config.transport.connect_timeout_secs == 0 {
            return Err(ConfigError::ValidationError {
                message: "transport.connect_timeout_secs must be greater than 0".to_string(),
            });
        }

        if config.transport.request_timeout_secs == Some(0) {
            return Err(ConfigError::ValidationError {
                message: "transport.request_timeout_secs must be greater than 0".to_string(),
            });
        }

        // Surfaces base URL and header problems at load time.
        config.client_config()?;
        Ok(())
    }

    /// Save configuration to file.
    pub fn save(&self, config: &CourierConfig) -> Result<(), ConfigError> {
        let config_dir = self.base_path.join(CONFIG_DIR);
        std::fs::create_dir_all(&config_dir)?;

        let yaml = serde_yaml::to_string(config).map_err(|e| ConfigError::ParseError {
            line: None,
            message: e.to_string(),
        })?;

        std::fs::write(config_dir.join(CONFIG_FILE), yaml)?;
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_default())
    }
}

/// Apply `COURIER_BASE_URL`, `COURIER_MAX_REDIRECTS` and
/// `COURIER_USER_AGENT` on top of file settings.
pub fn apply_env_overrides(config: &mut CourierConfig) -> Result<(), ConfigError> {
    if let Some(base_url) = Environment::get(vars::COURIER_BASE_URL) {
        config.client.base_url = Some(base_url);
    }
    if let Some(max) = Environment::get_int::<u32>(vars::COURIER_MAX_REDIRECTS).map_err(|e| {
        ConfigError::ValidationError {
            message: e.to_string(),
        }
    })? {
        config.client.max_redirects = Some(max);
    }
    if let Some(user_agent) = Environment::get(vars::COURIER_USER_AGENT) {
        config.client.user_agent = Some(user_agent);
    }
    Ok(())
}
