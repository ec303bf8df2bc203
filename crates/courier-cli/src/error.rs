//! CLI error handling.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use courier_common_config::{ConfigError, EnvError};
use courier_common_log::LogError;
use courier_http::HttpError;
use thiserror::Error;

/// Application exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Exit {
    Success = 0,
    /// The request completed with a non-2xx response.
    Failed = 1,
    ConfigError = 2,
    IoError = 3,
    TransportError = 4,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}

/// CLI error type
#[derive(Debug, Error)]
pub enum CliError {
    /// Bad configuration or a request that could not be built.
    #[error("{message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        hint: Option<String>,
    },

    /// The response arrived but was not a success.
    #[error("request failed with status {status}")]
    Status { status: u16 },

    /// The request failed after it was dispatched.
    #[error("{0}")]
    Transport(#[source] Arc<HttpError>),

    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: io::Error,
    },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit(&self) -> Exit {
        match self {
            Self::Config { .. } => Exit::ConfigError,
            Self::Status { .. } => Exit::Failed,
            Self::Transport(_) => Exit::TransportError,
            Self::Io { .. } => Exit::IoError,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        self.exit().into()
    }

    /// Get hint for this error if available
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Config { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
            hint: None,
        }
    }

    /// Create an IO error
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config {
            message: format!("Configuration error: {err}"),
            source: Some(Box::new(err)),
            hint: Some("Check .courier/config.yaml and COURIER_* environment variables".to_string()),
        }
    }
}

impl From<EnvError> for CliError {
    fn from(err: EnvError) -> Self {
        Self::Config {
            message: err.to_string(),
            source: Some(Box::new(err)),
            hint: Some("Check the .env files in the working directory".to_string()),
        }
    }
}

impl From<LogError> for CliError {
    fn from(err: LogError) -> Self {
        Self::Config {
            message: err.to_string(),
            source: Some(Box::new(err)),
            hint: Some("Check COURIER_LOG_FILE".to_string()),
        }
    }
}

/// Errors returned before dispatch are configuration problems; anything
/// later is a transport failure.
impl From<HttpError> for CliError {
    fn from(err: HttpError) -> Self {
        if err.is_config() {
            Self::Config {
                message: err.to_string(),
                source: Some(Box::new(err)),
                hint: None,
            }
        } else {
            Self::Transport(Arc::new(err))
        }
    }
}

impl From<Arc<HttpError>> for CliError {
    fn from(err: Arc<HttpError>) -> Self {
        if err.is_config() {
            Self::config(err.to_string())
        } else {
            Self::Transport(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_http::TransportError;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Status { status: 404 }.exit(), Exit::Failed);
        assert_eq!(CliError::config("bad").exit(), Exit::ConfigError);
        assert_eq!(CliError::from(HttpError::Aborted).exit(), Exit::TransportError);
        assert_eq!(
            CliError::io("read", io::Error::new(io::ErrorKind::NotFound, "gone")).exit(),
            Exit::IoError
        );
    }

    #[test]
    fn test_invalid_url_is_config_error() {
        let err = courier_http::Client::new().unwrap().get("not a url").unwrap_err();
        assert_eq!(CliError::from(err).exit(), Exit::ConfigError);
    }

    #[test]
    fn test_transport_error_keeps_message() {
        let err = CliError::from(Arc::new(HttpError::from(TransportError::ConnectionClosed)));
        assert_eq!(err.exit(), Exit::TransportError);
        assert!(err.to_string().starts_with("transport failed"));
    }

    #[test]
    fn test_config_error_has_hint() {
        let err = CliError::from(ConfigError::ValidationError {
            message: "bad".to_string(),
        });
        assert!(err.hint().unwrap().contains(".courier/config.yaml"));
    }
}
