//! Configuration types.

use std::collections::BTreeMap;
use std::time::Duration;

use courier_http::{ClientConfig, Decoding, Headers, TransportConfig};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::loader::ConfigError;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourierConfig {
    /// Client defaults.
    pub client: ClientSettings,
    /// Transport tuning.
    pub transport: TransportSettings,
}

/// Client-wide request defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Relative request URLs are resolved against this.
    pub base_url: Option<String>,
    /// Headers sent with every request.
    pub headers: BTreeMap<String, String>,
    /// Overrides the `courier/<version>` user agent.
    pub user_agent: Option<String>,
    /// Follow redirect responses.
    pub follow_redirects: bool,
    /// Redirect limit; absent means unbounded.
    pub max_redirects: Option<u32>,
    /// Default response decoding.
    pub decoding: Decoding,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            headers: BTreeMap::new(),
            user_agent: None,
            follow_redirects: true,
            max_redirects: None,
            decoding: Decoding::default(),
        }
    }
}

/// Transport configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    /// Connection timeout (seconds).
    pub connect_timeout_secs: u64,
    /// Whole-request timeout (seconds); absent waits indefinitely.
    pub request_timeout_secs: Option<u64>,
    /// Idle connections kept per host.
    pub pool_max_idle_per_host: usize,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: Some(30),
            pool_max_idle_per_host: 10,
        }
    }
}

impl From<&TransportSettings> for TransportConfig {
    fn from(settings: &TransportSettings) -> Self {
        Self {
            connect_timeout: Duration::from_secs(settings.connect_timeout_secs),
            request_timeout: settings.request_timeout_secs.map(Duration::from_secs),
            pool_max_idle_per_host: settings.pool_max_idle_per_host,
        }
    }
}

impl CourierConfig {
    /// Engine configuration for these settings.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        let mut config = ClientConfig {
            transport: TransportConfig::from(&self.transport),
            follow_redirects: self.client.follow_redirects,
            max_redirects: self.client.max_redirects,
            decoding: self.client.decoding,
            headers: self.client.headers.iter().collect::<Headers>(),
            ..ClientConfig::default()
        };

        if let Some(base_url) = &self.client.base_url {
            let url = Url::parse(base_url).map_err(|e| ConfigError::ValidationError {
                message: format!("client.base_url {base_url:?} is not a valid URL: {e}"),
            })?;
            config.base_url = Some(url);
        }
        if let Some(user_agent) = &self.client.user_agent {
            config.user_agent = user_agent.clone();
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CourierConfig::default();
        assert!(config.client.follow_redirects);
        assert_eq!(config.client.max_redirects, None);
        assert_eq!(config.client.decoding, Decoding::Utf8);
        assert_eq!(config.transport.connect_timeout_secs, 10);
        assert_eq!(config.transport.request_timeout_secs, Some(30));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: CourierConfig = serde_yaml::from_str("client:\n  max_redirects: 4\n").unwrap();
        assert_eq!(config.client.max_redirects, Some(4));
        assert!(config.client.follow_redirects);
        assert_eq!(config.transport, TransportSettings::default());
    }

    #[test]
    fn test_client_config_conversion() {
        let mut config = CourierConfig::default();
        config.client.base_url = Some("http://localhost:9000/api/".to_string());
        config.client.user_agent = Some("tester/1.0".to_string());
        config.client.headers.insert("X-Api-Key".to_string(), "secret".to_string());
        config.client.decoding = Decoding::Base64;
        config.transport.request_timeout_secs = None;

        let client = config.client_config().unwrap();
        assert_eq!(client.base_url.unwrap().as_str(), "http://localhost:9000/api/");
        assert_eq!(client.user_agent, "tester/1.0");
        assert_eq!(client.headers.get("x-api-key"), Some("secret"));
        assert_eq!(client.decoding, Decoding::Base64);
        assert_eq!(client.transport.request_timeout, None);
        assert_eq!(client.transport.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = CourierConfig::default();
        config.client.base_url = Some("not a url".to_string());
        assert!(matches!(config.client_config(), Err(ConfigError::ValidationError { .. })));
    }
}
