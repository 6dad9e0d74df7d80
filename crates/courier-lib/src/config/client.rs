use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for [`JsonClient`](crate::http_client::JsonClient).
///
/// Durations are in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    pub timeout: u32,
    pub connect_timeout: u32,
    pub pool_max_idle_per_host: u32,
    pub pool_idle_timeout: u32,
    /// Hand 404 responses to the decoder (which yields an empty value)
    /// instead of failing with a server error.
    pub decode_not_found: bool,
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout as u64)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout as u64)
    }

    pub fn pool_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_idle_timeout as u64)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            connect_timeout: 10,
            pool_max_idle_per_host: 100,
            pool_idle_timeout: 90,
            decode_not_found: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, 30);
        assert_eq!(config.connect_timeout, 10);
        assert_eq!(config.pool_max_idle_per_host, 100);
        assert_eq!(config.pool_idle_timeout, 90);
        assert!(!config.decode_not_found);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_json_round_trip() {
        let config = ClientConfig {
            decode_not_found: true,
            ..ClientConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: ClientConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_serde_rename_camel_case() {
        let value = serde_json::to_value(ClientConfig::default()).unwrap();
        let obj = value.as_object().unwrap();
        assert!(obj.contains_key("timeout"));
        assert!(obj.contains_key("connectTimeout"));
        assert!(obj.contains_key("poolMaxIdlePerHost"));
        assert!(obj.contains_key("poolIdleTimeout"));
        assert!(obj.contains_key("decodeNotFound"));
    }
}
