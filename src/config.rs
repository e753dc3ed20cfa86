//! Server configuration read from the environment.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use crate::demo_data::DemoData;

/// Default bind address, matching the other quickstart servers.
pub const DEFAULT_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 7860);

/// Longest date range a single request may cover.
pub const DEFAULT_MAX_RANGE_DAYS: i64 = 366;

/// Editing sessions untouched for this long are dropped.
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 8 * 60 * 60;

pub const ENV_ADDR: &str = "SHIFT_SCHEDULING_ADDR";
pub const ENV_DEMO: &str = "SHIFT_SCHEDULING_DEMO";
pub const ENV_MAX_RANGE_DAYS: &str = "SHIFT_SCHEDULING_MAX_RANGE_DAYS";
pub const ENV_SESSION_IDLE_SECS: &str = "SHIFT_SCHEDULING_SESSION_IDLE_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Demo roster loaded at startup.
    pub demo_data: DemoData,
    pub max_range_days: i64,
    pub session_idle: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(DEFAULT_ADDR),
            demo_data: DemoData::Small,
            max_range_days: DEFAULT_MAX_RANGE_DAYS,
            session_idle: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_ADDR) {
            config.bind_addr = raw.parse().map_err(|_| ConfigError::invalid(ENV_ADDR, &raw))?;
        }
        if let Some(raw) = lookup(ENV_DEMO) {
            config.demo_data = raw.parse().map_err(|_| ConfigError::invalid(ENV_DEMO, &raw))?;
        }
        if let Some(raw) = lookup(ENV_MAX_RANGE_DAYS) {
            config.max_range_days = match raw.parse::<i64>() {
                Ok(days) if days > 0 => days,
                _ => return Err(ConfigError::invalid(ENV_MAX_RANGE_DAYS, &raw)),
            };
        }
        if let Some(raw) = lookup(ENV_SESSION_IDLE_SECS) {
            let secs: u64 = raw
                .parse()
                .map_err(|_| ConfigError::invalid(ENV_SESSION_IDLE_SECS, &raw))?;
            config.session_idle = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Invalid { key: &'static str, value: String },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str) -> Self {
        ConfigError::Invalid {
            key,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { key, value } => {
                write!(f, "Invalid value '{}' for {}", value, key)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.bind_addr.port(), 7860);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            (ENV_ADDR, "127.0.0.1:9000"),
            (ENV_DEMO, "large"),
            (ENV_MAX_RANGE_DAYS, "31"),
            (ENV_SESSION_IDLE_SECS, "600"),
        ]))
        .unwrap();
        assert_eq!(config.session_idle, Duration::from_secs(600));
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.demo_data, DemoData::Large);
        assert_eq!(config.max_range_days, 31);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(AppConfig::from_lookup(lookup(&[(ENV_ADDR, "nowhere")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[(ENV_DEMO, "HUGE")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[(ENV_SESSION_IDLE_SECS, "-1")])).is_err());
        assert_eq!(
            AppConfig::from_lookup(lookup(&[(ENV_MAX_RANGE_DAYS, "0")])),
            Err(ConfigError::Invalid {
                key: ENV_MAX_RANGE_DAYS,
                value: "0".into()
            })
        );
    }
}
