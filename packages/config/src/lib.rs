// ABOUTME: Store configuration loaded from environment variables
// ABOUTME: Selects the storage backend and tunes the app-settings expiry sweeper

pub mod constants;

use std::env;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use constants::*;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid sweep interval: {0}")]
    InvalidInterval(#[from] ParseIntError),
    #[error("Sweep interval {0}s is out of valid range (1-3600)")]
    IntervalOutOfRange(u64),
    #[error("Invalid boolean for {0}: {1}")]
    InvalidFlag(&'static str, String),
    #[error("Unknown storage provider: {0}")]
    UnknownProvider(String),
}

/// Which backing store implementation to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageProviderKind {
    #[default]
    Memory,
}

impl FromStr for StorageProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "in-memory" | "in_memory" => Ok(StorageProviderKind::Memory),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

impl fmt::Display for StorageProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageProviderKind::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub provider: StorageProviderKind,
    pub sweep_enabled: bool,
    pub sweep_interval_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            provider: StorageProviderKind::Memory,
            sweep_enabled: true,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from any variable source. `from_env` passes the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = lookup(WATCHSTORE_STORAGE_PROVIDER)
            .unwrap_or_else(|| DEFAULT_STORAGE_PROVIDER.to_string())
            .parse::<StorageProviderKind>()?;

        let sweep_enabled = match lookup(WATCHSTORE_SWEEP_ENABLED) {
            Some(raw) => parse_flag(WATCHSTORE_SWEEP_ENABLED, &raw)?,
            None => true,
        };

        let sweep_interval_secs = match lookup(WATCHSTORE_SWEEP_INTERVAL_SECS) {
            Some(raw) => raw.trim().parse::<u64>()?,
            None => DEFAULT_SWEEP_INTERVAL_SECS,
        };

        if !(MIN_SWEEP_INTERVAL_SECS..=MAX_SWEEP_INTERVAL_SECS).contains(&sweep_interval_secs) {
            return Err(ConfigError::IntervalOutOfRange(sweep_interval_secs));
        }

        let config = StoreConfig {
            provider,
            sweep_enabled,
            sweep_interval_secs,
        };
        debug!("Loaded store config: {:?}", config);
        Ok(config)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag(name, raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = StoreConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.provider, StorageProviderKind::Memory);
        assert!(config.sweep_enabled);
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_config_reads_all_variables() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            (WATCHSTORE_STORAGE_PROVIDER, "in-memory"),
            (WATCHSTORE_SWEEP_ENABLED, "off"),
            (WATCHSTORE_SWEEP_INTERVAL_SECS, "15"),
        ]))
        .unwrap();

        assert_eq!(config.provider, StorageProviderKind::Memory);
        assert!(!config.sweep_enabled);
        assert_eq!(config.sweep_interval_secs, 15);
    }

    #[rstest]
    #[case("1", 1)]
    #[case("30", 30)]
    #[case("3600", 3600)]
    fn test_valid_sweep_intervals(#[case] raw: &str, #[case] expected: u64) {
        let config =
            StoreConfig::from_lookup(lookup_from(&[(WATCHSTORE_SWEEP_INTERVAL_SECS, raw)]))
                .unwrap();
        assert_eq!(config.sweep_interval_secs, expected);
    }

    #[rstest]
    #[case("0")]
    #[case("3601")]
    fn test_sweep_interval_out_of_range(#[case] raw: &str) {
        let result =
            StoreConfig::from_lookup(lookup_from(&[(WATCHSTORE_SWEEP_INTERVAL_SECS, raw)]));
        assert!(matches!(result, Err(ConfigError::IntervalOutOfRange(_))));
    }

    #[rstest]
    #[case("-1")]
    #[case("1.5")]
    #[case("soon")]
    fn test_sweep_interval_unparsable(#[case] raw: &str) {
        let result =
            StoreConfig::from_lookup(lookup_from(&[(WATCHSTORE_SWEEP_INTERVAL_SECS, raw)]));
        assert!(matches!(result, Err(ConfigError::InvalidInterval(_))));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let result =
            StoreConfig::from_lookup(lookup_from(&[(WATCHSTORE_STORAGE_PROVIDER, "postgres")]));
        match result {
            Err(ConfigError::UnknownProvider(name)) => assert_eq!(name, "postgres"),
            other => panic!("Expected UnknownProvider error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_flag_rejected() {
        let result =
            StoreConfig::from_lookup(lookup_from(&[(WATCHSTORE_SWEEP_ENABLED, "maybe")]));
        assert!(matches!(result, Err(ConfigError::InvalidFlag(_, _))));
    }

    #[test]
    fn test_provider_display_round_trips() {
        let kind = StorageProviderKind::Memory;
        assert_eq!(kind.to_string().parse::<StorageProviderKind>().unwrap(), kind);
    }
}
