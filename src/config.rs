//! Service configuration.
//!
//! Defaults suit a standard 5x5 board; every knob can be overridden from
//! the environment.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::notify::RetryPolicy;
use crate::proof::outcome::MineRange;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Variable is set but does not parse.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Environment variable.
        key: &'static str,
        /// Raw value.
        value: String,
    },

    /// Values parse but are inconsistent.
    #[error("invalid configuration: {0}")]
    Inconsistent(String),
}

/// Reveal service configuration.
#[derive(Debug, Clone)]
pub struct FairnessConfig {
    /// Accepted mine counts.
    pub mine_range: MineRange,
    /// How long an unrevealed bet stays pending. `None` keeps it forever.
    pub pending_ttl: Option<Duration>,
    /// Capacity of the event channel feeding the dispatcher.
    pub event_channel_capacity: usize,
    /// Delivery retry policy for notifications.
    pub retry: RetryPolicy,
}

impl Default for FairnessConfig {
    fn default() -> Self {
        Self {
            mine_range: MineRange::STANDARD,
            pending_ttl: None,
            event_channel_capacity: 256,
            retry: RetryPolicy::default(),
        }
    }
}

impl FairnessConfig {
    /// Create config from environment variables.
    ///
    /// `MINES_MIN`, `MINES_MAX`, `PENDING_TTL_SECS`, `EVENT_CHANNEL_CAPACITY`,
    /// `NOTIFY_MAX_ATTEMPTS`, `NOTIFY_BASE_BACKOFF_MS`, `NOTIFY_MAX_BACKOFF_MS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let min = parse_or(&lookup, "MINES_MIN", defaults.mine_range.min())?;
        let max = parse_or(&lookup, "MINES_MAX", defaults.mine_range.max())?;
        let mine_range =
            MineRange::new(min, max).map_err(|err| ConfigError::Inconsistent(err.to_string()))?;

        let pending_ttl = parse_opt::<u64, _>(&lookup, "PENDING_TTL_SECS")?.map(Duration::from_secs);

        let event_channel_capacity =
            parse_or(&lookup, "EVENT_CHANNEL_CAPACITY", defaults.event_channel_capacity)?;
        if event_channel_capacity == 0 {
            return Err(ConfigError::Inconsistent(
                "EVENT_CHANNEL_CAPACITY must be positive".to_string(),
            ));
        }

        let retry = RetryPolicy {
            max_attempts: parse_or(&lookup, "NOTIFY_MAX_ATTEMPTS", defaults.retry.max_attempts)?,
            base_backoff: Duration::from_millis(parse_or(
                &lookup,
                "NOTIFY_BASE_BACKOFF_MS",
                defaults.retry.base_backoff.as_millis() as u64,
            )?),
            max_backoff: Duration::from_millis(parse_or(
                &lookup,
                "NOTIFY_MAX_BACKOFF_MS",
                defaults.retry.max_backoff.as_millis() as u64,
            )?),
        };
        if retry.max_attempts == 0 {
            return Err(ConfigError::Inconsistent(
                "NOTIFY_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }
        if retry.base_backoff > retry.max_backoff {
            return Err(ConfigError::Inconsistent(
                "NOTIFY_BASE_BACKOFF_MS exceeds NOTIFY_MAX_BACKOFF_MS".to_string(),
            ));
        }

        Ok(Self {
            mine_range,
            pending_ttl,
            event_channel_capacity,
            retry,
        })
    }
}

fn parse_opt<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => {
            let parsed: Result<T, _> = raw.trim().parse();
            match parsed {
                Ok(value) => Ok(Some(value)),
                Err(_) => Err(ConfigError::InvalidValue { key, value: raw }),
            }
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(lookup, key)?.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_from_empty_env() {
        let config = FairnessConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.mine_range, MineRange::STANDARD);
        assert_eq!(config.pending_ttl, None);
        assert_eq!(config.event_channel_capacity, 256);
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn test_overrides() {
        let config = FairnessConfig::from_lookup(lookup_from(&[
            ("MINES_MIN", "2"),
            ("MINES_MAX", "20"),
            ("PENDING_TTL_SECS", "600"),
            ("NOTIFY_MAX_ATTEMPTS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.mine_range, MineRange::new(2, 20).unwrap());
        assert_eq!(config.pending_ttl, Some(Duration::from_secs(600)));
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_invalid_values() {
        let err = FairnessConfig::from_lookup(lookup_from(&[("MINES_MAX", "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "MINES_MAX", .. }));

        let err = FairnessConfig::from_lookup(lookup_from(&[("MINES_MAX", "30")])).unwrap_err();
        assert!(matches!(err, ConfigError::Inconsistent(_)));

        let err =
            FairnessConfig::from_lookup(lookup_from(&[("NOTIFY_MAX_ATTEMPTS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Inconsistent(_)));
    }
}
