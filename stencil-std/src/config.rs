//! Dispatcher configuration.

use serde::Deserialize;
use stencil_core::{Result, StencilError};
use std::time::Duration;

/// Settings for a [`Dispatcher`](crate::dispatcher::Dispatcher).
///
/// Every field has a default, so a partial TOML table is enough:
///
/// ```toml
/// consumers = 2
/// queue_capacity = 64
/// request_timeout_ms = 5000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatcherConfig {
    /// Number of concurrent consumer tasks.
    pub consumers: usize,
    /// Messages the queue holds before `submit` waits for room.
    pub queue_capacity: usize,
    /// Default deadline for `submit_and_wait`, in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            consumers: 1,
            queue_capacity: 1000,
            request_timeout_ms: 30_000,
        }
    }
}

impl DispatcherConfig {
    /// Parses a TOML document and validates it.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|e| StencilError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the number of consumer tasks.
    pub fn with_consumers(mut self, consumers: usize) -> Self {
        self.consumers = consumers;
        self
    }

    /// Sets the queue capacity.
    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    /// Sets the default `submit_and_wait` deadline.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// The default `submit_and_wait` deadline.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Rejects zero consumers, a zero-capacity queue and a zero timeout.
    pub fn validate(&self) -> Result<()> {
        if self.consumers == 0 {
            return Err(StencilError::InvalidConfig(
                "consumers must be at least 1".into(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(StencilError::InvalidConfig(
                "queue_capacity must be at least 1".into(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(StencilError::InvalidConfig(
                "request_timeout_ms must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = DispatcherConfig::from_toml_str("consumers = 2").unwrap();
        assert_eq!(config.consumers, 2);
        assert_eq!(config.queue_capacity, 1000);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn empty_toml_is_the_default() {
        assert_eq!(
            DispatcherConfig::from_toml_str("").unwrap(),
            DispatcherConfig::default()
        );
    }

    #[test]
    fn zero_values_are_rejected() {
        for raw in [
            "consumers = 0",
            "queue_capacity = 0",
            "request_timeout_ms = 0",
        ] {
            assert!(matches!(
                DispatcherConfig::from_toml_str(raw),
                Err(StencilError::InvalidConfig(_))
            ));
        }
        assert!(DispatcherConfig::default()
            .with_consumers(0)
            .validate()
            .is_err());
    }

    #[test]
    fn unknown_and_mistyped_keys_are_rejected() {
        assert!(DispatcherConfig::from_toml_str("workers = 2").is_err());
        assert!(DispatcherConfig::from_toml_str("consumers = \"two\"").is_err());
    }

    #[test]
    fn builder_sets_fields() {
        let config = DispatcherConfig::default()
            .with_consumers(4)
            .with_queue_capacity(8)
            .with_request_timeout(Duration::from_millis(250));
        assert_eq!(config.consumers, 4);
        assert_eq!(config.queue_capacity, 8);
        assert_eq!(config.request_timeout_ms, 250);
        assert!(config.validate().is_ok());
    }
}
