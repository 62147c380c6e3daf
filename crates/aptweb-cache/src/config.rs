//! Cache configuration

use std::time::Duration;

/// Configuration for [`TtlCache`](crate::TtlCache).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtlCacheConfig {
    /// Maximum number of entries held at once
    pub max_entries: usize,
    /// Time-to-live applied to entries inserted without an explicit TTL
    pub ttl: Duration,
    /// Interval of the background sweeper (zero disables it)
    pub cleanup_interval: Duration,
}

impl Default for TtlCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 100,
            ttl: Duration::from_secs(300),
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

impl TtlCacheConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum number of entries
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Set default TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set background cleanup interval
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_entries == 0 {
            return Err("max_entries must be greater than 0".to_string());
        }

        if self.ttl.is_zero() {
            return Err("ttl must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TtlCacheConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = TtlCacheConfig::new().with_max_entries(0);
        assert_eq!(
            config.validate(),
            Err("max_entries must be greater than 0".to_string())
        );
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = TtlCacheConfig::new().with_ttl(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_cleanup_interval_allowed() {
        let config = TtlCacheConfig::new().with_cleanup_interval(Duration::ZERO);
        assert!(config.validate().is_ok());
    }
}
