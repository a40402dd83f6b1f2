//! Producer configuration

use crate::error::{Error, Result};
use std::time::Duration;

/// Default batch size limit in bytes
const DEFAULT_BATCH_SIZE_LIMIT: usize = 16384;
/// Default record count limit per batch
const DEFAULT_BATCH_RECORD_LIMIT: usize = 1024;
/// Default linger time in milliseconds
const DEFAULT_LINGER_MS: u64 = 0;

/// Producer configuration
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Bootstrap servers (host:port)
    pub bootstrap_servers: Vec<String>,

    /// Batch size limit in bytes; a batch at or over this limit is sealed
    pub batch_size_limit: usize,

    /// Maximum number of records per batch
    pub batch_record_limit: usize,

    /// Time to wait for additional records before sealing a batch (ms)
    pub linger_ms: u64,

    /// Per-attempt network timeout. Must not exceed `delivery_timeout`.
    pub request_timeout: Duration,

    /// Total wall-clock budget from batch creation to final outcome,
    /// spanning all retries
    pub delivery_timeout: Duration,

    /// Advisory retry budget. The engine retries transient failures until
    /// `delivery_timeout` elapses; exceeding `retries` is logged but never
    /// truncates delivery before the deadline.
    pub retries: u32,

    /// Initial retry backoff (ms)
    pub retry_backoff_ms: u64,

    /// Maximum retry backoff (ms)
    pub retry_backoff_max_ms: u64,

    /// Backoff growth factor per completed attempt
    pub retry_multiplier: f64,

    /// Acknowledgment level requested from the broker:
    /// 0 = none, 1 = leader, -1 = all in-sync replicas
    pub acks: i8,

    /// Connection establishment timeout
    pub connection_timeout: Duration,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: vec!["localhost:9092".to_string()],
            batch_size_limit: DEFAULT_BATCH_SIZE_LIMIT,
            batch_record_limit: DEFAULT_BATCH_RECORD_LIMIT,
            linger_ms: DEFAULT_LINGER_MS,
            request_timeout: Duration::from_secs(30),
            delivery_timeout: Duration::from_secs(120),
            retries: u32::MAX,
            retry_backoff_ms: 100,
            retry_backoff_max_ms: 1000,
            retry_multiplier: 2.0,
            acks: -1,
            connection_timeout: Duration::from_secs(10),
        }
    }
}

impl ProducerConfig {
    /// Create a new builder
    pub fn builder() -> ProducerConfigBuilder {
        ProducerConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout > self.delivery_timeout {
            return Err(Error::InvalidConfig(format!(
                "request_timeout ({} ms) must not exceed delivery_timeout ({} ms)",
                self.request_timeout.as_millis(),
                self.delivery_timeout.as_millis()
            )));
        }
        if self.delivery_timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "delivery_timeout must be non-zero".to_string(),
            ));
        }
        if self.batch_size_limit == 0 {
            return Err(Error::InvalidConfig(
                "batch_size_limit must be non-zero".to_string(),
            ));
        }
        if self.batch_record_limit == 0 {
            return Err(Error::InvalidConfig(
                "batch_record_limit must be non-zero".to_string(),
            ));
        }
        if self.retry_multiplier < 1.0 {
            return Err(Error::InvalidConfig(
                "retry_multiplier must be at least 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for ProducerConfig
#[derive(Default)]
pub struct ProducerConfigBuilder {
    config: ProducerConfig,
}

impl ProducerConfigBuilder {
    /// Set bootstrap servers
    pub fn bootstrap_servers(mut self, servers: Vec<String>) -> Self {
        self.config.bootstrap_servers = servers;
        self
    }

    /// Set batch size limit in bytes
    pub fn batch_size_limit(mut self, bytes: usize) -> Self {
        self.config.batch_size_limit = bytes;
        self
    }

    /// Set maximum records per batch
    pub fn batch_record_limit(mut self, records: usize) -> Self {
        self.config.batch_record_limit = records;
        self
    }

    /// Set linger time in milliseconds
    pub fn linger_ms(mut self, ms: u64) -> Self {
        self.config.linger_ms = ms;
        self
    }

    /// Set per-attempt request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set total delivery timeout
    pub fn delivery_timeout(mut self, timeout: Duration) -> Self {
        self.config.delivery_timeout = timeout;
        self
    }

    /// Set the advisory retry budget
    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    /// Set initial retry backoff in milliseconds
    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    /// Set maximum retry backoff in milliseconds
    pub fn retry_backoff_max_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_max_ms = ms;
        self
    }

    /// Set backoff growth factor
    pub fn retry_multiplier(mut self, multiplier: f64) -> Self {
        self.config.retry_multiplier = multiplier;
        self
    }

    /// Set requested acknowledgment level
    pub fn acks(mut self, acks: i8) -> Self {
        self.config.acks = acks;
        self
    }

    /// Set connection timeout
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.config.connection_timeout = timeout;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ProducerConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ProducerConfig::builder()
            .bootstrap_servers(vec!["server1:9092".to_string()])
            .batch_size_limit(32768)
            .batch_record_limit(64)
            .linger_ms(10)
            .request_timeout(Duration::from_secs(5))
            .delivery_timeout(Duration::from_secs(5))
            .retries(20)
            .retry_backoff_ms(500)
            .build();

        assert_eq!(config.bootstrap_servers.len(), 1);
        assert_eq!(config.batch_size_limit, 32768);
        assert_eq!(config.batch_record_limit, 64);
        assert_eq!(config.linger_ms, 10);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.delivery_timeout, Duration::from_secs(5));
        assert_eq!(config.retries, 20);
        assert_eq!(config.retry_backoff_ms, 500);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ProducerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.delivery_timeout, Duration::from_secs(120));
        assert_eq!(config.acks, -1);
    }

    #[test]
    fn test_request_timeout_must_not_exceed_delivery_timeout() {
        let config = ProducerConfig::builder()
            .request_timeout(Duration::from_secs(10))
            .delivery_timeout(Duration::from_secs(5))
            .build();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("request_timeout"));
    }

    #[test]
    fn test_multiplier_below_one_is_rejected() {
        let config = ProducerConfig::builder().retry_multiplier(0.5).build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_limits_are_rejected() {
        assert!(ProducerConfig::builder()
            .batch_size_limit(0)
            .build()
            .validate()
            .is_err());
        assert!(ProducerConfig::builder()
            .batch_record_limit(0)
            .build()
            .validate()
            .is_err());
    }
}
