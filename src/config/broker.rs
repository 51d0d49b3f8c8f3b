//! Broker configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Which broker adapter backs the topic
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BrokerMode {
    /// Redis Streams
    #[default]
    Redis,
    /// In-process log, nothing leaves the process
    Memory,
}

impl BrokerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrokerMode::Redis => "redis",
            BrokerMode::Memory => "memory",
        }
    }
}

/// Broker configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    #[serde(default)]
    pub mode: BrokerMode,

    /// Redis connection URL
    #[serde(default = "default_url")]
    pub url: String,

    /// Topic (stream key) events are appended to
    #[serde(default = "default_topic")]
    pub topic: String,

    /// Wait between connecting and subscribing
    #[serde(default = "default_startup_grace_ms")]
    pub startup_grace_ms: u64,

    /// Upper bound on a single publish
    #[serde(default = "default_publish_timeout_ms")]
    pub publish_timeout_ms: u64,

    /// How long one blocking read waits for new records
    #[serde(default = "default_read_block_ms")]
    pub read_block_ms: u64,

    /// Maximum records per read
    #[serde(default = "default_read_batch_size")]
    pub read_batch_size: usize,

    /// Approximate cap on topic length (retention)
    #[serde(default = "default_max_len")]
    pub max_len: usize,

    /// Pause before re-reading after a failed read
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Records kept by the in-memory broker
    #[serde(default = "default_memory_retention")]
    pub memory_retention: usize,
}

impl BrokerConfig {
    pub fn startup_grace(&self) -> Duration {
        Duration::from_millis(self.startup_grace_ms)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }

    pub fn read_block(&self) -> Duration {
        Duration::from_millis(self.read_block_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Validate broker configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.topic.trim().is_empty() {
            return Err(ValidationError::MissingRequired("BROKER_TOPIC"));
        }
        if self.publish_timeout_ms == 0 || self.publish_timeout_ms > 60_000 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.read_batch_size == 0 {
            return Err(ValidationError::InvalidBatchSize);
        }
        if self.mode == BrokerMode::Redis {
            if self.url.is_empty() {
                return Err(ValidationError::MissingRequired("BROKER_URL"));
            }
            if !self.url.starts_with("redis://") && !self.url.starts_with("rediss://") {
                return Err(ValidationError::InvalidRedisUrl);
            }
        }
        Ok(())
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            mode: BrokerMode::default(),
            url: default_url(),
            topic: default_topic(),
            startup_grace_ms: default_startup_grace_ms(),
            publish_timeout_ms: default_publish_timeout_ms(),
            read_block_ms: default_read_block_ms(),
            read_batch_size: default_read_batch_size(),
            max_len: default_max_len(),
            retry_backoff_ms: default_retry_backoff_ms(),
            memory_retention: default_memory_retention(),
        }
    }
}

fn default_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_topic() -> String {
    "user_events".to_string()
}

fn default_startup_grace_ms() -> u64 {
    1000
}

fn default_publish_timeout_ms() -> u64 {
    2000
}

fn default_read_block_ms() -> u64 {
    5000
}

fn default_read_batch_size() -> usize {
    100
}

fn default_max_len() -> usize {
    100_000
}

fn default_retry_backoff_ms() -> u64 {
    2000
}

fn default_memory_retention() -> usize {
    1000
}
