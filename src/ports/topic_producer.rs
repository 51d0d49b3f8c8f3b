//! TopicProducer port - Interface for appending to the event topic.
//!
//! The broker is a durable, ordered, append-only log. This port hides
//! which broker backs it (Redis Streams in production, an in-process log
//! for tests and broker-less runs).

use async_trait::async_trait;

/// Errors that can occur talking to the broker.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrokerError {
    /// Broker unreachable or rejected the command
    #[error("Broker unavailable: {0}")]
    Unavailable(String),

    /// Operation did not finish in time
    #[error("Broker operation timed out after {0} ms")]
    Timeout(u64),

    /// Payload could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// One record to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRecord {
    /// Partition key (the event's user id).
    pub key: String,
    /// Serialized event JSON.
    pub payload: String,
}

/// Port for appending records to a named topic.
///
/// Implementations must not block indefinitely; callers additionally
/// bound every call with a timeout.
#[async_trait]
pub trait TopicProducer: Send + Sync {
    /// Append one record, returning the broker-assigned entry id.
    async fn send(&self, topic: &str, record: TopicRecord) -> Result<String, BrokerError>;
}
