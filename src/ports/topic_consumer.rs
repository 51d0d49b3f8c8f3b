//! TopicConsumer port - Interface for tailing the event topic.

use async_trait::async_trait;

use super::BrokerError;

/// One record read back from the topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMessage {
    /// Broker-assigned entry id.
    pub id: String,
    pub key: Option<String>,
    pub payload: String,
}

/// Port for subscribing to a topic.
///
/// A subscription starts at the current end of the topic: records
/// appended before `subscribe` returns are never delivered.
#[async_trait]
pub trait TopicConsumer: Send + Sync {
    /// Whether the topic exists yet. Creating it is an operator concern.
    async fn topic_exists(&self, topic: &str) -> Result<bool, BrokerError>;

    /// Open a cursor positioned at the tail of `topic`.
    async fn subscribe(&self, topic: &str) -> Result<Box<dyn TopicSubscription>, BrokerError>;

    /// Open a fresh cursor that continues right after `after_id`.
    ///
    /// Used to recover from a failed read without skipping records that
    /// arrived in the meantime. Records the broker has already trimmed
    /// are gone.
    async fn resume(
        &self,
        topic: &str,
        after_id: &str,
    ) -> Result<Box<dyn TopicSubscription>, BrokerError>;
}

/// An open cursor on a topic.
#[async_trait]
pub trait TopicSubscription: Send {
    /// Wait for the next batch of records.
    ///
    /// May return an empty batch when the broker's blocking read times out
    /// without new records; callers simply poll again.
    async fn next_batch(&mut self) -> Result<Vec<TopicMessage>, BrokerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time checks that traits are object-safe
    #[allow(dead_code)]
    fn assert_consumer_object_safe(_: &dyn TopicConsumer) {}

    #[allow(dead_code)]
    fn assert_subscription_object_safe(_: &dyn TopicSubscription) {}
}
