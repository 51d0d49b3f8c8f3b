//! In-process broker for tests and broker-less runs.
//!
//! Keeps the most recent records per topic and pushes new ones to live
//! subscribers over a tokio broadcast channel. Nothing survives a restart.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::ports::{
    BrokerError, TopicConsumer, TopicMessage, TopicProducer, TopicRecord, TopicSubscription,
};

/// Records kept per topic unless configured otherwise.
pub const DEFAULT_RETENTION: usize = 1000;

/// Upper bound on records handed out by one `next_batch` call.
const MAX_BATCH: usize = 100;

/// Sequence number of an `N-0` entry id.
fn sequence(id: &str) -> Option<u64> {
    id.split('-').next()?.parse().ok()
}

struct TopicLog {
    records: VecDeque<TopicMessage>,
    next_seq: u64,
    live: broadcast::Sender<TopicMessage>,
}

impl TopicLog {
    fn new(capacity: usize) -> Self {
        let (live, _) = broadcast::channel(capacity.max(1));
        Self {
            records: VecDeque::new(),
            next_seq: 1,
            live,
        }
    }
}

/// In-memory implementation of the producer and consumer ports.
///
/// # Example
///
/// ```ignore
/// let broker = Arc::new(InMemoryBroker::new(1000));
///
/// broker.send("user_events", record).await?;
///
/// assert_eq!(broker.record_count("user_events"), 1);
/// ```
pub struct InMemoryBroker {
    topics: Mutex<HashMap<String, TopicLog>>,
    retention: usize,
}

impl InMemoryBroker {
    /// Creates a broker keeping the last `retention` records per topic.
    pub fn new(retention: usize) -> Self {
        Self {
            topics: Mutex::new(HashMap::new()),
            retention: retention.max(1),
        }
    }

    fn topics(&self) -> MutexGuard<'_, HashMap<String, TopicLog>> {
        self.topics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns count of retained records in a topic.
    pub fn record_count(&self, topic: &str) -> usize {
        self.topics()
            .get(topic)
            .map(|log| log.records.len())
            .unwrap_or(0)
    }

    // === Test Helpers ===

    /// Returns the retained records of a topic, oldest first.
    pub fn records(&self, topic: &str) -> Vec<TopicMessage> {
        self.topics()
            .get(topic)
            .map(|log| log.records.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}

#[async_trait]
impl TopicProducer for InMemoryBroker {
    async fn send(&self, topic: &str, record: TopicRecord) -> Result<String, BrokerError> {
        let retention = self.retention;
        let mut topics = self.topics();
        let log = topics
            .entry(topic.to_string())
            .or_insert_with(|| TopicLog::new(retention));

        let id = format!("{}-0", log.next_seq);
        log.next_seq += 1;

        let message = TopicMessage {
            id: id.clone(),
            key: Some(record.key),
            payload: record.payload,
        };

        log.records.push_back(message.clone());
        while log.records.len() > retention {
            log.records.pop_front();
        }

        // No live subscribers is fine
        let _ = log.live.send(message);

        Ok(id)
    }
}

#[async_trait]
impl TopicConsumer for InMemoryBroker {
    async fn topic_exists(&self, topic: &str) -> Result<bool, BrokerError> {
        Ok(self.topics().contains_key(topic))
    }

    async fn subscribe(&self, topic: &str) -> Result<Box<dyn TopicSubscription>, BrokerError> {
        let retention = self.retention;
        let receiver = self
            .topics()
            .entry(topic.to_string())
            .or_insert_with(|| TopicLog::new(retention))
            .live
            .subscribe();

        Ok(Box::new(InMemorySubscription {
            backlog: VecDeque::new(),
            receiver,
        }))
    }

    async fn resume(
        &self,
        topic: &str,
        after_id: &str,
    ) -> Result<Box<dyn TopicSubscription>, BrokerError> {
        let after = sequence(after_id)
            .ok_or_else(|| BrokerError::Unavailable(format!("unknown entry id {}", after_id)))?;

        let retention = self.retention;
        let mut topics = self.topics();
        let log = topics
            .entry(topic.to_string())
            .or_insert_with(|| TopicLog::new(retention));

        // Taken under the same lock, so no record lands in both.
        let backlog = log
            .records
            .iter()
            .filter(|m| sequence(&m.id).is_some_and(|seq| seq > after))
            .cloned()
            .collect();
        let receiver = log.live.subscribe();

        Ok(Box::new(InMemorySubscription { backlog, receiver }))
    }
}

/// Live cursor on an in-memory topic.
pub struct InMemorySubscription {
    /// Retained records to hand out before live ones, after a resume.
    backlog: VecDeque<TopicMessage>,
    receiver: broadcast::Receiver<TopicMessage>,
}

#[async_trait]
impl TopicSubscription for InMemorySubscription {
    async fn next_batch(&mut self) -> Result<Vec<TopicMessage>, BrokerError> {
        if !self.backlog.is_empty() {
            let take = self.backlog.len().min(MAX_BATCH);
            return Ok(self.backlog.drain(..take).collect());
        }

        let first = loop {
            match self.receiver.recv().await {
                Ok(message) => break message,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "In-memory subscriber lagged, records dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(BrokerError::Unavailable("topic closed".to_string()));
                }
            }
        };

        let mut batch = vec![first];
        while batch.len() < MAX_BATCH {
            match self.receiver.try_recv() {
                Ok(message) => batch.push(message),
                Err(_) => break,
            }
        }

        Ok(batch)
    }
}
