//! Broker producer/consumer bridge.
//!
//! Decouples ingestion from fan-out through the topic:
//!
//! ```text
//!  gateway ──publish──▶ [ topic: user_events ] ──consume_loop──▶ EventSink
//!  (many instances)        keyed by user_id        (from "now")   (dashboards)
//! ```
//!
//! Broker trouble never escapes this module as an ingestion failure. It
//! is logged, recorded in [`BrokerStatus`], and the caller carries on in
//! degraded mode.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::BrokerConfig;
use crate::domain::events::{normalize_event, Event, NormalizeError};
use crate::ports::{
    BrokerError, EventSink, TopicConsumer, TopicMessage, TopicProducer, TopicRecord,
    TopicSubscription,
};

use super::BrokerStatus;

/// A topic record the consumer could not turn into an [`Event`].
#[derive(Debug, Error)]
pub enum MalformedMessage {
    #[error("Message {id} is not valid JSON: {reason}")]
    InvalidJson { id: String, reason: String },

    #[error("Message {id} is not a valid event: {source}")]
    InvalidEvent {
        id: String,
        #[source]
        source: NormalizeError,
    },
}

/// Timing and naming knobs for the bridge.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    pub topic: String,
    pub startup_grace: Duration,
    pub publish_timeout: Duration,
    pub retry_backoff: Duration,
}

impl From<&BrokerConfig> for BridgeSettings {
    fn from(config: &BrokerConfig) -> Self {
        Self {
            topic: config.topic.clone(),
            startup_grace: config.startup_grace(),
            publish_timeout: config.publish_timeout(),
            retry_backoff: config.retry_backoff(),
        }
    }
}

/// Publishes events to the topic and relays the topic to an [`EventSink`].
pub struct BrokerBridge {
    producer: Option<Arc<dyn TopicProducer>>,
    consumer: Option<Arc<dyn TopicConsumer>>,
    status: Arc<BrokerStatus>,
    settings: BridgeSettings,
}

impl BrokerBridge {
    /// Create a bridge over a reachable broker.
    pub fn new(
        producer: Arc<dyn TopicProducer>,
        consumer: Arc<dyn TopicConsumer>,
        status: Arc<BrokerStatus>,
        settings: BridgeSettings,
    ) -> Self {
        status.set_producer_ready(true);
        Self {
            producer: Some(producer),
            consumer: Some(consumer),
            status,
            settings,
        }
    }

    /// Create a bridge with no broker behind it.
    ///
    /// Every publish fails fast and the consume loop exits immediately,
    /// leaving the process in degraded mode.
    pub fn disconnected(status: Arc<BrokerStatus>, settings: BridgeSettings) -> Self {
        status.set_producer_ready(false);
        status.set_consumer_ready(false);
        Self {
            producer: None,
            consumer: None,
            status,
            settings,
        }
    }

    pub fn status(&self) -> &Arc<BrokerStatus> {
        &self.status
    }

    pub fn topic(&self) -> &str {
        &self.settings.topic
    }

    /// Append `event` to the topic, keyed by its user id.
    ///
    /// Bounded by the publish timeout. Failures flip the producer half of
    /// the status flag; a success restores it. Publishes are never retried.
    pub async fn publish(&self, event: &Event) -> Result<String, BrokerError> {
        let Some(producer) = &self.producer else {
            self.status.set_producer_ready(false);
            return Err(BrokerError::Unavailable("no broker connection".to_string()));
        };

        let payload =
            serde_json::to_string(event).map_err(|e| BrokerError::Serialization(e.to_string()))?;
        let record = TopicRecord {
            key: event.partition_key().to_string(),
            payload,
        };

        let timeout = self.settings.publish_timeout;
        let result = match tokio::time::timeout(timeout, producer.send(&self.settings.topic, record))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(BrokerError::Timeout(timeout.as_millis() as u64)),
        };

        match &result {
            Ok(entry_id) => {
                self.status.set_producer_ready(true);
                tracing::debug!(
                    topic = %self.settings.topic,
                    entry_id = %entry_id,
                    event_type = %event.event_type,
                    "Event published"
                );
            }
            Err(e) => {
                self.status.set_producer_ready(false);
                tracing::warn!(
                    topic = %self.settings.topic,
                    event_type = %event.event_type,
                    error = %e,
                    "Publish failed, event will not be streamed"
                );
            }
        }

        result
    }

    /// Turn one topic record into an event and hand it to `sink`.
    ///
    /// The payload is normalized again here because the producing gateway
    /// may use a different casing convention than this consumer.
    pub async fn relay(
        &self,
        message: TopicMessage,
        sink: &dyn EventSink,
    ) -> Result<usize, MalformedMessage> {
        let value: serde_json::Value =
            serde_json::from_str(&message.payload).map_err(|e| MalformedMessage::InvalidJson {
                id: message.id.clone(),
                reason: e.to_string(),
            })?;

        let event = normalize_event(value).map_err(|source| MalformedMessage::InvalidEvent {
            id: message.id.clone(),
            source,
        })?;

        tracing::debug!(
            entry_id = %message.id,
            event_type = %event.event_type,
            sink = sink.name(),
            "Relaying event"
        );

        Ok(sink.deliver(event).await)
    }

    /// Tail the topic forever, relaying every record to `sink`.
    ///
    /// Waits the startup grace period, then subscribes from the current end
    /// of the topic. A subscribe failure leaves the process degraded and
    /// returns. After a read failure the subscription is dropped and, after
    /// a back-off, reopened right after the last record seen.
    pub async fn consume_loop(&self, sink: Arc<dyn EventSink>) {
        let Some(consumer) = &self.consumer else {
            tracing::warn!("No broker connection, dashboard streaming disabled");
            self.status.set_consumer_ready(false);
            return;
        };

        let topic = self.settings.topic.as_str();
        tokio::time::sleep(self.settings.startup_grace).await;

        match consumer.topic_exists(topic).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!(
                topic,
                "Topic does not exist yet; it must be created by the operator"
            ),
            Err(e) => tracing::warn!(topic, error = %e, "Could not check topic existence"),
        }

        let mut subscription = match consumer.subscribe(topic).await {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                tracing::error!(topic, error = %e, "Subscribe failed, running degraded");
                self.status.set_consumer_ready(false);
                return;
            }
        };

        self.status.set_consumer_ready(true);
        tracing::info!(topic, sink = sink.name(), "Consumer started");

        let mut last_id: Option<String> = None;

        loop {
            let Some(active) = subscription.as_mut() else {
                tokio::time::sleep(self.settings.retry_backoff).await;
                subscription = self.reopen(&**consumer, last_id.as_deref()).await;
                continue;
            };

            match active.next_batch().await {
                Ok(batch) => {
                    self.status.set_consumer_ready(true);
                    for message in batch {
                        last_id = Some(message.id.clone());
                        if let Err(e) = self.relay(message, sink.as_ref()).await {
                            tracing::warn!(error = %e, "Skipping malformed message");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(topic, error = %e, "Topic read failed, resubscribing");
                    self.status.set_consumer_ready(false);
                    subscription = None;
                }
            }
        }
    }

    async fn reopen(
        &self,
        consumer: &dyn TopicConsumer,
        last_id: Option<&str>,
    ) -> Option<Box<dyn TopicSubscription>> {
        let topic = self.settings.topic.as_str();
        let result = match last_id {
            Some(id) => consumer.resume(topic, id).await,
            None => consumer.subscribe(topic).await,
        };

        match result {
            Ok(subscription) => {
                tracing::info!(topic, after = last_id.unwrap_or("tail"), "Consumer resubscribed");
                Some(subscription)
            }
            Err(e) => {
                tracing::warn!(topic, error = %e, "Resubscribe failed, retrying");
                None
            }
        }
    }

    /// Run [`consume_loop`](Self::consume_loop) as a background task.
    ///
    /// Abort the returned handle to stop consuming.
    pub fn spawn_consume_loop(self: &Arc<Self>, sink: Arc<dyn EventSink>) -> JoinHandle<()> {
        let bridge = Arc::clone(self);
        tokio::spawn(async move { bridge.consume_loop(sink).await })
    }
}
