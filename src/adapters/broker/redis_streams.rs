//! Redis Streams broker for production deployments.
//!
//! The topic is a single stream. Each record is one entry with two fields:
//!
//! ```text
//! XADD user_events MAXLEN ~ 100000 * key <user_id> payload <event json>
//! ```
//!
//! Subscribers start at the current last entry id and tail with
//! `XREAD BLOCK`, so nothing published before the subscription is replayed.
//!
//! A multiplexed connection is not re-established once its socket dies.
//! The shared command connection is replaced after a connection-level
//! error, and a failed subscription is replaced through
//! [`TopicConsumer::resume`], which opens a new reader.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use tokio::sync::RwLock;
use redis::streams::{StreamId, StreamMaxlen, StreamRangeReply, StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;

use crate::config::BrokerConfig;
use crate::ports::{
    BrokerError, TopicConsumer, TopicMessage, TopicProducer, TopicRecord, TopicSubscription,
};

const KEY_FIELD: &str = "key";
const PAYLOAD_FIELD: &str = "payload";

/// Start position for an empty stream.
const STREAM_START: &str = "0-0";

fn unavailable(e: redis::RedisError) -> BrokerError {
    BrokerError::Unavailable(e.to_string())
}

/// Whether `e` means the socket is gone rather than a command failing.
fn is_connection_lost(e: &redis::RedisError) -> bool {
    e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal()
}

/// Redis Streams implementation of the producer and consumer ports.
pub struct RedisStreamBroker {
    client: redis::Client,
    conn: RwLock<MultiplexedConnection>,
    max_len: usize,
    read_block: Duration,
    read_batch_size: usize,
}

impl RedisStreamBroker {
    /// Connect to Redis.
    ///
    /// Fails if the server cannot be reached; callers fall back to
    /// degraded mode.
    pub async fn connect(config: &BrokerConfig) -> Result<Self, BrokerError> {
        let client = redis::Client::open(config.url.as_str()).map_err(unavailable)?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(unavailable)?;

        tracing::info!(url = %config.url, "Connected to Redis broker");

        Ok(Self {
            client,
            conn: RwLock::new(conn),
            max_len: config.max_len,
            read_block: config.read_block(),
            read_batch_size: config.read_batch_size,
        })
    }

    async fn connection(&self) -> MultiplexedConnection {
        self.conn.read().await.clone()
    }

    /// Map a command error, replacing the shared connection if it died.
    async fn command_failed(&self, e: redis::RedisError) -> BrokerError {
        if is_connection_lost(&e) {
            match self.client.get_multiplexed_tokio_connection().await {
                Ok(fresh) => {
                    *self.conn.write().await = fresh;
                    tracing::info!("Redis connection re-established");
                }
                Err(reconnect) => {
                    tracing::debug!(error = %reconnect, "Redis still unreachable");
                }
            }
        }
        unavailable(e)
    }

    /// Open a reader positioned after `last_id` on its own connection.
    async fn open_reader(
        &self,
        topic: &str,
        last_id: String,
    ) -> Result<Box<dyn TopicSubscription>, BrokerError> {
        // XREAD BLOCK would stall every other command sharing a connection.
        let reader = self
            .client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(unavailable)?;

        tracing::debug!(topic, last_id = %last_id, "Opened stream reader");

        Ok(Box::new(RedisStreamSubscription {
            conn: reader,
            topic: topic.to_string(),
            last_id,
            options: StreamReadOptions::default()
                .block(self.read_block.as_millis() as usize)
                .count(self.read_batch_size),
        }))
    }
}

#[async_trait]
impl TopicProducer for RedisStreamBroker {
    async fn send(&self, topic: &str, record: TopicRecord) -> Result<String, BrokerError> {
        let mut conn = self.connection().await;

        let result: redis::RedisResult<String> = conn
            .xadd_maxlen(
                topic,
                StreamMaxlen::Approx(self.max_len),
                "*",
                &[
                    (KEY_FIELD, record.key.as_str()),
                    (PAYLOAD_FIELD, record.payload.as_str()),
                ],
            )
            .await;

        match result {
            Ok(entry_id) => Ok(entry_id),
            Err(e) => Err(self.command_failed(e).await),
        }
    }
}

#[async_trait]
impl TopicConsumer for RedisStreamBroker {
    async fn topic_exists(&self, topic: &str) -> Result<bool, BrokerError> {
        let mut conn = self.connection().await;
        let result: redis::RedisResult<bool> = conn.exists(topic).await;
        match result {
            Ok(exists) => Ok(exists),
            Err(e) => Err(self.command_failed(e).await),
        }
    }

    async fn subscribe(&self, topic: &str) -> Result<Box<dyn TopicSubscription>, BrokerError> {
        let mut conn = self.connection().await;

        let result: redis::RedisResult<StreamRangeReply> =
            conn.xrevrange_count(topic, "+", "-", 1).await;
        let tail = match result {
            Ok(tail) => tail,
            Err(e) => return Err(self.command_failed(e).await),
        };
        let last_id = tail
            .ids
            .first()
            .map(|entry| entry.id.clone())
            .unwrap_or_else(|| STREAM_START.to_string());

        self.open_reader(topic, last_id).await
    }

    async fn resume(
        &self,
        topic: &str,
        after_id: &str,
    ) -> Result<Box<dyn TopicSubscription>, BrokerError> {
        self.open_reader(topic, after_id.to_string()).await
    }
}

/// Cursor over one stream, advanced past every entry it returns.
pub struct RedisStreamSubscription {
    conn: MultiplexedConnection,
    topic: String,
    last_id: String,
    options: StreamReadOptions,
}

impl RedisStreamSubscription {
    fn to_message(entry: &StreamId) -> Option<TopicMessage> {
        let payload: String = entry.get(PAYLOAD_FIELD)?;
        Some(TopicMessage {
            id: entry.id.clone(),
            key: entry.get(KEY_FIELD),
            payload,
        })
    }
}

#[async_trait]
impl TopicSubscription for RedisStreamSubscription {
    async fn next_batch(&mut self) -> Result<Vec<TopicMessage>, BrokerError> {
        let reply: Option<StreamReadReply> = self
            .conn
            .xread_options(&[self.topic.as_str()], &[self.last_id.as_str()], &self.options)
            .await
            .map_err(unavailable)?;

        let mut batch = Vec::new();
        for stream in reply.map(|r| r.keys).unwrap_or_default() {
            for entry in &stream.ids {
                self.last_id = entry.id.clone();
                match Self::to_message(entry) {
                    Some(message) => batch.push(message),
                    None => tracing::warn!(
                        entry_id = %entry.id,
                        "Stream entry has no payload field, skipping"
                    ),
                }
            }
        }

        Ok(batch)
    }
}
