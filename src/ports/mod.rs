//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Broker Ports
//!
//! - `TopicProducer` - Append serialized events to the topic
//! - `TopicConsumer` / `TopicSubscription` - Tail the topic from "now"
//!
//! ## Delivery Ports
//!
//! - `EventSink` - Receives every event the consume loop reads back

mod event_sink;
mod topic_consumer;
mod topic_producer;

pub use event_sink::EventSink;
pub use topic_consumer::{TopicConsumer, TopicMessage, TopicSubscription};
pub use topic_producer::{BrokerError, TopicProducer, TopicRecord};
