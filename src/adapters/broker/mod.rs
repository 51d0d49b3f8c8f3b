//! Broker adapters.
//!
//! Implementations of the topic producer and consumer ports:
//!
//! - `RedisStreamBroker` - Redis Streams, for production
//! - `InMemoryBroker` - In-process log, for tests and broker-less runs

mod in_memory;
mod redis_streams;

pub use in_memory::{InMemoryBroker, InMemorySubscription, DEFAULT_RETENTION};
pub use redis_streams::{RedisStreamBroker, RedisStreamSubscription};
