//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the application to external systems:
//! - `broker` - Topic producer/consumer implementations (Redis Streams, in-memory)
//! - `http` - REST endpoints and the application router
//! - `websocket` - Push channel and dashboard fan-out

pub mod broker;
pub mod http;
pub mod websocket;

pub use broker::{InMemoryBroker, RedisStreamBroker};
pub use http::{app_router, RelayAppState};
pub use websocket::{ConnectionTracker, DashboardFanout, DashboardRegistry};
