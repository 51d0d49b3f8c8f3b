//! WebSocket adapters for the push channel.
//!
//! One persistent connection per client carries both directions:
//! events logged by the client, and live events pushed to dashboards.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    BrokerBridge::consume_loop                        │
//! │   RedisStreamBroker (production) │ InMemoryBroker (test, no-broker) │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ deliver
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        DashboardFanout                               │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ broadcast (try_send)
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      DashboardRegistry                               │
//! │   channel-a queue      channel-b queue      channel-c queue         │
//! │   └── writer task      └── writer task      └── writer task         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`messages`] - WebSocket message protocol types
//! - [`registry`] - Dashboard subscriber set
//! - [`handler`] - Axum WebSocket upgrade handler and frame dispatch
//! - [`event_bridge`] - Sink from the consume loop into the registry
//! - [`connections`] - Open connection counter

pub mod connections;
pub mod event_bridge;
pub mod handler;
pub mod messages;
pub mod registry;

pub use connections::{ConnectionGuard, ConnectionTracker};
pub use event_bridge::DashboardFanout;
pub use handler::{websocket_router, ws_handler, ChannelSession, WebSocketState};
pub use messages::{
    AckMessage, ClientMessage, ErrorMessage, EventLoggedMessage, FrameError, PongMessage,
    ServerMessage,
};
pub use registry::{DashboardRegistry, Outbound};
