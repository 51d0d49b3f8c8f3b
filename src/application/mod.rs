//! Application layer - Commands, Handlers, and the broker bridge.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Transports (HTTP, push channel) call into handlers here; handlers never
//! know which transport they serve.

mod broker_bridge;
mod broker_status;
pub mod handlers;

pub use broker_bridge::{BridgeSettings, BrokerBridge, MalformedMessage};
pub use broker_status::BrokerStatus;
pub use handlers::{
    IngestError, IngestEventCommand, IngestEventHandler, IngestEventResult, Transport,
};
