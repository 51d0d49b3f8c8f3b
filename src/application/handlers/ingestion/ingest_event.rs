//! IngestEventHandler - Command handler shared by both ingestion transports.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::application::BrokerBridge;
use crate::domain::events::{normalize_event, Event, NormalizeError};
use crate::domain::foundation::{Clock, DomainError, ErrorCode, SystemClock};
use crate::ports::BrokerError;

/// Which entry point an event arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Http,
    PushChannel,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Http => write!(f, "http"),
            Transport::PushChannel => write!(f, "push_channel"),
        }
    }
}

/// Command to ingest one raw event payload.
#[derive(Debug, Clone)]
pub struct IngestEventCommand {
    pub payload: Value,
    pub transport: Transport,
}

/// Result of a successful ingestion.
#[derive(Debug, Clone)]
pub struct IngestEventResult {
    /// The normalized, stamped event as it was handed to the broker.
    pub event: Event,
    /// Whether the broker accepted the event. `false` means degraded mode.
    pub streamed: bool,
}

/// Errors that fail an ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] NormalizeError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<IngestError> for DomainError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Validation(NormalizeError::Validation(e)) => e.into(),
            IngestError::Validation(e) => DomainError::new(ErrorCode::ValidationFailed, e.to_string()),
            IngestError::Internal(msg) => DomainError::new(ErrorCode::InternalError, msg),
        }
    }
}

/// Handler for ingesting events.
///
/// Normalizes, stamps, then publishes best-effort: a broker that is down
/// or slow never fails the ingestion.
pub struct IngestEventHandler {
    bridge: Arc<BrokerBridge>,
    clock: Arc<dyn Clock>,
}

impl IngestEventHandler {
    pub fn new(bridge: Arc<BrokerBridge>) -> Self {
        Self::with_clock(bridge, Arc::new(SystemClock))
    }

    pub fn with_clock(bridge: Arc<BrokerBridge>, clock: Arc<dyn Clock>) -> Self {
        Self { bridge, clock }
    }

    pub fn bridge(&self) -> &Arc<BrokerBridge> {
        &self.bridge
    }

    pub async fn handle(&self, cmd: IngestEventCommand) -> Result<IngestEventResult, IngestError> {
        // 1. Validate and normalize; nothing reaches the broker on failure
        let mut event = normalize_event(cmd.payload)?;

        // 2. Gateway-owned metadata
        event.stamp(self.clock.now());

        tracing::info!(
            event_type = %event.event_type,
            user_id = event.partition_key(),
            transport = %cmd.transport,
            "Logging event"
        );

        // 3. Publish best-effort
        let streamed = match self.bridge.publish(&event).await {
            Ok(_) => true,
            Err(BrokerError::Serialization(reason)) => return Err(IngestError::Internal(reason)),
            Err(_) => false,
        };

        Ok(IngestEventResult { event, streamed })
    }
}
