//! Event bridge connecting the consume loop to dashboard channels.
//!
//! # Event Flow
//!
//! ```text
//! BrokerBridge::consume_loop
//!          │ deliver(event)
//!          ▼
//! ┌────────────────────┐
//! │  DashboardFanout   │
//! └────────────────────┘
//!          │ broadcast
//!          ▼
//! ┌────────────────────┐
//! │ DashboardRegistry  │ ──▶ new_event on every subscribed channel
//! └────────────────────┘
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::events::Event;
use crate::ports::EventSink;

use super::registry::DashboardRegistry;

/// Sink that fans every event out to all dashboard channels.
pub struct DashboardFanout {
    registry: Arc<DashboardRegistry>,
}

impl DashboardFanout {
    pub fn new(registry: Arc<DashboardRegistry>) -> Self {
        Self { registry }
    }

    /// Create as an Arc (for handing to the consume loop).
    pub fn new_shared(registry: Arc<DashboardRegistry>) -> Arc<Self> {
        Arc::new(Self::new(registry))
    }
}

#[async_trait]
impl EventSink for DashboardFanout {
    async fn deliver(&self, event: Event) -> usize {
        let delivered = self.registry.broadcast(&event).await;
        tracing::debug!(
            event_type = %event.event_type,
            delivered,
            "Event fanned out to dashboards"
        );
        delivered
    }

    fn name(&self) -> &'static str {
        "DashboardFanout"
    }
}
