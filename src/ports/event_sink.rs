//! EventSink port - Where the consume loop hands off each event.

use async_trait::async_trait;

use crate::domain::events::Event;

/// Receiver of events read back from the topic.
///
/// Implementations should be:
/// - **Quick** - the consume loop awaits each delivery in order
/// - **Isolated** - a failing downstream must not fail the delivery
///
/// # Example
///
/// ```ignore
/// struct DashboardFanout { registry: Arc<DashboardRegistry> }
///
/// #[async_trait]
/// impl EventSink for DashboardFanout {
///     async fn deliver(&self, event: Event) -> usize {
///         self.registry.broadcast(&event).await
///     }
///
///     fn name(&self) -> &'static str {
///         "DashboardFanout"
///     }
/// }
/// ```
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one event, returning how many recipients accepted it.
    async fn deliver(&self, event: Event) -> usize;

    /// Sink name for logging.
    fn name(&self) -> &'static str;
}
