//! Shared broker health flag.

use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide view of whether events are reaching observers.
///
/// The producer half is set by publishes, the consumer half by the
/// consume loop. Either half being down means degraded mode: ingestion
/// keeps succeeding, streaming to dashboards does not.
#[derive(Debug, Default)]
pub struct BrokerStatus {
    producer_ready: AtomicBool,
    consumer_ready: AtomicBool,
}

impl BrokerStatus {
    /// Starts degraded until the broker proves reachable.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_producer_ready(&self, ready: bool) {
        let was = self.producer_ready.swap(ready, Ordering::SeqCst);
        if was != ready {
            tracing::info!(ready, "Broker producer status changed");
        }
    }

    pub fn set_consumer_ready(&self, ready: bool) {
        let was = self.consumer_ready.swap(ready, Ordering::SeqCst);
        if was != ready {
            tracing::info!(ready, "Broker consumer status changed");
        }
    }

    pub fn producer_ready(&self) -> bool {
        self.producer_ready.load(Ordering::SeqCst)
    }

    pub fn consumer_ready(&self) -> bool {
        self.consumer_ready.load(Ordering::SeqCst)
    }

    /// Both directions of the broker are working.
    pub fn is_connected(&self) -> bool {
        self.producer_ready() && self.consumer_ready()
    }

    pub fn is_degraded(&self) -> bool {
        !self.is_connected()
    }
}
