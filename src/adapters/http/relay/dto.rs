//! HTTP DTOs for relay endpoints.
//!
//! Field names mirror what existing clients already parse, including the
//! camelCase `eventType` on the produce response and `kafka_connected`
//! for broker health.

use serde::Serialize;

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Response for an accepted event.
#[derive(Debug, Clone, Serialize)]
pub struct ProduceResponse {
    pub success: bool,
    #[serde(rename = "eventType")]
    pub event_type: String,
    /// Time the gateway stamped the event.
    pub timestamp: String,
    /// Whether the event is expected to reach dashboards.
    pub kafka_connected: bool,
}

/// Health snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub connected_clients: usize,
    pub dashboard_clients: usize,
    pub kafka_connected: bool,
    /// Which broker backs the topic (`redis` or `memory`).
    pub mode: &'static str,
    /// Records retained by the in-memory broker. Absent for Redis.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_events: Option<usize>,
}

/// Error response for failed requests.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}
