//! HTTP handlers for relay endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::adapters::broker::InMemoryBroker;
use crate::adapters::websocket::{ConnectionTracker, DashboardRegistry, WebSocketState};
use crate::application::{
    BrokerStatus, IngestError, IngestEventCommand, IngestEventHandler, Transport,
};
use crate::config::BrokerMode;
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};

use super::dto::{ErrorResponse, HealthResponse, ProduceResponse};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

/// Everything the HTTP and WebSocket entry points share.
#[derive(Clone)]
pub struct RelayAppState {
    pub ingest: Arc<IngestEventHandler>,
    pub status: Arc<BrokerStatus>,
    pub registry: Arc<DashboardRegistry>,
    pub connections: Arc<ConnectionTracker>,
    pub mode: BrokerMode,
    pub outbound_capacity: usize,
    /// The in-memory broker, when it backs the topic.
    pub memory_log: Option<Arc<InMemoryBroker>>,
}

impl RelayAppState {
    /// State for the push-channel router.
    pub fn websocket(&self) -> WebSocketState {
        WebSocketState {
            registry: self.registry.clone(),
            ingest: self.ingest.clone(),
            connections: self.connections.clone(),
            outbound_capacity: self.outbound_capacity,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /produce - Log one event
///
/// Also mounted at POST /api/log.
pub async fn produce_event(
    State(state): State<RelayAppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected request body");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(rejection.body_text())),
            )
                .into_response();
        }
    };

    let cmd = IngestEventCommand {
        payload,
        transport: Transport::Http,
    };

    match state.ingest.handle(cmd).await {
        Ok(result) => {
            let response = ProduceResponse {
                success: true,
                event_type: result.event.event_type.to_string(),
                timestamp: result.event.server_timestamp.unwrap_or_default(),
                kafka_connected: state.status.is_connected(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_ingest_error(e),
    }
}

/// GET /health - Liveness and fan-out snapshot
pub async fn health(State(state): State<RelayAppState>) -> Response {
    let response = HealthResponse {
        status: "healthy",
        timestamp: Timestamp::now().to_iso_string(),
        connected_clients: state.connections.count(),
        dashboard_clients: state.registry.subscriber_count().await,
        kafka_connected: state.status.is_connected(),
        mode: state.mode.as_str(),
        total_events: state
            .memory_log
            .as_ref()
            .map(|log| log.record_count(state.ingest.bridge().topic())),
    };
    (StatusCode::OK, Json(response)).into_response()
}

// ════════════════════════════════════════════════════════════════════════════
// Error mapping
// ════════════════════════════════════════════════════════════════════════════

fn handle_ingest_error(error: IngestError) -> Response {
    let error = DomainError::from(error);
    let status = match error.code {
        ErrorCode::ValidationFailed | ErrorCode::InvalidMessage => {
            tracing::debug!(error = %error, "Event failed validation");
            StatusCode::BAD_REQUEST
        }
        ErrorCode::InternalError => {
            tracing::error!(error = %error, "Event ingestion failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorResponse::new(error.message))).into_response()
}
