//! HTTP routes for relay endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{health, produce_event, RelayAppState};

/// Creates the relay router with all endpoints.
pub fn relay_routes() -> Router<RelayAppState> {
    Router::new()
        .route("/produce", post(produce_event))
        .route("/api/log", post(produce_event))
        .route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::broker::InMemoryBroker;
    use crate::adapters::websocket::{ConnectionTracker, DashboardRegistry};
    use crate::application::{BridgeSettings, BrokerBridge, BrokerStatus, IngestEventHandler};
    use crate::config::BrokerMode;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    // ───────────────────────────────────────────────────────────────
    // Test fixtures
    // ───────────────────────────────────────────────────────────────

    fn settings() -> BridgeSettings {
        BridgeSettings {
            topic: "user_events".into(),
            startup_grace: Duration::ZERO,
            publish_timeout: Duration::from_millis(100),
            retry_backoff: Duration::from_millis(10),
        }
    }

    fn state_with(
        bridge: BrokerBridge,
        broker_status: Arc<BrokerStatus>,
        memory_log: Option<Arc<InMemoryBroker>>,
    ) -> RelayAppState {
        RelayAppState {
            ingest: Arc::new(IngestEventHandler::new(Arc::new(bridge))),
            status: broker_status,
            registry: Arc::new(DashboardRegistry::new()),
            connections: Arc::new(ConnectionTracker::new()),
            mode: BrokerMode::Memory,
            outbound_capacity: 8,
            memory_log,
        }
    }

    fn connected_state(broker: Arc<InMemoryBroker>) -> RelayAppState {
        let broker_status = Arc::new(BrokerStatus::new());
        broker_status.set_consumer_ready(true);
        let bridge = BrokerBridge::new(
            broker.clone(),
            broker.clone(),
            broker_status.clone(),
            settings(),
        );
        state_with(bridge, broker_status, Some(broker))
    }

    fn degraded_state() -> RelayAppState {
        let broker_status = Arc::new(BrokerStatus::new());
        let bridge = BrokerBridge::disconnected(broker_status.clone(), settings());
        state_with(bridge, broker_status, None)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // ───────────────────────────────────────────────────────────────
    // POST /produce
    // ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn produce_accepts_camel_case_event() {
        let broker = Arc::new(InMemoryBroker::default());
        let app = relay_routes().with_state(connected_state(broker.clone()));

        let response = app
            .oneshot(post_json(
                "/produce",
                r#"{"eventType":"play","userId":"u1","trackId":"t1"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["eventType"], json!("play"));
        assert_eq!(body["kafka_connected"], json!(true));
        assert!(body["timestamp"].as_str().is_some_and(|t| t.ends_with('Z')));

        let records = broker.records("user_events");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key.as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn produce_succeeds_in_degraded_mode() {
        let app = relay_routes().with_state(degraded_state());

        let response = app
            .oneshot(post_json("/produce", r#"{"event_type":"pause","track_id":"t1"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["kafka_connected"], json!(false));
    }

    #[tokio::test]
    async fn produce_without_event_type_is_bad_request() {
        let broker = Arc::new(InMemoryBroker::default());
        let app = relay_routes().with_state(connected_state(broker.clone()));

        let response = app
            .oneshot(post_json("/produce", r#"{"trackId":"t1"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("Field 'event_type' is required"));
        assert_eq!(broker.record_count("user_events"), 0);
    }

    #[tokio::test]
    async fn produce_with_non_object_body_is_bad_request() {
        let app = relay_routes().with_state(degraded_state());

        let response = app
            .oneshot(post_json("/produce", r#"["play"]"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["success"], json!(false));
    }

    #[tokio::test]
    async fn produce_with_malformed_json_is_bad_request() {
        let app = relay_routes().with_state(degraded_state());

        let response = app
            .oneshot(post_json("/produce", "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["success"], json!(false));
    }

    #[tokio::test]
    async fn api_log_is_an_alias() {
        let broker = Arc::new(InMemoryBroker::default());
        let app = relay_routes().with_state(connected_state(broker.clone()));

        let response = app
            .oneshot(post_json("/api/log", r#"{"event_type":"like","track_id":"t2"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["eventType"], json!("like"));
        assert_eq!(broker.record_count("user_events"), 1);
    }

    // ───────────────────────────────────────────────────────────────
    // GET /health
    // ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn health_reports_counts_and_mode() {
        let state = degraded_state();
        let (tx, _rx) = mpsc::channel(1);
        state
            .registry
            .subscribe(crate::domain::foundation::ChannelId::new(), tx)
            .await;
        let _guard = state.connections.open();

        let app = relay_routes().with_state(state);
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], json!("healthy"));
        assert_eq!(body["connected_clients"], json!(1));
        assert_eq!(body["dashboard_clients"], json!(1));
        assert_eq!(body["kafka_connected"], json!(false));
        assert_eq!(body["mode"], json!("memory"));
        assert!(body.get("total_events").is_none());
    }

    #[tokio::test]
    async fn health_reports_retained_events_in_memory_mode() {
        let broker = Arc::new(InMemoryBroker::new(2));
        let app = relay_routes().with_state(connected_state(broker));

        for track in ["t1", "t2", "t3"] {
            let body = format!(r#"{{"event_type":"play","track_id":"{}"}}"#, track);
            let response = app.clone().oneshot(post_json("/produce", &body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["mode"], json!("memory"));
        assert_eq!(body["total_events"], json!(2));
    }
}
