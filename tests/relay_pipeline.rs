//! End-to-end tests for the relay pipeline over the in-memory broker.
//!
//! These tests wire the real components together:
//! 1. HTTP ingestion publishes to the topic
//! 2. The consume loop reads the topic back and re-normalizes
//! 3. Every joined dashboard channel receives the event

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tower::ServiceExt;

use neo_analytics::adapters::http::app_router;
use neo_analytics::adapters::websocket::ServerMessage;
use neo_analytics::adapters::{
    ConnectionTracker, DashboardFanout, DashboardRegistry, InMemoryBroker, RelayAppState,
};
use neo_analytics::application::{
    BridgeSettings, BrokerBridge, BrokerStatus, IngestEventCommand, IngestEventHandler, Transport,
};
use neo_analytics::config::BrokerMode;
use neo_analytics::domain::context::{ScrubDirection, SessionContext};
use neo_analytics::domain::events::{Event, EventType};
use neo_analytics::domain::foundation::ChannelId;

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Relay {
    broker: Arc<InMemoryBroker>,
    status: Arc<BrokerStatus>,
    registry: Arc<DashboardRegistry>,
    ingest: Arc<IngestEventHandler>,
    consumer: JoinHandle<()>,
}

impl Relay {
    /// Starts the consume loop and waits until it is subscribed.
    async fn start() -> Self {
        let broker = Arc::new(InMemoryBroker::default());
        let status = Arc::new(BrokerStatus::new());
        let settings = BridgeSettings {
            topic: "user_events".into(),
            startup_grace: Duration::ZERO,
            publish_timeout: Duration::from_millis(500),
            retry_backoff: Duration::from_millis(10),
        };
        let bridge = Arc::new(BrokerBridge::new(
            broker.clone(),
            broker.clone(),
            status.clone(),
            settings,
        ));
        let registry = Arc::new(DashboardRegistry::new());
        let consumer = bridge.spawn_consume_loop(DashboardFanout::new_shared(registry.clone()));

        for _ in 0..200 {
            if status.consumer_ready() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(status.is_connected(), "consume loop never subscribed");

        Self {
            broker,
            status,
            registry,
            ingest: Arc::new(IngestEventHandler::new(bridge)),
            consumer,
        }
    }

    async fn join_dashboard(&self) -> mpsc::Receiver<ServerMessage> {
        let (tx, rx) = mpsc::channel(16);
        self.registry.subscribe(ChannelId::new(), tx).await;
        rx
    }

    fn app(&self) -> axum::Router {
        let state = RelayAppState {
            ingest: self.ingest.clone(),
            status: self.status.clone(),
            registry: self.registry.clone(),
            connections: Arc::new(ConnectionTracker::new()),
            mode: BrokerMode::Memory,
            outbound_capacity: 16,
            memory_log: Some(self.broker.clone()),
        };
        app_router(state, &[])
    }
}

impl Drop for Relay {
    fn drop(&mut self) {
        self.consumer.abort();
    }
}

async fn next_event(rx: &mut mpsc::Receiver<ServerMessage>) -> Event {
    match tokio::time::timeout(Duration::from_secs(2), rx.recv()).await {
        Ok(Some(ServerMessage::NewEvent(event))) => event,
        other => panic!("Expected NewEvent, got {:?}", other),
    }
}

fn produce(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/produce")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn http_event_reaches_every_dashboard_normalized() {
    let relay = Relay::start().await;
    let mut first = relay.join_dashboard().await;
    let mut second = relay.join_dashboard().await;

    let response = relay
        .app()
        .oneshot(produce(&json!({"eventType": "play", "userId": "u1", "trackId": "t1"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    for rx in [&mut first, &mut second] {
        let event = next_event(rx).await;
        let json = event.to_json().unwrap();
        assert_eq!(json["event_type"], json!("play"));
        assert_eq!(json["user_id"], json!("u1"));
        assert_eq!(json["track_id"], json!("t1"));
        assert!(json.get("eventType").is_none());
        assert!(json.get("userId").is_none());
    }

    assert_eq!(relay.broker.record_count("user_events"), 1);
}

#[tokio::test]
async fn disconnected_dashboard_does_not_block_others() {
    let relay = Relay::start().await;
    let mut live = relay.join_dashboard().await;
    let gone = relay.join_dashboard().await;
    drop(gone);

    relay
        .ingest
        .handle(IngestEventCommand {
            payload: json!({"event_type": "pause", "track_id": "t1"}),
            transport: Transport::PushChannel,
        })
        .await
        .unwrap();

    assert_eq!(next_event(&mut live).await.event_type, EventType::Pause);
}

#[tokio::test]
async fn enriched_context_survives_the_round_trip() {
    let relay = Relay::start().await;
    let mut dashboard = relay.join_dashboard().await;

    let mut session = SessionContext::new();
    session.track_started("t1");
    let scrub = session.scrub_context(10.0, 25.0);
    let event = Event::new(EventType::Scrub, "t1")
        .with_user_id("u1")
        .with_context(scrub);

    relay
        .ingest
        .handle(IngestEventCommand {
            payload: event.to_json().unwrap(),
            transport: Transport::Http,
        })
        .await
        .unwrap();

    let received = next_event(&mut dashboard).await;
    let json = received.to_json().unwrap();
    assert_eq!(json["scrub_context"]["scrub_direction"], json!("forward"));
    assert_eq!(json["scrub_context"]["scrub_distance"], json!(15.0));
    assert_eq!(json["scrub_context"]["was_playing_before_scrub"], json!(true));

    // Direction is also typed on the decoded event
    match received.context {
        Some(neo_analytics::domain::context::EventContext::Scrub(ctx)) => {
            assert_eq!(ctx.scrub_direction, ScrubDirection::Forward);
        }
        other => panic!("Expected scrub context, got {:?}", other),
    }
}

#[tokio::test]
async fn events_published_before_subscribe_are_not_replayed() {
    let relay = Relay::start().await;
    let mut witness = relay.join_dashboard().await;

    relay
        .ingest
        .handle(IngestEventCommand {
            payload: json!({"event_type": "like", "track_id": "t1"}),
            transport: Transport::Http,
        })
        .await
        .unwrap();
    assert_eq!(next_event(&mut witness).await.track_id, "t1");

    // Joining later only sees what comes after
    let mut late = relay.join_dashboard().await;
    assert!(late.try_recv().is_err());

    relay
        .ingest
        .handle(IngestEventCommand {
            payload: json!({"event_type": "skip", "track_id": "t2"}),
            transport: Transport::Http,
        })
        .await
        .unwrap();

    assert_eq!(next_event(&mut late).await.track_id, "t2");
}

#[tokio::test]
async fn invalid_event_is_rejected_before_the_topic() {
    let relay = Relay::start().await;

    let response = relay
        .app()
        .oneshot(produce(&json!({"userId": "u1", "trackId": "t1"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(relay.broker.record_count("user_events"), 0);
}
