//! WebSocket upgrade handler for the push channel.
//!
//! Handles the HTTP → WebSocket upgrade and manages the connection lifecycle:
//! 1. Upgrade to WebSocket and assign a channel id
//! 2. Spawn a writer task draining the channel's outbound queue
//! 3. Dispatch client frames until disconnect
//! 4. Leave the dashboard set

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::application::{IngestEventCommand, IngestEventHandler, Transport};
use crate::domain::foundation::{ChannelId, DomainError, ErrorCode};

use super::{
    connections::ConnectionTracker,
    messages::{
        AckMessage, ClientMessage, ErrorMessage, EventLoggedMessage, PongMessage, ServerMessage,
    },
    registry::{DashboardRegistry, Outbound},
};

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub registry: Arc<DashboardRegistry>,
    pub ingest: Arc<IngestEventHandler>,
    pub connections: Arc<ConnectionTracker>,
    /// Outbound queue size per connection.
    pub outbound_capacity: usize,
}

/// One connected client: its id, its outbound queue, and the services
/// its messages are dispatched to.
pub struct ChannelSession {
    channel_id: ChannelId,
    outbound: Outbound,
    registry: Arc<DashboardRegistry>,
    ingest: Arc<IngestEventHandler>,
}

impl ChannelSession {
    pub fn new(
        channel_id: ChannelId,
        outbound: Outbound,
        registry: Arc<DashboardRegistry>,
        ingest: Arc<IngestEventHandler>,
    ) -> Self {
        Self {
            channel_id,
            outbound,
            registry,
            ingest,
        }
    }

    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    /// Parse and dispatch one text frame, returning the reply.
    pub async fn handle_frame(&self, text: &str) -> ServerMessage {
        match text.parse::<ClientMessage>() {
            Ok(message) => self.dispatch(message).await,
            Err(e) => {
                tracing::debug!(channel_id = %self.channel_id, error = %e, "Rejected frame");
                let err = DomainError::new(ErrorCode::InvalidMessage, e.to_string());
                ServerMessage::Error(ErrorMessage::from(err))
            }
        }
    }

    pub async fn dispatch(&self, message: ClientMessage) -> ServerMessage {
        match message {
            ClientMessage::LogEvent(payload) => self.log_event(payload).await,
            ClientMessage::JoinDashboard => {
                self.registry
                    .subscribe(self.channel_id, self.outbound.clone())
                    .await;
                ServerMessage::DashboardJoined(AckMessage::ok())
            }
            ClientMessage::LeaveDashboard => {
                self.registry.unsubscribe(&self.channel_id).await;
                ServerMessage::DashboardLeft(AckMessage::ok())
            }
            ClientMessage::Ping => {
                tracing::trace!(channel_id = %self.channel_id, "Received ping");
                ServerMessage::Pong(PongMessage::now())
            }
        }
    }

    async fn log_event(&self, payload: Value) -> ServerMessage {
        let cmd = IngestEventCommand {
            payload,
            transport: Transport::PushChannel,
        };

        match self.ingest.handle(cmd).await {
            Ok(result) => {
                let event_type = result.event.event_type.to_string();
                ServerMessage::EventLogged(EventLoggedMessage::logged(event_type))
            }
            Err(e) => {
                tracing::warn!(channel_id = %self.channel_id, error = %e, "Event rejected");
                ServerMessage::EventLogged(EventLoggedMessage::failed(e.to_string()))
            }
        }
    }

    /// Queue a reply behind any pending broadcasts.
    async fn reply(&self, message: ServerMessage) -> bool {
        self.outbound.send(message).await.is_ok()
    }

    /// Leave the dashboard set, if joined.
    async fn close(&self) {
        self.registry.unsubscribe(&self.channel_id).await;
    }
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<WebSocketState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection.
///
/// Runs for the lifetime of the connection.
async fn handle_socket(socket: WebSocket, state: WebSocketState) {
    let (mut sender, mut receiver) = socket.split();
    let channel_id = ChannelId::new();
    let _counted = state.connections.open();

    tracing::info!(channel_id = %channel_id, "Client connected");

    let (outbound, mut queue) = mpsc::channel::<ServerMessage>(state.outbound_capacity);

    // Writer: drains the queue so broadcasts never wait on the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(message) = queue.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(channel_id = %channel_id, error = %e, "Unserializable message");
                    continue;
                }
            };
            if let Err(e) = sender.send(Message::Text(text)).await {
                tracing::debug!(channel_id = %channel_id, "Send error, closing connection: {}", e);
                break;
            }
        }
    });

    let session = Arc::new(ChannelSession::new(
        channel_id,
        outbound,
        state.registry.clone(),
        state.ingest.clone(),
    ));

    let reader = session.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    let reply = reader.handle_frame(&text).await;
                    if !reader.reply(reply).await {
                        break;
                    }
                }
                Ok(Message::Binary(_)) => {
                    tracing::warn!(channel_id = %channel_id, "Received unsupported binary message");
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!(channel_id = %channel_id, "Client sent close frame");
                    break;
                }
                // WebSocket protocol ping/pong - handled automatically by axum
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(channel_id = %channel_id, "Receive error: {}", e);
                    break;
                }
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    session.close().await;
    tracing::info!(channel_id = %channel_id, "Client disconnected");
}

/// Create axum router for the WebSocket endpoint.
pub fn websocket_router() -> axum::Router<WebSocketState> {
    use axum::routing::get;

    axum::Router::new().route("/ws", get(ws_handler))
}
