//! Dashboard subscriber registry.
//!
//! Tracks which push channels want every event read back from the topic:
//!
//! ```text
//! DashboardRegistry
//! ├── channel-a ── mpsc ──▶ writer task ──▶ socket
//! ├── channel-b ── mpsc ──▶ writer task ──▶ socket
//! └── channel-c ── mpsc ──▶ (closed, pruned on next broadcast)
//! ```
//!
//! Each channel owns a bounded outbound queue drained by its own writer
//! task, so a broadcast is a set of independent non-blocking pushes.

use std::collections::HashMap;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::RwLock;

use crate::domain::events::Event;
use crate::domain::foundation::ChannelId;

use super::messages::ServerMessage;

/// Sending half of a channel's outbound queue.
pub type Outbound = mpsc::Sender<ServerMessage>;

/// Set of channels subscribed to the live event stream.
///
/// # Thread Safety
///
/// Uses `RwLock` since broadcasts (reads) vastly outnumber joins and
/// leaves (writes).
#[derive(Default)]
pub struct DashboardRegistry {
    channels: RwLock<HashMap<ChannelId, Outbound>>,
}

impl DashboardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a channel. Subscribing twice replaces the previous queue.
    pub async fn subscribe(&self, channel_id: ChannelId, outbound: Outbound) {
        self.channels.write().await.insert(channel_id, outbound);
        tracing::info!(channel_id = %channel_id, "Dashboard client joined");
    }

    /// Remove a channel. Returns whether it was subscribed.
    pub async fn unsubscribe(&self, channel_id: &ChannelId) -> bool {
        let removed = self.channels.write().await.remove(channel_id).is_some();
        if removed {
            tracing::info!(channel_id = %channel_id, "Dashboard client left");
        }
        removed
    }

    /// Push `event` to every subscribed channel.
    ///
    /// Never waits on a slow observer: a full queue drops the event for
    /// that channel only, and a closed queue is pruned. Returns the number
    /// of channels that accepted the event.
    pub async fn broadcast(&self, event: &Event) -> usize {
        let message = ServerMessage::NewEvent(event.clone());
        let mut delivered = 0;
        let mut closed = Vec::new();

        {
            let channels = self.channels.read().await;
            for (channel_id, outbound) in channels.iter() {
                match outbound.try_send(message.clone()) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(
                            channel_id = %channel_id,
                            "Dashboard queue full, dropping event"
                        );
                    }
                    Err(TrySendError::Closed(_)) => closed.push(*channel_id),
                }
            }
        }

        if !closed.is_empty() {
            let mut channels = self.channels.write().await;
            for channel_id in &closed {
                channels.remove(channel_id);
                tracing::debug!(channel_id = %channel_id, "Pruned closed dashboard channel");
            }
        }

        delivered
    }

    /// Number of channels currently subscribed.
    pub async fn subscriber_count(&self) -> usize {
        self.channels.read().await.len()
    }

    pub async fn is_subscribed(&self, channel_id: &ChannelId) -> bool {
        self.channels.read().await.contains_key(channel_id)
    }
}
