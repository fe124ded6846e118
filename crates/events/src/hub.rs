//! Realtime messaging hub.
//!
//! Holds at most one live connection per user and the subscriber set of every
//! `conversation:{id}` channel. Both maps sit behind a single lock. Frames are
//! pushed onto a bounded per-user queue that the connection's writer task
//! drains in FIFO order; broadcasts snapshot the targets under the lock and
//! enqueue outside it.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::Utc;
use fitup_core::messaging::HubEvent;
use fitup_core::types::Timestamp;
use futures::future::join_all;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Frames buffered per user before sends start failing.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// How long [`Hub::close`] waits for writers to flush their queues.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Close reasons sent to clients.
pub mod close_reason {
    pub const REPLACED: &str = "replaced";
    pub const DISCONNECTED: &str = "disconnected";
    pub const SHUTDOWN: &str = "shutdown";
}

/// A frame queued for one connection's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubFrame {
    /// Serialized [`HubEvent`] JSON.
    Text(String),
    Ping,
    /// Close the socket with this reason; the writer stops after sending it.
    Close(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("realtime hub is shutting down")]
    ShuttingDown,
}

/// Handed to the connection task on [`Hub::connect`].
#[derive(Debug)]
pub struct Registration {
    pub connection_id: Uuid,
    pub receiver: mpsc::Receiver<HubFrame>,
}

struct Connection {
    id: Uuid,
    sender: mpsc::Sender<HubFrame>,
    connected_at: Timestamp,
}

#[derive(Default)]
struct HubState {
    connections: HashMap<String, Connection>,
    channels: HashMap<String, HashSet<String>>,
    closed: bool,
}

impl HubState {
    fn leave_all_channels(&mut self, user_id: &str) {
        self.channels.retain(|_, members| {
            members.remove(user_id);
            !members.is_empty()
        });
    }
}

pub struct Hub {
    state: RwLock<HubState>,
    queue_capacity: usize,
}

impl Hub {
    pub fn new() -> Self {
        Self::with_queue_capacity(OUTBOUND_QUEUE_CAPACITY)
    }

    pub fn with_queue_capacity(queue_capacity: usize) -> Self {
        Self {
            state: RwLock::new(HubState::default()),
            queue_capacity: queue_capacity.max(1),
        }
    }

    // -----------------------------------------------------------------------
    // Connections
    // -----------------------------------------------------------------------

    /// Register the live connection of `user_id`, evicting any previous one
    /// with a `"replaced"` close. Channel subscriptions carry over.
    pub async fn connect(&self, user_id: &str) -> Result<Registration, ConnectError> {
        let (sender, receiver) = mpsc::channel(self.queue_capacity);
        let connection = Connection {
            id: Uuid::new_v4(),
            sender,
            connected_at: Utc::now(),
        };
        let connection_id = connection.id;

        let mut state = self.state.write().await;
        if state.closed {
            return Err(ConnectError::ShuttingDown);
        }
        if let Some(previous) = state.connections.insert(user_id.to_string(), connection) {
            let _ = previous
                .sender
                .try_send(HubFrame::Close(close_reason::REPLACED.to_string()));
            tracing::info!(
                user_id,
                previous_connection = %previous.id,
                connected_for_secs = (Utc::now() - previous.connected_at).num_seconds(),
                "Realtime connection replaced"
            );
        }
        Ok(Registration {
            connection_id,
            receiver,
        })
    }

    /// Remove the user's connection and all of their subscriptions.
    ///
    /// Returns whether a connection was registered.
    pub async fn disconnect(&self, user_id: &str) -> bool {
        let mut state = self.state.write().await;
        state.leave_all_channels(user_id);
        match state.connections.remove(user_id) {
            Some(connection) => {
                let _ = connection
                    .sender
                    .try_send(HubFrame::Close(close_reason::DISCONNECTED.to_string()));
                true
            }
            None => false,
        }
    }

    /// Disconnect only if `connection_id` is still the user's live connection.
    ///
    /// Connection tasks call this on exit so an evicted socket never tears
    /// down its replacement.
    pub async fn disconnect_connection(&self, user_id: &str, connection_id: Uuid) -> bool {
        let mut state = self.state.write().await;
        if state
            .connections
            .get(user_id)
            .is_none_or(|c| c.id != connection_id)
        {
            return false;
        }
        state.connections.remove(user_id);
        state.leave_all_channels(user_id);
        true
    }

    pub async fn is_connected(&self, user_id: &str) -> bool {
        self.state.read().await.connections.contains_key(user_id)
    }

    pub async fn connection_count(&self) -> usize {
        self.state.read().await.connections.len()
    }

    // -----------------------------------------------------------------------
    // Channels
    // -----------------------------------------------------------------------

    /// Returns `true` if the user was not already subscribed.
    pub async fn subscribe(&self, user_id: &str, channel: &str) -> bool {
        self.state
            .write()
            .await
            .channels
            .entry(channel.to_string())
            .or_default()
            .insert(user_id.to_string())
    }

    /// Returns `true` if the user was subscribed.
    pub async fn unsubscribe(&self, user_id: &str, channel: &str) -> bool {
        let mut state = self.state.write().await;
        let Some(members) = state.channels.get_mut(channel) else {
            return false;
        };
        let removed = members.remove(user_id);
        if members.is_empty() {
            state.channels.remove(channel);
        }
        removed
    }

    pub async fn is_subscribed(&self, user_id: &str, channel: &str) -> bool {
        self.state
            .read()
            .await
            .channels
            .get(channel)
            .is_some_and(|members| members.contains(user_id))
    }

    /// Subscribers of `channel`, sorted.
    pub async fn subscribers(&self, channel: &str) -> Vec<String> {
        let mut members: Vec<String> = self
            .state
            .read()
            .await
            .channels
            .get(channel)
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default();
        members.sort();
        members
    }

    // -----------------------------------------------------------------------
    // Delivery
    // -----------------------------------------------------------------------

    /// Enqueue `event` for every connected subscriber of `channel`.
    ///
    /// A subscriber whose queue is full or closed is dropped from the
    /// channel. Returns the number of connections the event was queued for.
    pub async fn broadcast_to_channel(&self, channel: &str, event: &HubEvent) -> usize {
        let targets: Vec<(String, Uuid, mpsc::Sender<HubFrame>)> = {
            let state = self.state.read().await;
            let Some(members) = state.channels.get(channel) else {
                return 0;
            };
            members
                .iter()
                .filter_map(|user_id| {
                    state
                        .connections
                        .get(user_id)
                        .map(|c| (user_id.clone(), c.id, c.sender.clone()))
                })
                .collect()
        };

        let text = event.to_json();
        let mut delivered = 0;
        let mut failed = Vec::new();
        for (user_id, connection_id, sender) in targets {
            match sender.try_send(HubFrame::Text(text.clone())) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    let closed = matches!(e, TrySendError::Closed(_));
                    tracing::warn!(
                        user_id = %user_id,
                        channel,
                        closed,
                        "Dropping subscriber after failed send"
                    );
                    failed.push((user_id, connection_id, closed));
                }
            }
        }

        if !failed.is_empty() {
            let mut state = self.state.write().await;
            for (user_id, connection_id, closed) in failed {
                if let Some(members) = state.channels.get_mut(channel) {
                    members.remove(&user_id);
                    if members.is_empty() {
                        state.channels.remove(channel);
                    }
                }
                let dead = closed
                    && state
                        .connections
                        .get(&user_id)
                        .is_some_and(|c| c.id == connection_id);
                if dead {
                    state.connections.remove(&user_id);
                }
            }
        }
        delivered
    }

    /// Enqueue `event` for one user. Returns whether it was queued.
    pub async fn send_to_user(&self, user_id: &str, event: &HubEvent) -> bool {
        let sender = match self.state.read().await.connections.get(user_id) {
            Some(c) => c.sender.clone(),
            None => return false,
        };
        match sender.try_send(HubFrame::Text(event.to_json())) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Direct send failed");
                false
            }
        }
    }

    /// Queue a ping on every connection. Returns how many accepted it.
    pub async fn ping_all(&self) -> usize {
        let state = self.state.read().await;
        state
            .connections
            .values()
            .filter(|c| c.sender.try_send(HubFrame::Ping).is_ok())
            .count()
    }

    // -----------------------------------------------------------------------
    // Shutdown
    // -----------------------------------------------------------------------

    /// Stop accepting connections, queue a close on every connection and wait
    /// up to [`DRAIN_TIMEOUT`] for the writers to flush.
    pub async fn close(&self) -> usize {
        self.close_with_timeout(DRAIN_TIMEOUT).await
    }

    pub async fn close_with_timeout(&self, timeout: Duration) -> usize {
        let connections = {
            let mut state = self.state.write().await;
            state.closed = true;
            state.channels.clear();
            std::mem::take(&mut state.connections)
        };
        let count = connections.len();

        let drains = connections.into_values().map(|connection| async move {
            let close = HubFrame::Close(close_reason::SHUTDOWN.to_string());
            if connection.sender.send(close).await.is_ok() {
                connection.sender.closed().await;
            }
        });
        match tokio::time::timeout(timeout, join_all(drains)).await {
            Ok(_) => tracing::info!(count, "Realtime hub drained"),
            Err(_) => tracing::warn!(count, ?timeout, "Realtime hub drain timed out"),
        }
        count
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
