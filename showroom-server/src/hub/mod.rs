//! Connection registry: live dashboard fan-out
//!
//! Tracks every accepted WebSocket connection and the dealership room it is
//! subscribed to. Events are serialized once and queued to each member of the
//! room; nothing here touches the network.
//!
//! ```text
//! services (visit / timer / note)
//!       │ broadcast(dealership_id, event, payload)
//!       ▼
//! Hub
//!   ├── connections: ConnectionId → { outbound queue, room }
//!   └── rooms:       dealership_id → {ConnectionId}
//!         │ try_send (bounded mpsc, never blocks)
//!         ▼
//!   session writer task → socket
//! ```

pub mod session;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::Utf8Bytes;
use parking_lot::Mutex;
use serde::Serialize;
use shared::live::{LiveEventType, LiveMessage, SubscribedPayload};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Registry-assigned connection handle
pub type ConnectionId = u64;

/// One serialized outbound frame, shared by every recipient
pub type Frame = Utf8Bytes;

struct ConnectionEntry {
    tx: mpsc::Sender<Frame>,
    room: Option<String>,
}

#[derive(Default)]
struct Registry {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    rooms: HashMap<String, HashSet<ConnectionId>>,
}

impl Registry {
    /// Detach a connection from its room, dropping the room when it empties
    fn leave_room(&mut self, id: ConnectionId, room: &str) {
        if let Some(members) = self.rooms.get_mut(room) {
            members.remove(&id);
            if members.is_empty() {
                self.rooms.remove(room);
            }
        }
    }

    fn remove(&mut self, id: ConnectionId) -> bool {
        match self.connections.remove(&id) {
            Some(entry) => {
                if let Some(room) = entry.room {
                    self.leave_room(id, &room);
                }
                true
            }
            None => false,
        }
    }
}

/// Per-dealership broadcast hub
#[derive(Clone)]
pub struct Hub {
    inner: Arc<Mutex<Registry>>,
    next_id: Arc<AtomicU64>,
    queue_capacity: usize,
}

impl Hub {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry::default())),
            next_id: Arc::new(AtomicU64::new(1)),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Add a freshly accepted connection (not in any room yet)
    pub fn register(&self) -> (ConnectionId, mpsc::Receiver<Frame>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        self.inner
            .lock()
            .connections
            .insert(id, ConnectionEntry { tx, room: None });
        tracing::debug!(connection_id = id, "Live connection registered");
        (id, rx)
    }

    /// Move a connection into a dealership room and acknowledge with `SUBSCRIBED`
    ///
    /// Returns `false` when the connection is unknown (already gone).
    pub fn subscribe(&self, id: ConnectionId, dealership_id: &str) -> bool {
        let frame = match encode(
            LiveEventType::Subscribed,
            &SubscribedPayload {
                dealership_id: dealership_id.to_string(),
            },
        ) {
            Some(f) => f,
            None => return false,
        };

        let mut registry = self.inner.lock();
        let previous = match registry.connections.get_mut(&id) {
            Some(entry) => entry.room.replace(dealership_id.to_string()),
            None => return false,
        };
        if let Some(prev) = previous {
            registry.leave_room(id, &prev);
        }
        registry
            .rooms
            .entry(dealership_id.to_string())
            .or_default()
            .insert(id);

        let delivered = registry
            .connections
            .get(&id)
            .is_some_and(|entry| entry.tx.try_send(frame).is_ok());
        if !delivered {
            tracing::warn!(connection_id = id, "Subscriber queue unavailable, dropping connection");
            registry.remove(id);
            return false;
        }

        tracing::info!(connection_id = id, dealership_id = %dealership_id, "Live connection subscribed");
        true
    }

    /// Remove a connection from the registry and its room (idempotent)
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.inner.lock().remove(id);
        if removed {
            tracing::debug!(connection_id = id, "Live connection unregistered");
        }
        removed
    }

    /// Queue `{type, data}` for every connection in the dealership room
    ///
    /// Returns the number of connections the frame was queued for. Slow or
    /// closed subscribers are unregistered; the caller never blocks.
    pub fn broadcast<T: Serialize>(
        &self,
        dealership_id: &str,
        event_type: LiveEventType,
        payload: &T,
    ) -> usize {
        let Some(frame) = encode(event_type, payload) else {
            return 0;
        };

        let mut registry = self.inner.lock();
        let Some(members) = registry.rooms.get(dealership_id) else {
            return 0;
        };

        let mut delivered = 0;
        let mut dropped = Vec::new();
        for id in members {
            let Some(entry) = registry.connections.get(id) else {
                dropped.push(*id);
                continue;
            };
            match entry.tx.try_send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        connection_id = *id,
                        dealership_id = %dealership_id,
                        event = %event_type,
                        "Subscriber queue full, disconnecting slow consumer"
                    );
                    dropped.push(*id);
                }
                Err(TrySendError::Closed(_)) => dropped.push(*id),
            }
        }

        for id in dropped {
            registry.remove(id);
        }
        delivered
    }

    pub fn connection_count(&self) -> usize {
        self.inner.lock().connections.len()
    }

    pub fn room_size(&self, dealership_id: &str) -> usize {
        self.inner
            .lock()
            .rooms
            .get(dealership_id)
            .map_or(0, HashSet::len)
    }
}

fn encode<T: Serialize>(event_type: LiveEventType, payload: &T) -> Option<Frame> {
    match serde_json::to_string(&LiveMessage::new(event_type, payload)) {
        Ok(json) => Some(json.into()),
        Err(e) => {
            tracing::error!(event = %event_type, error = %e, "Failed to serialize live message");
            None
        }
    }
}
