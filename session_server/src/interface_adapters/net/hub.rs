// Registry of live connections and fan-out of serialized frames to their outbound queues.

use crate::interface_adapters::protocol::ServerMessage;
use crate::use_cases::WorldStore;
use axum::extract::ws::Utf8Bytes;
use std::collections::HashMap;
use tokio::sync::{Mutex, mpsc, mpsc::error::TrySendError};
use tracing::{error, warn};

/// Server-assigned connection identifier.
pub type ConnId = u64;

/// Outcome of a single non-blocking enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    /// Queue was full (or already draining shut); the frame was discarded.
    Dropped,
    NotRegistered,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    /// Connections unregistered because their queue could not take the frame.
    pub evicted: usize,
}

/// Owns the send half of every registered connection's bounded outbound queue.
///
/// Registration, removal, unicast and broadcast all serialize on one lock. Removing an entry
/// drops the hub's sender, which is the only sender for that queue, so a queue is closed exactly
/// when it leaves the registry and can never be written after that.
#[derive(Debug)]
pub struct Hub {
    queue_capacity: usize,
    registry: Mutex<HashMap<ConnId, mpsc::Sender<Utf8Bytes>>>,
}

impl Hub {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            queue_capacity,
            registry: Mutex::new(HashMap::new()),
        }
    }

    /// Creates the connection's outbound queue and makes it eligible for broadcasts.
    /// The returned receiver is drained by the connection's writer.
    pub async fn register(&self, conn_id: ConnId) -> mpsc::Receiver<Utf8Bytes> {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let mut registry = self.registry.lock().await;
        if registry.insert(conn_id, tx).is_some() {
            warn!(conn_id, "connection id registered twice; previous queue closed");
        }
        rx
    }

    /// Removes the connection and closes its queue. Returns false if it was already gone.
    pub async fn unregister(&self, conn_id: ConnId) -> bool {
        let mut registry = self.registry.lock().await;
        registry.remove(&conn_id).is_some()
    }

    pub async fn is_registered(&self, conn_id: ConnId) -> bool {
        self.registry.lock().await.contains_key(&conn_id)
    }

    pub async fn connection_count(&self) -> usize {
        self.registry.lock().await.len()
    }

    /// Unicast. A full queue drops the frame but keeps the connection registered.
    pub async fn send_to(&self, conn_id: ConnId, msg: &ServerMessage) -> Delivery {
        match msg.to_frame() {
            Ok(frame) => self.send_frame_to(conn_id, frame).await,
            Err(e) => {
                error!(conn_id, error = ?e, "failed to serialize unicast message");
                Delivery::Dropped
            }
        }
    }

    pub async fn send_frame_to(&self, conn_id: ConnId, frame: Utf8Bytes) -> Delivery {
        let registry = self.registry.lock().await;
        let Some(tx) = registry.get(&conn_id) else {
            return Delivery::NotRegistered;
        };
        match tx.try_send(frame) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => Delivery::Dropped,
        }
    }

    /// Enqueues a joiner's identity followed by a world snapshot taken while the registry lock is
    /// held. World changes are applied before their broadcast, and broadcasts take this same lock,
    /// so every event queued behind the snapshot is at least as new as it.
    ///
    /// Lock order is hub, then world. Returns how many of the two frames were queued.
    pub async fn send_intro(
        &self,
        conn_id: ConnId,
        identity: &ServerMessage,
        world: &WorldStore,
    ) -> usize {
        let registry = self.registry.lock().await;
        let Some(tx) = registry.get(&conn_id) else {
            return 0;
        };

        let snapshot = ServerMessage::world_state(&world.snapshot().await);
        let mut queued = 0;
        for msg in [identity, &snapshot] {
            match msg.to_frame() {
                Ok(frame) => {
                    if tx.try_send(frame).is_ok() {
                        queued += 1;
                    }
                }
                Err(e) => error!(conn_id, error = ?e, "failed to serialize unicast message"),
            }
        }
        queued
    }

    /// Serializes once and enqueues to every registered connection.
    pub async fn broadcast(&self, msg: &ServerMessage) -> BroadcastReport {
        self.broadcast_inner(msg, None).await
    }

    /// Like [`Hub::broadcast`] but skips the originating connection.
    pub async fn broadcast_except(&self, msg: &ServerMessage, skip: ConnId) -> BroadcastReport {
        self.broadcast_inner(msg, Some(skip)).await
    }

    async fn broadcast_inner(&self, msg: &ServerMessage, skip: Option<ConnId>) -> BroadcastReport {
        let frame = match msg.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!(error = ?e, "failed to serialize broadcast message");
                return BroadcastReport::default();
            }
        };
        self.broadcast_frame(frame, skip).await
    }

    /// A connection whose queue is full is treated as unresponsive: it is unregistered here and
    /// its queue closes, which ends its writer and in turn its session.
    pub async fn broadcast_frame(&self, frame: Utf8Bytes, skip: Option<ConnId>) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let mut registry = self.registry.lock().await;

        registry.retain(|&conn_id, tx| {
            if skip == Some(conn_id) {
                return true;
            }
            match tx.try_send(frame.clone()) {
                Ok(()) => {
                    report.delivered += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    warn!(conn_id, "outbound queue full during broadcast; evicting connection");
                    report.evicted += 1;
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    report.evicted += 1;
                    false
                }
            }
        });

        report
    }
}
