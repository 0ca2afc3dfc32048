/**
 * Connection Registry
 *
 * This module tracks live connections and which routing key each one is
 * registered under. The registry is the only frequently-mutated shared
 * structure in the realtime core; every connection task touches it on
 * register/unregister and every publish reads it.
 *
 * # Concurrency
 *
 * State lives behind a single `std::sync::Mutex`. Lock bodies never block:
 * registration inserts a sender, unregistration removes one, and publishes
 * take a snapshot of the per-key sender list and deliver outside the lock.
 * A registration that returns before a publish starts is guaranteed to be
 * seen by that publish.
 *
 * # Lifecycle
 *
 * Entries for a routing key are reclaimed when the last connection under it
 * unregisters; a later registration under the same key recreates the entry.
 * Unregistering a connection that is already gone is a no-op.
 */

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Sender half of a connection's outbound frame queue
///
/// Frames are pre-serialized JSON text; the registry never inspects them,
/// which keeps it independent of the transport.
pub type FrameSender = mpsc::UnboundedSender<String>;

/// Unique connection identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generates a new process-unique connection ID
    pub fn generate() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the inner ID value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Registry of live connections, grouped by routing key
///
/// The registry is explicitly constructed at startup and injected through
/// application state; it is never accessed as a global.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// routing key -> { connection id -> outbound frame sender }
    channels: Mutex<HashMap<String, HashMap<ConnectionId, FrameSender>>>,
}

impl ConnectionRegistry {
    /// Creates a new, empty registry
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Register a connection under a routing key
    ///
    /// The registration is visible to any publish issued after this call
    /// returns. Registering the same connection ID twice under one key
    /// replaces the stored sender.
    pub fn register(&self, routing_key: &str, id: ConnectionId, sender: FrameSender) {
        let mut channels = self.channels.lock().unwrap();
        channels
            .entry(routing_key.to_string())
            .or_default()
            .insert(id, sender);
        tracing::debug!("[Registry] {} registered under '{}'", id, routing_key);
    }

    /// Unregister a connection from a routing key
    ///
    /// Idempotent: unregistering an absent connection is a no-op. The
    /// per-key entry is dropped once its last member is removed.
    pub fn unregister(&self, routing_key: &str, id: ConnectionId) {
        let mut channels = self.channels.lock().unwrap();
        if let Some(members) = channels.get_mut(routing_key) {
            if members.remove(&id).is_some() {
                tracing::debug!("[Registry] {} unregistered from '{}'", id, routing_key);
            }
            if members.is_empty() {
                channels.remove(routing_key);
            }
        }
    }

    /// Connection IDs currently registered under a routing key
    pub fn members_of(&self, routing_key: &str) -> Vec<ConnectionId> {
        let channels = self.channels.lock().unwrap();
        channels
            .get(routing_key)
            .map(|members| members.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Number of live connections under a routing key
    pub fn member_count(&self, routing_key: &str) -> usize {
        let channels = self.channels.lock().unwrap();
        channels.get(routing_key).map_or(0, HashMap::len)
    }

    /// Consistent snapshot of the senders under a routing key
    ///
    /// The snapshot is taken under the lock, so a concurrent register or
    /// unregister either fully precedes or fully follows it. Connections
    /// registering after the snapshot do not appear in it.
    pub fn senders_of(&self, routing_key: &str) -> Vec<(ConnectionId, FrameSender)> {
        let channels = self.channels.lock().unwrap();
        channels
            .get(routing_key)
            .map(|members| {
                members
                    .iter()
                    .map(|(id, sender)| (*id, sender.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of routing keys with at least one live connection
    pub fn routing_key_count(&self) -> usize {
        self.channels.lock().unwrap().len()
    }
}

/// Scoped registry entry: unregisters the connection when dropped
///
/// Session handlers hold one of these for the lifetime of a connection so
/// that every exit path, normal close or transport error alike, removes the
/// connection from the registry.
#[derive(Debug)]
pub struct RegistrationGuard {
    registry: Arc<ConnectionRegistry>,
    routing_key: String,
    id: ConnectionId,
}

impl RegistrationGuard {
    /// Register a connection and return the guard that will undo it
    pub fn register(
        registry: Arc<ConnectionRegistry>,
        routing_key: impl Into<String>,
        id: ConnectionId,
        sender: FrameSender,
    ) -> Self {
        let routing_key = routing_key.into();
        registry.register(&routing_key, id, sender);
        Self {
            registry,
            routing_key,
            id,
        }
    }

    /// The connection ID held by this guard
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        self.registry.unregister(&self.routing_key, self.id);
    }
}
