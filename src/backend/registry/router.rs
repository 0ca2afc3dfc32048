/**
 * Broadcast Router
 *
 * This module delivers events to every connection registered under a
 * routing key. The router serializes an event once, snapshots the key's
 * sender list from the Connection Registry, and pushes the frame onto each
 * connection's outbound queue.
 *
 * # Delivery Semantics
 *
 * - Snapshot: connections registering after the snapshot is taken do not
 *   receive the event.
 * - Independence: a dead receiver (connection mid-disconnect) is skipped;
 *   one failed delivery never aborts the rest and never reaches the caller.
 * - Ordering: frames published by one logical sequence of calls arrive at
 *   each member in publish order (per-connection FIFO queues). No ordering
 *   is promised across routing keys.
 *
 * Publishing is non-blocking: queues are unbounded, so no send can suspend
 * while another group is being fanned out.
 */

use serde::Serialize;
use std::sync::Arc;

use super::connection::ConnectionRegistry;

/// Broadcast router over a shared connection registry
#[derive(Debug, Clone)]
pub struct BroadcastRouter {
    registry: Arc<ConnectionRegistry>,
}

impl BroadcastRouter {
    /// Creates a new router over the given registry
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Broadcast an event to every connection under a routing key
    ///
    /// Serialization failures are logged and swallowed; a publish never
    /// errors. Returns the number of connections the frame was queued for.
    pub fn publish<T: Serialize>(&self, routing_key: &str, event: &T) -> usize {
        let frame = match serde_json::to_string(event) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("[Broadcast] Failed to serialize event for '{}': {:?}", routing_key, e);
                return 0;
            }
        };
        self.publish_raw(routing_key, frame)
    }

    /// Broadcast a pre-serialized frame to every connection under a key
    pub fn publish_raw(&self, routing_key: &str, frame: String) -> usize {
        let recipients = self.registry.senders_of(routing_key);
        let mut delivered = 0;

        for (id, sender) in recipients {
            // A closed receiver means the connection is tearing down; skip it.
            match sender.send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(_) => {
                    tracing::debug!(
                        "[Broadcast] Skipping {} on '{}': receiver closed",
                        id,
                        routing_key
                    );
                }
            }
        }

        tracing::debug!(
            "[Broadcast] Delivered frame on '{}' to {} connection(s)",
            routing_key,
            delivered
        );
        delivered
    }

    /// The registry this router fans out over
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }
}
