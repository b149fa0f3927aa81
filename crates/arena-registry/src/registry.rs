//! The connection registry: every live player channel in one place.
//!
//! This is the delivery fabric the rest of the core is injected with.
//! Rooms broadcast through it, the matchmaker notifies through it, and
//! connection lifecycle (register/unregister) mutates it.
//!
//! # Concurrency note
//!
//! The registry has its own internal lock, independent of any per-room
//! serialization. Many rooms broadcast concurrently while connections
//! churn; the lock is held only for map access — sends on unbounded
//! channels never block — so a slow room can't stall unrelated
//! connection traffic.

use std::collections::HashMap;
use std::sync::Mutex;

use arena_protocol::{PlayerId, ServerEvent};
use tokio::sync::mpsc;

use crate::{EventSender, PlayerSession, PlayerStatus, RegistryError};

/// Per-recipient outcome of a broadcast.
///
/// Broadcast is best-effort: failures are reported individually and
/// never abort delivery to the remaining recipients.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    /// Recipients whose channel accepted the event.
    pub delivered: Vec<PlayerId>,
    /// Recipients with no live channel.
    pub unreachable: Vec<PlayerId>,
}

impl DeliveryReport {
    /// True if every recipient was reached.
    pub fn complete(&self) -> bool {
        self.unreachable.is_empty()
    }
}

/// Maps player ids to live outbound channels and tracks liveness.
///
/// Constructed once at service start; handed to the other components as
/// an `Arc`. Closed channels discovered during delivery are reaped and
/// reported on the disconnect stream, so rooms learn about drops without
/// polling.
pub struct ConnectionRegistry {
    sessions: Mutex<HashMap<PlayerId, PlayerSession>>,
    /// Channel-closure notifications for the supervisor.
    disconnects: mpsc::UnboundedSender<PlayerId>,
}

impl ConnectionRegistry {
    /// Creates an empty registry plus the stream of disconnect events.
    ///
    /// The receiver side is consumed by the supervisor, which reacts to
    /// drops (cancel queue entries, start grace timers).
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PlayerId>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let registry = Self {
            sessions: Mutex::new(HashMap::new()),
            disconnects: tx,
        };
        (registry, rx)
    }

    /// Registers a player's outbound channel.
    ///
    /// A fresh connection replaces any stale entry for the same player
    /// (the old channel is dropped, not notified).
    pub fn register(&self, player_id: PlayerId, sender: EventSender) {
        let mut sessions = self.sessions.lock().expect("registry lock poisoned");
        let replaced = sessions
            .insert(
                player_id,
                PlayerSession {
                    player_id,
                    sender,
                    status: PlayerStatus::Idle,
                },
            )
            .is_some();
        if replaced {
            tracing::debug!(%player_id, "stale session replaced on register");
        } else {
            tracing::info!(%player_id, "player registered");
        }
    }

    /// Removes a player's session and emits a disconnect event.
    ///
    /// No-op for unknown players — disconnection is never an error.
    pub fn unregister(&self, player_id: PlayerId) {
        let removed = {
            let mut sessions = self.sessions.lock().expect("registry lock poisoned");
            sessions.remove(&player_id).is_some()
        };
        if removed {
            tracing::info!(%player_id, "player unregistered");
            let _ = self.disconnects.send(player_id);
        }
    }

    /// Delivers one event to one player.
    ///
    /// # Errors
    /// Returns [`RegistryError::Unreachable`] if the player has no live
    /// channel. A channel found closed here is reaped and reported on the
    /// disconnect stream.
    pub fn send(&self, player_id: PlayerId, event: ServerEvent) -> Result<(), RegistryError> {
        let result = {
            let sessions = self.sessions.lock().expect("registry lock poisoned");
            match sessions.get(&player_id) {
                Some(session) => session.sender.send(event).map_err(|_| ()),
                None => return Err(RegistryError::Unreachable(player_id)),
            }
        };

        match result {
            Ok(()) => Ok(()),
            Err(()) => {
                // Receiver dropped without an explicit Disconnect.
                tracing::debug!(%player_id, "channel closed, reaping session");
                self.unregister(player_id);
                Err(RegistryError::Unreachable(player_id))
            }
        }
    }

    /// Best-effort fan-out to a set of players.
    ///
    /// Per-recipient failures are collected in the report; delivery to
    /// the remaining recipients always proceeds.
    pub fn broadcast(&self, players: &[PlayerId], event: &ServerEvent) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for &player_id in players {
            match self.send(player_id, event.clone()) {
                Ok(()) => report.delivered.push(player_id),
                Err(_) => {
                    tracing::debug!(%player_id, "broadcast recipient unreachable");
                    report.unreachable.push(player_id);
                }
            }
        }
        report
    }

    /// Updates a player's lifecycle status.
    ///
    /// # Errors
    /// Returns [`RegistryError::NotRegistered`] for unknown players.
    pub fn set_status(
        &self,
        player_id: PlayerId,
        status: PlayerStatus,
    ) -> Result<(), RegistryError> {
        let mut sessions = self.sessions.lock().expect("registry lock poisoned");
        let session = sessions
            .get_mut(&player_id)
            .ok_or(RegistryError::NotRegistered(player_id))?;
        session.status = status;
        Ok(())
    }

    /// Returns a player's current status, if registered.
    pub fn status(&self, player_id: PlayerId) -> Option<PlayerStatus> {
        let sessions = self.sessions.lock().expect("registry lock poisoned");
        sessions.get(&player_id).map(|s| s.status)
    }

    /// True if the player has a live session entry.
    pub fn is_registered(&self, player_id: PlayerId) -> bool {
        let sessions = self.sessions.lock().expect("registry lock poisoned");
        sessions.contains_key(&player_id)
    }

    /// Number of registered players.
    pub fn len(&self) -> usize {
        self.sessions.lock().expect("registry lock poisoned").len()
    }

    /// True if no players are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
