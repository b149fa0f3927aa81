//! Session types: the registry's record of one connected player.

use arena_protocol::{PlayerId, RoomId, ServerEvent};
use tokio::sync::mpsc;

/// The outbound half of a player's connection.
///
/// The transport layer owns the receiving end and is responsible for
/// draining it onto the wire. When the transport drops its receiver,
/// sends fail and the registry treats the player as disconnected.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Where a player currently is in the matchmaking/room lifecycle.
///
/// ```text
///   Idle ──(JoinQueue)──→ Queued ──(MatchFormed)──→ InRoom
///     ↑         │                                      │
///     └─────────┴──────(cancel / room teardown)────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    /// Connected, not queued, not in a room.
    Idle,
    /// Waiting in the matchmaking queue.
    Queued,
    /// Member of the given room.
    InRoom(RoomId),
}

/// One connected player: identity, live channel, lifecycle status.
///
/// Created on `register`, destroyed on `unregister` (or when the channel
/// is found closed). Owned exclusively by the registry.
#[derive(Debug, Clone)]
pub struct PlayerSession {
    pub player_id: PlayerId,
    pub sender: EventSender,
    pub status: PlayerStatus,
}
