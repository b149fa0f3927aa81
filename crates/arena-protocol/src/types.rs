//! Core types shared by every layer: identities, command/event envelopes,
//! and the immutable facts a room produces (`GameEvent`, `RoomResult`).
//!
//! Everything here is plain serializable data. The transport layer that
//! carries these envelopes is an external collaborator — this crate only
//! fixes their shape.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A stable external identity for a player.
///
/// Newtype over `u64` so a `PlayerId` can never be confused with a
/// `RoomId` in a signature. `#[serde(transparent)]` keeps the wire form
/// a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for one room (one authoritative match instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

/// Counter backing [`RoomId::fresh`]. Process-wide so every component
/// that mints a room id draws from the same sequence.
static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

impl RoomId {
    /// Returns a fresh, process-unique room id.
    pub fn fresh() -> Self {
        RoomId(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// GameEvent — the unit of state synchronization
// ---------------------------------------------------------------------------

/// An ordered, immutable state-changing fact produced by a room.
///
/// Sequence numbers are assigned by the room alone and are strictly
/// increasing and gap-free within one room. Clients reconcile state by
/// applying events in `seq` order; the payload is opaque to every layer
/// except the game rules that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// The room that produced this event.
    pub room_id: RoomId,
    /// The player whose action caused it.
    pub player_id: PlayerId,
    /// Per-room monotonic sequence number, starting at 1.
    pub seq: u64,
    /// Rules-specific description of the state change.
    pub payload: serde_json::Value,
}

// ---------------------------------------------------------------------------
// ChatMessage — ephemeral, never part of game state
// ---------------------------------------------------------------------------

/// A chat line relayed to a room's members.
///
/// Chat is a stream independent of game events: internally ordered, but
/// with no ordering guarantee relative to `GameEvent`s. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub room_id: RoomId,
    pub sender: PlayerId,
    pub text: String,
    /// Milliseconds since the Unix epoch, stamped by the relay.
    pub timestamp_ms: u64,
}

// ---------------------------------------------------------------------------
// RoomResult — the terminal outcome record
// ---------------------------------------------------------------------------

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Outcome {
    /// One player won (checkmate, forfeit, ...).
    Win { winner: PlayerId },
    /// No winner (stalemate, insufficient material, agreed draw).
    Draw,
    /// The game never completed (forming timeout, everyone left).
    Aborted,
}

/// Terminal outcome record emitted exactly once when a room finishes.
///
/// Handed to the persistence collaborator; the core itself keeps nothing
/// after room teardown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomResult {
    pub room_id: RoomId,
    /// Human-facing room code (8 uppercase hex chars).
    pub code: String,
    /// Full roster in join order, including players who forfeited.
    pub players: Vec<PlayerId>,
    pub outcome: Outcome,
    /// Short end-condition description ("checkmate", "forfeit", ...).
    pub reason: String,
}

impl RoomResult {
    /// The winning player, if the outcome names one.
    pub fn winner(&self) -> Option<PlayerId> {
        match self.outcome {
            Outcome::Win { winner } => Some(winner),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ClientCommand — the inbound envelope
// ---------------------------------------------------------------------------

/// A command from a connected player, as handed over by the transport
/// layer together with the sender's identity.
///
/// `#[serde(tag = "type")]` gives internally tagged JSON:
/// `{ "type": "JoinQueue", "mode": "chess", "skill": 1200 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientCommand {
    /// Enter the matchmaking queue for a mode at a skill rating.
    JoinQueue { mode: String, skill: u32 },
    /// Leave the matchmaking queue.
    CancelQueue,
    /// A rules-specific action for the player's current room.
    /// Decoded by the game mode, opaque to the routing layers.
    GameAction { payload: serde_json::Value },
    /// A chat line for the player's current room.
    ChatMessage { text: String },
    /// Orderly disconnect.
    Disconnect,
}

// ---------------------------------------------------------------------------
// ServerEvent — the outbound envelope
// ---------------------------------------------------------------------------

/// An event delivered to one recipient's channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// The matchmaker assembled a group; a room has been created for it.
    MatchFormed {
        room_id: RoomId,
        code: String,
        players: Vec<PlayerId>,
    },
    /// An ordered state change from the recipient's room.
    GameEvent(GameEvent),
    /// A chat line from the recipient's room.
    ChatMessage(ChatMessage),
    /// The recipient's room membership or phase changed.
    RoomUpdate {
        room_id: RoomId,
        players: Vec<PlayerId>,
    },
    /// The recipient's room reached a terminal state.
    RoomResult(RoomResult),
    /// A rejection surfaced to the originating player only.
    /// `code` follows HTTP conventions (400 invalid, 404 not found, ...).
    Error { code: u16, message: String },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The envelope shapes are a wire contract with client code; these
    //! tests pin the exact JSON produced by our serde attributes.

    use super::*;

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&PlayerId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_room_id_fresh_is_unique() {
        assert_ne!(RoomId::fresh(), RoomId::fresh());
    }

    #[test]
    fn test_id_display() {
        assert_eq!(PlayerId(7).to_string(), "P-7");
        assert_eq!(RoomId(3).to_string(), "R-3");
    }

    #[test]
    fn test_client_command_internally_tagged() {
        let cmd = ClientCommand::JoinQueue {
            mode: "chess".into(),
            skill: 1200,
        };
        let json: serde_json::Value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["type"], "JoinQueue");
        assert_eq!(json["mode"], "chess");
        assert_eq!(json["skill"], 1200);
    }

    #[test]
    fn test_client_command_game_action_round_trip() {
        let cmd = ClientCommand::GameAction {
            payload: serde_json::json!({ "from": "e2", "to": "e4" }),
        };
        let bytes = serde_json::to_vec(&cmd).unwrap();
        let decoded: ClientCommand = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(cmd, decoded);
    }

    #[test]
    fn test_server_event_match_formed_json_format() {
        let ev = ServerEvent::MatchFormed {
            room_id: RoomId(9),
            code: "A1B2C3D4".into(),
            players: vec![PlayerId(1), PlayerId(2)],
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "MatchFormed");
        assert_eq!(json["room_id"], 9);
        assert_eq!(json["players"], serde_json::json!([1, 2]));
    }

    #[test]
    fn test_server_event_game_event_round_trip() {
        let ev = ServerEvent::GameEvent(GameEvent {
            room_id: RoomId(1),
            player_id: PlayerId(2),
            seq: 3,
            payload: serde_json::json!({ "x": 1 }),
        });
        let bytes = serde_json::to_vec(&ev).unwrap();
        let decoded: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ev, decoded);
    }

    #[test]
    fn test_outcome_win_json_format() {
        let json: serde_json::Value =
            serde_json::to_value(Outcome::Win { winner: PlayerId(5) }).unwrap();
        assert_eq!(json["type"], "Win");
        assert_eq!(json["winner"], 5);
    }

    #[test]
    fn test_room_result_winner_helper() {
        let result = RoomResult {
            room_id: RoomId(1),
            code: "DEADBEEF".into(),
            players: vec![PlayerId(1), PlayerId(2)],
            outcome: Outcome::Win { winner: PlayerId(2) },
            reason: "checkmate".into(),
        };
        assert_eq!(result.winner(), Some(PlayerId(2)));

        let draw = RoomResult {
            outcome: Outcome::Draw,
            reason: "stalemate".into(),
            ..result
        };
        assert_eq!(draw.winner(), None);
    }

    #[test]
    fn test_decode_unknown_command_type_returns_error() {
        let unknown = r#"{"type": "FlyToMoon", "speed": 9000}"#;
        let result: Result<ClientCommand, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_garbage_returns_error() {
        let result: Result<ServerEvent, _> =
            serde_json::from_slice(b"not json at all");
        assert!(result.is_err());
    }
}
