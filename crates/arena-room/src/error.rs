//! Error types for the room layer.

use arena_protocol::{PlayerId, RoomId};

/// Errors that can occur during room operations.
///
/// Validation failures (`InvalidAction`, `NotMember`) never mutate state
/// and are surfaced to the originating player only.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The sender is not a current member of the room.
    #[error("player {0} is not a member of room {1}")]
    NotMember(PlayerId, RoomId),

    /// The action failed rules validation. The reason comes from the
    /// game mode and is safe to echo back to the player.
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// The room reached a terminal state; no further actions apply.
    #[error("room {0} is closed")]
    RoomClosed(RoomId),

    /// The game hasn't started yet.
    #[error("room {0} is still forming")]
    NotActive(RoomId),

    /// All seats are taken.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The room is not accepting members in its current phase.
    #[error("room {0} is not joinable")]
    NotJoinable(RoomId),

    /// The room's command channel is closed or full.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}
