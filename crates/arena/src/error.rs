//! Top-level error type wrapping every layer's failures.

use arena_matchmaker::MatchError;
use arena_protocol::{PlayerId, ProtocolError, RoomId};
use arena_registry::RegistryError;
use arena_room::RoomError;

use crate::ChatError;

/// Errors surfaced by the service layer.
///
/// Each maps to an HTTP-style code carried in `ServerEvent::Error`, so
/// transports can relay failures without knowing the layer they came
/// from.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    Room(#[from] RoomError),

    #[error(transparent)]
    Chat(#[from] ChatError),

    /// The command needs a room and the player isn't in one.
    #[error("player {0} is not in any room")]
    NotInRoom(PlayerId),

    /// Queueing while already seated.
    #[error("player {0} is already in room {1}")]
    AlreadyInRoom(PlayerId, RoomId),
}

impl ArenaError {
    /// The wire code reported to the offending player.
    pub fn code(&self) -> u16 {
        match self {
            ArenaError::Protocol(_) => 400,
            ArenaError::Registry(_) => 404,
            ArenaError::Match(e) => match e {
                MatchError::NotQueued(_) => 404,
                MatchError::AlreadyQueued(_) => 409,
                MatchError::QueueFull => 429,
                MatchError::Unavailable => 503,
            },
            ArenaError::Room(e) => match e {
                RoomError::InvalidAction(_) => 400,
                RoomError::NotMember(..) => 403,
                RoomError::NotActive(_) | RoomError::RoomFull(_) | RoomError::NotJoinable(_) => 409,
                RoomError::RoomClosed(_) => 410,
                RoomError::Unavailable(_) => 503,
            },
            ArenaError::Chat(e) => match e {
                ChatError::NotMember(..) => 403,
                ChatError::EmptyMessage => 400,
            },
            ArenaError::NotInRoom(_) => 404,
            ArenaError::AlreadyInRoom(..) => 409,
        }
    }
}
