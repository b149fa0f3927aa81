//! Error types for the registry layer.

use arena_protocol::PlayerId;

/// Errors that can occur during delivery or session bookkeeping.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The player has no live channel: never registered, already
    /// unregistered, or their channel was found closed on send.
    #[error("player {0} is unreachable")]
    Unreachable(PlayerId),

    /// The player has no session entry at all.
    #[error("player {0} is not registered")]
    NotRegistered(PlayerId),
}
