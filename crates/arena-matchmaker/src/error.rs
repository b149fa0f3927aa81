//! Error types for the matchmaking layer.

use arena_protocol::PlayerId;

/// Errors that can occur during queue operations.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// Cancel was called for a player who isn't waiting.
    #[error("player {0} is not queued")]
    NotQueued(PlayerId),

    /// The player already has a waiting request.
    #[error("player {0} is already queued")]
    AlreadyQueued(PlayerId),

    /// Backpressure: the matchmaker is at capacity, enqueue rejected.
    #[error("matchmaking queue is full")]
    QueueFull,

    /// The matchmaker task is gone.
    #[error("matchmaker is unavailable")]
    Unavailable,
}
