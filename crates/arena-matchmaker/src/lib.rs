//! Matchmaking for Arena.
//!
//! Pools waiting players into compatible groups and emits
//! [`MatchFormed`] events for the room supervisor to consume.
//!
//! Matching is strict FIFO within a mode: requests are never reordered
//! by any secondary key, so given identical criteria an earlier request
//! is always matched no later than a later one. Skill compatibility is
//! banded, and a request's band widens deterministically with wait time
//! (quality traded for latency, never randomized).

mod actor;
mod error;
mod pool;

pub use actor::{MatchmakerHandle, spawn_matchmaker};
pub use error::MatchError;
pub use pool::{MatchFormed, MatchPreferences, MatchRequest, MatchmakerConfig, WaitingPools};
