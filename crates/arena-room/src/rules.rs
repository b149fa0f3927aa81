//! The `GameRules` trait — the extension point for game modes.
//!
//! A room is generic over one implementation of this trait. The room owns
//! sequencing, membership, and lifecycle; the rules own legality and
//! state evolution. The capability set is deliberately small: validate,
//! apply, terminal check.

use arena_protocol::{Outcome, PlayerId};
use serde::{Serialize, de::DeserializeOwned};

/// Rules for one game mode.
///
/// Associated types:
/// - `Config` — mode-specific settings.
/// - `State` — the authoritative game state. Serializable so snapshots
///   can cross the boundary if a variant wants them.
/// - `Action` — what players submit. Decoded from the opaque
///   `GameAction` payload by the routing layer.
///
/// `validate` is called before `apply` and must not mutate anything; a
/// rejected action leaves the room's version and sequence untouched.
pub trait GameRules: Send + Sync + 'static {
    /// Mode-specific configuration.
    type Config: Send + Sync + Clone + Default;

    /// Authoritative game state.
    type State: Send + Sync + Clone + Serialize;

    /// A player-submitted action.
    type Action: Send + Sync + Clone + Serialize + DeserializeOwned;

    /// Creates the initial state when a room starts.
    ///
    /// `players` is the roster in join order — rules that care about
    /// turn order (who is White, who deals) read it from here.
    fn init(config: &Self::Config, players: &[PlayerId]) -> Self::State;

    /// Checks that an action is legal: right player, right turn, valid
    /// targets. Returns a human-readable rejection reason on failure.
    fn validate(state: &Self::State, player: PlayerId, action: &Self::Action)
    -> Result<(), String>;

    /// Applies a validated action and returns the event payload that is
    /// broadcast verbatim to every member.
    fn apply(state: &mut Self::State, player: PlayerId, action: Self::Action)
    -> serde_json::Value;

    /// Terminal check, called after every `apply` and forfeit. Returns
    /// the outcome plus a short reason ("checkmate", "stalemate", ...)
    /// once the game is over.
    fn outcome(state: &Self::State) -> Option<(Outcome, String)>;

    /// Called when a member forfeits (disconnect grace elapsed, or a
    /// voluntary leave mid-game). Default: no state change — the room
    /// itself decides the forfeit result for two-player games.
    fn forfeit(_state: &mut Self::State, _player: PlayerId) {}
}
