//! Room lifecycle phases and per-variant policy knobs.

use std::time::Duration;

// ---------------------------------------------------------------------------
// RoomPolicy
// ---------------------------------------------------------------------------

/// What to do when the forming timeout fires before every expected
/// member has joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormingTimeout {
    /// Tear the room down with an aborted result.
    Abort,
    /// Start anyway if at least `min_players` made it; abort otherwise.
    StartShortHanded { min_players: usize },
}

/// Per-variant configuration for a room instance.
#[derive(Debug, Clone)]
pub struct RoomPolicy {
    /// Bound on how long a room may sit in Forming.
    pub forming_timeout: Duration,

    /// Bound on how long a disconnected member may stay absent before
    /// they forfeit.
    pub disconnect_grace: Duration,

    /// Policy applied when the forming timeout fires.
    pub on_forming_timeout: FormingTimeout,

    /// Whether members may join after the game starts. Off for classic
    /// turn games; a variant flag, not a global.
    pub allow_midgame_join: bool,
}

impl Default for RoomPolicy {
    fn default() -> Self {
        Self {
            forming_timeout: Duration::from_secs(30),
            disconnect_grace: Duration::from_secs(30),
            on_forming_timeout: FormingTimeout::Abort,
            allow_midgame_join: false,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomPhase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a room.
///
/// ```text
/// Forming → Active → Finished (terminal)
/// ```
///
/// - **Forming**: accepting members up to the match's target size.
///   Re-join by an existing member is an idempotent no-op.
/// - **Active**: the game runs; actions are validated and applied in
///   strict sequence. Membership only shrinks (unless the variant
///   allows mid-game joins).
/// - **Finished**: terminal. The result has been emitted; any further
///   action fails with `RoomClosed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    Forming,
    Active,
    Finished,
}

impl RoomPhase {
    /// True if new members may join in this phase (mid-game joins are
    /// policy-gated separately).
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Forming)
    }

    /// True if the game is running.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// True if the room reached its terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl std::fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forming => write!(f, "Forming"),
            Self::Active => write!(f, "Active"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}
