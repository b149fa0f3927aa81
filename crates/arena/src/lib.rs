//! # Arena
//!
//! Real-time matchmaking and room-state synchronization core.
//!
//! Arena sits between a transport (WebSocket server, test harness) and
//! a storage layer, neither of which it implements. Players enqueue for
//! a game mode, the matchmaker forms groups, the supervisor spins up an
//! authoritative room actor per match, and every applied action fans
//! out to the room's members with a gap-free sequence number. Finished
//! results leave through the [`ResultSink`] boundary.
//!
//! Game legality is pluggable: implement
//! [`GameRules`](arena_room::GameRules) (see `arena-chess` for the
//! chess mode) and hand it to [`GameService::spawn`].
//!
//! ```no_run
//! use arena::{GameService, NoopSink, ServiceConfig};
//! use arena_chess::{ChessConfig, ChessGame};
//!
//! # async fn demo() {
//! let service = GameService::<ChessGame, _>::spawn(
//!     ServiceConfig::default(),
//!     ChessConfig,
//!     NoopSink,
//! );
//! # let _ = service;
//! # }
//! ```

mod chat;
mod error;
mod index;
mod persist;
mod service;
mod supervisor;

pub use chat::{ChatError, ChatRelay};
pub use error::ArenaError;
pub use index::RoomIndex;
pub use persist::{NoopSink, ResultSink, SinkError};
pub use service::{GameService, ServiceConfig};
pub use supervisor::Supervisor;

/// Installs the default `tracing` subscriber, reading the filter from
/// `RUST_LOG`. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
