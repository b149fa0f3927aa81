//! Authoritative room state machine for Arena.
//!
//! A room is an isolated actor that owns one match: membership, the
//! Forming → Active → Finished lifecycle, gap-free event sequencing,
//! and fan-out to connected members. Game legality lives behind the
//! [`GameRules`] trait so the same room machinery serves every mode.
//!
//! ```no_run
//! use std::sync::Arc;
//! use arena_protocol::RoomId;
//! use arena_registry::ConnectionRegistry;
//! use arena_room::{spawn_room, RoomPolicy};
//! # use arena_protocol::{Outcome, PlayerId};
//! # #[derive(Clone, Serialize, Deserialize)]
//! # struct NoAction;
//! # #[derive(Clone, Serialize)]
//! # struct NoState;
//! # use serde::{Serialize, Deserialize};
//! # struct NoGame;
//! # impl arena_room::GameRules for NoGame {
//! #     type Config = ();
//! #     type State = NoState;
//! #     type Action = NoAction;
//! #     fn init(_: &(), _: &[PlayerId]) -> NoState { NoState }
//! #     fn validate(_: &NoState, _: PlayerId, _: &NoAction) -> Result<(), String> { Ok(()) }
//! #     fn apply(_: &mut NoState, _: PlayerId, _: NoAction) -> serde_json::Value {
//! #         serde_json::Value::Null
//! #     }
//! #     fn outcome(_: &NoState) -> Option<(Outcome, String)> { None }
//! # }
//!
//! # async fn demo() {
//! let (registry, _disconnects) = ConnectionRegistry::new();
//! let registry = Arc::new(registry);
//! let (signals, _lifecycle) = tokio::sync::mpsc::unbounded_channel();
//!
//! let room = spawn_room::<NoGame>(
//!     RoomId::fresh(),
//!     "A1B2C3D4".to_string(),
//!     RoomPolicy::default(),
//!     (),
//!     2,
//!     registry,
//!     signals,
//!     64,
//! );
//! # let _ = room;
//! # }
//! ```

mod error;
mod policy;
mod room;
mod rules;

pub use error::RoomError;
pub use policy::{FormingTimeout, RoomPhase, RoomPolicy};
pub use room::{RoomHandle, RoomInfo, RoomSignal, spawn_room};
pub use rules::GameRules;
