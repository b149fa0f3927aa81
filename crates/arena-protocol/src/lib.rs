//! Shared protocol types for Arena.
//!
//! This crate defines the language the core components speak:
//!
//! - **Identities** ([`PlayerId`], [`RoomId`]) — newtype ids.
//! - **Envelopes** ([`ClientCommand`], [`ServerEvent`]) — what crosses
//!   the boundary to the (external) transport layer.
//! - **Facts** ([`GameEvent`], [`ChatMessage`], [`RoomResult`]) — the
//!   ordered, immutable records rooms produce.
//! - **Codec** ([`Codec`], [`JsonCodec`]) — byte conversion at the edge.
//!
//! It knows nothing about connections, rooms, or matchmaking — it only
//! fixes the data shapes every other crate agrees on.

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ChatMessage, ClientCommand, GameEvent, Outcome, PlayerId, RoomId, RoomResult, ServerEvent,
};
