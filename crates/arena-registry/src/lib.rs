//! Connection registry for Arena.
//!
//! Maps player identities to live outbound channels, tracks liveness and
//! lifecycle status, and fans out events best-effort. This is the only
//! component that touches channels directly; everything above it deals in
//! `PlayerId`s.
//!
//! ```text
//! Supervisor / Rooms / Chat ──(events)──→ ConnectionRegistry ──→ channels
//!                                              │
//!                                              └──(disconnects)──→ Supervisor
//! ```

mod error;
mod registry;
mod session;

pub use error::RegistryError;
pub use registry::{ConnectionRegistry, DeliveryReport};
pub use session::{EventSender, PlayerSession, PlayerStatus};
