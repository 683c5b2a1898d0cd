//! Session handshake with a relay service.
//!
//! Runs alongside the generator in the same process but shares no data
//! with it.
//!
//! # Invariants
//! - The handshake only moves forward: connect, lobby, room.
//! - Events that arrive out of order are rejected, never silently applied.

mod relay;
mod room;

pub use relay::{LocalRelay, Relay, RelayEvent};
pub use room::{DEFAULT_ROOM, RoomManager, SessionError, SessionState};
