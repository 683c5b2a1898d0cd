use uuid::Uuid;

use crate::relay::{Relay, RelayEvent};

/// Room joined when no name is configured.
pub const DEFAULT_ROOM: &str = "test";

/// Errors from the session handshake.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("not connected to the relay")]
    NotConnected,
    #[error("not in the lobby")]
    NotInLobby,
    #[error("room name must not be empty")]
    InvalidRoomName,
    #[error("unexpected {event} while {state}")]
    UnexpectedEvent { event: String, state: String },
    #[error("disconnected: {0}")]
    Disconnected(String),
}

/// Where the handshake currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    ConnectedToMaster,
    InLobby,
    InRoom { name: String, session: Uuid },
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::ConnectedToMaster => write!(f, "connected to master"),
            Self::InLobby => write!(f, "in lobby"),
            Self::InRoom { name, .. } => write!(f, "in room {name}"),
        }
    }
}

/// Drives the relay handshake: connect, then join the lobby, then join
/// (or create) the configured room.
#[derive(Debug)]
pub struct RoomManager {
    room: String,
    state: SessionState,
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new(DEFAULT_ROOM)
    }
}

impl RoomManager {
    pub fn new(room: impl Into<String>) -> Self {
        Self {
            room: room.into(),
            state: SessionState::Disconnected,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn is_in_room(&self) -> bool {
        matches!(self.state, SessionState::InRoom { .. })
    }

    /// Begin connecting.
    pub fn start(&mut self, relay: &mut impl Relay) -> Result<(), SessionError> {
        tracing::info!("connecting");
        relay.connect()?;
        self.state = SessionState::Connecting;
        Ok(())
    }

    /// React to one relay callback.
    pub fn handle(
        &mut self,
        event: RelayEvent,
        relay: &mut impl Relay,
    ) -> Result<(), SessionError> {
        match (&self.state, event) {
            (SessionState::Connecting, RelayEvent::ConnectedToMaster) => {
                tracing::info!("connected");
                self.state = SessionState::ConnectedToMaster;
                relay.join_lobby()
            }
            (SessionState::ConnectedToMaster, RelayEvent::JoinedLobby) => {
                tracing::info!(room = %self.room, "joined lobby");
                self.state = SessionState::InLobby;
                relay.join_or_create_room(&self.room)
            }
            (SessionState::InLobby, RelayEvent::JoinedRoom { name, session, created })
                if name == self.room =>
            {
                tracing::info!(room = %name, %session, created, "joined room");
                self.state = SessionState::InRoom { name, session };
                Ok(())
            }
            (_, RelayEvent::Disconnected { reason }) => {
                tracing::warn!(%reason, "relay disconnected");
                self.state = SessionState::Disconnected;
                Err(SessionError::Disconnected(reason))
            }
            (state, event) => Err(SessionError::UnexpectedEvent {
                event: format!("{event:?}"),
                state: state.to_string(),
            }),
        }
    }

    /// Deliver every pending relay event. Returns how many were handled.
    pub fn pump(&mut self, relay: &mut impl Relay) -> Result<usize, SessionError> {
        let mut handled = 0;
        while let Some(event) = relay.poll() {
            self.handle(event, relay)?;
            handled += 1;
        }
        Ok(handled)
    }
}
