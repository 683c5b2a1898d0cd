use std::collections::{BTreeMap, VecDeque};
use uuid::Uuid;

use crate::room::SessionError;

/// Callbacks delivered by the relay service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    ConnectedToMaster,
    JoinedLobby,
    JoinedRoom {
        name: String,
        session: Uuid,
        /// True when this join created the room.
        created: bool,
    },
    Disconnected {
        reason: String,
    },
}

/// A relay service the session manager talks to.
///
/// Requests are fire-and-forget; their outcome arrives later through
/// [`poll`](Relay::poll).
pub trait Relay {
    fn connect(&mut self) -> Result<(), SessionError>;
    fn join_lobby(&mut self) -> Result<(), SessionError>;
    fn join_or_create_room(&mut self, name: &str) -> Result<(), SessionError>;
    fn poll(&mut self) -> Option<RelayEvent>;
}

/// In-process relay. Rooms persist for the lifetime of the relay.
#[derive(Debug, Default)]
pub struct LocalRelay {
    connected: bool,
    in_lobby: bool,
    rooms: BTreeMap<String, Uuid>,
    pending: VecDeque<RelayEvent>,
}

impl LocalRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn room(&self, name: &str) -> Option<Uuid> {
        self.rooms.get(name).copied()
    }

    /// Simulate the service dropping the connection.
    pub fn drop_connection(&mut self, reason: &str) {
        self.connected = false;
        self.in_lobby = false;
        self.pending.push_back(RelayEvent::Disconnected {
            reason: reason.to_string(),
        });
    }
}

impl Relay for LocalRelay {
    fn connect(&mut self) -> Result<(), SessionError> {
        self.connected = true;
        self.pending.push_back(RelayEvent::ConnectedToMaster);
        Ok(())
    }

    fn join_lobby(&mut self) -> Result<(), SessionError> {
        if !self.connected {
            return Err(SessionError::NotConnected);
        }
        self.in_lobby = true;
        self.pending.push_back(RelayEvent::JoinedLobby);
        Ok(())
    }

    fn join_or_create_room(&mut self, name: &str) -> Result<(), SessionError> {
        if !self.connected {
            return Err(SessionError::NotConnected);
        }
        if !self.in_lobby {
            return Err(SessionError::NotInLobby);
        }
        if name.is_empty() {
            return Err(SessionError::InvalidRoomName);
        }
        let created = !self.rooms.contains_key(name);
        let session = *self
            .rooms
            .entry(name.to_string())
            .or_insert_with(Uuid::new_v4);
        self.pending.push_back(RelayEvent::JoinedRoom {
            name: name.to_string(),
            session,
            created,
        });
        Ok(())
    }

    fn poll(&mut self) -> Option<RelayEvent> {
        self.pending.pop_front()
    }
}
