// Process-wide lookup of rooms and player sessions.

use crate::domain::{PlayerId, PlayerSession, Room, RoomId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A room is locked for the whole apply-resolve-broadcast sequence of an action.
pub type SharedRoom = Arc<tokio::sync::Mutex<Room>>;
/// Sessions are locked briefly and only while the owning room lock is held,
/// or while the session is not bound to a room.
pub type SharedSession = Arc<Mutex<PlayerSession>>;

/// Locks a session, recovering the data if a previous holder panicked.
pub fn lock_session(session: &SharedSession) -> MutexGuard<'_, PlayerSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Thread-safe registry of rooms and sessions, keyed by id.
#[derive(Debug, Default)]
pub struct Registry {
    rooms: RwLock<HashMap<RoomId, SharedRoom>>,
    players: RwLock<HashMap<PlayerId, SharedSession>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn rooms_read(&self) -> RwLockReadGuard<'_, HashMap<RoomId, SharedRoom>> {
        self.rooms.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn rooms_write(&self) -> RwLockWriteGuard<'_, HashMap<RoomId, SharedRoom>> {
        self.rooms.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn players_read(&self) -> RwLockReadGuard<'_, HashMap<PlayerId, SharedSession>> {
        self.players.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn players_write(&self) -> RwLockWriteGuard<'_, HashMap<PlayerId, SharedSession>> {
        self.players.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a room. Returns `None` if the id is already taken.
    pub fn insert_room(&self, room: Room) -> Option<SharedRoom> {
        let mut rooms = self.rooms_write();
        if rooms.contains_key(&room.id) {
            return None;
        }
        let id = room.id.clone();
        let shared = Arc::new(tokio::sync::Mutex::new(room));
        rooms.insert(id, shared.clone());
        Some(shared)
    }

    pub fn room(&self, room_id: &str) -> Option<SharedRoom> {
        self.rooms_read().get(room_id).cloned()
    }

    pub fn remove_room(&self, room_id: &str) -> Option<SharedRoom> {
        self.rooms_write().remove(room_id)
    }

    pub fn rooms(&self) -> Vec<SharedRoom> {
        self.rooms_read().values().cloned().collect()
    }

    pub fn room_count(&self) -> usize {
        self.rooms_read().len()
    }

    pub fn insert_player(&self, session: PlayerSession) -> SharedSession {
        let id = session.id;
        let shared = Arc::new(Mutex::new(session));
        self.players_write().insert(id, shared.clone());
        shared
    }

    pub fn player(&self, player_id: PlayerId) -> Option<SharedSession> {
        self.players_read().get(&player_id).cloned()
    }

    pub fn remove_player(&self, player_id: PlayerId) -> Option<SharedSession> {
        self.players_write().remove(&player_id)
    }

    pub fn players(&self) -> Vec<SharedSession> {
        self.players_read().values().cloned().collect()
    }
}
