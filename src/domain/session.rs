// Per-connection player identity, room binding and owned game state.

use crate::domain::game::GameState;
use crate::domain::room::{PlayerId, RoomId};

const MAX_DISPLAY_NAME_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct PlayerSession {
    pub id: PlayerId,
    pub display_name: String,
    /// Id-based back-reference; the room owns the membership.
    pub room_id: Option<RoomId>,
    pub ready: bool,
    pub wins: u32,
    pub losses: u32,
    pub game: Option<GameState>,
}

impl PlayerSession {
    pub fn new(id: PlayerId, display_name: String) -> Self {
        Self {
            id,
            display_name,
            room_id: None,
            ready: false,
            wins: 0,
            losses: 0,
            game: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.game.as_ref().is_some_and(|game| game.alive)
    }

    /// Drops the room binding and everything scoped to it.
    pub fn leave_room(&mut self) {
        self.room_id = None;
        self.ready = false;
        self.game = None;
    }
}

/// Trims a requested display name; `None` when blank or too long.
pub fn normalize_display_name(raw: &str) -> Option<String> {
    let name = raw.trim();
    let len = name.chars().count();
    if len == 0 || len > MAX_DISPLAY_NAME_LEN {
        return None;
    }
    Some(name.to_string())
}
