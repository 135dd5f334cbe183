// Room state machine: membership, auto-start at capacity, one-shot finish.

use crate::domain::errors::RoomError;

pub type PlayerId = u64;
pub type RoomId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    Waiting,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameMode {
    #[default]
    Battle,
    Classic,
    Tournament,
}

impl GameMode {
    /// Multi-line clears push garbage onto opponents.
    pub fn sends_garbage(self) -> bool {
        matches!(self, GameMode::Battle)
    }

    /// The match ends once at most one player is still alive.
    pub fn is_elimination(self) -> bool {
        matches!(self, GameMode::Battle | GameMode::Tournament)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// Number of seats in a room: 2, 4 or 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity(u8);

impl Capacity {
    pub fn get(self) -> usize {
        usize::from(self.0)
    }
}

impl TryFrom<u8> for Capacity {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 | 4 | 6 => Ok(Self(value)),
            other => Err(format!("unsupported room capacity {other}")),
        }
    }
}

impl From<Capacity> for u8 {
    fn from(capacity: Capacity) -> Self {
        capacity.0
    }
}

#[derive(Debug, Clone)]
pub struct RoomSettings {
    pub name: String,
    pub capacity: Capacity,
    pub visibility: Visibility,
    pub mode: GameMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    /// The join filled the room and moved it to `Playing`.
    Started,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOver {
    pub winner: Option<PlayerId>,
}

#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub capacity: Capacity,
    pub visibility: Visibility,
    pub mode: GameMode,
    status: RoomStatus,
    members: Vec<PlayerId>,
}

impl Room {
    pub fn new(id: RoomId, settings: RoomSettings) -> Self {
        Self {
            id,
            name: settings.name,
            capacity: settings.capacity,
            visibility: settings.visibility,
            mode: settings.mode,
            status: RoomStatus::Waiting,
            members: Vec::new(),
        }
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn members(&self) -> &[PlayerId] {
        &self.members
    }

    pub fn is_member(&self, player_id: PlayerId) -> bool {
        self.members.contains(&player_id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Seats a player. Filling the last seat starts the match.
    pub fn add_member(&mut self, player_id: PlayerId) -> Result<JoinOutcome, RoomError> {
        if self.is_member(player_id) {
            return Ok(JoinOutcome::Joined);
        }
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::NotAccepting);
        }
        if self.members.len() >= self.capacity.get() {
            return Err(RoomError::Full);
        }
        self.members.push(player_id);
        if self.members.len() == self.capacity.get() {
            self.status = RoomStatus::Playing;
            return Ok(JoinOutcome::Started);
        }
        Ok(JoinOutcome::Joined)
    }

    pub fn remove_member(&mut self, player_id: PlayerId) -> bool {
        let before = self.members.len();
        self.members.retain(|id| *id != player_id);
        self.members.len() != before
    }

    /// Finishes an elimination match once at most one listed player is alive.
    /// Fires at most once per room; later calls return `None`.
    pub fn conclude(&mut self, alive: &[PlayerId]) -> Option<MatchOver> {
        if self.status != RoomStatus::Playing || !self.mode.is_elimination() {
            return None;
        }
        if alive.len() > 1 {
            return None;
        }
        self.status = RoomStatus::Finished;
        Some(MatchOver {
            winner: alive.first().copied(),
        })
    }
}
