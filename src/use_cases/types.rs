// Use-case level commands in and events out of the match orchestrator.

use crate::domain::room::Capacity;
use crate::domain::{
    Direction, GameMode, GameSnapshot, PlayerId, PowerUpKind, RoomId, RoomSettings, RoomStatus,
    Visibility,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceAction {
    Move(Direction),
    Rotate,
    SoftDrop,
    HardDrop,
}

/// Tagged inbound commands from a registered player.
#[derive(Debug, Clone)]
pub enum Command {
    CreateRoom {
        room_id: RoomId,
        settings: RoomSettings,
    },
    JoinRoom {
        room_id: RoomId,
    },
    LeaveRoom,
    SetReady {
        ready: bool,
    },
    Act {
        room_id: RoomId,
        action: PieceAction,
    },
    UsePowerUp {
        room_id: RoomId,
        kind: PowerUpKind,
        target: Option<PlayerId>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub display_name: String,
    pub ready: bool,
    pub wins: u32,
    pub losses: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub name: String,
    pub capacity: Capacity,
    pub visibility: Visibility,
    pub mode: GameMode,
    pub status: RoomStatus,
    pub players: Vec<PlayerSummary>,
}

/// Outbound notifications. Recipients are chosen by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    Registered {
        player_id: PlayerId,
        display_name: String,
    },
    RoomCreated {
        room: RoomSnapshot,
    },
    RoomJoined {
        room: RoomSnapshot,
    },
    PlayerJoinedRoom {
        room_id: RoomId,
        player_id: PlayerId,
        display_name: String,
    },
    RoomFull {
        room_id: RoomId,
    },
    RoomNotFound {
        room_id: RoomId,
    },
    GameStarted {
        room: RoomSnapshot,
    },
    GameUpdate {
        player_id: PlayerId,
        state: GameSnapshot,
    },
    PowerUpUsed {
        player_id: PlayerId,
        kind: PowerUpKind,
        target: Option<PlayerId>,
    },
    PlayerLeft {
        player_id: PlayerId,
        display_name: String,
    },
    ReadyChanged {
        player_id: PlayerId,
        ready: bool,
    },
    GameOver {
        room_id: RoomId,
        winner: Option<PlayerId>,
    },
}

// Broadcast port implemented by the transport layer. Must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, recipients: &[PlayerId], event: &ServerEvent);
}
