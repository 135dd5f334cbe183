// Wire protocol DTOs and conversions for websocket messages and HTTP payloads.

use crate::domain::leaderboard::{Leaderboard, Period, RankedScore, ScoreRecord};
use crate::domain::room::Capacity;
use crate::domain::{
    Board, Cell, Direction, GameMode, GameSnapshot, Piece, PlayerId, PowerUpKind, RoomSettings,
    RoomStatus, Visibility,
};
use crate::use_cases::leaderboard::Standing;
use crate::use_cases::types::{PlayerSummary, RoomSnapshot};
use crate::use_cases::{PieceAction, ServerEvent};
use serde::{Deserialize, Serialize};

const GARBAGE_COLOR: &str = "gray";

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    // Initial handshake message; must be the first frame.
    Join(JoinPayload),
    CreateRoom(CreateRoomPayload),
    JoinRoom(RoomRef),
    LeaveRoom,
    Ready(ReadyPayload),
    Move(MovePayload),
    UsePowerUp(UsePowerUpPayload),
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinPayload {
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoomPayload {
    pub name: String,
    pub capacity: u8,
    #[serde(default)]
    pub visibility: VisibilityDto,
    #[serde(default)]
    pub mode: GameModeDto,
}

impl CreateRoomPayload {
    /// Rejects capacities other than 2, 4 or 6.
    pub fn into_settings(self) -> Result<RoomSettings, String> {
        let capacity = Capacity::try_from(self.capacity)?;
        let name = match self.name.trim() {
            "" => "Room".to_string(),
            name => name.to_string(),
        };
        Ok(RoomSettings {
            name,
            capacity,
            visibility: self.visibility.into(),
            mode: self.mode.into(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomRef {
    pub room_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadyPayload {
    pub ready: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovePayload {
    pub room_id: String,
    pub action: MoveActionDto,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoveActionDto {
    Move { direction: DirectionDto },
    Rotate,
    // Soft drop: one row down, locking if the piece is resting.
    Drop,
    HardDrop,
}

impl From<MoveActionDto> for PieceAction {
    fn from(action: MoveActionDto) -> Self {
        match action {
            MoveActionDto::Move { direction } => PieceAction::Move(direction.into()),
            MoveActionDto::Rotate => PieceAction::Rotate,
            MoveActionDto::Drop => PieceAction::SoftDrop,
            MoveActionDto::HardDrop => PieceAction::HardDrop,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionDto {
    Left,
    Right,
}

impl From<DirectionDto> for Direction {
    fn from(direction: DirectionDto) -> Self {
        match direction {
            DirectionDto::Left => Direction::Left,
            DirectionDto::Right => Direction::Right,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsePowerUpPayload {
    pub room_id: String,
    pub kind: PowerUpKindDto,
    #[serde(default)]
    pub target_player_id: Option<String>,
}

/// Player ids travel as decimal strings; anything else is treated as absent.
pub fn parse_player_id(value: &str) -> Option<PlayerId> {
    value.trim().parse().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKindDto {
    ClearLines,
    SlowOpponent,
    AddGarbage,
    Shield,
}

impl From<PowerUpKindDto> for PowerUpKind {
    fn from(kind: PowerUpKindDto) -> Self {
        match kind {
            PowerUpKindDto::ClearLines => PowerUpKind::ClearLines,
            PowerUpKindDto::SlowOpponent => PowerUpKind::SlowOpponent,
            PowerUpKindDto::AddGarbage => PowerUpKind::AddGarbage,
            PowerUpKindDto::Shield => PowerUpKind::Shield,
        }
    }
}

impl From<PowerUpKind> for PowerUpKindDto {
    fn from(kind: PowerUpKind) -> Self {
        match kind {
            PowerUpKind::ClearLines => PowerUpKindDto::ClearLines,
            PowerUpKind::SlowOpponent => PowerUpKindDto::SlowOpponent,
            PowerUpKind::AddGarbage => PowerUpKindDto::AddGarbage,
            PowerUpKind::Shield => PowerUpKindDto::Shield,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityDto {
    #[default]
    Public,
    Private,
}

impl From<VisibilityDto> for Visibility {
    fn from(visibility: VisibilityDto) -> Self {
        match visibility {
            VisibilityDto::Public => Visibility::Public,
            VisibilityDto::Private => Visibility::Private,
        }
    }
}

impl From<Visibility> for VisibilityDto {
    fn from(visibility: Visibility) -> Self {
        match visibility {
            Visibility::Public => VisibilityDto::Public,
            Visibility::Private => VisibilityDto::Private,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameModeDto {
    #[default]
    Battle,
    Classic,
    Tournament,
}

impl From<GameModeDto> for GameMode {
    fn from(mode: GameModeDto) -> Self {
        match mode {
            GameModeDto::Battle => GameMode::Battle,
            GameModeDto::Classic => GameMode::Classic,
            GameModeDto::Tournament => GameMode::Tournament,
        }
    }
}

impl From<GameMode> for GameModeDto {
    fn from(mode: GameMode) -> Self {
        match mode {
            GameMode::Battle => GameModeDto::Battle,
            GameMode::Classic => GameModeDto::Classic,
            GameMode::Tournament => GameModeDto::Tournament,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatusDto {
    Waiting,
    Playing,
    Finished,
}

impl From<RoomStatus> for RoomStatusDto {
    fn from(status: RoomStatus) -> Self {
        match status {
            RoomStatus::Waiting => RoomStatusDto::Waiting,
            RoomStatus::Playing => RoomStatusDto::Playing,
            RoomStatus::Finished => RoomStatusDto::Finished,
        }
    }
}

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    // Assigned identity for the connection after Join is accepted.
    Joined {
        player_id: String,
        display_name: String,
    },
    RoomCreated(RoomDto),
    RoomJoined(RoomDto),
    PlayerJoinedRoom {
        room_id: String,
        player_id: String,
        display_name: String,
    },
    RoomFull {
        room_id: String,
    },
    RoomNotFound {
        room_id: String,
    },
    GameStarted(RoomDto),
    GameUpdate {
        player_id: String,
        state: GameStateDto,
    },
    PowerUpUsed {
        player_id: String,
        kind: PowerUpKindDto,
        target_player_id: Option<String>,
    },
    PlayerLeft {
        player_id: String,
        display_name: String,
    },
    ReadyChanged {
        player_id: String,
        ready: bool,
    },
    GameOver {
        room_id: String,
        winner: Option<String>,
    },
}

impl From<&ServerEvent> for ServerMessage {
    fn from(event: &ServerEvent) -> Self {
        match event {
            ServerEvent::Registered {
                player_id,
                display_name,
            } => ServerMessage::Joined {
                player_id: player_id.to_string(),
                display_name: display_name.clone(),
            },
            ServerEvent::RoomCreated { room } => ServerMessage::RoomCreated(room.into()),
            ServerEvent::RoomJoined { room } => ServerMessage::RoomJoined(room.into()),
            ServerEvent::PlayerJoinedRoom {
                room_id,
                player_id,
                display_name,
            } => ServerMessage::PlayerJoinedRoom {
                room_id: room_id.clone(),
                player_id: player_id.to_string(),
                display_name: display_name.clone(),
            },
            ServerEvent::RoomFull { room_id } => ServerMessage::RoomFull {
                room_id: room_id.clone(),
            },
            ServerEvent::RoomNotFound { room_id } => ServerMessage::RoomNotFound {
                room_id: room_id.clone(),
            },
            ServerEvent::GameStarted { room } => ServerMessage::GameStarted(room.into()),
            ServerEvent::GameUpdate { player_id, state } => ServerMessage::GameUpdate {
                player_id: player_id.to_string(),
                state: state.into(),
            },
            ServerEvent::PowerUpUsed {
                player_id,
                kind,
                target,
            } => ServerMessage::PowerUpUsed {
                player_id: player_id.to_string(),
                kind: (*kind).into(),
                target_player_id: target.map(|id| id.to_string()),
            },
            ServerEvent::PlayerLeft {
                player_id,
                display_name,
            } => ServerMessage::PlayerLeft {
                player_id: player_id.to_string(),
                display_name: display_name.clone(),
            },
            ServerEvent::ReadyChanged { player_id, ready } => ServerMessage::ReadyChanged {
                player_id: player_id.to_string(),
                ready: *ready,
            },
            ServerEvent::GameOver { room_id, winner } => ServerMessage::GameOver {
                room_id: room_id.clone(),
                winner: winner.map(|id| id.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomDto {
    pub id: String,
    pub name: String,
    pub capacity: u8,
    pub player_count: usize,
    pub visibility: VisibilityDto,
    pub mode: GameModeDto,
    pub status: RoomStatusDto,
    pub players: Vec<PlayerDto>,
}

impl From<&RoomSnapshot> for RoomDto {
    fn from(room: &RoomSnapshot) -> Self {
        Self {
            id: room.id.clone(),
            name: room.name.clone(),
            capacity: room.capacity.into(),
            player_count: room.players.len(),
            visibility: room.visibility.into(),
            mode: room.mode.into(),
            status: room.status.into(),
            players: room.players.iter().map(PlayerDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerDto {
    pub id: String,
    pub display_name: String,
    pub ready: bool,
    pub wins: u32,
    pub losses: u32,
}

impl From<&PlayerSummary> for PlayerDto {
    fn from(player: &PlayerSummary) -> Self {
        Self {
            id: player.id.to_string(),
            display_name: player.display_name.clone(),
            ready: player.ready,
            wins: player.wins,
            losses: player.losses,
        }
    }
}

/// Board rows top to bottom; each cell is a color or null when empty.
#[derive(Debug, Clone, Serialize)]
pub struct GameStateDto {
    pub board: Vec<Vec<Option<&'static str>>>,
    pub current_piece: PieceDto,
    pub next_piece: PieceDto,
    pub score: u64,
    pub lines_cleared: u32,
    pub level: u32,
    pub alive: bool,
    pub power_ups: Vec<PowerUpKindDto>,
    pub shields: u32,
    pub slowed: bool,
}

impl From<&GameSnapshot> for GameStateDto {
    fn from(state: &GameSnapshot) -> Self {
        Self {
            board: board_colors(&state.board),
            current_piece: (&state.current).into(),
            next_piece: (&state.next).into(),
            score: state.score,
            lines_cleared: state.lines_cleared,
            level: state.level,
            alive: state.alive,
            power_ups: state.power_ups.iter().copied().map(Into::into).collect(),
            shields: state.shields,
            slowed: state.slowed,
        }
    }
}

fn board_colors(board: &Board) -> Vec<Vec<Option<&'static str>>> {
    board
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Cell::Empty => None,
                    Cell::Block(kind) => Some(kind.color()),
                    Cell::Garbage => Some(GARBAGE_COLOR),
                })
                .collect()
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct PieceDto {
    pub kind: &'static str,
    pub color: &'static str,
    pub shape: Vec<Vec<u8>>,
    pub x: i32,
    pub y: i32,
}

impl From<&Piece> for PieceDto {
    fn from(piece: &Piece) -> Self {
        Self {
            kind: piece.kind.letter(),
            color: piece.color(),
            shape: piece
                .shape
                .iter()
                .map(|row| row.iter().map(|filled| u8::from(*filled)).collect())
                .collect(),
            x: piece.x,
            y: piece.y,
        }
    }
}

// HTTP payloads.

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreRequest {
    #[serde(default)]
    pub player_name: String,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub lines: Option<u32>,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreDto {
    pub id: u64,
    pub player_name: String,
    pub score: u64,
    pub lines: u32,
    pub level: u32,
    pub date: Option<String>,
    pub submitted_at: u64,
}

impl From<ScoreRecord> for ScoreDto {
    fn from(record: ScoreRecord) -> Self {
        Self {
            id: record.id,
            player_name: record.player_name,
            score: record.score,
            lines: record.lines,
            level: record.level,
            date: record.date,
            submitted_at: record.submitted_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreCreatedResponse {
    pub message: String,
    pub score: ScoreDto,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaderboardQuery {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl LeaderboardQuery {
    pub fn period(&self) -> Period {
        self.period.as_deref().map(Period::parse).unwrap_or_default()
    }

    /// Standings are the default; only `single-player` selects the score board.
    pub fn is_multiplayer(&self) -> bool {
        self.mode.as_deref() != Some("single-player")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedScoreDto {
    pub rank: u32,
    #[serde(flatten)]
    pub score: ScoreDto,
}

impl From<RankedScore> for RankedScoreDto {
    fn from(entry: RankedScore) -> Self {
        Self {
            rank: entry.rank,
            score: entry.record.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<RankedScoreDto>,
    pub total_scores: usize,
    pub period: &'static str,
}

impl From<Leaderboard> for LeaderboardResponse {
    fn from(leaderboard: Leaderboard) -> Self {
        Self {
            leaderboard: leaderboard.entries.into_iter().map(Into::into).collect(),
            total_scores: leaderboard.total,
            period: leaderboard.period.as_str(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StandingDto {
    pub rank: u32,
    pub player_id: String,
    pub display_name: String,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: f64,
}

impl From<Standing> for StandingDto {
    fn from(standing: Standing) -> Self {
        Self {
            rank: standing.rank,
            player_id: standing.player_id.to_string(),
            display_name: standing.display_name,
            wins: standing.wins,
            losses: standing.losses,
            win_rate: standing.win_rate,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StandingsResponse {
    pub leaderboard: Vec<StandingDto>,
    pub total_players: usize,
    pub mode: &'static str,
}
