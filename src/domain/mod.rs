// Domain layer: falling-block simulation, rooms and score records.

pub mod board;
pub mod errors;
pub mod game;
pub mod leaderboard;
pub mod piece;
pub mod ports;
pub mod power_up;
pub mod room;
pub mod session;

pub use board::{BOARD_HEIGHT, BOARD_WIDTH, Board, Cell};
pub use game::{Direction, GameSnapshot, GameState};
pub use piece::{Piece, PieceKind};
pub use power_up::PowerUpKind;
pub use room::{GameMode, PlayerId, Room, RoomId, RoomSettings, RoomStatus, Visibility};
pub use session::PlayerSession;
