// Per-player simulation state and the moves that drive it.

use crate::domain::board::Board;
use crate::domain::piece::{Piece, rotate};
use crate::domain::power_up::{PowerUpKind, PowerUpSet};
use rand::Rng;
use std::time::Duration;

pub const LINES_PER_LEVEL: u32 = 10;

const BASE_DROP_INTERVAL_MS: u64 = 1000;
const MIN_DROP_INTERVAL_MS: u64 = 100;
const DROP_INTERVAL_STEP_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    fn dx(self) -> i32 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }
}

/// Points for clearing `lines` rows at once, scaled by level.
pub fn score_for(lines: u32, level: u32) -> u64 {
    let base = match lines {
        1 => 100,
        2 => 300,
        3 => 500,
        4 => 800,
        _ => 0,
    };
    base * u64::from(level)
}

pub fn level_for(lines_cleared: u32) -> u32 {
    lines_cleared / LINES_PER_LEVEL + 1
}

/// Time between gravity steps. Slowed players fall at half speed.
pub fn drop_interval(level: u32, slowed: bool) -> Duration {
    let speedup = u64::from(level.saturating_sub(1)) * DROP_INTERVAL_STEP_MS;
    let millis = BASE_DROP_INTERVAL_MS
        .saturating_sub(speedup)
        .max(MIN_DROP_INTERVAL_MS);
    let millis = if slowed { millis * 2 } else { millis };
    Duration::from_millis(millis)
}

/// Result of committing the current piece to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lock {
    pub lines_cleared: u32,
    pub points: u64,
}

#[derive(Debug, Clone)]
pub struct GameState {
    pub board: Board,
    pub current: Piece,
    pub next: Piece,
    pub score: u64,
    pub lines_cleared: u32,
    pub level: u32,
    pub alive: bool,
    pub power_ups: PowerUpSet,
    pub shields: u32,
    pub slowed: bool,
    // Gravity accumulator; not part of snapshots.
    pub fall_elapsed: Duration,
}

impl GameState {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            board: Board::new(),
            current: Piece::random(rng),
            next: Piece::random(rng),
            score: 0,
            lines_cleared: 0,
            level: 1,
            alive: true,
            power_ups: PowerUpSet::default(),
            shields: 0,
            slowed: false,
            fall_elapsed: Duration::ZERO,
        }
    }

    fn fits(&self, dx: i32, dy: i32) -> bool {
        self.board
            .is_legal(&self.current.shape, self.current.x + dx, self.current.y + dy)
    }

    pub fn try_move(&mut self, direction: Direction) -> bool {
        let dx = direction.dx();
        if !self.fits(dx, 0) {
            return false;
        }
        self.current.x += dx;
        true
    }

    pub fn try_rotate(&mut self) -> bool {
        let rotated = rotate(&self.current.shape);
        if !self.board.is_legal(&rotated, self.current.x, self.current.y) {
            return false;
        }
        self.current.shape = rotated;
        true
    }

    /// Moves the piece down one row for one point. Returns false when it is resting.
    pub fn soft_drop(&mut self) -> bool {
        if !self.step_down() {
            return false;
        }
        self.score += 1;
        true
    }

    /// Unscored one-row descent used by gravity.
    pub fn step_down(&mut self) -> bool {
        if !self.fits(0, 1) {
            return false;
        }
        self.current.y += 1;
        true
    }

    /// Drops the piece as far as it goes (two points per row), then locks it.
    pub fn hard_drop(&mut self) -> Lock {
        let mut rows = 0;
        while self.fits(0, rows + 1) {
            rows += 1;
        }
        self.current.y += rows;
        self.score += 2 * rows as u64;
        self.lock_piece()
    }

    /// Locks the current piece, clears full rows and applies line score.
    /// Points use the level in effect before the clear.
    pub fn lock_piece(&mut self) -> Lock {
        self.board.lock(&self.current);
        let lines_cleared = self.board.clear_lines();
        let mut points = 0;
        if lines_cleared > 0 {
            points = score_for(lines_cleared, self.level);
            self.score += points;
            self.lines_cleared += lines_cleared;
            self.level = level_for(self.lines_cleared);
        }
        Lock {
            lines_cleared,
            points,
        }
    }

    /// Promotes the preview piece and draws a new preview. Marks the player dead and
    /// returns false if the promoted piece is already blocked.
    pub fn spawn_next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        self.current = std::mem::replace(&mut self.next, Piece::random(rng));
        self.fall_elapsed = Duration::ZERO;
        if self.board.is_topped(&self.current) {
            self.alive = false;
        }
        self.alive
    }

    /// Accumulates gravity time. Returns true when a gravity step is due.
    pub fn advance_fall(&mut self, elapsed: Duration) -> bool {
        self.fall_elapsed += elapsed;
        let interval = drop_interval(self.level, self.slowed);
        if self.fall_elapsed < interval {
            return false;
        }
        self.fall_elapsed -= interval;
        true
    }

    /// Grants a random power-up; duplicates are discarded.
    pub fn award_power_up<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<PowerUpKind> {
        let kind = PowerUpKind::random(rng);
        self.power_ups.grant(kind).then_some(kind)
    }
}

/// Read-only view of a game state for broadcasting.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    pub board: Board,
    pub current: Piece,
    pub next: Piece,
    pub score: u64,
    pub lines_cleared: u32,
    pub level: u32,
    pub alive: bool,
    pub power_ups: Vec<PowerUpKind>,
    pub shields: u32,
    pub slowed: bool,
}

impl From<&GameState> for GameSnapshot {
    fn from(state: &GameState) -> Self {
        Self {
            board: state.board.clone(),
            current: state.current.clone(),
            next: state.next.clone(),
            score: state.score,
            lines_cleared: state.lines_cleared,
            level: state.level,
            alive: state.alive,
            power_ups: state.power_ups.iter().collect(),
            shields: state.shields,
            slowed: state.slowed,
        }
    }
}
