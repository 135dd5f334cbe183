// Board engine: collision, locking, line clears and garbage injection.

use crate::domain::piece::{Piece, PieceKind, Shape, occupied};
use rand::Rng;

pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 20;

/// A single board cell. Non-empty cells come only from locks or garbage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Block(PieceKind),
    Garbage,
}

impl Cell {
    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }
}

pub type Row = [Cell; BOARD_WIDTH];

const EMPTY_ROW: Row = [Cell::Empty; BOARD_WIDTH];

/// Fixed 10x20 grid. Row 0 is the top of the visible playfield.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: Vec<Row>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            rows: vec![EMPTY_ROW; BOARD_HEIGHT],
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<Cell> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    /// Overwrites one cell; out-of-range coordinates are ignored.
    pub fn set_cell(&mut self, x: usize, y: usize, cell: Cell) {
        if let Some(slot) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            *slot = cell;
        }
    }

    /// Whether `shape` anchored at `(x, y)` fits: inside the side walls, above the floor,
    /// and not overlapping filled cells. Cells above the top edge are never checked
    /// against the board.
    pub fn is_legal(&self, shape: &Shape, x: i32, y: i32) -> bool {
        occupied(shape).all(|(dx, dy)| {
            let (cx, cy) = (x + dx, y + dy);
            if cx < 0 || cx >= BOARD_WIDTH as i32 || cy >= BOARD_HEIGHT as i32 {
                return false;
            }
            cy < 0 || self.rows[cy as usize][cx as usize].is_empty()
        })
    }

    /// True when the piece has no legal position where it currently sits.
    pub fn is_topped(&self, piece: &Piece) -> bool {
        !self.is_legal(&piece.shape, piece.x, piece.y)
    }

    /// Writes the piece into the grid. Cells above the top edge are dropped.
    pub fn lock(&mut self, piece: &Piece) {
        let tag = Cell::Block(piece.kind);
        for (cx, cy) in piece.cells() {
            if cy < 0 || cx < 0 {
                continue;
            }
            self.set_cell(cx as usize, cy as usize, tag);
        }
    }

    /// Removes every full row in one pass and refills the top with empty rows.
    /// Returns the number of rows removed.
    pub fn clear_lines(&mut self) -> u32 {
        let before = self.rows.len();
        self.rows.retain(|row| row.iter().any(|cell| cell.is_empty()));
        let cleared = before - self.rows.len();
        self.rows.splice(0..0, std::iter::repeat_n(EMPTY_ROW, cleared));
        cleared as u32
    }

    /// Pushes `count` garbage rows in from the bottom, dropping the same number of rows
    /// off the top. Each garbage row has exactly one random hole.
    pub fn inject_garbage<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) {
        let count = count.min(BOARD_HEIGHT);
        self.rows.drain(..count);
        for _ in 0..count {
            let mut row = [Cell::Garbage; BOARD_WIDTH];
            row[rng.gen_range(0..BOARD_WIDTH)] = Cell::Empty;
            self.rows.push(row);
        }
    }

    /// Drops the bottom `count` rows and inserts empty rows on top.
    pub fn clear_bottom_rows(&mut self, count: usize) {
        let count = count.min(BOARD_HEIGHT);
        self.rows.truncate(BOARD_HEIGHT - count);
        self.rows.splice(0..0, std::iter::repeat_n(EMPTY_ROW, count));
    }
}
