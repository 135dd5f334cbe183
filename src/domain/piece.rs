// Tetromino shapes, spawn placement and rotation.

use crate::domain::board::BOARD_WIDTH;
use rand::Rng;

/// Rectangular occupancy bitmap, row-major. Dimensions vary by kind and rotation.
pub type Shape = Vec<Vec<bool>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
    ];

    /// Uniform pick among the seven kinds.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    /// Color tag written into the board when a piece of this kind locks.
    pub fn color(self) -> &'static str {
        match self {
            PieceKind::I => "#00f0f0",
            PieceKind::O => "#f0f000",
            PieceKind::T => "#a000f0",
            PieceKind::S => "#00f000",
            PieceKind::Z => "#f00000",
            PieceKind::J => "#0000f0",
            PieceKind::L => "#f0a000",
        }
    }

    pub fn letter(self) -> &'static str {
        match self {
            PieceKind::I => "I",
            PieceKind::O => "O",
            PieceKind::T => "T",
            PieceKind::S => "S",
            PieceKind::Z => "Z",
            PieceKind::J => "J",
            PieceKind::L => "L",
        }
    }

    /// Spawn orientation.
    pub fn shape(self) -> Shape {
        let rows: &[&[u8]] = match self {
            PieceKind::I => &[&[1, 1, 1, 1]],
            PieceKind::O => &[&[1, 1], &[1, 1]],
            PieceKind::T => &[&[0, 1, 0], &[1, 1, 1]],
            PieceKind::S => &[&[0, 1, 1], &[1, 1, 0]],
            PieceKind::Z => &[&[1, 1, 0], &[0, 1, 1]],
            PieceKind::J => &[&[1, 0, 0], &[1, 1, 1]],
            PieceKind::L => &[&[0, 0, 1], &[1, 1, 1]],
        };
        rows.iter()
            .map(|row| row.iter().map(|&bit| bit == 1).collect())
            .collect()
    }
}

/// The active falling piece. `x`/`y` anchor the top-left corner of `shape`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceKind,
    pub shape: Shape,
    pub x: i32,
    pub y: i32,
}

impl Piece {
    /// Places `kind` horizontally centered on the top row.
    pub fn spawn(kind: PieceKind) -> Self {
        let shape = kind.shape();
        let width = shape_width(&shape) as i32;
        Self {
            kind,
            shape,
            x: (BOARD_WIDTH as i32 - width).div_euclid(2),
            y: 0,
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::spawn(PieceKind::random(rng))
    }

    pub fn color(&self) -> &'static str {
        self.kind.color()
    }

    /// Absolute board coordinates of every occupied cell.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        occupied(&self.shape).map(move |(dx, dy)| (self.x + dx, self.y + dy))
    }
}

pub fn shape_width(shape: &Shape) -> usize {
    shape.first().map_or(0, Vec::len)
}

/// Occupied offsets of a shape as `(column, row)`.
pub fn occupied(shape: &Shape) -> impl Iterator<Item = (i32, i32)> + '_ {
    shape.iter().enumerate().flat_map(|(row, cells)| {
        cells
            .iter()
            .enumerate()
            .filter(|(_, filled)| **filled)
            .map(move |(col, _)| (col as i32, row as i32))
    })
}

/// Rotates a shape 90 degrees clockwise. A `rows x cols` shape becomes `cols x rows`.
///
/// No legality check and no wall kick; the board decides whether the result fits.
pub fn rotate(shape: &Shape) -> Shape {
    let rows = shape.len();
    let cols = shape_width(shape);
    let mut rotated = vec![vec![false; rows]; cols];
    for (r, cells) in shape.iter().enumerate() {
        for (c, &filled) in cells.iter().enumerate() {
            rotated[c][rows - 1 - r] = filled;
        }
    }
    rotated
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn bits(shape: &Shape) -> Vec<Vec<u8>> {
        shape
            .iter()
            .map(|row| row.iter().map(|&b| u8::from(b)).collect())
            .collect()
    }

    #[test]
    fn every_kind_has_four_cells() {
        for kind in PieceKind::ALL {
            assert_eq!(occupied(&kind.shape()).count(), 4, "{kind:?}");
        }
    }

    #[test]
    fn spawn_is_horizontally_centered_on_top_row() {
        assert_eq!(Piece::spawn(PieceKind::I).x, 3);
        assert_eq!(Piece::spawn(PieceKind::O).x, 4);
        assert_eq!(Piece::spawn(PieceKind::T).x, 3);
        for kind in PieceKind::ALL {
            assert_eq!(Piece::spawn(kind).y, 0);
        }
    }

    #[test]
    fn rotating_t_turns_it_clockwise() {
        let rotated = rotate(&PieceKind::T.shape());
        assert_eq!(bits(&rotated), vec![vec![1, 0], vec![1, 1], vec![1, 0]]);
    }

    #[test]
    fn rotating_i_swaps_dimensions() {
        let rotated = rotate(&PieceKind::I.shape());
        assert_eq!(rotated.len(), 4);
        assert_eq!(shape_width(&rotated), 1);
    }

    #[test]
    fn four_rotations_restore_the_shape() {
        for kind in PieceKind::ALL {
            let shape = kind.shape();
            let back = rotate(&rotate(&rotate(&rotate(&shape))));
            assert_eq!(back, shape, "{kind:?}");
        }
    }

    #[test]
    fn random_pieces_cover_all_kinds() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.insert(Piece::random(&mut rng).kind);
        }
        assert_eq!(seen.len(), 7);
    }
}
