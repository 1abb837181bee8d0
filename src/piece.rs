//! Tetromino shapes, clockwise rotation and the falling piece.

use ratatui::style::Color;
use std::fmt;

/// Largest bounding box side of any tetromino.
pub const MAX_SHAPE_DIM: usize = 4;

/// Tetromino kinds (I, O, T, L, J, S, Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    O,
    T,
    L,
    J,
    S,
    Z,
}

impl PieceKind {
    pub const ALL: [Self; 7] = [Self::I, Self::O, Self::T, Self::L, Self::J, Self::S, Self::Z];

    /// Spawn orientation as a row-major occupancy matrix.
    pub const fn base_shape(self) -> Shape {
        match self {
            Self::I => Shape::from_rows([[1, 1, 1, 1]]),
            Self::O => Shape::from_rows([[1, 1], [1, 1]]),
            Self::T => Shape::from_rows([[0, 1, 0], [1, 1, 1]]),
            Self::L => Shape::from_rows([[0, 0, 1], [1, 1, 1]]),
            Self::J => Shape::from_rows([[1, 0, 0], [1, 1, 1]]),
            Self::S => Shape::from_rows([[0, 1, 1], [1, 1, 0]]),
            Self::Z => Shape::from_rows([[1, 1, 0], [0, 1, 1]]),
        }
    }

    /// Classic display colour. Themes may override it per kind.
    pub const fn color(self) -> Color {
        match self {
            Self::I => Color::Rgb(0, 255, 255),
            Self::O => Color::Rgb(255, 255, 0),
            Self::T => Color::Rgb(128, 0, 128),
            Self::L => Color::Rgb(255, 165, 0),
            Self::J => Color::Rgb(0, 0, 255),
            Self::S => Color::Rgb(0, 255, 0),
            Self::Z => Color::Rgb(255, 0, 0),
        }
    }

    /// Position in [`PieceKind::ALL`]; used to index per-kind tables.
    pub const fn index(self) -> usize {
        match self {
            Self::I => 0,
            Self::O => 1,
            Self::T => 2,
            Self::L => 3,
            Self::J => 4,
            Self::S => 5,
            Self::Z => 6,
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Self::I => 'I',
            Self::O => 'O',
            Self::T => 'T',
            Self::L => 'L',
            Self::J => 'J',
            Self::S => 'S',
            Self::Z => 'Z',
        };
        write!(f, "{c}")
    }
}

/// Occupancy matrix of at most 4x4 cells. Only the top-left `rows x cols` part is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    rows: usize,
    cols: usize,
    cells: [[bool; MAX_SHAPE_DIM]; MAX_SHAPE_DIM],
}

impl Shape {
    const fn empty(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: [[false; MAX_SHAPE_DIM]; MAX_SHAPE_DIM],
        }
    }

    /// Build from a literal grid of 0/1.
    pub const fn from_rows<const R: usize, const C: usize>(grid: [[u8; C]; R]) -> Self {
        assert!(R <= MAX_SHAPE_DIM && C <= MAX_SHAPE_DIM);
        let mut shape = Self::empty(R, C);
        let mut r = 0;
        while r < R {
            let mut c = 0;
            while c < C {
                shape.cells[r][c] = grid[r][c] != 0;
                c += 1;
            }
            r += 1;
        }
        shape
    }

    pub const fn rows(&self) -> usize {
        self.rows
    }

    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// True if (row, col) is inside the matrix and occupied.
    pub fn get(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols && self.cells[row][col]
    }

    /// (row, col) of every occupied cell, row-major.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.rows)
            .flat_map(move |r| (0..self.cols).map(move |c| (r, c)))
            .filter(|&(r, c)| self.cells[r][c])
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            for c in 0..self.cols {
                write!(f, "{}", if self.get(r, c) { '#' } else { '.' })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Rotate a matrix 90 degrees clockwise.
///
/// The result has `shape.cols()` rows and `shape.rows()` columns; output cell (r, c)
/// is input cell (rows - 1 - c, r).
pub fn rotate_clockwise(shape: &Shape) -> Shape {
    let mut out = Shape::empty(shape.cols, shape.rows);
    for r in 0..out.rows {
        for c in 0..out.cols {
            out.cells[r][c] = shape.cells[shape.rows - 1 - c][r];
        }
    }
    out
}

/// Active or preview piece. `x`, `y` are board coordinates of the bounding box top-left;
/// `y` may be negative while the piece is above the visible grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceKind,
    pub x: i32,
    pub y: i32,
    rotation: usize,
    rotations: [Shape; 4],
}

impl Piece {
    pub fn new(kind: PieceKind, x: i32, y: i32) -> Self {
        let base = kind.base_shape();
        let r1 = rotate_clockwise(&base);
        let r2 = rotate_clockwise(&r1);
        let r3 = rotate_clockwise(&r2);
        Self {
            kind,
            x,
            y,
            rotation: 0,
            rotations: [base, r1, r2, r3],
        }
    }

    /// Rotation index in 0..4.
    pub fn rotation(&self) -> usize {
        self.rotation
    }

    /// Advance to the next clockwise state. No collision check here.
    pub fn rotate(&mut self) {
        self.rotation = (self.rotation + 1) % self.rotations.len();
    }

    pub(crate) fn set_rotation(&mut self, rotation: usize) {
        self.rotation = rotation % self.rotations.len();
    }

    pub fn current_shape(&self) -> &Shape {
        &self.rotations[self.rotation]
    }

    /// Board coordinates (x, y) of each occupied cell, offset by (dx, dy).
    pub fn cells_at(&self, dx: i32, dy: i32) -> impl Iterator<Item = (i32, i32)> + '_ {
        let (ox, oy) = (self.x + dx, self.y + dy);
        self.current_shape()
            .occupied()
            .map(move |(r, c)| (ox + c as i32, oy + r as i32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_rotations_return_to_base() {
        for kind in PieceKind::ALL {
            let base = kind.base_shape();
            let mut s = base;
            for _ in 0..4 {
                s = rotate_clockwise(&s);
            }
            assert_eq!(s, base, "{kind} did not close after four rotations");
        }
    }

    #[test]
    fn rotation_swaps_dimensions() {
        let i = PieceKind::I.base_shape();
        let r = rotate_clockwise(&i);
        assert_eq!((r.rows(), r.cols()), (4, 1));
        assert!((0..4).all(|row| r.get(row, 0)));
    }

    #[test]
    fn t_rotates_clockwise() {
        // .#.      #.
        // ###  ->  ##
        //          #.
        let r = rotate_clockwise(&PieceKind::T.base_shape());
        assert_eq!(r, Shape::from_rows([[1, 0], [1, 1], [1, 0]]));
    }

    #[test]
    fn every_shape_has_four_cells() {
        for kind in PieceKind::ALL {
            let mut piece = Piece::new(kind, 0, 0);
            for _ in 0..4 {
                assert_eq!(piece.current_shape().occupied().count(), 4);
                piece.rotate();
            }
        }
    }

    #[test]
    fn rotate_wraps_and_only_changes_index() {
        let mut p = Piece::new(PieceKind::L, 3, -1);
        let states: Vec<Shape> = (0..4)
            .map(|_| {
                let s = *p.current_shape();
                p.rotate();
                s
            })
            .collect();
        assert_eq!(p.rotation(), 0);
        assert_eq!((p.x, p.y), (3, -1));
        assert_eq!(states[0], PieceKind::L.base_shape());
        assert_eq!(states[1], rotate_clockwise(&states[0]));
    }

    #[test]
    fn cells_at_applies_origin_and_offset() {
        let p = Piece::new(PieceKind::O, 4, 2);
        let mut cells: Vec<_> = p.cells_at(1, -1).collect();
        cells.sort_unstable();
        assert_eq!(cells, vec![(5, 1), (5, 2), (6, 1), (6, 2)]);
    }

    #[test]
    fn display_draws_matrix() {
        assert_eq!(PieceKind::S.base_shape().to_string(), ".##\n##.\n");
        assert_eq!(PieceKind::Z.to_string(), "Z");
    }
}
