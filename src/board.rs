//! Playfield grid: collision testing, locking pieces and clearing full rows.

use crate::piece::{Piece, PieceKind};
use std::collections::VecDeque;

pub const COLUMNS: usize = 10;
pub const ROWS: usize = 20;

/// Single cell: empty, or filled by a locked piece of the given kind (its colour).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Filled(PieceKind),
}

impl Cell {
    #[inline]
    pub fn is_filled(self) -> bool {
        matches!(self, Self::Filled(_))
    }
}

/// Outcome of writing a piece into the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockResult {
    Locked { lines_cleared: u32 },
    /// Some cell was still above row 0; the board is left untouched.
    SpawnBlocked,
}

type Row = [Cell; COLUMNS];

const EMPTY_ROW: Row = [Cell::Empty; COLUMNS];

/// Fixed 20x10 grid. y=0 is the top row; rows[y][x].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: VecDeque<Row>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            rows: (0..ROWS).map(|_| EMPTY_ROW).collect(),
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<Cell> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if let Some(slot) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            *slot = cell;
        }
    }

    /// Rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    #[cfg(test)]
    pub fn filled_count(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|row| row.iter())
            .filter(|c| c.is_filled())
            .count()
    }

    /// True if the piece shifted by (dx, dy) stays inside the side walls and above the floor,
    /// without overlapping filled cells. Cells above row 0 never collide.
    pub fn is_valid_placement(&self, piece: &Piece, dx: i32, dy: i32) -> bool {
        piece.cells_at(dx, dy).all(|(x, y)| {
            if x < 0 || x >= COLUMNS as i32 || y >= ROWS as i32 {
                return false;
            }
            y < 0 || !self.get(x as usize, y as usize).is_some_and(Cell::is_filled)
        })
    }

    /// Write the piece into the grid and clear completed rows.
    pub fn lock(&mut self, piece: &Piece) -> LockResult {
        if piece.cells_at(0, 0).any(|(_, y)| y < 0) {
            return LockResult::SpawnBlocked;
        }
        for (x, y) in piece.cells_at(0, 0) {
            self.set(x as usize, y as usize, Cell::Filled(piece.kind));
        }
        LockResult::Locked {
            lines_cleared: self.clear_completed_lines(),
        }
    }

    /// Single top-to-bottom pass: each full row is removed and an empty row inserted at the top.
    /// A row shifted into an index already visited is not re-checked.
    pub fn clear_completed_lines(&mut self) -> u32 {
        let mut cleared = 0;
        for y in 0..ROWS {
            let complete = self
                .rows
                .get(y)
                .is_some_and(|row| row.iter().all(|c| c.is_filled()));
            if complete {
                self.rows.remove(y);
                self.rows.push_front(EMPTY_ROW);
                cleared += 1;
            }
        }
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fill_row(board: &mut Board, y: usize) {
        for x in 0..COLUMNS {
            board.set(x, y, Cell::Filled(PieceKind::I));
        }
    }

    #[test]
    fn new_board_is_empty() {
        let b = Board::new();
        assert_eq!(b.rows().count(), ROWS);
        assert_eq!(b.filled_count(), 0);
        assert_eq!(b.get(COLUMNS, 0), None);
        assert_eq!(b.get(0, ROWS), None);
    }

    #[test]
    fn placement_above_grid_is_allowed() {
        let mut b = Board::new();
        fill_row(&mut b, 0);
        let p = Piece::new(PieceKind::O, 4, -2);
        assert!(b.is_valid_placement(&p, 0, 0));
        assert!(!b.is_valid_placement(&p, 0, 1));
    }

    #[test]
    fn placement_rejects_overlap() {
        let mut b = Board::new();
        b.set(5, 10, Cell::Filled(PieceKind::Z));
        let p = Piece::new(PieceKind::O, 4, 9);
        assert!(!b.is_valid_placement(&p, 0, 0));
        assert!(b.is_valid_placement(&p, -2, 0));
        assert!(b.is_valid_placement(&p, 0, -2));
    }

    #[test]
    fn clears_two_rows_and_keeps_order() {
        let mut b = Board::new();
        for y in 0..ROWS {
            if y == 3 || y == 7 {
                fill_row(&mut b, y);
            } else {
                b.set(y % COLUMNS, y, Cell::Filled(PieceKind::ALL[y % 7]));
            }
        }
        let expected: Vec<Row> = [EMPTY_ROW, EMPTY_ROW]
            .into_iter()
            .chain(
                b.rows()
                    .enumerate()
                    .filter(|(y, _)| *y != 3 && *y != 7)
                    .map(|(_, r)| *r),
            )
            .collect();

        assert_eq!(b.clear_completed_lines(), 2);
        let after: Vec<Row> = b.rows().copied().collect();
        assert_eq!(after, expected);
    }

    #[test]
    fn clear_with_no_full_rows_is_noop() {
        let mut b = Board::new();
        b.set(0, ROWS - 1, Cell::Filled(PieceKind::T));
        let before = b.clone();
        assert_eq!(b.clear_completed_lines(), 0);
        assert_eq!(b, before);
    }

    #[test]
    fn clears_four_adjacent_rows() {
        let mut b = Board::new();
        for y in ROWS - 4..ROWS {
            fill_row(&mut b, y);
        }
        b.set(2, ROWS - 5, Cell::Filled(PieceKind::J));
        assert_eq!(b.clear_completed_lines(), 4);
        assert_eq!(b.filled_count(), 1);
        assert_eq!(b.get(2, ROWS - 1), Some(Cell::Filled(PieceKind::J)));
    }

    #[test]
    fn lock_writes_cells_and_clears() {
        let mut b = Board::new();
        for x in 0..COLUMNS - 4 {
            b.set(x, ROWS - 1, Cell::Filled(PieceKind::S));
        }
        let p = Piece::new(PieceKind::I, COLUMNS as i32 - 4, ROWS as i32 - 1);
        assert_eq!(b.lock(&p), LockResult::Locked { lines_cleared: 1 });
        assert_eq!(b.filled_count(), 0);

        let p = Piece::new(PieceKind::T, 0, ROWS as i32 - 2);
        assert_eq!(b.lock(&p), LockResult::Locked { lines_cleared: 0 });
        assert_eq!(b.get(1, ROWS - 2), Some(Cell::Filled(PieceKind::T)));
        assert_eq!(b.get(0, ROWS - 2), Some(Cell::Empty));
        assert_eq!(b.filled_count(), 4);
    }

    #[test]
    fn lock_above_grid_is_blocked_without_writing() {
        let mut b = Board::new();
        let p = Piece::new(PieceKind::T, 3, -1);
        assert_eq!(b.lock(&p), LockResult::SpawnBlocked);
        assert_eq!(b.filled_count(), 0);
    }

    fn any_kind() -> impl Strategy<Value = PieceKind> {
        (0..PieceKind::ALL.len()).prop_map(|i| PieceKind::ALL[i])
    }

    proptest! {
        #[test]
        fn placement_matches_bounds_on_empty_board(
            kind in any_kind(),
            rotation in 0usize..4,
            x in -5i32..15,
            y in -5i32..25,
        ) {
            let b = Board::new();
            let mut p = Piece::new(kind, x, y);
            for _ in 0..rotation {
                p.rotate();
            }
            let in_bounds = p
                .cells_at(0, 0)
                .all(|(cx, cy)| (0..COLUMNS as i32).contains(&cx) && cy < ROWS as i32);
            prop_assert_eq!(b.is_valid_placement(&p, 0, 0), in_bounds);
        }

        #[test]
        fn offsets_match_moved_origin(
            kind in any_kind(),
            x in -2i32..10,
            y in -2i32..20,
            dx in -2i32..3,
            dy in -2i32..3,
        ) {
            let mut b = Board::new();
            b.set(4, 15, Cell::Filled(PieceKind::O));
            let p = Piece::new(kind, x, y);
            let moved = Piece::new(kind, x + dx, y + dy);
            prop_assert_eq!(b.is_valid_placement(&p, dx, dy), b.is_valid_placement(&moved, 0, 0));
        }
    }
}
