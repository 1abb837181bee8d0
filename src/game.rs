//! Game state: board, current and next piece, score, level, gravity.

use crate::board::{Board, LockResult, COLUMNS};
use crate::piece::{Piece, PieceKind};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

/// Fall interval at level 1.
pub const BASE_FALL_INTERVAL_MS: u64 = 1000;

/// Gravity never gets faster than this.
pub const MIN_FALL_INTERVAL_MS: u64 = 100;

const FALL_INTERVAL_STEP_MS: u64 = 100;

/// Score needed per level (level goes up once score / this exceeds the level).
pub const POINTS_PER_LEVEL: u32 = 1000;

/// Base points for 0..=4 lines cleared by one piece, multiplied by level.
const LINE_SCORES: [u32; 5] = [0, 100, 300, 500, 800];

/// Spawn column: roughly centred for every shape.
const SPAWN_X: i32 = COLUMNS as i32 / 2 - 2;
const SPAWN_Y: i32 = 0;

/// Base points for clearing `lines` rows at once. More than four counts as four.
pub fn line_score(lines: u32) -> u32 {
    let idx = (lines as usize).min(LINE_SCORES.len() - 1);
    LINE_SCORES[idx]
}

/// Gravity interval in ms for a level, floored at [`MIN_FALL_INTERVAL_MS`].
pub fn fall_interval_for_level(level: u32) -> u64 {
    BASE_FALL_INTERVAL_MS
        .saturating_sub(u64::from(level) * FALL_INTERVAL_STEP_MS)
        .max(MIN_FALL_INTERVAL_MS)
}

fn random_piece(rng: &mut impl Rng) -> Piece {
    let kind = PieceKind::ALL[rng.random_range(0..PieceKind::ALL.len())];
    Piece::new(kind, SPAWN_X, SPAWN_Y)
}

/// One game session. Commands on a finished game are ignored until [`GameState::reset`].
#[derive(Debug)]
pub struct GameState {
    board: Board,
    current: Piece,
    next: Piece,
    score: u32,
    level: u32,
    fall_interval_ms: u64,
    /// Reference point for automatic soft drops.
    last_fall: Instant,
    game_over: bool,
    lines_cleared: u32,
    pieces_locked: u32,
    rng: StdRng,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// New game with pieces drawn from OS entropy.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }

    /// New game with a reproducible piece sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(mut rng: StdRng) -> Self {
        let current = random_piece(&mut rng);
        let next = random_piece(&mut rng);
        info!("new game: current {} next {}", current.kind, next.kind);
        Self {
            board: Board::new(),
            current,
            next,
            score: 0,
            level: 1,
            fall_interval_ms: BASE_FALL_INTERVAL_MS,
            last_fall: Instant::now(),
            game_over: false,
            lines_cleared: 0,
            pieces_locked: 0,
            rng,
        }
    }

    /// Start over: empty board, fresh pieces, score 0, level 1. The random stream carries on.
    pub fn reset(&mut self) {
        self.board = Board::new();
        self.current = self.spawn_piece();
        self.next = self.spawn_piece();
        self.score = 0;
        self.level = 1;
        self.fall_interval_ms = BASE_FALL_INTERVAL_MS;
        self.last_fall = Instant::now();
        self.game_over = false;
        self.lines_cleared = 0;
        self.pieces_locked = 0;
        info!("game reset: current {} next {}", self.current.kind, self.next.kind);
    }

    /// Uniformly random kind at the spawn position. Independent of earlier pieces.
    pub fn spawn_piece(&mut self) -> Piece {
        random_piece(&mut self.rng)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current(&self) -> &Piece {
        &self.current
    }

    pub fn next(&self) -> &Piece {
        &self.next
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn fall_interval_ms(&self) -> u64 {
        self.fall_interval_ms
    }

    #[cfg(test)]
    pub fn last_fall(&self) -> Instant {
        self.last_fall
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn lines_cleared(&self) -> u32 {
        self.lines_cleared
    }

    pub fn pieces_locked(&self) -> u32 {
        self.pieces_locked
    }

    /// Shift sideways by `dx` if the target is free; otherwise nothing happens.
    pub fn move_horizontal(&mut self, dx: i32) {
        if self.game_over {
            return;
        }
        if self.board.is_valid_placement(&self.current, dx, 0) {
            self.current.x += dx;
        }
    }

    /// Move down one row, or lock the piece if it is resting on something.
    pub fn soft_drop(&mut self) {
        if self.game_over {
            return;
        }
        if self.board.is_valid_placement(&self.current, 0, 1) {
            self.current.y += 1;
        } else {
            self.lock_current_piece();
        }
    }

    /// Drop to the lowest free row and lock. No bonus points.
    pub fn hard_drop(&mut self) {
        if self.game_over {
            return;
        }
        while self.board.is_valid_placement(&self.current, 0, 1) {
            self.current.y += 1;
        }
        self.lock_current_piece();
    }

    /// Rotate clockwise in place; reverted if the new orientation collides. No wall kicks.
    pub fn rotate(&mut self) {
        if self.game_over {
            return;
        }
        let old_rotation = self.current.rotation();
        self.current.rotate();
        if !self.board.is_valid_placement(&self.current, 0, 0) {
            self.current.set_rotation(old_rotation);
        }
    }

    fn lock_current_piece(&mut self) {
        match self.board.lock(&self.current) {
            LockResult::SpawnBlocked => {
                self.game_over = true;
                info!("game over: {} locked above the board, score {}", self.current.kind, self.score);
            }
            LockResult::Locked { lines_cleared } => {
                debug!(
                    "locked {} at ({}, {}) rotation {}, cleared {}",
                    self.current.kind,
                    self.current.x,
                    self.current.y,
                    self.current.rotation(),
                    lines_cleared
                );
                self.pieces_locked += 1;
                self.lines_cleared += lines_cleared;
                self.update_score(lines_cleared);
                let spawned = self.spawn_piece();
                self.current = std::mem::replace(&mut self.next, spawned);
                if !self.board.is_valid_placement(&self.current, 0, 0) {
                    self.game_over = true;
                    info!("game over: no room to spawn {}, score {}", self.current.kind, self.score);
                }
            }
        }
    }

    /// Add `line_score(lines) * level`; at most one level-up per call.
    pub fn update_score(&mut self, lines_cleared: u32) {
        self.score = self
            .score
            .saturating_add(line_score(lines_cleared).saturating_mul(self.level));
        if self.score / POINTS_PER_LEVEL > self.level {
            self.level += 1;
            self.fall_interval_ms = fall_interval_for_level(self.level);
            debug!("level {} (fall interval {} ms)", self.level, self.fall_interval_ms);
        }
    }

    /// Gravity check against the stored fall reference. Returns true if a soft drop happened.
    pub fn tick(&mut self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_fall);
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.tick_elapsed(elapsed_ms, now)
    }

    /// Soft drop if more than `fall_interval_ms` has passed; `now` becomes the new fall reference.
    pub fn tick_elapsed(&mut self, elapsed_ms: u64, now: Instant) -> bool {
        if self.game_over || elapsed_ms <= self.fall_interval_ms {
            return false;
        }
        self.soft_drop();
        self.last_fall = now;
        true
    }

    /// Restart the gravity timer, e.g. after a pause.
    pub fn reset_fall_timer(&mut self, now: Instant) {
        self.last_fall = now;
    }

    /// Time until the next automatic drop is due.
    pub fn time_to_next_fall(&self, now: Instant) -> Duration {
        (self.last_fall + Duration::from_millis(self.fall_interval_ms)).saturating_duration_since(now)
    }
}
