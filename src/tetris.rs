//! Tetris: playfield, falling piece, next preview, line sweep, levels.

use crate::engine::{Game, Progress, Status};
use crate::rng::GameRng;
use std::collections::VecDeque;
use std::time::Duration;

pub const BOARD_W: usize = 10;
pub const BOARD_H: usize = 20;

/// Spawn offset of a piece's bounding box; one row above the visible board.
const SPAWN_X: i32 = 3;
const SPAWN_Y: i32 = -1;

const POINTS_PER_LINE: u32 = 100;
const LINES_PER_LEVEL: u32 = 5;
const BASE_INTERVAL_MS: u64 = 800;
const MIN_INTERVAL_MS: u64 = 120;
const LEVEL_STEP_MS: u64 = 60;

/// Tetromino kinds (I, J, L, O, S, T, Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TetrominoKind {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl TetrominoKind {
    pub const ALL: [Self; 7] = [Self::I, Self::J, Self::L, Self::O, Self::S, Self::T, Self::Z];

    /// Spawn orientation, rows top to bottom.
    fn rows(self) -> &'static [&'static [u8]] {
        match self {
            Self::I => &[&[1, 1, 1, 1]],
            Self::J => &[&[1, 0, 0], &[1, 1, 1]],
            Self::L => &[&[0, 0, 1], &[1, 1, 1]],
            Self::O => &[&[1, 1], &[1, 1]],
            Self::S => &[&[0, 1, 1], &[1, 1, 0]],
            Self::T => &[&[0, 1, 0], &[1, 1, 1]],
            Self::Z => &[&[1, 1, 0], &[0, 1, 1]],
        }
    }

    /// Colour id 1..=7, stable per kind.
    pub fn color_id(self) -> u8 {
        match self {
            Self::I => 1,
            Self::J => 2,
            Self::L => 3,
            Self::O => 4,
            Self::S => 5,
            Self::T => 6,
            Self::Z => 7,
        }
    }

    pub fn shape(self) -> Shape {
        Shape {
            rows: self
                .rows()
                .iter()
                .map(|r| r.iter().map(|&c| c != 0).collect())
                .collect(),
        }
    }

    fn random(rng: &mut GameRng) -> Self {
        Self::ALL[rng.below(Self::ALL.len())]
    }
}

/// Binary matrix of a piece's bounding box. Never edited in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    rows: Vec<Vec<bool>>,
}

impl Shape {
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Occupied (dx, dy) offsets within the box.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.rows.iter().enumerate().flat_map(|(dy, row)| {
            row.iter()
                .enumerate()
                .filter(|&(_, &filled)| filled)
                .map(move |(dx, _)| (dx as i32, dy as i32))
        })
    }

    /// Quarter turn clockwise: `out[x][h-1-y] = in[y][x]`.
    pub fn rotated(&self) -> Self {
        let (h, w) = (self.height(), self.width());
        let mut rows = vec![vec![false; h]; w];
        for (y, row) in self.rows.iter().enumerate() {
            for (x, &filled) in row.iter().enumerate() {
                rows[x][h - 1 - y] = filled;
            }
        }
        Self { rows }
    }
}

/// Active piece: kind, current shape and the board offset of its box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub kind: TetrominoKind,
    pub shape: Shape,
    pub x: i32,
    pub y: i32,
}

impl Piece {
    pub fn spawn(kind: TetrominoKind) -> Self {
        Self {
            kind,
            shape: kind.shape(),
            x: SPAWN_X,
            y: SPAWN_Y,
        }
    }

    /// Absolute board coordinates of every occupied cell.
    pub fn board_cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape.cells().map(|(dx, dy)| (self.x + dx, self.y + dy))
    }

    fn shifted(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self.clone()
        }
    }
}

/// Single cell: empty or filled with a locked piece's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Filled(TetrominoKind),
}

impl Cell {
    /// 0 for empty, otherwise the kind's colour id.
    pub fn color_id(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Filled(kind) => kind.color_id(),
        }
    }
}

/// Locked cells. y=0 is top; rows are stored [0..BOARD_H].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playfield {
    rows: VecDeque<[Cell; BOARD_W]>,
}

impl Default for Playfield {
    fn default() -> Self {
        Self::new()
    }
}

impl Playfield {
    pub fn new() -> Self {
        Self {
            rows: (0..BOARD_H).map(|_| [Cell::Empty; BOARD_W]).collect(),
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

    pub fn rows(&self) -> impl Iterator<Item = &[Cell; BOARD_W]> {
        self.rows.iter()
    }

    /// True if the piece fits. Cells above the board (y < 0) are only
    /// checked against the side walls.
    pub fn can_place(&self, piece: &Piece) -> bool {
        piece.board_cells().all(|(x, y)| {
            if x < 0 || x >= BOARD_W as i32 || y >= BOARD_H as i32 {
                return false;
            }
            y < 0 || self.get(x as usize, y as usize) == Some(Cell::Empty)
        })
    }

    /// Write the piece's cells into the board; cells above the top are lost.
    pub fn merge(&mut self, piece: &Piece) {
        for (x, y) in piece.board_cells() {
            if y >= 0 {
                self.set(x as usize, y as usize, Cell::Filled(piece.kind));
            }
        }
    }

    /// Remove full rows, keep the rest in order, backfill empty rows on top.
    /// Returns how many rows were removed.
    pub fn sweep(&mut self) -> u32 {
        let before = self.rows.len();
        self.rows.retain(|row| row.contains(&Cell::Empty));
        let cleared = before - self.rows.len();
        for _ in 0..cleared {
            self.rows.push_front([Cell::Empty; BOARD_W]);
        }
        cleared as u32
    }
}

#[derive(Debug, Clone)]
pub struct TetrisGame {
    playfield: Playfield,
    /// None only after a spawn collision ended the game.
    piece: Option<Piece>,
    next: TetrominoKind,
    score: u32,
    lines: u32,
    level: u32,
    status: Status,
    rng: GameRng,
}

impl TetrisGame {
    pub fn new(mut rng: GameRng) -> Self {
        let first = TetrominoKind::random(&mut rng);
        let next = TetrominoKind::random(&mut rng);
        Self {
            playfield: Playfield::new(),
            piece: Some(Piece::spawn(first)),
            next,
            score: 0,
            lines: 0,
            level: 1,
            status: Status::Idle,
            rng,
        }
    }

    pub fn piece(&self) -> Option<&Piece> {
        self.piece.as_ref()
    }

    pub fn next_kind(&self) -> TetrominoKind {
        self.next
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Board copy with the active piece composited; for rendering only.
    pub fn display_board(&self) -> Playfield {
        let mut board = self.playfield.clone();
        if let Some(piece) = &self.piece {
            board.merge(piece);
        }
        board
    }

    /// Row offset the active piece would land at after a hard drop.
    pub fn ghost_y(&self) -> Option<i32> {
        self.piece.as_ref().map(|p| self.landing(p).y)
    }

    fn accepts_commands(&self) -> bool {
        !self.status.is_game_over() && self.piece.is_some()
    }

    /// Apply `f` to a copy of the piece and keep it only if it still fits.
    fn try_transform(&mut self, f: impl FnOnce(&Piece) -> Piece) -> bool {
        if !self.accepts_commands() {
            return false;
        }
        let Some(piece) = self.piece.as_ref() else {
            return false;
        };
        let candidate = f(piece);
        if self.playfield.can_place(&candidate) {
            self.piece = Some(candidate);
            true
        } else {
            false
        }
    }

    pub fn move_left(&mut self) {
        self.move_horizontal(-1);
    }

    pub fn move_right(&mut self) {
        self.move_horizontal(1);
    }

    /// `dir` is -1 or +1; blocked moves are dropped.
    pub fn move_horizontal(&mut self, dir: i32) {
        self.try_transform(|p| p.shifted(dir.signum(), 0));
    }

    /// No wall kicks: a rotation that does not fit in place is dropped.
    pub fn rotate(&mut self) {
        self.try_transform(|p| Piece {
            shape: p.shape.rotated(),
            ..p.clone()
        });
    }

    /// One row down, or lock when blocked.
    pub fn soft_drop(&mut self) {
        if !self.accepts_commands() {
            return;
        }
        if !self.try_transform(|p| p.shifted(0, 1)) {
            self.lock_piece();
        }
    }

    pub fn hard_drop(&mut self) {
        if !self.accepts_commands() {
            return;
        }
        if let Some(piece) = self.piece.take() {
            self.piece = Some(self.landing(&piece));
            self.lock_piece();
        }
    }

    fn landing(&self, piece: &Piece) -> Piece {
        let mut landed = piece.clone();
        loop {
            let below = landed.shifted(0, 1);
            if !self.playfield.can_place(&below) {
                return landed;
            }
            landed = below;
        }
    }

    fn lock_piece(&mut self) {
        let piece = match self.piece.take() {
            Some(p) => p,
            None => return,
        };
        self.playfield.merge(&piece);

        let cleared = self.playfield.sweep();
        if cleared > 0 {
            self.lines += cleared;
            self.score += cleared * POINTS_PER_LINE;
            self.level = (self.lines / LINES_PER_LEVEL + 1).max(1);
        }
        self.spawn_next();
    }

    fn spawn_next(&mut self) {
        let piece = Piece::spawn(self.next);
        self.next = TetrominoKind::random(&mut self.rng);
        if self.playfield.can_place(&piece) {
            self.piece = Some(piece);
        } else {
            self.status = Status::GameOver;
        }
    }
}

impl Game for TetrisGame {
    fn start(&mut self) {
        if self.status.begin() {
            self.reset();
            self.status = Status::Running;
        }
    }

    fn pause(&mut self) {
        self.status.park();
    }

    fn reset(&mut self) {
        self.playfield = Playfield::new();
        self.piece = Some(Piece::spawn(TetrominoKind::random(&mut self.rng)));
        self.next = TetrominoKind::random(&mut self.rng);
        self.score = 0;
        self.lines = 0;
        self.level = 1;
        self.status = Status::Idle;
    }

    fn tick(&mut self) {
        if self.status.is_running() {
            self.soft_drop();
        }
    }

    fn step(&mut self) {
        self.soft_drop();
    }

    fn status(&self) -> Status {
        self.status
    }

    fn tick_interval(&self) -> Duration {
        let speedup = u64::from(self.level) * LEVEL_STEP_MS;
        Duration::from_millis(BASE_INTERVAL_MS.saturating_sub(speedup).max(MIN_INTERVAL_MS))
    }

    fn progress(&self) -> Progress {
        Progress {
            score: self.score,
            lines: self.lines,
            status: self.status,
        }
    }
}

#[cfg(test)]
impl TetrisGame {
    fn with_piece(kind: TetrominoKind) -> Self {
        let mut game = Self::new(GameRng::new(42));
        game.piece = Some(Piece::spawn(kind));
        game
    }

    fn fill_row_except(&mut self, y: usize, gaps: &[usize]) {
        for x in (0..BOARD_W).filter(|x| !gaps.contains(x)) {
            self.playfield.set(x, y, Cell::Filled(TetrominoKind::I));
        }
    }
}
