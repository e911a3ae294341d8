//! Core game state and logic
//!
//! The engine advances one fixed tick per [`Game::update`] call. Within a
//! tick the order is always: horizontal autorepeat, soft drop, gravity, lock.
//! Discrete keys (rotate, hard drop, hold) act as soon as they arrive.

use crate::bag::Bag;
use crate::board::{checked_index, position_of, Board, Cell, OVERFLOW_ROW};
use crate::mode::{GameMode, GameResult, ModeState, Outcome};
use crate::piece::Piece;
use crate::score::{LockScore, Score, Spin};
use crate::tetromino::{PieceKind, Rotation, RotationDirection};

/// Ticks a feedback message stays on screen
pub const FEEDBACK_TICKS: u32 = 60;

/// Timer thresholds, all in ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Delayed Auto Shift: ticks a direction is held before repeating
    pub das: u32,
    /// Auto Repeat Rate: ticks between repeats, 0 moves to the wall at once
    pub arr: u32,
    /// Ticks between automatic falls
    pub gravity: u32,
    /// Ticks a grounded piece waits before locking
    pub lock_delay: u32,
    /// Lock timer resets granted to player moves per piece
    pub max_lock_resets: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            das: 10,
            arr: 2,
            gravity: 60,
            lock_delay: 30,
            max_lock_resets: 15,
        }
    }
}

impl Timing {
    /// Raise gravity and lock delay to at least one tick, since a zero
    /// threshold would fall or lock every tick
    pub fn clamped(self) -> Self {
        Self {
            gravity: self.gravity.max(1),
            lock_delay: self.lock_delay.max(1),
            ..self
        }
    }
}

/// Game state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    /// No game started yet
    Idle,
    Active,
    GameOver(Outcome),
}

/// Keys the engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    SoftDrop,
    HardDrop,
    RotateCw,
    RotateCcw,
    Hold,
    Abort,
    Restart,
}

impl Key {
    fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// A key transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub pressed: bool,
}

impl KeyEvent {
    pub fn down(key: Key) -> Self {
        Self { key, pressed: true }
    }

    pub fn up(key: Key) -> Self {
        Self {
            key,
            pressed: false,
        }
    }
}

/// Fading text shown after a notable clear
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub text: String,
    /// Ticks left before it disappears
    pub remaining: u32,
}

/// What one tick produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Update {
    /// Whether anything visible changed since the previous update
    pub changed: bool,
    /// Set exactly once, on the first update after the game ends
    pub finished: Option<GameResult>,
}

/// Horizontal autorepeat in progress
#[derive(Debug, Clone, Copy)]
struct Shift {
    direction: i32,
    timer: u32,
}

/// The main game struct
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    current: Option<Piece>,
    held: Option<PieceKind>,
    /// Whether hold has been used this piece
    hold_used: bool,
    bag: Bag,
    score: Score,
    state: GameState,
    mode_state: ModeState,
    timing: Timing,
    gravity_timer: u32,
    lock_timer: u32,
    lock_resets: u32,
    /// Bitset of keys currently held down
    keys: u16,
    shift: Option<Shift>,
    feedback: Option<Feedback>,
    last_lock: Option<LockScore>,
    changed: bool,
    reported: bool,
}

impl Default for Game {
    fn default() -> Self {
        Self::new(Timing::default())
    }
}

impl Game {
    /// Create an idle engine; call [`Game::new_game`] to start playing
    pub fn new(timing: Timing) -> Self {
        Self {
            board: Board::new(),
            current: None,
            held: None,
            hold_used: false,
            bag: Bag::new(),
            score: Score::new(),
            state: GameState::Idle,
            mode_state: ModeState::new(GameMode::default()),
            timing: timing.clamped(),
            gravity_timer: 0,
            lock_timer: 0,
            lock_resets: 0,
            keys: 0,
            shift: None,
            feedback: None,
            last_lock: None,
            changed: false,
            reported: false,
        }
    }

    /// Reset everything and start a game with a random piece sequence
    pub fn new_game(&mut self, mode: GameMode) {
        self.new_game_with_seed(mode, rand::random());
    }

    /// Reset everything and start a game with a fixed piece sequence.
    /// Keys still held down stay held.
    pub fn new_game_with_seed(&mut self, mode: GameMode, seed: u64) {
        tracing::info!("New {} game, seed={:016x}", mode.name(), seed);
        self.board = Board::new();
        self.current = None;
        self.held = None;
        self.hold_used = false;
        self.bag.reset(seed);
        self.score = Score::new();
        self.state = GameState::Active;
        self.mode_state = ModeState::new(mode);
        self.gravity_timer = 0;
        self.lock_timer = 0;
        self.lock_resets = 0;
        self.keys &= !Key::Restart.bit();
        self.feedback = None;
        self.last_lock = None;
        self.changed = true;
        self.reported = false;

        // A direction held through the restart resumes its autorepeat
        self.shift = [(Key::Left, -1), (Key::Right, 1)]
            .into_iter()
            .find(|&(key, _)| self.is_held(key))
            .map(|(_, direction)| Shift {
                direction,
                timer: 0,
            });

        let first = self.bag.next();
        self.spawn(first);
    }

    pub fn set_timing(&mut self, timing: Timing) {
        self.timing = timing.clamped();
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    /// Get the current game mode
    pub fn mode(&self) -> GameMode {
        self.mode_state.mode
    }

    pub fn mode_state(&self) -> &ModeState {
        &self.mode_state
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The cell grid, `row * BOARD_WIDTH + col`
    pub fn cells(&self) -> &[Cell] {
        self.board.cells()
    }

    pub fn active(&self) -> Option<&Piece> {
        self.current.as_ref()
    }

    pub fn held(&self) -> Option<PieceKind> {
        self.held
    }

    /// Whether hold can be used by the current piece
    pub fn hold_available(&self) -> bool {
        !self.hold_used
    }

    /// Get preview of next pieces
    pub fn preview(&self, count: usize) -> &[PieceKind] {
        self.bag.preview(count)
    }

    pub fn score(&self) -> &Score {
        &self.score
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    /// Score breakdown of the most recent lock
    pub fn last_lock(&self) -> Option<LockScore> {
        self.last_lock
    }

    /// Final payload once the game has ended
    pub fn result(&self) -> Option<GameResult> {
        match self.state {
            GameState::GameOver(outcome) => Some(GameResult {
                mode: self.mode(),
                outcome,
                score: self.score.points,
                lines: self.score.lines,
                ticks: self.mode_state.ticks,
            }),
            _ => None,
        }
    }

    /// Process a key transition
    pub fn handle(&mut self, event: KeyEvent) {
        if event.pressed {
            self.on_key_down(event.key);
        } else {
            self.on_key_up(event.key);
        }
    }

    pub fn on_key_down(&mut self, key: Key) {
        // Holding a key down is idempotent
        if self.keys & key.bit() != 0 {
            return;
        }
        self.keys |= key.bit();

        if key == Key::Restart {
            self.new_game(self.mode());
            return;
        }
        if self.state != GameState::Active {
            return;
        }

        match key {
            Key::Left => self.start_shift(-1),
            Key::Right => self.start_shift(1),
            // Applied inside update
            Key::SoftDrop => {}
            Key::HardDrop => self.hard_drop(),
            Key::RotateCw => self.rotate(RotationDirection::Clockwise),
            Key::RotateCcw => self.rotate(RotationDirection::CounterClockwise),
            Key::Hold => self.hold(),
            Key::Abort => self.finish(Outcome::Lost),
            Key::Restart => {}
        }
    }

    pub fn on_key_up(&mut self, key: Key) {
        self.keys &= !key.bit();

        let released = match key {
            Key::Left => -1,
            Key::Right => 1,
            _ => return,
        };
        if self.shift.is_some_and(|shift| shift.direction == released) {
            // Hand the autorepeat to the other direction if it is still held
            let other = if released < 0 { Key::Right } else { Key::Left };
            self.shift = (self.keys & other.bit() != 0).then_some(Shift {
                direction: -released,
                timer: 0,
            });
        }
    }

    fn is_held(&self, key: Key) -> bool {
        self.keys & key.bit() != 0
    }

    /// Advance one tick
    pub fn update(&mut self) -> Update {
        if self.state != GameState::Active {
            return self.report();
        }

        self.mode_state.tick();

        // Count down before this tick's lock can set new feedback
        if let Some(feedback) = &mut self.feedback {
            feedback.remaining = feedback.remaining.saturating_sub(1);
            if feedback.remaining == 0 {
                self.feedback = None;
            }
            self.changed = true;
        }

        // 1. horizontal autorepeat
        if let Some(mut shift) = self.shift {
            shift.timer += 1;
            self.shift = Some(shift);
            if shift.timer >= self.timing.das {
                if self.timing.arr == 0 {
                    while self.try_shift(shift.direction) {}
                } else if (shift.timer - self.timing.das) % self.timing.arr == 0 {
                    self.try_shift(shift.direction);
                }
            }
        }

        // 2. soft drop
        if self.is_held(Key::SoftDrop) {
            if let Some(piece) = &mut self.current {
                if piece.fall(&mut self.board) {
                    self.score.add_soft_drop(1);
                    self.gravity_timer = 0;
                    self.changed = true;
                }
            }
        }

        // 3. gravity
        let Some(piece) = &mut self.current else {
            return self.report();
        };
        if piece.can_fall(&self.board) {
            self.lock_timer = 0;
            self.gravity_timer += 1;
            if self.gravity_timer >= self.timing.gravity {
                piece.fall(&mut self.board);
                self.gravity_timer = 0;
                self.changed = true;
            }
        } else {
            self.gravity_timer = 0;
            self.lock_timer += 1;
        }

        // 4. lock
        if self.lock_timer >= self.timing.lock_delay {
            self.lock_piece();
        }

        self.report()
    }

    /// Drain the change flag and report a finished game once
    fn report(&mut self) -> Update {
        let changed = std::mem::take(&mut self.changed);
        let finished = match self.state {
            GameState::GameOver(_) if !self.reported => {
                self.reported = true;
                self.result()
            }
            _ => None,
        };
        Update { changed, finished }
    }

    fn start_shift(&mut self, direction: i32) {
        // First tap moves at once, repeats start after DAS
        self.shift = Some(Shift {
            direction,
            timer: 0,
        });
        self.try_shift(direction);
    }

    fn try_shift(&mut self, direction: i32) -> bool {
        let Some(piece) = &mut self.current else {
            return false;
        };
        if !piece.shift(&mut self.board, direction) {
            return false;
        }
        self.changed = true;
        self.try_reset_lock();
        true
    }

    fn rotate(&mut self, direction: RotationDirection) {
        let Some(piece) = &mut self.current else {
            return;
        };
        if piece.rotate(&mut self.board, direction) {
            self.changed = true;
            self.try_reset_lock();
        }
    }

    fn hard_drop(&mut self) {
        let Some(piece) = &mut self.current else {
            return;
        };
        let distance = piece.hard_drop(&mut self.board);
        self.score.add_hard_drop(distance as u32);
        self.changed = true;
        self.lock_piece();
    }

    fn hold(&mut self) {
        if self.hold_used {
            return;
        }
        let Some(current) = self.current.take() else {
            return;
        };

        current.remove(&mut self.board);
        let next = match self.held.replace(current.kind) {
            Some(held) => held,
            None => self.bag.next(),
        };
        tracing::trace!("Hold {:?}, next {:?}", current.kind, next);

        self.hold_used = true;
        self.changed = true;
        self.spawn(next);
    }

    /// Player moves on the ground buy more lock delay, up to a limit
    fn try_reset_lock(&mut self) {
        if self.lock_timer > 0 && self.lock_resets < self.timing.max_lock_resets {
            self.lock_timer = 0;
            self.lock_resets += 1;
        }
    }

    /// Put a new piece on the board and reset per-piece timers
    fn spawn(&mut self, kind: PieceKind) {
        self.gravity_timer = 0;
        self.lock_timer = 0;
        self.lock_resets = 0;
        match Piece::spawn(kind, &mut self.board) {
            Some(piece) => {
                tracing::trace!("Spawned {:?}", kind);
                self.current = Some(piece);
            }
            None => {
                tracing::debug!("Spawn of {:?} blocked", kind);
                self.finish(Outcome::Lost);
            }
        }
    }

    /// Lock the current piece, score it, clear lines and spawn the next
    fn lock_piece(&mut self) {
        let Some(piece) = self.current.take() else {
            return;
        };
        self.changed = true;

        // Locking into the hidden rows tops out before anything is scored
        let rows = piece.rows();
        if rows.iter().any(|&row| row <= OVERFLOW_ROW) {
            tracing::debug!("{:?} locked in the overflow rows", piece.kind);
            self.finish(Outcome::Lost);
            return;
        }

        piece.settle(&mut self.board);

        // Spin detection needs the rows intact
        let spin = self.detect_t_spin(&piece);
        let full = self.board.full_rows(&rows);
        let lock = self.score.add_lock(spin, full.len());
        self.board.clear_full_rows(&full);

        let perfect_clear = !full.is_empty() && self.board.is_empty();
        if perfect_clear {
            self.score.add_perfect_clear();
        }

        tracing::debug!(
            "Locked {:?}: spin={:?} lines={} points={} b2b={} combo={} perfect={}",
            piece.kind,
            lock.spin,
            lock.lines,
            lock.points,
            lock.back_to_back,
            lock.combo,
            perfect_clear
        );

        if let Some(text) = lock.describe(perfect_clear) {
            self.feedback = Some(Feedback {
                text,
                remaining: FEEDBACK_TICKS,
            });
        }
        self.last_lock = Some(lock);

        if self.mode_state.is_complete(self.score.lines) {
            self.finish(Outcome::Won);
            return;
        }

        self.hold_used = false;
        let next = self.bag.next();
        self.spawn(next);
    }

    fn finish(&mut self, outcome: Outcome) {
        tracing::info!(
            "Game over ({:?}): score={} lines={} time={}",
            outcome,
            self.score.points,
            self.score.lines,
            self.mode_state.format_time()
        );
        self.state = GameState::GameOver(outcome);
        self.shift = None;
        self.changed = true;
    }

    /// Classify a T-spin from the four diagonal neighbours of the center.
    /// Cells outside the field count as occupied.
    fn detect_t_spin(&self, piece: &Piece) -> Spin {
        if !piece.is_t_piece() || !piece.last_move_was_rotation() {
            return Spin::None;
        }

        let (row, col) = position_of(piece.center);
        let (row, col) = (row as i32, col as i32);
        // 0: up-left, 1: up-right, 2: down-right, 3: down-left
        let corners = [
            (row - 1, col - 1),
            (row - 1, col + 1),
            (row + 1, col + 1),
            (row + 1, col - 1),
        ]
        .map(|(r, c)| checked_index(r, c).is_none_or(|index| self.board.occupied(index)));

        if corners.iter().filter(|&&filled| filled).count() < 3 {
            return Spin::None;
        }

        // The two corners on the side the T points at
        let (front_a, front_b) = match piece.rotation {
            Rotation::North => (0, 1),
            Rotation::East => (1, 2),
            Rotation::South => (2, 3),
            Rotation::West => (3, 0),
        };
        if corners[front_a] && corners[front_b] {
            Spin::Full
        } else {
            Spin::Mini
        }
    }
}
