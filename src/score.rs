//! Scoring system following modern Tetris guidelines
//!
//! Lock scores are computed before any row is cleared. Back-to-back only
//! applies when both this lock and the previous lock were "hard" (a Tetris
//! or a full T-spin clear). A lock that clears nothing breaks the chain.

/// Spin classification of a lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Spin {
    #[default]
    None,
    Mini,
    Full,
}

/// Points by lines cleared (0-4)
pub const LINE_SCORES: [u64; 5] = [0, 100, 300, 500, 800];
/// Full T-spin points by lines cleared (0-3)
pub const TSPIN_SCORES: [u64; 4] = [400, 800, 1200, 1600];
/// Mini T-spin points by lines cleared (0-3)
pub const MINI_TSPIN_SCORES: [u64; 4] = [100, 200, 400, 800];
/// Added per step of an ongoing combo
pub const COMBO_SCORE: u64 = 50;
pub const PERFECT_CLEAR_SCORE: u64 = 3000;
/// Back-to-back multiplier as a ratio (1.5x)
pub const B2B_NUMERATOR: u64 = 3;
pub const B2B_DENOMINATOR: u64 = 2;

/// What a single lock earned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockScore {
    pub spin: Spin,
    pub lines: usize,
    /// Points added by this lock, excluding any perfect clear bonus
    pub points: u64,
    /// Whether the back-to-back multiplier applied
    pub back_to_back: bool,
    /// Combo count before this lock was added (0 for the first clear)
    pub combo: u32,
}

impl LockScore {
    /// Display name for the clear, or None for a plain lock
    pub fn name(&self) -> Option<&'static str> {
        let name = match (self.spin, self.lines) {
            (Spin::None, 0) => return None,
            (Spin::None, 1) => "Single",
            (Spin::None, 2) => "Double",
            (Spin::None, 3) => "Triple",
            (Spin::None, _) => "Tetris",
            (Spin::Full, 0) => "T-Spin",
            (Spin::Full, 1) => "T-Spin Single",
            (Spin::Full, 2) => "T-Spin Double",
            (Spin::Full, _) => "T-Spin Triple",
            (Spin::Mini, 0) => "Mini T-Spin",
            (Spin::Mini, 1) => "Mini T-Spin Single",
            (Spin::Mini, 2) => "Mini T-Spin Double",
            (Spin::Mini, _) => "Mini T-Spin Triple",
        };
        Some(name)
    }

    /// Build the feedback line shown after a lock
    pub fn describe(&self, perfect_clear: bool) -> Option<String> {
        let mut text = self.name()?.to_string();
        if self.back_to_back {
            text = format!("B2B {}", text);
        }
        if self.combo > 0 {
            text.push_str(&format!(" Combo x{}", self.combo));
        }
        if perfect_clear {
            text.push_str(" Perfect Clear");
        }
        Some(text)
    }
}

/// Scoring calculation
#[derive(Debug, Clone, Default)]
pub struct Score {
    /// Current score
    pub points: u64,
    /// Total lines cleared
    pub lines: u32,
    /// Consecutive line-clearing locks
    pub combo: u32,
    /// Whether the last lock was a "hard" clear (Tetris or T-spin)
    pub back_to_back: bool,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score one lock. `lines` is the number of full rows found before
    /// clearing.
    pub fn add_lock(&mut self, spin: Spin, lines: usize) -> LockScore {
        let lines = lines.min(4);
        let base = match spin {
            Spin::Full => TSPIN_SCORES[lines.min(3)],
            Spin::Mini => MINI_TSPIN_SCORES[lines.min(3)],
            Spin::None => LINE_SCORES[lines],
        };
        let is_hard = lines > 0 && (lines == 4 || spin == Spin::Full);

        // Read the previous lock's hardness before overwriting it
        let back_to_back = is_hard && self.back_to_back;
        self.back_to_back = is_hard;
        let mut points = if back_to_back {
            base * B2B_NUMERATOR / B2B_DENOMINATOR
        } else {
            base
        };

        let combo = self.combo;
        if lines > 0 {
            points += combo as u64 * COMBO_SCORE;
            self.combo += 1;
        } else {
            self.combo = 0;
        }

        self.lines += lines as u32;
        self.points += points;
        LockScore {
            spin,
            lines,
            points,
            back_to_back,
            combo,
        }
    }

    /// Add the bonus for a clear that leaves the board empty
    pub fn add_perfect_clear(&mut self) {
        self.points += PERFECT_CLEAR_SCORE;
    }

    /// Add score for soft drop (1 point per cell)
    pub fn add_soft_drop(&mut self, cells: u32) {
        self.points += cells as u64;
    }

    /// Add score for hard drop (2 points per cell)
    pub fn add_hard_drop(&mut self, cells: u32) {
        self.points += cells as u64 * 2;
    }
}
