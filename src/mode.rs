//! Game modes: Marathon and Sprint, plus personal records

use std::time::Duration;

/// Reference tick rate the engine is driven at
pub const TICKS_PER_SECOND: u64 = 60;
/// Lines needed to finish a Sprint
pub const SPRINT_LINES: u32 = 40;

/// Available game modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameMode {
    #[default]
    Marathon, // Endless, play for score
    Sprint,   // Clear 40 lines as fast as possible
}

impl GameMode {
    pub fn name(&self) -> &'static str {
        match self {
            GameMode::Marathon => "Marathon",
            GameMode::Sprint => "Sprint",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            GameMode::Marathon => "Endless mode - play for the high score",
            GameMode::Sprint => "Clear 40 lines as fast as possible",
        }
    }

    /// Stable key used for stored records
    pub fn key(&self) -> &'static str {
        match self {
            GameMode::Marathon => "marathon",
            GameMode::Sprint => "sprint",
        }
    }

    pub fn all() -> &'static [GameMode] {
        &[GameMode::Marathon, GameMode::Sprint]
    }

    /// Line target that ends the game, if any
    pub fn target_lines(&self) -> Option<u32> {
        match self {
            GameMode::Marathon => None,
            GameMode::Sprint => Some(SPRINT_LINES),
        }
    }

    /// Whether a lower record value is better (times) or a higher one (scores)
    pub fn lower_is_better(&self) -> bool {
        matches!(self, GameMode::Sprint)
    }
}

/// Convert a tick count to wall time at the reference rate
pub fn ticks_to_duration(ticks: u64) -> Duration {
    Duration::from_millis(ticks * 1000 / TICKS_PER_SECOND)
}

/// Mode-specific game state
#[derive(Debug, Clone)]
pub struct ModeState {
    pub mode: GameMode,
    /// Ticks played so far
    pub ticks: u64,
}

impl ModeState {
    pub fn new(mode: GameMode) -> Self {
        Self { mode, ticks: 0 }
    }

    /// Advance the clock by one tick
    pub fn tick(&mut self) {
        self.ticks += 1;
    }

    pub fn elapsed(&self) -> Duration {
        ticks_to_duration(self.ticks)
    }

    /// Check if game is complete based on mode
    pub fn is_complete(&self, lines_cleared: u32) -> bool {
        self.mode
            .target_lines()
            .is_some_and(|target| lines_cleared >= target)
    }

    /// Get lines remaining for Sprint mode (None for other modes)
    pub fn lines_remaining(&self, lines_cleared: u32) -> Option<u32> {
        self.mode
            .target_lines()
            .map(|target| target.saturating_sub(lines_cleared))
    }

    /// Format elapsed time as MM:SS.mmm
    pub fn format_time(&self) -> String {
        format_duration(self.elapsed())
    }
}

/// Format a duration as MM:SS.mmm
pub fn format_duration(duration: Duration) -> String {
    let total_millis = duration.as_millis();
    let minutes = total_millis / 60000;
    let seconds = (total_millis % 60000) / 1000;
    let millis = total_millis % 1000;
    format!("{:02}:{:02}.{:03}", minutes, seconds, millis)
}

/// Storage for per-mode personal bests. Marathon stores a score, Sprint a
/// time in milliseconds.
pub trait RecordStore {
    fn personal_best(&self, mode: GameMode) -> Option<u64>;
    fn set_personal_best(&mut self, mode: GameMode, value: u64);
}

/// How a finished game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Won,
    Lost,
}

/// Final payload reported when a game ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    pub mode: GameMode,
    pub outcome: Outcome,
    pub score: u64,
    pub lines: u32,
    pub ticks: u64,
}

impl GameResult {
    pub fn elapsed(&self) -> Duration {
        ticks_to_duration(self.ticks)
    }

    /// The value this game would be recorded under, if it qualifies at all
    pub fn record_value(&self) -> Option<u64> {
        match self.mode {
            GameMode::Marathon => Some(self.score),
            GameMode::Sprint if self.outcome == Outcome::Won => {
                Some(self.elapsed().as_millis() as u64)
            }
            GameMode::Sprint => None,
        }
    }

    /// Write a new personal best through the store. Returns true if the
    /// record was beaten.
    pub fn submit(&self, store: &mut dyn RecordStore) -> bool {
        let Some(value) = self.record_value() else {
            return false;
        };
        let beaten = match store.personal_best(self.mode) {
            None => true,
            Some(best) if self.mode.lower_is_better() => value < best,
            Some(best) => value > best,
        };
        if beaten {
            tracing::info!("New {} record: {}", self.mode.name(), value);
            store.set_personal_best(self.mode, value);
        }
        beaten
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStore(HashMap<GameMode, u64>);

    impl RecordStore for MemoryStore {
        fn personal_best(&self, mode: GameMode) -> Option<u64> {
            self.0.get(&mode).copied()
        }

        fn set_personal_best(&mut self, mode: GameMode, value: u64) {
            self.0.insert(mode, value);
        }
    }

    fn result(mode: GameMode, outcome: Outcome, score: u64, ticks: u64) -> GameResult {
        GameResult {
            mode,
            outcome,
            score,
            lines: 0,
            ticks,
        }
    }

    #[test]
    fn test_sprint_completion() {
        let state = ModeState::new(GameMode::Sprint);
        assert!(!state.is_complete(39));
        assert!(state.is_complete(40));
        assert_eq!(state.lines_remaining(12), Some(28));
        assert!(!ModeState::new(GameMode::Marathon).is_complete(10_000));
    }

    #[test]
    fn test_format_time() {
        let mut state = ModeState::new(GameMode::Sprint);
        for _ in 0..(61 * TICKS_PER_SECOND + 30) {
            state.tick();
        }
        assert_eq!(state.format_time(), "01:01.500");
    }

    #[test]
    fn test_marathon_record_keeps_highest() {
        let mut store = MemoryStore::default();
        assert!(result(GameMode::Marathon, Outcome::Lost, 500, 10).submit(&mut store));
        assert!(!result(GameMode::Marathon, Outcome::Lost, 400, 10).submit(&mut store));
        assert!(result(GameMode::Marathon, Outcome::Lost, 900, 10).submit(&mut store));
        assert_eq!(store.personal_best(GameMode::Marathon), Some(900));
    }

    #[test]
    fn test_sprint_record_keeps_fastest_win() {
        let mut store = MemoryStore::default();
        assert!(!result(GameMode::Sprint, Outcome::Lost, 0, 60).submit(&mut store));
        assert!(result(GameMode::Sprint, Outcome::Won, 0, 120).submit(&mut store));
        assert!(result(GameMode::Sprint, Outcome::Won, 0, 60).submit(&mut store));
        assert!(!result(GameMode::Sprint, Outcome::Won, 0, 90).submit(&mut store));
        assert_eq!(store.personal_best(GameMode::Sprint), Some(1000));
    }
}
