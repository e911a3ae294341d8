//! 7-bag randomizer for piece generation
//!
//! Tetris uses a "7-bag" system where all 7 pieces are shuffled,
//! then dealt out before reshuffling. This prevents long droughts.

use crate::tetromino::PieceKind;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Minimum number of upcoming pieces kept in the queue
pub const LOOKAHEAD: usize = 6;

/// The 7-bag piece randomizer
#[derive(Debug, Clone)]
pub struct Bag {
    /// Preview queue for upcoming pieces
    queue: Vec<PieceKind>,
    rng: ChaCha8Rng,
}

impl Default for Bag {
    fn default() -> Self {
        Self::new()
    }
}

impl Bag {
    /// Create a randomly seeded bag
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Create a bag with a fixed seed (replays, tests)
    pub fn with_seed(seed: u64) -> Self {
        let mut bag = Self {
            queue: Vec::with_capacity(LOOKAHEAD + 7),
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        bag.ensure_lookahead();
        bag
    }

    /// Drop the queue and start again from a fresh bag
    pub fn reset(&mut self, seed: u64) {
        *self = Self::with_seed(seed);
    }

    /// The 7 kinds in a uniformly random order (Fisher-Yates)
    pub fn new_bag(&mut self) -> [PieceKind; 7] {
        let mut bag = PieceKind::all();
        bag.shuffle(&mut self.rng);
        bag
    }

    /// Append whole bags until the queue holds at least LOOKAHEAD kinds
    pub fn ensure_lookahead(&mut self) {
        while self.queue.len() < LOOKAHEAD {
            let bag = self.new_bag();
            self.queue.extend(bag);
        }
    }

    /// Get the next piece from the queue
    pub fn next(&mut self) -> PieceKind {
        let next = self.queue.remove(0);
        self.ensure_lookahead();
        next
    }

    /// Preview the next N pieces without removing them
    pub fn preview(&self, count: usize) -> &[PieceKind] {
        &self.queue[..count.min(self.queue.len())]
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_bag_contains_all_pieces() {
        let mut bag = Bag::with_seed(7);
        for _ in 0..10 {
            let pieces: HashSet<_> = (0..7).map(|_| bag.next()).collect();
            assert_eq!(pieces.len(), 7);
        }
    }

    #[test]
    fn test_queue_never_drops_below_lookahead() {
        let mut bag = Bag::with_seed(1);
        for _ in 0..100 {
            bag.next();
            assert!(bag.len() >= LOOKAHEAD);
        }
    }

    #[test]
    fn test_preview() {
        let bag = Bag::with_seed(3);
        assert_eq!(bag.preview(5).len(), 5);
        assert_eq!(bag.preview(100).len(), bag.len());
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = Bag::with_seed(42);
        let mut b = Bag::with_seed(42);
        let xs: Vec<_> = (0..21).map(|_| a.next()).collect();
        let ys: Vec<_> = (0..21).map(|_| b.next()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_reset_starts_on_bag_boundary() {
        let mut bag = Bag::with_seed(9);
        bag.next();
        bag.next();
        bag.reset(10);
        let pieces: HashSet<_> = (0..7).map(|_| bag.next()).collect();
        assert_eq!(pieces.len(), 7);
    }
}
