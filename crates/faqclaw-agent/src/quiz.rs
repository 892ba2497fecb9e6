//! Random question picker for quiz mode.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct QuizPicker {
    rng: StdRng,
}

impl QuizPicker {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic picker for tests and reproducible sessions.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform index in `0..len`, `None` for an empty corpus.
    pub fn pick(&mut self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.rng.gen_range(0..len))
    }
}

impl Default for QuizPicker {
    fn default() -> Self {
        Self::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_in_range() {
        let mut picker = QuizPicker::seeded(7);
        for _ in 0..100 {
            let i = picker.pick(3).unwrap();
            assert!(i < 3);
        }
        assert_eq!(picker.pick(0), None);
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let mut a = QuizPicker::seeded(42);
        let mut b = QuizPicker::seeded(42);
        let left: Vec<_> = (0..10).map(|_| a.pick(50)).collect();
        let right: Vec<_> = (0..10).map(|_| b.pick(50)).collect();
        assert_eq!(left, right);
    }
}
