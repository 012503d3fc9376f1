use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};

/// Every random choice the generator makes.
///
/// Implementations must return indices below the bound they are given.
pub trait Picker {
    fn pick_template(&mut self, candidates: usize) -> usize;

    /// `amount` distinct indices below `available`.
    fn pick_resources(&mut self, available: usize, amount: usize) -> Vec<usize>;

    fn pick_value(&mut self, candidates: usize) -> usize;
}

/// Uniform choices from any `rand` generator.
#[derive(Debug, Clone)]
pub struct RandomPicker<R: Rng> {
    rng: R,
}

impl RandomPicker<ThreadRng> {
    pub fn thread() -> Self {
        Self::new(rand::thread_rng())
    }
}

impl RandomPicker<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomPicker<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    fn index(&mut self, bound: usize) -> usize {
        if bound == 0 {
            0
        } else {
            self.rng.gen_range(0..bound)
        }
    }
}

impl<R: Rng> Picker for RandomPicker<R> {
    fn pick_template(&mut self, candidates: usize) -> usize {
        self.index(candidates)
    }

    fn pick_resources(&mut self, available: usize, amount: usize) -> Vec<usize> {
        rand::seq::index::sample(&mut self.rng, available, amount.min(available)).into_vec()
    }

    fn pick_value(&mut self, candidates: usize) -> usize {
        self.index(candidates)
    }
}
