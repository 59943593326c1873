use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform random source for placement. Reseeded once per generation pass,
/// never per cell: all jitter and selection draws of a pass come from one
/// ordered stream, so iteration order is part of the output.
pub trait RandomSource {
    fn uniform(&mut self, min: f32, max: f32) -> f32;
    fn reseed(&mut self, seed: u32);
}

pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed as u64),
        }
    }
}

impl RandomSource for StdRandom {
    fn uniform(&mut self, min: f32, max: f32) -> f32 {
        // One raw draw per call, mapped by hand: a zero-width range
        // (error margin 0) must still consume its draw and return `min`
        // so all sources advance their streams identically.
        min + self.rng.random::<f32>() * (max - min)
    }

    fn reseed(&mut self, seed: u32) {
        self.rng = StdRng::seed_from_u64(seed as u64);
    }
}

/// Replays a fixed script of raw draws in [0, 1), cycling at the end.
/// Reseeding rewinds to the start of the script regardless of the seed.
pub struct ScriptedRandom {
    values: Vec<f32>,
    cursor: usize,
}

impl ScriptedRandom {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values, cursor: 0 }
    }
}

impl RandomSource for ScriptedRandom {
    fn uniform(&mut self, min: f32, max: f32) -> f32 {
        if self.values.is_empty() {
            return min;
        }
        let r = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        min + r * (max - min)
    }

    fn reseed(&mut self, _seed: u32) {
        self.cursor = 0;
    }
}
