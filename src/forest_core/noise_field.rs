use std::cell::Cell;

use glam::Vec2;
use noise::{NoiseFn, Perlin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::forest_core::grid::Grid;

/// Coherent 2D noise in [0, 1]. Implementations are fixed pure functions
/// of (x, y); world seeding enters through the octave offsets, never
/// through the primitive itself.
pub trait NoiseSource {
    fn sample2d(&self, x: f32, y: f32) -> f32;
}

/// Classic Perlin gradient noise over a fixed permutation table.
pub struct PerlinSource {
    perlin: Perlin,
}

impl PerlinSource {
    pub fn new() -> Self {
        Self {
            perlin: Perlin::new(0),
        }
    }
}

impl Default for PerlinSource {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseSource for PerlinSource {
    fn sample2d(&self, x: f32, y: f32) -> f32 {
        // Perlin yields [-1, 1]; the source contract is [0, 1].
        (self.perlin.get([x as f64, y as f64]) as f32) * 0.5 + 0.5
    }
}

/// Replays scripted samples in call order, cycling at the end of the
/// script. Values outside [0, 1] are allowed.
pub struct ScriptedNoise {
    values: Vec<f32>,
    cursor: Cell<usize>,
}

impl ScriptedNoise {
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            values,
            cursor: Cell::new(0),
        }
    }
}

impl NoiseSource for ScriptedNoise {
    fn sample2d(&self, _x: f32, _y: f32) -> f32 {
        if self.values.is_empty() {
            return 0.5;
        }
        let i = self.cursor.get();
        self.cursor.set(i + 1);
        self.values[i % self.values.len()]
    }
}

/// Everything a raw field synthesis depends on: equal params over the same
/// source produce bit-identical grids.
#[derive(Clone, Copy, Debug)]
pub struct FieldParams {
    pub seed: u32,
    pub seed_offset: i32,
    pub octaves: u32,
    pub noise_scale: f32,
    pub persistence: f32,
    pub lacunarity: f32,
    /// Static per-species offset, in cell units.
    pub offset: Vec2,
    /// World offset of the chunk being generated, in cell units.
    pub chunk_offset: Vec2,
}

pub struct RawField {
    pub values: Grid<f32>,
    pub min: f32,
    pub max: f32,
}

/// Multi-octave synthesis. Per-octave offsets come from a PRNG seeded with
/// `seed + seed_offset`; each octave samples at
/// `(cell - half + offset) / noise_scale * frequency`, remapped to [-1, 1]
/// and summed under decaying amplitude. Both offset axes are added, so
/// integer chunk offsets translate the sampling lattice.
pub fn generate(
    params: &FieldParams,
    width: usize,
    height: usize,
    noise: &dyn NoiseSource,
) -> RawField {
    let combined_seed = (params.seed as i64 + params.seed_offset as i64) as u64;
    let mut prng = StdRng::seed_from_u64(combined_seed);

    let mut octave_offsets = Vec::with_capacity(params.octaves as usize);
    for _ in 0..params.octaves {
        let x = prng.random_range(-100_000..100_000) as f32
            + params.offset.x
            + params.chunk_offset.x;
        let y = prng.random_range(-100_000..100_000) as f32
            + params.offset.y
            + params.chunk_offset.y;
        octave_offsets.push(Vec2::new(x, y));
    }

    // Integer division: odd sizes bias the center by half a cell.
    let half_w = (width / 2) as f32;
    let half_h = (height / 2) as f32;

    let mut values = Grid::filled(width, height, 0.0f32);
    let mut min = f32::MAX;
    let mut max = f32::MIN;

    for y in 0..height {
        for x in 0..width {
            let mut amplitude = 1.0f32;
            let mut frequency = 1.0f32;
            let mut sum = 0.0f32;

            for offset in &octave_offsets {
                let sx = (x as f32 - half_w + offset.x) / params.noise_scale * frequency;
                let sy = (y as f32 - half_h + offset.y) / params.noise_scale * frequency;
                let sample = noise.sample2d(sx, sy) * 2.0 - 1.0;
                sum += sample * amplitude;

                amplitude *= params.persistence;
                frequency *= params.lacunarity;
            }

            if sum > max {
                max = sum;
            }
            if sum < min {
                min = sum;
            }
            values.set(x, y, sum);
        }
    }

    RawField { values, min, max }
}
