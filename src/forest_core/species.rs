use glam::Vec2;

use crate::forest_core::config::SpeciesConfig;
use crate::forest_core::grid::Grid;
use crate::forest_core::layer::Layer;
use crate::forest_core::noise_field::{self, FieldParams, NoiseSource};
use crate::forest_core::normalize::{normalize, NormalizeMode, NormalizeReport};

/// One normalized field per species: raw synthesis under the species'
/// own parameters and seed offset, then normalization.
pub struct SpeciesLayer {
    seed: u32,
    mode: NormalizeMode,
    width: usize,
    height: usize,
}

pub struct SpeciesFieldInput<'a> {
    pub species: &'a SpeciesConfig,
    /// Offset of the chunk being generated, in cell units.
    pub chunk_offset: Vec2,
    pub noise: &'a dyn NoiseSource,
}

pub struct SpeciesField {
    pub values: Grid<f32>,
    pub report: NormalizeReport,
}

impl SpeciesLayer {
    pub fn new(seed: u32, mode: NormalizeMode, width: usize, height: usize) -> Self {
        Self {
            seed,
            mode,
            width,
            height,
        }
    }
}

impl<'a> Layer<SpeciesFieldInput<'a>, SpeciesField> for SpeciesLayer {
    fn generate(&self, input: SpeciesFieldInput<'a>) -> SpeciesField {
        let species = input.species;
        let params = FieldParams {
            seed: self.seed,
            seed_offset: species.seed_offset,
            octaves: species.octaves,
            noise_scale: species.noise_scale,
            persistence: species.persistence,
            lacunarity: species.lacunarity,
            offset: Vec2::from(species.offset),
            chunk_offset: input.chunk_offset,
        };

        let raw = noise_field::generate(&params, self.width, self.height, input.noise);
        let (values, report) = normalize(&raw, self.mode, species.octaves, species.persistence);
        SpeciesField { values, report }
    }
}
