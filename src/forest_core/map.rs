use glam::Vec2;

use crate::forest_core::config::{normalize_weights, ForestConfig, SpeciesConfig};
use crate::forest_core::error::ConfigError;
use crate::forest_core::grid::Grid;
use crate::forest_core::ground::GroundLayer;
use crate::forest_core::layer::Layer;
use crate::forest_core::merge::merge_max;
use crate::forest_core::noise_field::{NoiseSource, PerlinSource};
use crate::forest_core::placement::{PlacementInput, PlacementLayer};
use crate::forest_core::rand_source::{RandomSource, StdRandom};
use crate::forest_core::sink::{GroundSink, ObjectHandle, ObjectSink, SurfaceHandle};
use crate::forest_core::species::{SpeciesFieldInput, SpeciesLayer};

/// One standalone forest over a single surface. Unlike the streaming
/// cache, every `regenerate` tears down the previous placements and
/// redraws from the top-level seed.
pub struct ForestMap {
    seed: u32,
    width: usize,
    height: usize,
    global_scale: f32,
    species: Vec<SpeciesConfig>,
    species_layer: SpeciesLayer,
    ground_layer: GroundLayer,
    placement_layer: PlacementLayer,
    noise: Box<dyn NoiseSource>,
    rng: Box<dyn RandomSource>,
    surface: Option<SurfaceHandle>,
    placements: Vec<ObjectHandle>,
}

impl ForestMap {
    pub fn new(config: &ForestConfig) -> Result<Self, ConfigError> {
        Self::with_sources(
            config,
            Box::new(PerlinSource::default()),
            Box::new(StdRandom::new(config.seed)),
        )
    }

    pub fn with_sources(
        config: &ForestConfig,
        noise: Box<dyn NoiseSource>,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self, ConfigError> {
        let species = normalize_weights(config.species.clone())?;
        let (width, height) = (config.map.width, config.map.height);
        Ok(Self {
            seed: config.seed,
            width,
            height,
            global_scale: config.map.global_scale,
            species,
            species_layer: SpeciesLayer::new(config.seed, config.map.normalize, width, height),
            ground_layer: GroundLayer {
                mode: config.map.display,
                ground_color: config.ground.ground_color,
                water_color: config.ground.water_color,
                water_level: config.ground.water_level,
            },
            placement_layer: PlacementLayer {
                policy: config.map.policy,
                error_margin: config.map.error_margin,
                global_scale: config.map.global_scale,
            },
            noise,
            rng,
            surface: None,
            placements: Vec::new(),
        })
    }

    pub fn surface(&self) -> Option<SurfaceHandle> {
        self.surface
    }

    pub fn placements(&self) -> &[ObjectHandle] {
        &self.placements
    }

    /// Destroys the previous placements, restarts the draw stream from
    /// the seed, recolors the ground and places a fresh set of objects.
    /// Returns the placement count.
    pub fn regenerate(
        &mut self,
        ground: &mut dyn GroundSink,
        objects: &mut dyn ObjectSink,
    ) -> usize {
        for handle in self.placements.drain(..) {
            objects.destroy(handle);
        }
        self.rng.reseed(self.seed);

        let fields: Vec<Grid<f32>> = self
            .species
            .iter()
            .map(|cfg| {
                self.species_layer
                    .generate(SpeciesFieldInput {
                        species: cfg,
                        chunk_offset: Vec2::ZERO,
                        noise: self.noise.as_ref(),
                    })
                    .values
            })
            .collect();

        let refs: Vec<&Grid<f32>> = fields.iter().collect();
        let merged = merge_max(&refs, self.width, self.height);
        let pixels = self.ground_layer.generate(&merged);

        let surface = ground.apply_ground(&pixels);
        let world_size = Vec2::new(
            self.width as f32 * self.global_scale,
            self.height as f32 * self.global_scale,
        );
        ground.set_surface_scale(surface, world_size);
        self.surface = Some(surface);

        let planned = self.placement_layer.generate(PlacementInput {
            species: &self.species,
            fields: &fields,
            width: self.width,
            height: self.height,
            chunk_origin: Vec2::ZERO,
            rng: self.rng.as_mut(),
        });
        self.placements = planned
            .iter()
            .map(|p| {
                objects.instantiate(
                    &self.species[p.species_index].name,
                    p.position,
                    p.scale,
                    surface,
                )
            })
            .collect();

        self.placements.len()
    }
}
