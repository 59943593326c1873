use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::forest_core::error::ConfigError;
use crate::forest_core::ground::DisplayMode;
use crate::forest_core::normalize::NormalizeMode;
use crate::forest_core::placement::SelectionPolicy;

/// Noise scale divides sample coordinates; zero would blow the lattice up.
const MIN_NOISE_SCALE: f32 = 1e-4;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub seed: u32,
    pub map: MapConfig,
    pub streaming: StreamingConfig,
    pub ground: GroundConfig,
    pub species: Vec<SpeciesConfig>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            map: MapConfig::default(),
            streaming: StreamingConfig::default(),
            ground: GroundConfig::default(),
            species: vec![
                SpeciesConfig {
                    name: "pine".to_string(),
                    weight: 0.5,
                    noise_scale: 35.0,
                    threshold: 0.55,
                    ..SpeciesConfig::default()
                },
                SpeciesConfig {
                    name: "birch".to_string(),
                    seed_offset: 101,
                    weight: 0.3,
                    noise_scale: 28.0,
                    threshold: 0.6,
                    offset: [12.5, -4.0],
                    ..SpeciesConfig::default()
                },
                SpeciesConfig {
                    name: "shrub".to_string(),
                    seed_offset: 907,
                    weight: 0.2,
                    object_scale: 0.4,
                    octaves: 3,
                    noise_scale: 18.0,
                    persistence: 0.45,
                    lacunarity: 2.2,
                    threshold: 0.5,
                    ..SpeciesConfig::default()
                },
            ],
        }
    }
}

impl ForestConfig {
    /// Reads a JSON config. A missing file means defaults; an unreadable
    /// or malformed file is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("loaded {}", path.display());
        Ok(config)
    }

    /// Clamps every recognized option into its legal range and renormalizes
    /// species weights. Runs once at load time, never during generation.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if self.species.is_empty() {
            return Err(ConfigError::NoSpecies);
        }

        self.map.error_margin = clamp_logged("map.error_margin", self.map.error_margin, 0.0, 0.5);

        if self.streaming.chunk_size == 0 {
            log::warn!("streaming.chunk_size 0 raised to 1");
            self.streaming.chunk_size = 1;
        }
        if self.streaming.view_radius < 0 {
            log::warn!(
                "streaming.view_radius {} raised to 0",
                self.streaming.view_radius
            );
            self.streaming.view_radius = 0;
        }

        self.ground.water_level = clamp_logged("ground.water_level", self.ground.water_level, 0.0, 1.0);

        for species in &mut self.species {
            species.sanitize();
        }
        self.species = normalize_weights(self.species)?;

        Ok(self)
    }
}

/// Renormalizes probability weights to sum to 1 across the whole declared
/// list, enabled or not; eligibility filters disabled species later.
pub fn normalize_weights(mut species: Vec<SpeciesConfig>) -> Result<Vec<SpeciesConfig>, ConfigError> {
    let sum: f32 = species.iter().map(|s| s.weight).sum();
    if !(sum > 0.0) || !sum.is_finite() {
        return Err(ConfigError::NonPositiveWeightSum { sum });
    }
    for s in &mut species {
        s.weight /= sum;
    }
    Ok(species)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub width: usize,
    pub height: usize,
    pub global_scale: f32,
    /// Placement jitter half-range, in cell units.
    pub error_margin: f32,
    pub display: DisplayMode,
    pub normalize: NormalizeMode,
    pub policy: SelectionPolicy,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
            global_scale: 1.0,
            error_margin: 0.35,
            display: DisplayMode::Noise,
            normalize: NormalizeMode::Local,
            policy: SelectionPolicy::Random,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Cells per chunk side.
    pub chunk_size: usize,
    /// View window half-width, in chunks.
    pub view_radius: i32,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 64,
            view_radius: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    pub ground_color: [u8; 4],
    pub water_color: [u8; 4],
    /// Cumulative-field threshold for the filtered and lakes displays.
    pub water_level: f32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            ground_color: [76, 112, 60, 255],
            water_color: [52, 88, 148, 255],
            water_level: 0.35,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeciesConfig {
    pub name: String,
    pub enabled: bool,
    pub seed_offset: i32,
    pub weight: f32,
    pub object_scale: f32,
    pub octaves: u32,
    pub noise_scale: f32,
    pub persistence: f32,
    pub lacunarity: f32,
    /// Minimum normalized field value for eligibility.
    pub threshold: f32,
    /// Static sampling offset, in cell units.
    pub offset: [f32; 2],
}

impl Default for SpeciesConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            enabled: true,
            seed_offset: 0,
            weight: 1.0,
            object_scale: 1.0,
            octaves: 4,
            noise_scale: 35.0,
            persistence: 0.5,
            lacunarity: 2.0,
            threshold: 0.55,
            offset: [0.0, 0.0],
        }
    }
}

impl SpeciesConfig {
    fn sanitize(&mut self) {
        if !(1..=12).contains(&self.octaves) {
            let clamped = self.octaves.clamp(1, 12);
            log::warn!(
                "species {} octaves {} clamped to {clamped}",
                self.name,
                self.octaves
            );
            self.octaves = clamped;
        }
        self.weight = clamp_logged(&format!("species {} weight", self.name), self.weight, 0.0, 1.0);
        self.persistence = clamp_logged(
            &format!("species {} persistence", self.name),
            self.persistence,
            0.0,
            1.0,
        );
        self.threshold = clamp_logged(
            &format!("species {} threshold", self.name),
            self.threshold,
            0.0,
            1.0,
        );
        if self.noise_scale < MIN_NOISE_SCALE {
            log::warn!(
                "species {} noise_scale {} raised to {MIN_NOISE_SCALE}",
                self.name,
                self.noise_scale
            );
            self.noise_scale = MIN_NOISE_SCALE;
        }
    }
}

fn clamp_logged(name: &str, value: f32, min: f32, max: f32) -> f32 {
    let clamped = value.clamp(min, max);
    if clamped != value {
        log::warn!("{name} {value} clamped to {clamped}");
    }
    clamped
}
