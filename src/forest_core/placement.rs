use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::forest_core::config::SpeciesConfig;
use crate::forest_core::grid::Grid;
use crate::forest_core::layer::Layer;
use crate::forest_core::rand_source::RandomSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionPolicy {
    /// One species per eligible cell, drawn by probability weight.
    Random,
    /// One species per eligible cell, the heaviest weight wins.
    MaxProbability,
    /// Every eligible species places at the cell.
    SpawnAll,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlannedPlacement {
    pub species_index: usize,
    pub position: Vec3,
    pub scale: f32,
}

pub struct PlacementLayer {
    pub policy: SelectionPolicy,
    pub error_margin: f32,
    pub global_scale: f32,
}

pub struct PlacementInput<'a> {
    pub species: &'a [SpeciesConfig],
    /// One normalized field per species, same order as `species`.
    pub fields: &'a [Grid<f32>],
    pub width: usize,
    pub height: usize,
    /// World-space center of the chunk, zero for a standalone map.
    pub chunk_origin: Vec2,
    pub rng: &'a mut dyn RandomSource,
}

/// Draw order: cells iterate row-major (y outer, x inner); an eligible cell
/// draws its jitter pair first, then (weighted-random only) one selection
/// draw; spawn-all draws one jitter pair per eligible species in declared
/// order. Cells with no eligible species consume nothing.
impl<'a> Layer<PlacementInput<'a>, Vec<PlannedPlacement>> for PlacementLayer {
    fn generate(&self, input: PlacementInput<'a>) -> Vec<PlannedPlacement> {
        let PlacementInput {
            species,
            fields,
            width,
            height,
            chunk_origin,
            rng,
        } = input;

        let half_w = (width / 2) as f32;
        let half_h = (height / 2) as f32;

        let mut placements = Vec::new();
        let mut eligible: Vec<usize> = Vec::with_capacity(species.len());

        for y in 0..height {
            for x in 0..width {
                eligible.clear();
                for (i, cfg) in species.iter().enumerate() {
                    if cfg.enabled && fields[i].get(x, y) >= cfg.threshold {
                        eligible.push(i);
                    }
                }
                if eligible.is_empty() {
                    continue;
                }

                match self.policy {
                    SelectionPolicy::Random => {
                        let jitter = draw_jitter(rng, self.error_margin);
                        let index = select_weighted(species, &eligible, rng);
                        placements.push(self.place(
                            species,
                            index,
                            x,
                            y,
                            half_w,
                            half_h,
                            jitter,
                            chunk_origin,
                        ));
                    }
                    SelectionPolicy::MaxProbability => {
                        let jitter = draw_jitter(rng, self.error_margin);
                        let index = select_max_weight(species, &eligible);
                        placements.push(self.place(
                            species,
                            index,
                            x,
                            y,
                            half_w,
                            half_h,
                            jitter,
                            chunk_origin,
                        ));
                    }
                    SelectionPolicy::SpawnAll => {
                        for &index in &eligible {
                            let jitter = draw_jitter(rng, self.error_margin);
                            placements.push(self.place(
                                species,
                                index,
                                x,
                                y,
                                half_w,
                                half_h,
                                jitter,
                                chunk_origin,
                            ));
                        }
                    }
                }
            }
        }

        placements
    }
}

impl PlacementLayer {
    #[allow(clippy::too_many_arguments)]
    fn place(
        &self,
        species: &[SpeciesConfig],
        index: usize,
        x: usize,
        y: usize,
        half_w: f32,
        half_h: f32,
        jitter: Vec2,
        chunk_origin: Vec2,
    ) -> PlannedPlacement {
        let world_x = (x as f32 - half_w + 0.5 + jitter.x) * self.global_scale + chunk_origin.x;
        let world_z = (y as f32 - half_h + 0.5 + jitter.y) * self.global_scale + chunk_origin.y;
        PlannedPlacement {
            species_index: index,
            position: Vec3::new(world_x, 0.0, world_z),
            scale: self.global_scale * species[index].object_scale,
        }
    }
}

fn draw_jitter(rng: &mut dyn RandomSource, error_margin: f32) -> Vec2 {
    Vec2::new(
        rng.uniform(-error_margin, error_margin),
        rng.uniform(-error_margin, error_margin),
    )
}

/// Weighted walk over the eligible subset; weights are pre-normalized, so
/// the subset total is a plain sum. An exhausted walk lands on the last.
fn select_weighted(
    species: &[SpeciesConfig],
    eligible: &[usize],
    rng: &mut dyn RandomSource,
) -> usize {
    let total: f32 = eligible.iter().map(|&i| species[i].weight).sum();
    let mut point = rng.uniform(0.0, 1.0) * total;
    for &i in eligible {
        if point < species[i].weight {
            return i;
        }
        point -= species[i].weight;
    }
    eligible[eligible.len() - 1]
}

/// Strictly-greatest weight wins, ties keep the earliest declared. The
/// running max starts at 0, so an all-non-positive subset keeps its first.
fn select_max_weight(species: &[SpeciesConfig], eligible: &[usize]) -> usize {
    let mut best = eligible[0];
    let mut best_weight = 0.0f32;
    for &i in eligible {
        if species[i].weight > best_weight {
            best_weight = species[i].weight;
            best = i;
        }
    }
    best
}
