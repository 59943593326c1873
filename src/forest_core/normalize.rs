use serde::{Deserialize, Serialize};

use crate::forest_core::grid::Grid;
use crate::forest_core::noise_field::RawField;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NormalizeMode {
    /// Rescale by the min/max actually observed in the field.
    Local,
    /// Rescale by the analytic amplitude bounds of the octave series;
    /// out-of-range samples are reported, then clamped.
    Global,
}

/// Out-of-range accounting for global normalization. `worst` is the signed
/// distance of the farthest sample outside [0, 1] (0 when none escaped).
#[derive(Clone, Copy, Debug, Default)]
pub struct NormalizeReport {
    pub overflow_count: usize,
    pub worst: f32,
}

pub fn inverse_lerp(a: f32, b: f32, v: f32) -> f32 {
    if a == b {
        return 0.0;
    }
    (v - a) / (b - a)
}

pub fn normalize(
    field: &RawField,
    mode: NormalizeMode,
    octaves: u32,
    persistence: f32,
) -> (Grid<f32>, NormalizeReport) {
    match mode {
        NormalizeMode::Local => (normalize_local(field), NormalizeReport::default()),
        NormalizeMode::Global => normalize_global(field, octaves, persistence),
    }
}

fn normalize_local(field: &RawField) -> Grid<f32> {
    let (width, height) = (field.values.width(), field.values.height());
    let mut out = Grid::filled(width, height, 0.0f32);
    for y in 0..height {
        for x in 0..width {
            out.set(x, y, inverse_lerp(field.min, field.max, field.values.get(x, y)));
        }
    }
    out
}

fn normalize_global(
    field: &RawField,
    octaves: u32,
    persistence: f32,
) -> (Grid<f32>, NormalizeReport) {
    let (min_bound, max_bound) = amplitude_bounds(octaves, persistence);
    let (width, height) = (field.values.width(), field.values.height());

    let mut out = Grid::filled(width, height, 0.0f32);
    let mut report = NormalizeReport::default();

    for y in 0..height {
        for x in 0..width {
            // Max-first argument order inverts the field: raw at +bound
            // maps to 0, at -bound to 1.
            let v = inverse_lerp(max_bound, min_bound, field.values.get(x, y));
            if !(0.0..=1.0).contains(&v) {
                report.overflow_count += 1;
                let excursion = if v < 0.0 { v } else { v - 1.0 };
                if excursion.abs() > report.worst.abs() {
                    report.worst = excursion;
                }
            }
            out.set(x, y, v.clamp(0.0, 1.0));
        }
    }

    if report.overflow_count > 0 {
        log::warn!(
            "global normalization left {} samples outside [0, 1] (worst excursion {})",
            report.overflow_count,
            report.worst
        );
    }

    (out, report)
}

/// Bounds of the accumulated octave series, by the same `bound += amplitude;
/// amplitude *= persistence` loop the synthesis runs.
fn amplitude_bounds(octaves: u32, persistence: f32) -> (f32, f32) {
    let mut max_bound = 0.0f32;
    let mut amplitude = 1.0f32;
    for _ in 0..octaves {
        max_bound += amplitude;
        amplitude *= persistence;
    }
    (-max_bound, max_bound)
}
