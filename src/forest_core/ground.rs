use serde::{Deserialize, Serialize};

use crate::forest_core::grid::Grid;
use crate::forest_core::layer::Layer;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayMode {
    /// Greyscale ramp of the cumulative field.
    Noise,
    /// Constant ground color, ignoring the field.
    FlatColor,
    /// Threshold debug view: at or above the water level renders black.
    Filtered,
    /// Water below the water level, ground at or above it.
    Lakes,
}

const BLACK: [u8; 4] = [0, 0, 0, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];

pub struct GroundLayer {
    pub mode: DisplayMode,
    pub ground_color: [u8; 4],
    pub water_color: [u8; 4],
    pub water_level: f32,
}

impl<'a> Layer<&'a Grid<f32>, Grid<[u8; 4]>> for GroundLayer {
    fn generate(&self, cumulative: &'a Grid<f32>) -> Grid<[u8; 4]> {
        let (width, height) = (cumulative.width(), cumulative.height());
        let mut pixels = Grid::filled(width, height, [0u8; 4]);

        for y in 0..height {
            for x in 0..width {
                let v = cumulative.get(x, y);
                let color = match self.mode {
                    DisplayMode::Noise => greyscale(v),
                    DisplayMode::FlatColor => self.ground_color,
                    DisplayMode::Filtered => {
                        if v >= self.water_level {
                            BLACK
                        } else {
                            WHITE
                        }
                    }
                    DisplayMode::Lakes => {
                        if v < self.water_level {
                            self.water_color
                        } else {
                            self.ground_color
                        }
                    }
                };
                pixels.set(x, y, color);
            }
        }

        pixels
    }
}

fn greyscale(v: f32) -> [u8; 4] {
    let level = (v.clamp(0.0, 1.0) * 255.0) as u8;
    [level, level, level, 255]
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUND: [u8; 4] = [76, 112, 60, 255];
    const WATER: [u8; 4] = [52, 88, 148, 255];

    fn layer(mode: DisplayMode) -> GroundLayer {
        GroundLayer {
            mode,
            ground_color: GROUND,
            water_color: WATER,
            water_level: 0.5,
        }
    }

    fn field() -> Grid<f32> {
        let mut g = Grid::filled(3, 1, 0.0f32);
        g.set(1, 0, 0.5);
        g.set(2, 0, 1.0);
        g
    }

    #[test]
    fn noise_mode_ramps_black_to_white() {
        let pixels = layer(DisplayMode::Noise).generate(&field());
        assert_eq!(pixels.get(0, 0), [0, 0, 0, 255]);
        assert_eq!(pixels.get(1, 0), [127, 127, 127, 255]);
        assert_eq!(pixels.get(2, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn flat_color_ignores_the_field() {
        let pixels = layer(DisplayMode::FlatColor).generate(&field());
        assert!(pixels.as_slice().iter().all(|&p| p == GROUND));
    }

    #[test]
    fn filtered_mode_blacks_out_at_the_water_level() {
        let pixels = layer(DisplayMode::Filtered).generate(&field());
        assert_eq!(pixels.get(0, 0), WHITE);
        // The threshold itself belongs to the dark side.
        assert_eq!(pixels.get(1, 0), BLACK);
        assert_eq!(pixels.get(2, 0), BLACK);
    }

    #[test]
    fn lakes_mode_fills_water_below_the_level() {
        let pixels = layer(DisplayMode::Lakes).generate(&field());
        assert_eq!(pixels.get(0, 0), WATER);
        assert_eq!(pixels.get(1, 0), GROUND);
        assert_eq!(pixels.get(2, 0), GROUND);
    }
}
