use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use glam::{Vec2, Vec3};

use crate::cli::{CliOptions, DemoMode};
use crate::forest_core::config::ForestConfig;
use crate::forest_core::grid::Grid;
use crate::forest_core::map::ForestMap;
use crate::forest_core::sink::{GroundSink, ObjectHandle, ObjectSink, SurfaceHandle};
use crate::forest_runtime::streaming::StreamingForest;

/// Headless demo driver: generates a forest and exports its ground
/// imagery as PNG files for inspection.
pub fn run(options: &CliOptions) -> Result<()> {
    let mut config = ForestConfig::load(&options.config_path)?.validate()?;
    if let Some(seed) = options.seed {
        config.seed = seed;
    }
    log::info!(
        "seed {} with {} species declared",
        config.seed,
        config.species.len()
    );

    match options.mode {
        DemoMode::Map => run_map(&config, options.out.as_deref()),
        DemoMode::Walk => run_walk(&config, options.out.as_deref(), options.ticks),
    }
}

fn run_map(config: &ForestConfig, out: Option<&Path>) -> Result<()> {
    let mut ground = PngGround::default();
    let mut objects = LoggingObjects::default();
    let mut map = ForestMap::new(config)?;

    let count = map.regenerate(&mut ground, &mut objects);

    let path = out.unwrap_or_else(|| Path::new("forest.png"));
    let surface = map.surface().context("map generation produced no surface")?;
    let pixels = ground
        .take(surface)
        .context("no pixels recorded for the map surface")?;
    write_png(path, &pixels)?;

    log::info!(
        "map complete: {count} placements, ground written to {}",
        path.display()
    );
    Ok(())
}

fn run_walk(config: &ForestConfig, out: Option<&Path>, ticks: u32) -> Result<()> {
    let dir = out.unwrap_or_else(|| Path::new("chunks"));
    let mut ground = PngGround::default();
    let mut objects = LoggingObjects::default();
    let mut forest = StreamingForest::new(config)?;

    // Half a chunk per tick keeps the window sliding without skipping
    // coordinates.
    let step = forest.chunk_world_size() * 0.5;
    for tick in 0..ticks {
        let distance = tick as f32 * step;
        let viewer = Vec3::new(distance, 0.0, distance);
        let generated = forest.tick(viewer, &mut ground, &mut objects);
        let stats = forest.stats();
        log::info!(
            "tick {tick}: viewer ({:.1}, {:.1}), center {},{}, {generated} generated, {} cached, {} visible",
            viewer.x,
            viewer.z,
            stats.center_chunk.x,
            stats.center_chunk.y,
            stats.cached_chunks,
            stats.visible_chunks
        );

        for chunk in forest.chunks().values() {
            if let Some(pixels) = ground.take(chunk.surface) {
                let path = dir.join(format!("chunk_{}_{}.png", chunk.coord.x, chunk.coord.y));
                write_png(&path, &pixels)?;
            }
        }
    }

    log::info!(
        "walk complete: {} objects placed, chunk images under {}",
        objects.total,
        dir.display()
    );
    Ok(())
}

fn write_png(path: &Path, pixels: &Grid<[u8; 4]>) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    image::save_buffer(
        path,
        bytemuck::cast_slice(pixels.as_slice()),
        pixels.width() as u32,
        pixels.height() as u32,
        image::ColorType::Rgba8,
    )
    .with_context(|| format!("failed to encode {}", path.display()))
}

/// Ground sink that buffers pixel grids until the driver writes them out.
#[derive(Default)]
struct PngGround {
    pending: HashMap<SurfaceHandle, Grid<[u8; 4]>>,
    next: u64,
}

impl PngGround {
    fn take(&mut self, surface: SurfaceHandle) -> Option<Grid<[u8; 4]>> {
        self.pending.remove(&surface)
    }
}

impl GroundSink for PngGround {
    fn apply_ground(&mut self, pixels: &Grid<[u8; 4]>) -> SurfaceHandle {
        let handle = SurfaceHandle(self.next);
        self.next += 1;
        self.pending.insert(handle, pixels.clone());
        handle
    }

    fn set_surface_scale(&mut self, surface: SurfaceHandle, world_size: Vec2) {
        log::debug!(
            "surface {surface:?} covers {}x{} world units",
            world_size.x,
            world_size.y
        );
    }
}

/// Object sink that only keeps counters; the demo has nothing to render.
#[derive(Default)]
struct LoggingObjects {
    next: u64,
    live: usize,
    total: u64,
}

impl ObjectSink for LoggingObjects {
    fn instantiate(
        &mut self,
        kind: &str,
        position: Vec3,
        scale: f32,
        parent: SurfaceHandle,
    ) -> ObjectHandle {
        let handle = ObjectHandle(self.next);
        self.next += 1;
        self.live += 1;
        self.total += 1;
        log::trace!(
            "{kind} at ({:.2}, {:.2}) scale {scale:.2} on {parent:?}",
            position.x,
            position.z
        );
        handle
    }

    fn destroy(&mut self, _object: ObjectHandle) {
        self.live = self.live.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_grids_cast_to_row_major_rgba_bytes() {
        let mut pixels = Grid::filled(2, 1, [0u8; 4]);
        pixels.set(0, 0, [1, 2, 3, 4]);
        pixels.set(1, 0, [5, 6, 7, 8]);
        let bytes: &[u8] = bytemuck::cast_slice(pixels.as_slice());
        assert_eq!(bytes, [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn png_ground_hands_each_surface_out_once() {
        let mut ground = PngGround::default();
        let pixels = Grid::filled(1, 1, [9u8, 9, 9, 255]);
        let surface = ground.apply_ground(&pixels);

        assert_eq!(ground.take(surface), Some(pixels));
        assert_eq!(ground.take(surface), None);
    }

    #[test]
    fn logging_objects_count_live_and_total() {
        let mut objects = LoggingObjects::default();
        let parent = SurfaceHandle(0);
        let a = objects.instantiate("pine", Vec3::ZERO, 1.0, parent);
        let _b = objects.instantiate("birch", Vec3::ZERO, 1.0, parent);
        assert_eq!(objects.live, 2);
        assert_eq!(objects.total, 2);

        objects.destroy(a);
        assert_eq!(objects.live, 1);
        assert_eq!(objects.total, 2);
    }
}
