use std::collections::HashMap;

use glam::{IVec2, Vec3};

use crate::forest_core::chunk::{world_to_chunk, TerrainChunk};
use crate::forest_core::chunk_generator::{ChunkSource, ForestChunkGenerator};
use crate::forest_core::config::ForestConfig;
use crate::forest_core::error::ConfigError;
use crate::forest_core::sink::{GroundSink, ObjectSink};

pub struct StreamingStats {
    pub cached_chunks: usize,
    pub visible_chunks: usize,
    pub center_chunk: IVec2,
}

/// Viewer-centered chunk streamer. Every coordinate the view window ever
/// touches is generated exactly once and cached for the process lifetime;
/// leaving the window only hides a chunk.
pub struct StreamingForest<S: ChunkSource> {
    seed: u32,
    view_radius: i32,
    chunk_world_size: f32,
    source: S,
    cache: HashMap<IVec2, TerrainChunk>,
    center: IVec2,
}

impl StreamingForest<ForestChunkGenerator> {
    pub fn new(config: &ForestConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_source(
            config.seed,
            config.streaming.view_radius,
            ForestChunkGenerator::new(config)?,
        ))
    }
}

impl<S: ChunkSource> StreamingForest<S> {
    pub fn with_source(seed: u32, view_radius: i32, source: S) -> Self {
        let chunk_world_size = source.chunk_world_size();
        Self {
            seed,
            view_radius,
            chunk_world_size,
            source,
            cache: HashMap::new(),
            center: IVec2::ZERO,
        }
    }

    /// Recenters the window on the viewer, updates visibility over the
    /// whole cache, then generates every window coordinate not yet cached.
    /// Returns the number of chunks generated this tick.
    pub fn tick(
        &mut self,
        viewer: Vec3,
        ground: &mut dyn GroundSink,
        objects: &mut dyn ObjectSink,
    ) -> usize {
        self.center = world_to_chunk(viewer, self.chunk_world_size);

        for chunk in self.cache.values_mut() {
            chunk.visible = in_window(chunk.coord, self.center, self.view_radius);
        }

        let missing: Vec<IVec2> = window_coords(self.center, self.view_radius)
            .into_iter()
            .filter(|coord| !self.cache.contains_key(coord))
            .collect();
        if missing.is_empty() {
            return 0;
        }

        // One draw stream per tick batch. A failed coordinate stays out
        // of the cache and retries when the window covers it again.
        self.source.reseed(self.seed);
        let mut generated = 0;
        for coord in missing {
            match self.source.generate(coord, ground, objects) {
                Ok(chunk) => {
                    self.cache.insert(coord, chunk);
                    generated += 1;
                }
                Err(e) => {
                    log::warn!("chunk {},{} generation failed: {e:#}", coord.x, coord.y);
                }
            }
        }
        generated
    }

    pub fn chunks(&self) -> &HashMap<IVec2, TerrainChunk> {
        &self.cache
    }

    pub fn chunk_world_size(&self) -> f32 {
        self.chunk_world_size
    }

    pub fn stats(&self) -> StreamingStats {
        StreamingStats {
            cached_chunks: self.cache.len(),
            visible_chunks: self.cache.values().filter(|c| c.visible).count(),
            center_chunk: self.center,
        }
    }
}

fn in_window(coord: IVec2, center: IVec2, radius: i32) -> bool {
    (coord.x - center.x).abs() <= radius && (coord.y - center.y).abs() <= radius
}

/// Window coordinates in the fixed generation order, rows before columns.
fn window_coords(center: IVec2, radius: i32) -> Vec<IVec2> {
    let width = (radius * 2 + 1).max(1);
    let mut coords = Vec::with_capacity((width * width) as usize);
    for y in -radius..=radius {
        for x in -radius..=radius {
            coords.push(IVec2::new(center.x + x, center.y + y));
        }
    }
    coords
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::forest_core::grid::Grid;
    use crate::forest_core::sink::{RecordingGround, RecordingObjects};

    /// Records every call; optionally fails the first generation.
    struct CountingSource {
        world_size: f32,
        generated: Rc<RefCell<Vec<IVec2>>>,
        reseeds: Rc<RefCell<Vec<u32>>>,
        fail_first: bool,
    }

    impl CountingSource {
        fn new(world_size: f32) -> (Self, Rc<RefCell<Vec<IVec2>>>, Rc<RefCell<Vec<u32>>>) {
            let generated = Rc::new(RefCell::new(Vec::new()));
            let reseeds = Rc::new(RefCell::new(Vec::new()));
            let source = Self {
                world_size,
                generated: Rc::clone(&generated),
                reseeds: Rc::clone(&reseeds),
                fail_first: false,
            };
            (source, generated, reseeds)
        }
    }

    impl ChunkSource for CountingSource {
        fn chunk_world_size(&self) -> f32 {
            self.world_size
        }

        fn reseed(&mut self, seed: u32) {
            self.reseeds.borrow_mut().push(seed);
        }

        fn generate(
            &mut self,
            coord: IVec2,
            ground: &mut dyn GroundSink,
            objects: &mut dyn ObjectSink,
        ) -> anyhow::Result<TerrainChunk> {
            if self.fail_first {
                self.fail_first = false;
                anyhow::bail!("scripted failure");
            }
            self.generated.borrow_mut().push(coord);
            let surface = ground.apply_ground(&Grid::filled(1, 1, [0u8; 4]));
            let handle = objects.instantiate("pine", Vec3::ZERO, 1.0, surface);
            Ok(TerrainChunk {
                coord,
                surface,
                placements: vec![handle],
                visible: true,
            })
        }
    }

    fn sinks() -> (RecordingGround, RecordingObjects) {
        (RecordingGround::default(), RecordingObjects::default())
    }

    #[test]
    fn a_cached_coord_is_never_generated_twice() {
        let (source, generated, _) = CountingSource::new(8.0);
        let mut forest = StreamingForest::with_source(42, 0, source);
        let (mut ground, mut objects) = sinks();

        assert_eq!(forest.tick(Vec3::ZERO, &mut ground, &mut objects), 1);
        assert_eq!(forest.tick(Vec3::ZERO, &mut ground, &mut objects), 0);
        assert_eq!(forest.tick(Vec3::new(8.0, 0.0, 0.0), &mut ground, &mut objects), 1);
        assert_eq!(forest.tick(Vec3::ZERO, &mut ground, &mut objects), 0);

        assert_eq!(*generated.borrow(), vec![IVec2::ZERO, IVec2::new(1, 0)]);
    }

    #[test]
    fn window_exit_toggles_visibility_and_keeps_handles_alive() {
        let (source, _, _) = CountingSource::new(8.0);
        let mut forest = StreamingForest::with_source(42, 0, source);
        let (mut ground, mut objects) = sinks();

        forest.tick(Vec3::ZERO, &mut ground, &mut objects);
        let home = forest.chunks()[&IVec2::ZERO].clone();
        assert!(home.visible);

        forest.tick(Vec3::new(8.0, 0.0, 0.0), &mut ground, &mut objects);
        let hidden = &forest.chunks()[&IVec2::ZERO];
        assert!(!hidden.visible);
        assert_eq!(hidden.surface, home.surface);
        assert_eq!(hidden.placements, home.placements);
        assert!(objects.destroyed.is_empty());

        forest.tick(Vec3::ZERO, &mut ground, &mut objects);
        let back = &forest.chunks()[&IVec2::ZERO];
        assert!(back.visible);
        assert_eq!(back.surface, home.surface);
    }

    #[test]
    fn the_view_window_is_a_square_inclusive_of_its_radius() {
        let (source, generated, _) = CountingSource::new(8.0);
        let mut forest = StreamingForest::with_source(42, 2, source);
        let (mut ground, mut objects) = sinks();

        assert_eq!(forest.tick(Vec3::ZERO, &mut ground, &mut objects), 25);

        let mut expected = Vec::new();
        for y in -2..=2 {
            for x in -2..=2 {
                expected.push(IVec2::new(x, y));
            }
        }
        assert_eq!(*generated.borrow(), expected);

        let stats = forest.stats();
        assert_eq!(stats.cached_chunks, 25);
        assert_eq!(stats.visible_chunks, 25);
        assert_eq!(stats.center_chunk, IVec2::ZERO);
    }

    #[test]
    fn the_viewer_snaps_to_the_nearest_chunk_center() {
        let (source, generated, _) = CountingSource::new(8.0);
        let mut forest = StreamingForest::with_source(42, 0, source);
        let (mut ground, mut objects) = sinks();

        forest.tick(Vec3::new(12.6, 0.0, -4.1), &mut ground, &mut objects);
        assert_eq!(forest.stats().center_chunk, IVec2::new(2, -1));
        assert_eq!(*generated.borrow(), vec![IVec2::new(2, -1)]);
    }

    #[test]
    fn a_failed_coord_stays_uncached_and_retries() {
        let (mut source, generated, reseeds) = CountingSource::new(8.0);
        source.fail_first = true;
        let mut forest = StreamingForest::with_source(7, 0, source);
        let (mut ground, mut objects) = sinks();

        assert_eq!(forest.tick(Vec3::ZERO, &mut ground, &mut objects), 0);
        assert_eq!(forest.stats().cached_chunks, 0);

        assert_eq!(forest.tick(Vec3::ZERO, &mut ground, &mut objects), 1);
        assert_eq!(*generated.borrow(), vec![IVec2::ZERO]);
        // Both ticks had a missing coordinate, so both reseeded.
        assert_eq!(*reseeds.borrow(), vec![7, 7]);
    }

    #[test]
    fn ticks_with_a_full_window_do_not_reseed() {
        let (source, _, reseeds) = CountingSource::new(8.0);
        let mut forest = StreamingForest::with_source(42, 1, source);
        let (mut ground, mut objects) = sinks();

        forest.tick(Vec3::ZERO, &mut ground, &mut objects);
        forest.tick(Vec3::ZERO, &mut ground, &mut objects);
        assert_eq!(reseeds.borrow().len(), 1);
    }

    #[test]
    fn two_walks_over_the_same_seed_generate_identical_forests() {
        let config = {
            let mut config = ForestConfig::default();
            config.seed = 42;
            config.streaming.chunk_size = 8;
            config.streaming.view_radius = 1;
            config
        };

        let mut walks = Vec::new();
        for _ in 0..2 {
            let mut forest = StreamingForest::new(&config).unwrap();
            let (mut ground, mut objects) = sinks();
            let step = forest.chunk_world_size() * 0.5;
            for tick in 0..3 {
                let viewer = Vec3::new(tick as f32 * step, 0.0, tick as f32 * step);
                forest.tick(viewer, &mut ground, &mut objects);
            }
            walks.push((ground.applied, objects.instantiated));
        }

        assert_eq!(walks[0].0, walks[1].0);
        assert_eq!(walks[0].1, walks[1].1);
    }
}
