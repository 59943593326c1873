use glam::{IVec2, Vec3};

use crate::forest_core::sink::{ObjectHandle, SurfaceHandle};

/// Coordinate of the chunk whose center is nearest to a world position.
/// Chunks are centered on integer multiples of `chunk_world_size`, so this
/// is a rounded division of the xz plane, half away from zero.
pub fn world_to_chunk(position: Vec3, chunk_world_size: f32) -> IVec2 {
    let xz = glam::Vec2::new(position.x, position.z) / chunk_world_size;
    IVec2::new(xz.x.round() as i32, xz.y.round() as i32)
}

/// One generated chunk. Frozen at generation: leaving the view window only
/// hides it, its surface and objects stay alive for the next visit.
#[derive(Clone, Debug)]
pub struct TerrainChunk {
    pub coord: IVec2,
    pub surface: SurfaceHandle,
    pub placements: Vec<ObjectHandle>,
    pub visible: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_to_chunk_rounds_to_the_nearest_center() {
        assert_eq!(world_to_chunk(Vec3::new(12.6, 0.0, -4.1), 8.0), IVec2::new(2, -1));
        assert_eq!(world_to_chunk(Vec3::new(0.0, 5.0, 0.0), 8.0), IVec2::ZERO);
        assert_eq!(world_to_chunk(Vec3::new(3.9, 0.0, 3.9), 8.0), IVec2::ZERO);
    }

    #[test]
    fn half_cell_boundaries_round_away_from_zero() {
        assert_eq!(world_to_chunk(Vec3::new(4.0, 0.0, -4.0), 8.0), IVec2::new(1, -1));
    }
}
