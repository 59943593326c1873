use glam::{Vec2, Vec3};

use crate::forest_core::grid::Grid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectHandle(pub u64);

/// Receives colorized ground imagery. Implementations decide what a
/// surface is: a texture upload, a PNG on disk, a recorded call.
pub trait GroundSink {
    fn apply_ground(&mut self, pixels: &Grid<[u8; 4]>) -> SurfaceHandle;
    fn set_surface_scale(&mut self, surface: SurfaceHandle, world_size: Vec2);
}

/// Receives planned objects. `parent` is the ground surface the object
/// stands on.
pub trait ObjectSink {
    fn instantiate(
        &mut self,
        kind: &str,
        position: Vec3,
        scale: f32,
        parent: SurfaceHandle,
    ) -> ObjectHandle;
    fn destroy(&mut self, object: ObjectHandle);
}

/// Records every ground call.
#[derive(Default)]
pub struct RecordingGround {
    pub applied: Vec<(SurfaceHandle, Grid<[u8; 4]>)>,
    pub scaled: Vec<(SurfaceHandle, Vec2)>,
    next: u64,
}

impl GroundSink for RecordingGround {
    fn apply_ground(&mut self, pixels: &Grid<[u8; 4]>) -> SurfaceHandle {
        let handle = SurfaceHandle(self.next);
        self.next += 1;
        self.applied.push((handle, pixels.clone()));
        handle
    }

    fn set_surface_scale(&mut self, surface: SurfaceHandle, world_size: Vec2) {
        self.scaled.push((surface, world_size));
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct InstantiatedObject {
    pub handle: ObjectHandle,
    pub kind: String,
    pub position: Vec3,
    pub scale: f32,
    pub parent: SurfaceHandle,
}

/// Records instantiations and destructions.
#[derive(Default)]
pub struct RecordingObjects {
    pub instantiated: Vec<InstantiatedObject>,
    pub destroyed: Vec<ObjectHandle>,
    next: u64,
}

impl ObjectSink for RecordingObjects {
    fn instantiate(
        &mut self,
        kind: &str,
        position: Vec3,
        scale: f32,
        parent: SurfaceHandle,
    ) -> ObjectHandle {
        let handle = ObjectHandle(self.next);
        self.next += 1;
        self.instantiated.push(InstantiatedObject {
            handle,
            kind: kind.to_string(),
            position,
            scale,
            parent,
        });
        handle
    }

    fn destroy(&mut self, object: ObjectHandle) {
        self.destroyed.push(object);
    }
}
