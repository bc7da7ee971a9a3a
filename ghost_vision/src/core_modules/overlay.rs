// THEORY:
// The overlay draws one translucent cube around every tracked ghost head,
// coloured by its claim state, visible through walls. Geometry is produced
// in viewer space: the renderer subtracts the viewer's interpolated position
// so the sink can draw relative to the camera.
//
// Emission is read-only. It works from a snapshot of the store taken after
// the frame's presence and lifecycle phases, so the colours always reflect
// the state just evaluated.

use crate::core_modules::coordinates::Vec3;
use crate::core_modules::tracking_store::{GhostState, TrackedGhost};
use crate::host::{RenderSink, Viewer};

/// Straight-alpha RGBA colour, components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl OverlayColor {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Colour for a head in `state`: green claimed, red unclaimed, yellow
    /// not yet evaluated.
    pub fn for_state(state: GhostState, alpha: f32) -> Self {
        match state {
            GhostState::Claimed => Self::new(0.0, 1.0, 0.0, alpha),
            GhostState::Unclaimed => Self::new(1.0, 0.0, 0.0, alpha),
            GhostState::Unknown => Self::new(1.0, 1.0, 0.0, alpha),
        }
    }

    /// 8-bit RGBA, rounded.
    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

/// An axis-aligned cube in viewer space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayCube {
    pub min: Vec3,
    pub max: Vec3,
    pub color: OverlayColor,
    /// Always false: the overlay shows through terrain.
    pub depth_test: bool,
}

impl OverlayCube {
    /// The six faces as quads: bottom, top, north, south, west, east.
    pub fn quads(&self) -> [[Vec3; 4]; 6] {
        let (a, b) = (self.min, self.max);
        let v = Vec3::new;
        [
            [v(a.x, a.y, a.z), v(b.x, a.y, a.z), v(b.x, a.y, b.z), v(a.x, a.y, b.z)],
            [v(a.x, b.y, a.z), v(a.x, b.y, b.z), v(b.x, b.y, b.z), v(b.x, b.y, a.z)],
            [v(a.x, a.y, a.z), v(a.x, b.y, a.z), v(b.x, b.y, a.z), v(b.x, a.y, a.z)],
            [v(a.x, a.y, b.z), v(b.x, a.y, b.z), v(b.x, b.y, b.z), v(a.x, b.y, b.z)],
            [v(a.x, a.y, a.z), v(a.x, a.y, b.z), v(a.x, b.y, b.z), v(a.x, b.y, a.z)],
            [v(b.x, a.y, a.z), v(b.x, b.y, a.z), v(b.x, b.y, b.z), v(b.x, a.y, b.z)],
        ]
    }

    /// The quads flattened into 24 vertices, four per face.
    pub fn vertices(&self) -> Vec<Vec3> {
        self.quads().into_iter().flatten().collect()
    }
}

pub struct OverlayRenderer {
    alpha: f32,
}

impl OverlayRenderer {
    pub fn new(alpha: f32) -> Self {
        Self { alpha }
    }

    /// Builds the cube for one ghost relative to `eye`.
    pub fn cube_for(&self, ghost: &TrackedGhost, eye: Vec3) -> OverlayCube {
        let min = ghost.pos.min_corner().sub(eye);
        OverlayCube {
            min,
            max: min.add(Vec3::new(1.0, 1.0, 1.0)),
            color: OverlayColor::for_state(ghost.state, self.alpha),
            depth_test: false,
        }
    }

    /// Draws every ghost in `snapshot` into `sink`. Returns the number of
    /// cubes drawn.
    pub fn emit(
        &self,
        snapshot: &[TrackedGhost],
        viewer: &Viewer,
        partial_ticks: f64,
        sink: &mut dyn RenderSink,
    ) -> usize {
        if snapshot.is_empty() {
            return 0;
        }
        let eye = viewer.interpolated(partial_ticks);
        for ghost in snapshot {
            sink.draw_cube(&self.cube_for(ghost, eye));
        }
        snapshot.len()
    }
}

/// A `RenderSink` that keeps every cube it receives.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub cubes: Vec<OverlayCube>,
}

impl RenderSink for CollectingSink {
    fn draw_cube(&mut self, cube: &OverlayCube) {
        self.cubes.push(*cube);
    }
}
