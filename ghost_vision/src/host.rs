// THEORY:
// The engine never talks to a game client directly. Everything it needs
// from the outside world arrives through the small traits in this module:
//
// - `SpatialQuery`: what is at a block, and what profile does it carry.
// - `Transport`: a one-time hook into the stream of inbound messages.
// - `RenderSink`: somewhere to put translucent overlay cubes.
// - `TextChannel`: a line-oriented output for status and diagnostics.
//
// Inbound messages are a closed, tagged enum instead of "any object we
// might recognise at runtime", so the correlator can pattern-match on the
// one kind it cares about and ignore the rest.

use crate::core_modules::coordinates::{BlockPos, Vec3};
use crate::core_modules::overlay::OverlayCube;
use crate::core_modules::profile::ProfileData;
use crate::error::TransportError;
use std::sync::Arc;

/// What occupies a block, as far as the engine cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockCategory {
    /// A head/skull block, the only category that can be a ghost.
    Skull,
    Other,
}

/// Read access to the live world.
pub trait SpatialQuery {
    fn category_at(&self, pos: BlockPos) -> BlockCategory;
    fn profile_at(&self, pos: BlockPos) -> Option<ProfileData>;
}

/// A message delivered by the inbound transport.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// A particle effect spawned in the world.
    Particles {
        effect: String,
        origin: Vec3,
        count: u32,
    },
    Chat(String),
    Other,
}

/// Receives inbound messages, possibly on the transport's own thread.
pub trait InboundObserver: Send + Sync {
    fn on_message(&self, message: &InboundMessage);
}

/// Inbound message source that accepts a single observer.
pub trait Transport {
    /// Attaches `observer`. Errors leave the caller free to retry later.
    fn register(&self, observer: Arc<dyn InboundObserver>) -> Result<(), TransportError>;
}

/// Accepts overlay geometry for the current frame.
pub trait RenderSink {
    fn draw_cube(&mut self, cube: &OverlayCube);
}

/// Line-oriented operator output.
pub trait TextChannel: Send + Sync {
    fn send_line(&self, line: &str);
}

/// Whether intercepted operator text should continue to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDisposition {
    Forward,
    Suppress,
}

/// Viewer position at the previous and current tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewer {
    pub previous: Vec3,
    pub current: Vec3,
}

impl Viewer {
    pub fn stationary(at: Vec3) -> Self {
        Self {
            previous: at,
            current: at,
        }
    }

    /// Position between the last two ticks, for smooth rendering.
    pub fn interpolated(&self, partial_ticks: f64) -> Vec3 {
        self.previous.lerp(self.current, partial_ticks)
    }

    pub fn block(&self) -> BlockPos {
        BlockPos::containing(self.current)
    }
}
