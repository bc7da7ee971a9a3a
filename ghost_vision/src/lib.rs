// THEORY:
// This file is the main entry point for the `ghost_vision` library crate.
// It defines the public API exposed to hosts (a game client integration, or
// the bundled `overlay_tester` simulation).
//
// The primary export is `GhostPipeline` together with `GhostConfig` and the
// host traits (`SpatialQuery`, `Transport`, `RenderSink`, `TextChannel`)
// that a host implements to plug the engine in. The building blocks in
// `core_modules` stay public for hosts that want to drive individual stages
// (a custom image store, a different transport), but most callers only need
// the re-exports below.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod host;
pub mod pipeline;

pub use config::GhostConfig;
pub use core_modules::channel_transport::ChannelTransport;
pub use core_modules::coordinates::{BlockPos, Vec3};
pub use core_modules::image_store::{DiskImageStore, ImageStore, MemoryImageStore};
pub use core_modules::overlay::{OverlayColor, OverlayCube};
pub use core_modules::profile::{ProfileData, ProfileProperty};
pub use host::{
    BlockCategory, InboundMessage, InboundObserver, RenderSink, SpatialQuery, TextChannel,
    TextDisposition, Transport, Viewer,
};
pub use pipeline::{FrameReport, GhostPipeline, InteractionOutcome, TickReport};
