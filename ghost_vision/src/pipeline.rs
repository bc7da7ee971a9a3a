// THEORY:
// The `pipeline` module is the top-level API for the ghost head engine. A
// host wires its four callbacks (tick, interaction, render frame, outgoing
// text) to the matching `GhostPipeline` methods and supplies the world,
// transport and render sink through the traits in `host`. Everything else
// (when to scan, how to fingerprint, when a ghost changes colour) happens in
// here.
//
// Key architectural principles:
// 1.  **Staged Processing**: Each callback runs a fixed sequence of stages,
//     in the same spirit as a vision pipeline's per-frame stages:
//     - Tick: register the particle listener, sweep stale flames, scan.
//     - Render: presence check, lifecycle evaluation, overlay emission.
//     - Interaction: debounce, inspect, re-verify, claim.
// 2.  **Shared State Through One Store**: The pipeline and the particle
//     observer both hold the same `Arc<TrackingStore>`. The pipeline itself
//     only owns single-threaded helpers (resolver cache, tick counter,
//     debounce gate).
// 3.  **Time Is an Argument**: Every callback takes `now`, so the whole
//     engine can be driven deterministically from tests.

use crate::config::GhostConfig;
use crate::core_modules::command::{self, Command};
use crate::core_modules::coordinates::BlockPos;
use crate::core_modules::fingerprint_resolver::FingerprintResolver;
use crate::core_modules::image_store::ImageStore;
use crate::core_modules::lifecycle::{InteractionGate, LifecycleEvaluator, StateChange};
use crate::core_modules::overlay::OverlayRenderer;
use crate::core_modules::particle_correlator::{FlameObserver, ParticleCorrelator, Registration};
use crate::core_modules::scanner::{ScanReport, SpatialScanner, VerificationOutcome};
use crate::core_modules::tracking_store::TrackingStore;
use crate::host::{
    BlockCategory, RenderSink, SpatialQuery, TextChannel, TextDisposition, Transport, Viewer,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

// Re-export key data structures for the public API.
pub use crate::core_modules::fingerprint_resolver::Classification;
pub use crate::core_modules::tracking_store::{GhostState, TrackedGhost, TrackingCounts};

/// What one tick did.
#[derive(Debug, Default)]
pub struct TickReport {
    pub tick: u64,
    /// Set when this tick tried to register the particle listener.
    pub registration: Option<Registration>,
    pub flames_expired: usize,
    /// Present on scan ticks only.
    pub scan: Option<ScanReport>,
}

/// What one render frame did.
#[derive(Debug, Default)]
pub struct FrameReport {
    /// Tracked heads that were no longer in the world.
    pub removed: Vec<BlockPos>,
    pub changes: Vec<StateChange>,
    pub cubes_drawn: usize,
}

/// Result of an operator interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionOutcome {
    /// Too soon after the previous accepted interaction.
    Debounced,
    NotSkull,
    Inspected { is_ghost: bool, claimed: bool },
}

/// The main, top-level struct for the ghost head engine.
///
/// Every callback judges time by the `now` it is given. The one exception is
/// the listener registered on a `Transport`: it stamps flames with
/// `Instant::now()` as they arrive. A host that runs on a simulated clock
/// should feed particles through `flame_observer().observe(message, now)`
/// instead of registering a transport.
pub struct GhostPipeline {
    config: GhostConfig,
    store: Arc<TrackingStore>,
    resolver: FingerprintResolver,
    scanner: SpatialScanner,
    correlator: ParticleCorrelator,
    lifecycle: LifecycleEvaluator,
    renderer: OverlayRenderer,
    gate: InteractionGate,
    debug: Arc<AtomicBool>,
    text: Arc<dyn TextChannel>,
    tick: u64,
}

impl GhostPipeline {
    pub fn new(config: GhostConfig, images: Arc<dyn ImageStore>, text: Arc<dyn TextChannel>) -> Self {
        let store = Arc::new(TrackingStore::new());
        let debug = Arc::new(AtomicBool::new(false));
        Self {
            resolver: FingerprintResolver::new(images, &config),
            scanner: SpatialScanner::new(&config),
            correlator: ParticleCorrelator::new(&config, store.clone(), debug.clone(), text.clone()),
            lifecycle: LifecycleEvaluator::new(&config),
            renderer: OverlayRenderer::new(config.overlay_alpha),
            gate: InteractionGate::new(config.interaction_debounce()),
            store,
            debug,
            text,
            tick: 0,
            config,
        }
    }

    // --- Tick ---

    pub fn on_tick(
        &mut self,
        world: &dyn SpatialQuery,
        viewer: &Viewer,
        transport: &dyn Transport,
        now: Instant,
    ) -> TickReport {
        let tick = self.tick;
        self.tick = self.tick.wrapping_add(1);

        // Stage 1: Listener registration
        let registration = (!self.correlator.is_registered())
            .then(|| self.correlator.ensure_registered(transport).clone());

        // Stage 2: Flame expiry
        let flames_expired = self.correlator.sweep_expired(now);

        // Stage 3: Periodic scan
        let scan = self.scanner.is_scan_tick(tick).then(|| {
            self.scanner
                .scan(world, &self.store, &mut self.resolver, viewer.block(), now)
        });
        if let Some(report) = &scan {
            self.announce_scan(report);
        }

        TickReport {
            tick,
            registration,
            flames_expired,
            scan,
        }
    }

    fn announce_scan(&self, report: &ScanReport) {
        if self.is_debug() {
            for pos in &report.queued {
                self.text
                    .send_line(&format!("[DEBUG] Found skull at {pos}, queued for checking"));
            }
        }
        for outcome in &report.verified {
            if let VerificationOutcome::Ghost {
                pos,
                newly_tracked: true,
            } = outcome
            {
                self.announce_new_ghost(*pos);
            }
        }
    }

    fn announce_new_ghost(&self, pos: BlockPos) {
        let total = self.store.counts().total_found;
        self.text
            .send_line(&format!("New ghost head detected at {pos} (Total: {total})"));
    }

    // --- Interaction ---

    /// Handles the operator interacting with the block at `pos`.
    pub fn on_interact(
        &mut self,
        pos: BlockPos,
        world: &dyn SpatialQuery,
        now: Instant,
    ) -> InteractionOutcome {
        if !self.gate.accept(now) {
            return InteractionOutcome::Debounced;
        }

        let debug = self.is_debug();
        let category = world.category_at(pos);
        if debug {
            self.text.send_line("=== Block Information ===");
            self.text.send_line(&format!("Block: {category:?}"));
            self.text
                .send_line(&format!("Position: {}, {}, {}", pos.x, pos.y, pos.z));
        }

        let outcome = if category == BlockCategory::Skull {
            self.inspect(pos, world, debug, now)
        } else {
            InteractionOutcome::NotSkull
        };

        if debug {
            self.text.send_line("=====================");
        }
        outcome
    }

    fn inspect(
        &mut self,
        pos: BlockPos,
        world: &dyn SpatialQuery,
        verbose: bool,
        now: Instant,
    ) -> InteractionOutcome {
        if verbose {
            self.text.send_line("This is a HEAD/SKULL block!");
        }

        let profile = world.profile_at(pos);
        let resolution = self.resolver.resolve(profile.as_ref(), verbose);
        for note in &resolution.notes {
            self.text.send_line(note);
        }

        let is_ghost = resolution.classification.is_ghost();
        if is_ghost {
            if verbose {
                self.text.send_line("GHOST DETECTED!");
            }
            if self.store.track(pos, now) {
                tracing::info!(%pos, "New ghost head detected");
                self.announce_new_ghost(pos);
            }
        } else {
            if verbose {
                self.text.send_line("This is not a ghost head.");
            }
            if resolution.classification.rejects() && self.store.untrack(pos) {
                tracing::info!(%pos, "Head no longer verifies as a ghost, untracked");
            }
        }

        let claimed = self.store.claim(pos);
        if claimed {
            tracing::info!(%pos, "Ghost head claimed by operator");
            self.text.send_line("Ghost head marked as CLAIMED!");
        }
        InteractionOutcome::Inspected { is_ghost, claimed }
    }

    // --- Render ---

    /// Runs the presence, lifecycle and emission phases for one frame.
    pub fn on_render_frame(
        &mut self,
        world: &dyn SpatialQuery,
        viewer: &Viewer,
        partial_ticks: f64,
        sink: &mut dyn RenderSink,
        now: Instant,
    ) -> FrameReport {
        // Phase 1: Presence
        let removed: Vec<BlockPos> = self
            .store
            .tracked_positions()
            .into_iter()
            .filter(|pos| world.category_at(*pos) != BlockCategory::Skull)
            .collect();
        for pos in &removed {
            self.store.untrack(*pos);
            tracing::debug!(%pos, "Ghost head gone from world, untracked");
        }

        // Phase 2: Lifecycle
        let changes = self.lifecycle.evaluate(&self.store, viewer.current, now);

        // Phase 3: Emission
        let snapshot = self.store.snapshot();
        let cubes_drawn = self.renderer.emit(&snapshot, viewer, partial_ticks, sink);

        FrameReport {
            removed,
            changes,
            cubes_drawn,
        }
    }

    // --- Commands ---

    /// Intercepts operator text. Anything carrying the command prefix is
    /// handled here and suppressed.
    pub fn on_outgoing_text(&mut self, text: &str) -> TextDisposition {
        let Some(command) = command::parse(text, &self.config.command_prefix) else {
            return TextDisposition::Forward;
        };

        match command {
            Command::Status => {
                for line in command::status_lines(&self.counts(), self.is_debug()) {
                    self.text.send_line(&line);
                }
            }
            Command::ToggleDebug => {
                let enabled = !self.debug.fetch_xor(true, Ordering::Relaxed);
                tracing::info!(enabled, "Debug mode toggled");
                self.text.send_line(&command::debug_toggled_line(enabled));
            }
            Command::Unknown => {
                tracing::debug!(text, "Ignoring unknown command");
            }
        }
        TextDisposition::Suppress
    }

    // --- Accessors ---

    pub fn counts(&self) -> TrackingCounts {
        self.store.counts()
    }

    pub fn store(&self) -> &Arc<TrackingStore> {
        &self.store
    }

    pub fn is_debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    pub fn set_debug(&self, enabled: bool) {
        self.debug.store(enabled, Ordering::Relaxed);
    }

    pub fn registration(&self) -> &Registration {
        self.correlator.registration()
    }

    /// The observer the particle listener registers, for hosts that feed
    /// messages directly.
    pub fn flame_observer(&self) -> Arc<FlameObserver> {
        self.correlator.observer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::coordinates::Vec3;
    use crate::core_modules::image_store::MemoryImageStore;
    use crate::core_modules::overlay::CollectingSink;
    use crate::core_modules::profile::{ProfileData, encode_texture_payload};
    use crate::error::TransportError;
    use crate::host::{InboundMessage, InboundObserver};
    use image::{Rgba, RgbaImage};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    const GHOST_ID: &str = "aa11bb22";
    const PLAIN_ID: &str = "cc33dd44";

    #[derive(Default)]
    struct TestWorld {
        blocks: RefCell<HashMap<BlockPos, Option<ProfileData>>>,
    }

    impl TestWorld {
        fn place(&self, pos: BlockPos, profile: Option<ProfileData>) {
            self.blocks.borrow_mut().insert(pos, profile);
        }
        fn remove(&self, pos: BlockPos) {
            self.blocks.borrow_mut().remove(&pos);
        }
    }

    impl SpatialQuery for TestWorld {
        fn category_at(&self, pos: BlockPos) -> BlockCategory {
            if self.blocks.borrow().contains_key(&pos) {
                BlockCategory::Skull
            } else {
                BlockCategory::Other
            }
        }
        fn profile_at(&self, pos: BlockPos) -> Option<ProfileData> {
            self.blocks.borrow().get(&pos).cloned().flatten()
        }
    }

    #[derive(Default)]
    struct CapturedText(Mutex<Vec<String>>);

    impl CapturedText {
        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    impl TextChannel for CapturedText {
        fn send_line(&self, line: &str) {
            self.0.lock().unwrap().push(line.to_string());
        }
    }

    /// Accepts registration once `ready` is set.
    #[derive(Default)]
    struct TestTransport {
        ready: Mutex<bool>,
        observers: Mutex<Vec<Arc<dyn InboundObserver>>>,
    }

    impl Transport for TestTransport {
        fn register(&self, observer: Arc<dyn InboundObserver>) -> Result<(), TransportError> {
            if !*self.ready.lock().unwrap() {
                return Err(TransportError::NotReady("offline".into()));
            }
            self.observers.lock().unwrap().push(observer);
            Ok(())
        }
    }

    fn profile(texture_id: &str) -> ProfileData {
        ProfileData::with_texture_payload(encode_texture_payload(&format!(
            "http://textures.minecraft.net/texture/{texture_id}"
        )))
    }

    fn flame_at(x: f64, y: f64, z: f64) -> InboundMessage {
        InboundMessage::Particles {
            effect: "flame".into(),
            origin: Vec3::new(x, y, z),
            count: 1,
        }
    }

    struct Harness {
        pipeline: GhostPipeline,
        world: TestWorld,
        text: Arc<CapturedText>,
        transport: TestTransport,
        viewer: Viewer,
        t0: Instant,
    }

    impl Harness {
        fn new() -> Self {
            let config = GhostConfig {
                reference_textures: vec![GHOST_ID.to_string()],
                scan_radius: 12,
                ..GhostConfig::default()
            };
            let images = Arc::new(MemoryImageStore::new());
            images.insert(GHOST_ID, RgbaImage::from_pixel(64, 64, Rgba([40, 0, 60, 255])));
            images.insert(PLAIN_ID, RgbaImage::from_pixel(64, 64, Rgba([200, 180, 150, 255])));
            let text = Arc::new(CapturedText::default());
            Self {
                pipeline: GhostPipeline::new(config, images, text.clone()),
                world: TestWorld::default(),
                text,
                transport: TestTransport::default(),
                viewer: Viewer::stationary(Vec3::new(0.5, 68.0, 0.5)),
                t0: Instant::now(),
            }
        }

        fn at(&self, ms: u64) -> Instant {
            self.t0 + Duration::from_millis(ms)
        }

        /// Runs ticks 50 ms apart starting at `start_ms`.
        fn ticks(&mut self, count: u64, start_ms: u64) {
            for i in 0..count {
                let now = self.at(start_ms + i * 50);
                self.pipeline
                    .on_tick(&self.world, &self.viewer, &self.transport, now);
            }
        }

        fn render(&mut self, ms: u64) -> (FrameReport, CollectingSink) {
            let mut sink = CollectingSink::default();
            let now = self.at(ms);
            let report = self
                .pipeline
                .on_render_frame(&self.world, &self.viewer, 1.0, &mut sink, now);
            (report, sink)
        }
    }

    #[test]
    fn scan_tracks_verified_ghosts_only() {
        let mut h = Harness::new();
        let ghost = BlockPos::new(0, 70, 0);
        let plain = BlockPos::new(10, 64, 10);
        h.world.place(ghost, Some(profile(GHOST_ID)));
        h.world.place(plain, None);

        // Tick 0 queues, tick 20 (1000 ms later) verifies.
        h.ticks(21, 0);

        let store = h.pipeline.store();
        assert!(store.is_tracked(ghost));
        assert!(!store.is_tracked(plain));
        assert_eq!(store.state_of(ghost), Some(GhostState::Unknown));
        assert_eq!(h.pipeline.counts().total_found, 1);
        assert!(
            h.text
                .take()
                .contains(&"New ghost head detected at (0, 70, 0) (Total: 1)".to_string())
        );

        // Nothing more is found on later scans.
        h.ticks(40, 1050);
        assert_eq!(h.pipeline.counts().total_found, 1);
    }

    #[test]
    fn flame_marks_ghost_unclaimed_and_it_stays_red() {
        let mut h = Harness::new();
        let ghost = BlockPos::new(0, 70, 0);
        h.world.place(ghost, Some(profile(GHOST_ID)));
        h.ticks(21, 0);

        let hits = h
            .pipeline
            .flame_observer()
            .observe(&flame_at(0.4, 70.3, 0.1), h.at(1100));
        assert_eq!(hits, vec![ghost]);

        let (report, sink) = h.render(1200);
        assert_eq!(report.changes[0].to, GhostState::Unclaimed);
        assert_eq!(sink.cubes[0].color.to_rgba8(), [255, 0, 0, 77]);

        // Long after the flames stop, the head is still unclaimed.
        h.ticks(10, 5000);
        let (report, sink) = h.render(6000);
        assert!(report.changes.is_empty());
        assert_eq!(h.pipeline.store().state_of(ghost), Some(GhostState::Unclaimed));
        assert_eq!(sink.cubes[0].color.to_rgba8(), [255, 0, 0, 77]);
    }

    #[test]
    fn nearby_ghost_without_flames_is_auto_claimed() {
        let mut h = Harness::new();
        let ghost = BlockPos::new(0, 70, 0);
        h.world.place(ghost, Some(profile(GHOST_ID)));
        h.ticks(21, 0);

        let (report, sink) = h.render(1100);
        assert_eq!(report.cubes_drawn, 1);
        assert_eq!(sink.cubes[0].color.to_rgba8(), [0, 255, 0, 77]);
    }

    #[test]
    fn operator_claim_beats_later_flames() {
        let mut h = Harness::new();
        let ghost = BlockPos::new(0, 70, 0);
        h.world.place(ghost, Some(profile(GHOST_ID)));
        h.ticks(21, 0);
        h.pipeline
            .flame_observer()
            .observe(&flame_at(0.5, 70.5, 0.5), h.at(1100));
        h.render(1150);
        assert_eq!(h.pipeline.store().state_of(ghost), Some(GhostState::Unclaimed));
        h.text.take();

        let outcome = h.pipeline.on_interact(ghost, &h.world, h.at(1200));
        assert_eq!(
            outcome,
            InteractionOutcome::Inspected {
                is_ghost: true,
                claimed: true
            }
        );
        assert_eq!(h.text.take(), vec!["Ghost head marked as CLAIMED!".to_string()]);

        h.pipeline
            .flame_observer()
            .observe(&flame_at(0.5, 70.5, 0.5), h.at(1300));
        h.render(1350);
        assert_eq!(h.pipeline.store().state_of(ghost), Some(GhostState::Claimed));
    }

    #[test]
    fn interaction_finds_ghost_before_any_scan() {
        let mut h = Harness::new();
        let ghost = BlockPos::new(3, 65, -2);
        h.world.place(ghost, Some(profile(GHOST_ID)));

        h.pipeline.on_interact(ghost, &h.world, h.at(0));
        assert_eq!(h.pipeline.store().state_of(ghost), Some(GhostState::Claimed));
        assert_eq!(h.pipeline.counts().total_found, 1);
        assert_eq!(
            h.text.take(),
            vec![
                "New ghost head detected at (3, 65, -2) (Total: 1)".to_string(),
                "Ghost head marked as CLAIMED!".to_string(),
            ]
        );
    }

    #[test]
    fn rapid_interactions_are_debounced() {
        let mut h = Harness::new();
        let pos = BlockPos::new(1, 1, 1);
        assert_eq!(
            h.pipeline.on_interact(pos, &h.world, h.at(0)),
            InteractionOutcome::NotSkull
        );
        assert_eq!(
            h.pipeline.on_interact(pos, &h.world, h.at(150)),
            InteractionOutcome::Debounced
        );
        assert_eq!(
            h.pipeline.on_interact(pos, &h.world, h.at(200)),
            InteractionOutcome::NotSkull
        );
    }

    #[test]
    fn interaction_untracks_head_that_no_longer_verifies() {
        let mut h = Harness::new();
        let pos = BlockPos::new(0, 70, 0);
        h.world.place(pos, Some(profile(GHOST_ID)));
        h.ticks(21, 0);
        h.pipeline
            .flame_observer()
            .observe(&flame_at(0.5, 70.5, 0.5), h.at(1100));

        h.world.place(pos, Some(profile(PLAIN_ID)));
        let outcome = h.pipeline.on_interact(pos, &h.world, h.at(1200));
        assert_eq!(
            outcome,
            InteractionOutcome::Inspected {
                is_ghost: false,
                claimed: false
            }
        );
        let store = h.pipeline.store();
        assert!(!store.is_tracked(pos));
        assert!(store.last_flame(pos).is_none());
        assert!(store.is_consistent());
    }

    #[test]
    fn interaction_claims_tracked_head_whose_profile_is_unreadable() {
        let mut h = Harness::new();
        let pos = BlockPos::new(0, 70, 0);
        h.world.place(pos, Some(profile(GHOST_ID)));
        h.ticks(21, 0);
        assert!(h.pipeline.store().is_tracked(pos));

        // Profile not loaded (yet): the head says nothing either way.
        h.world.place(pos, None);
        let outcome = h.pipeline.on_interact(pos, &h.world, h.at(1200));
        assert_eq!(
            outcome,
            InteractionOutcome::Inspected {
                is_ghost: false,
                claimed: true
            }
        );
        assert_eq!(h.pipeline.store().state_of(pos), Some(GhostState::Claimed));
        assert_eq!(h.pipeline.counts().total_found, 1);
    }

    #[test]
    fn debug_interaction_reports_block_and_resolution() {
        let mut h = Harness::new();
        let pos = BlockPos::new(0, 70, 0);
        h.world.place(pos, Some(profile(GHOST_ID)));
        h.pipeline.set_debug(true);

        h.pipeline.on_interact(pos, &h.world, h.at(0));
        let lines = h.text.take();
        assert_eq!(lines[0], "=== Block Information ===");
        assert_eq!(lines[1], "Block: Skull");
        assert_eq!(lines[2], "Position: 0, 70, 0");
        assert!(lines.iter().any(|l| l.starts_with("Texture ID: ")));
        assert!(lines.contains(&"GHOST DETECTED!".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("====================="));
    }

    #[test]
    fn removed_heads_are_pruned_before_drawing() {
        let mut h = Harness::new();
        let a = BlockPos::new(0, 70, 0);
        let b = BlockPos::new(2, 70, 0);
        h.world.place(a, Some(profile(GHOST_ID)));
        h.world.place(b, Some(profile(GHOST_ID)));
        h.ticks(21, 0);
        assert_eq!(h.pipeline.counts().tracked, 2);

        h.world.remove(a);
        let (report, sink) = h.render(1100);
        assert_eq!(report.removed, vec![a]);
        assert_eq!(report.cubes_drawn, 1);
        assert_eq!(sink.cubes.len(), 1);
        assert!(!h.pipeline.store().is_processed(a));
        // The all-time total is unaffected.
        assert_eq!(h.pipeline.counts().total_found, 2);
    }

    #[test]
    fn empty_store_draws_nothing() {
        let mut h = Harness::new();
        let (report, sink) = h.render(0);
        assert_eq!(report.cubes_drawn, 0);
        assert!(sink.cubes.is_empty());
    }

    #[test]
    fn registration_retries_each_tick_until_transport_is_ready() {
        let mut h = Harness::new();
        h.ticks(3, 0);
        assert!(matches!(
            h.pipeline.registration(),
            Registration::Failed { attempts: 3, .. }
        ));

        *h.transport.ready.lock().unwrap() = true;
        h.ticks(1, 150);
        assert_eq!(h.pipeline.registration(), &Registration::Registered);
        h.ticks(5, 200);
        assert_eq!(h.transport.observers.lock().unwrap().len(), 1);
        assert!(
            h.text
                .take()
                .contains(&"Particle listener registered successfully!".to_string())
        );
    }

    #[test]
    fn transport_flames_reach_the_store() {
        let mut h = Harness::new();
        *h.transport.ready.lock().unwrap() = true;
        let ghost = BlockPos::new(0, 70, 0);
        h.world.place(ghost, Some(profile(GHOST_ID)));
        h.ticks(21, 0);

        let observer = h.transport.observers.lock().unwrap()[0].clone();
        observer.on_message(&flame_at(0.4, 70.3, 0.1));
        assert!(h.pipeline.store().last_flame(ghost).is_some());
    }

    #[test]
    fn commands_are_suppressed_and_answered() {
        let mut h = Harness::new();
        assert_eq!(h.pipeline.on_outgoing_text("hello there"), TextDisposition::Forward);
        assert!(h.text.take().is_empty());

        assert_eq!(h.pipeline.on_outgoing_text("//GhostStatus"), TextDisposition::Suppress);
        let lines = h.text.take();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[1], "Total Ghosts Found (All Time): 0");
        assert_eq!(lines[5], "Debug Mode: OFF");

        assert_eq!(h.pipeline.on_outgoing_text("//ghostdebug"), TextDisposition::Suppress);
        assert!(h.pipeline.is_debug());
        assert_eq!(h.text.take(), vec!["Debug mode: ON".to_string()]);
        h.pipeline.on_outgoing_text("//ghostdebug");
        assert!(!h.pipeline.is_debug());

        assert_eq!(h.pipeline.on_outgoing_text("//ghostwhatever"), TextDisposition::Suppress);
        assert!(h.text.take().iter().all(|l| l != "Debug mode: ON"));
    }

    #[test]
    fn debug_scan_echoes_queued_skulls() {
        let mut h = Harness::new();
        h.pipeline.set_debug(true);
        h.world.place(BlockPos::new(1, 68, 1), None);
        h.ticks(1, 0);
        assert!(
            h.text
                .take()
                .contains(&"[DEBUG] Found skull at (1, 68, 1), queued for checking".to_string())
        );
    }
}
