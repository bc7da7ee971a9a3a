// THEORY:
// The `SpatialScanner` finds candidate heads. Once every scan interval it
// sweeps the cube around the viewer for skull blocks it has not processed
// yet and queues each one for verification a short time later. Freshly
// placed heads often arrive before their profile does, so checking them
// immediately would misclassify real ghosts; the delay avoids that.
//
// On the same interval it drains the queue. A matured entry is checked
// again against the world (the head may have been broken meanwhile), then
// handed to the `FingerprintResolver`. Whatever the verdict, the position is
// marked processed so the sweep never queues it again. Only removal from
// tracking (which clears "processed") makes a position eligible again.

use crate::config::GhostConfig;
use crate::core_modules::coordinates::BlockPos;
use crate::core_modules::fingerprint_resolver::{Classification, FingerprintResolver};
use crate::core_modules::tracking_store::TrackingStore;
use crate::host::{BlockCategory, SpatialQuery};
use std::time::{Duration, Instant};

/// What happened to one matured candidate.
#[derive(Debug)]
pub enum VerificationOutcome {
    /// Verified as a ghost; `newly_tracked` is false if it already was.
    Ghost { pos: BlockPos, newly_tracked: bool },
    NotGhost { pos: BlockPos, classification: Classification },
    /// The head was gone by the time it matured.
    Vanished { pos: BlockPos },
}

/// Summary of one scan pass.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Positions newly queued for verification.
    pub queued: Vec<BlockPos>,
    pub verified: Vec<VerificationOutcome>,
}

pub struct SpatialScanner {
    radius: i32,
    interval_ticks: u64,
    delay: Duration,
}

impl SpatialScanner {
    pub fn new(config: &GhostConfig) -> Self {
        Self {
            radius: config.scan_radius,
            interval_ticks: config.scan_interval_ticks.max(1),
            delay: config.verification_delay(),
        }
    }

    /// True on ticks where a scan should run.
    pub fn is_scan_tick(&self, tick: u64) -> bool {
        tick % self.interval_ticks == 0
    }

    /// Sweeps the cube around `center` and queues unseen skull blocks.
    pub fn sweep(
        &self,
        world: &dyn SpatialQuery,
        store: &TrackingStore,
        center: BlockPos,
        now: Instant,
    ) -> Vec<BlockPos> {
        let mut queued = Vec::new();
        let r = self.radius;
        for dx in -r..=r {
            for dy in -r..=r {
                for dz in -r..=r {
                    let pos = center.offset(dx, dy, dz);
                    if store.is_processed(pos) {
                        continue;
                    }
                    if world.category_at(pos) != BlockCategory::Skull {
                        continue;
                    }
                    if store.enqueue_pending(pos, now + self.delay) {
                        tracing::debug!(%pos, "Found skull, queued for checking");
                        queued.push(pos);
                    }
                }
            }
        }
        queued
    }

    /// Verifies every queued position whose delay has elapsed.
    pub fn drain(
        &self,
        world: &dyn SpatialQuery,
        store: &TrackingStore,
        resolver: &mut FingerprintResolver,
        now: Instant,
    ) -> Vec<VerificationOutcome> {
        let mut outcomes = Vec::new();
        for pos in store.take_matured(now) {
            if world.category_at(pos) != BlockCategory::Skull {
                outcomes.push(VerificationOutcome::Vanished { pos });
                continue;
            }

            let profile = world.profile_at(pos);
            let resolution = resolver.resolve(profile.as_ref(), false);

            if resolution.classification.is_ghost() {
                let newly_tracked = store.track(pos, now);
                store.mark_processed(pos);
                if newly_tracked {
                    tracing::info!(%pos, "New ghost head detected");
                }
                outcomes.push(VerificationOutcome::Ghost { pos, newly_tracked });
            } else {
                // Untracking clears "processed", so mark afterwards.
                if resolution.classification.rejects() {
                    store.untrack(pos);
                }
                store.mark_processed(pos);
                tracing::debug!(%pos, verdict = ?resolution.classification, "Not a ghost head");
                outcomes.push(VerificationOutcome::NotGhost {
                    pos,
                    classification: resolution.classification,
                });
            }
        }
        outcomes
    }

    /// One full scan pass: queue new candidates, then verify matured ones.
    pub fn scan(
        &self,
        world: &dyn SpatialQuery,
        store: &TrackingStore,
        resolver: &mut FingerprintResolver,
        center: BlockPos,
        now: Instant,
    ) -> ScanReport {
        let queued = self.sweep(world, store, center, now);
        let verified = self.drain(world, store, resolver, now);
        ScanReport { queued, verified }
    }
}
