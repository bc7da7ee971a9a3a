// THEORY:
// A tracked ghost head starts out Unknown. When the operator comes within
// claim range, the head is judged by what the correlator has seen near it:
// fresh flames mean nobody has claimed it yet (Unclaimed), no flames mean it
// was claimed before we arrived (Claimed). An explicit interaction always
// claims.
//
// Key architectural principles:
// 1.  **Pure Transition Rule**: `next_state` is a plain function of the
//     current state and flame freshness. The evaluator only decides which
//     heads are close enough to be judged and applies the result in one
//     locked pass over the store.
// 2.  **One-Way Claims**: Claimed is terminal. Unclaimed can only move to
//     Claimed through an explicit interaction, never by auto-claim, so a
//     head whose flames died down while out of view keeps its red marker.
// 3.  **Debounced Input**: Interaction events repeat while a button is held.
//     `InteractionGate` accepts at most one per debounce window.

use crate::config::GhostConfig;
use crate::core_modules::coordinates::{BlockPos, Vec3};
use crate::core_modules::tracking_store::{GhostState, TrackingStore, flame_is_active};
use std::time::{Duration, Instant};

/// One applied lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub pos: BlockPos,
    pub from: GhostState,
    pub to: GhostState,
}

/// The automatic transition rule for a head within claim range.
pub fn next_state(current: GhostState, flame_active: bool) -> Option<GhostState> {
    match (current, flame_active) {
        (GhostState::Claimed, _) => None,
        (_, true) => Some(GhostState::Unclaimed),
        (GhostState::Unknown, false) => Some(GhostState::Claimed),
        (GhostState::Unclaimed, false) => None,
    }
}

pub struct LifecycleEvaluator {
    proximity: f64,
    flame_ttl: Duration,
}

impl LifecycleEvaluator {
    pub fn new(config: &GhostConfig) -> Self {
        Self {
            proximity: config.claim_proximity,
            flame_ttl: config.flame_ttl(),
        }
    }

    /// Applies `next_state` to every tracked head within claim range of
    /// `viewer`.
    pub fn evaluate(&self, store: &TrackingStore, viewer: Vec3, now: Instant) -> Vec<StateChange> {
        let changes = store.update_states(|ghost| {
            if ghost.pos.center_distance(viewer) > self.proximity {
                return None;
            }
            let flame_active = ghost
                .last_flame
                .is_some_and(|seen| flame_is_active(seen, now, self.flame_ttl));
            next_state(ghost.state, flame_active)
        });

        changes
            .into_iter()
            .map(|(pos, from, to)| {
                tracing::debug!(%pos, ?from, ?to, "Ghost state changed");
                StateChange { pos, from, to }
            })
            .collect()
    }
}

/// Rate limiter for operator interactions.
#[derive(Debug)]
pub struct InteractionGate {
    debounce: Duration,
    last_accepted: Option<Instant>,
}

impl InteractionGate {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            last_accepted: None,
        }
    }

    /// Accepts the interaction unless one was accepted less than the
    /// debounce window before `now`.
    pub fn accept(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_accepted {
            if now.saturating_duration_since(last) < self.debounce {
                return false;
            }
        }
        self.last_accepted = Some(now);
        true
    }
}
