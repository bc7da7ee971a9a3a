// THEORY:
// The `tracking_store` module is the memory of the engine. It owns every
// piece of state that outlives a single tick: which heads are ghosts, which
// of those are claimed or unclaimed, when flames were last seen near them,
// which positions have already been fingerprinted, and which are waiting to
// be.
//
// Key architectural principles:
// 1.  **Single Owner**: All of that state sits behind one mutex in one
//     `TrackingStore`. The scan/render thread and the transport thread both
//     go through its methods; no raw container is ever handed out.
// 2.  **Lifecycle Management**: The store is responsible for the whole life
//     of a tracked ghost:
//     - **Birth**: `track` inserts a position and bumps the all-time total
//       only if the position was not already tracked.
//     - **State**: `claim`, `mark_unclaimed` and `update_states` move a ghost
//       between Unknown, Unclaimed and Claimed while keeping the claimed and
//       unclaimed sets disjoint.
//     - **Death**: `untrack` removes the position from every structure at
//       once, so nothing can refer to a ghost that is no longer tracked.
// 3.  **Lazy Freshness**: Flame observations are plain timestamps. Whether a
//     flame is "active" is decided at query time against the TTL; the sweep
//     in `purge_expired_flames` only bounds memory.

use crate::core_modules::coordinates::{BlockPos, Vec3};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Claim status of a tracked ghost head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GhostState {
    /// Tracked, but not yet evaluated near the operator.
    Unknown,
    /// Flames were seen near it and nobody has claimed it.
    Unclaimed,
    /// Clicked by the operator, or seen up close without flames.
    Claimed,
}

/// Read-only view of one tracked ghost.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedGhost {
    pub pos: BlockPos,
    pub state: GhostState,
    pub last_flame: Option<Instant>,
    pub discovered_at: Instant,
}

/// Aggregate counts for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackingCounts {
    pub total_found: u64,
    pub tracked: usize,
    pub claimed: usize,
    pub unclaimed: usize,
}

#[derive(Debug, Default)]
struct TrackingState {
    /// Tracked ghost positions with their discovery time.
    tracked: HashMap<BlockPos, Instant>,
    claimed: HashSet<BlockPos>,
    unclaimed: HashSet<BlockPos>,
    /// Last time a flame particle was seen near each ghost.
    flames: HashMap<BlockPos, Instant>,
    /// Positions already fingerprinted; the scanner skips them.
    processed: HashSet<BlockPos>,
    /// Positions waiting for verification, with their earliest check time.
    pending: HashMap<BlockPos, Instant>,
    total_found: u64,
}

impl TrackingState {
    fn state_of(&self, pos: &BlockPos) -> GhostState {
        if self.claimed.contains(pos) {
            GhostState::Claimed
        } else if self.unclaimed.contains(pos) {
            GhostState::Unclaimed
        } else {
            GhostState::Unknown
        }
    }

    fn set_state(&mut self, pos: BlockPos, state: GhostState) {
        match state {
            GhostState::Claimed => {
                self.unclaimed.remove(&pos);
                self.claimed.insert(pos);
            }
            GhostState::Unclaimed => {
                self.claimed.remove(&pos);
                self.unclaimed.insert(pos);
            }
            GhostState::Unknown => {
                self.claimed.remove(&pos);
                self.unclaimed.remove(&pos);
            }
        }
    }
}

/// Shared, synchronized tracking state.
#[derive(Debug, Default)]
pub struct TrackingStore {
    inner: Mutex<TrackingState>,
}

impl TrackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, TrackingState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // --- Tracked set ---

    /// Starts tracking `pos`. Returns true (and bumps the total) if it was new.
    pub fn track(&self, pos: BlockPos, now: Instant) -> bool {
        let mut state = self.state();
        if state.tracked.contains_key(&pos) {
            return false;
        }
        state.tracked.insert(pos, now);
        state.total_found += 1;
        true
    }

    /// Stops tracking `pos` and forgets everything known about it.
    pub fn untrack(&self, pos: BlockPos) -> bool {
        let mut state = self.state();
        let was_tracked = state.tracked.remove(&pos).is_some();
        state.claimed.remove(&pos);
        state.unclaimed.remove(&pos);
        state.flames.remove(&pos);
        state.processed.remove(&pos);
        state.pending.remove(&pos);
        was_tracked
    }

    pub fn is_tracked(&self, pos: BlockPos) -> bool {
        self.state().tracked.contains_key(&pos)
    }

    /// Tracked positions in ascending order.
    pub fn tracked_positions(&self) -> Vec<BlockPos> {
        let mut positions: Vec<BlockPos> = self.state().tracked.keys().copied().collect();
        positions.sort();
        positions
    }

    pub fn is_empty(&self) -> bool {
        self.state().tracked.is_empty()
    }

    // --- Claim state ---

    pub fn state_of(&self, pos: BlockPos) -> Option<GhostState> {
        let state = self.state();
        state.tracked.contains_key(&pos).then(|| state.state_of(&pos))
    }

    /// Marks a tracked ghost as claimed. No effect on untracked positions.
    pub fn claim(&self, pos: BlockPos) -> bool {
        let mut state = self.state();
        if !state.tracked.contains_key(&pos) {
            return false;
        }
        state.set_state(pos, GhostState::Claimed);
        true
    }

    /// Marks a tracked, unclaimed-or-unknown ghost as unclaimed.
    pub fn mark_unclaimed(&self, pos: BlockPos) -> bool {
        let mut state = self.state();
        if !state.tracked.contains_key(&pos) || state.claimed.contains(&pos) {
            return false;
        }
        state.set_state(pos, GhostState::Unclaimed);
        true
    }

    /// Runs `decide` for every tracked ghost under a single lock and applies
    /// the states it returns. Returns the applied `(pos, from, to)` changes.
    pub fn update_states<F>(&self, mut decide: F) -> Vec<(BlockPos, GhostState, GhostState)>
    where
        F: FnMut(&TrackedGhost) -> Option<GhostState>,
    {
        let mut state = self.state();
        let mut positions: Vec<BlockPos> = state.tracked.keys().copied().collect();
        positions.sort();

        let mut changes = Vec::new();
        for pos in positions {
            let view = TrackedGhost {
                pos,
                state: state.state_of(&pos),
                last_flame: state.flames.get(&pos).copied(),
                discovered_at: state.tracked[&pos],
            };
            if let Some(next) = decide(&view) {
                if next != view.state {
                    state.set_state(pos, next);
                    changes.push((pos, view.state, next));
                }
            }
        }
        changes
    }

    // --- Flame observations ---

    /// Records a flame at `now` for every tracked ghost whose centre lies
    /// within `radius` of `origin`. Returns the positions that were updated.
    pub fn record_flame_near(&self, origin: Vec3, radius: f64, now: Instant) -> Vec<BlockPos> {
        let mut state = self.state();
        let hits: Vec<BlockPos> = state
            .tracked
            .keys()
            .filter(|pos| pos.center_distance(origin) <= radius)
            .copied()
            .collect();
        for pos in &hits {
            state.flames.insert(*pos, now);
        }
        hits
    }

    pub fn last_flame(&self, pos: BlockPos) -> Option<Instant> {
        self.state().flames.get(&pos).copied()
    }

    /// Drops flame observations older than `ttl`. Returns how many were dropped.
    pub fn purge_expired_flames(&self, now: Instant, ttl: Duration) -> usize {
        let mut state = self.state();
        let before = state.flames.len();
        state
            .flames
            .retain(|_, seen| now.saturating_duration_since(*seen) <= ttl);
        before - state.flames.len()
    }

    // --- Scanner bookkeeping ---

    pub fn is_processed(&self, pos: BlockPos) -> bool {
        self.state().processed.contains(&pos)
    }

    pub fn mark_processed(&self, pos: BlockPos) {
        self.state().processed.insert(pos);
    }

    /// Queues `pos` for verification at `ready_at`, unless already queued.
    pub fn enqueue_pending(&self, pos: BlockPos, ready_at: Instant) -> bool {
        let mut state = self.state();
        if state.pending.contains_key(&pos) {
            return false;
        }
        state.pending.insert(pos, ready_at);
        true
    }

    /// Removes and returns every queued position whose time has come.
    pub fn take_matured(&self, now: Instant) -> Vec<BlockPos> {
        let mut state = self.state();
        let mut matured: Vec<BlockPos> = state
            .pending
            .iter()
            .filter(|(_, ready_at)| now >= **ready_at)
            .map(|(pos, _)| *pos)
            .collect();
        matured.sort();
        for pos in &matured {
            state.pending.remove(pos);
        }
        matured
    }

    pub fn pending_len(&self) -> usize {
        self.state().pending.len()
    }

    // --- Reporting ---

    /// All tracked ghosts in ascending position order.
    pub fn snapshot(&self) -> Vec<TrackedGhost> {
        let state = self.state();
        let mut ghosts: Vec<TrackedGhost> = state
            .tracked
            .iter()
            .map(|(pos, discovered_at)| TrackedGhost {
                pos: *pos,
                state: state.state_of(pos),
                last_flame: state.flames.get(pos).copied(),
                discovered_at: *discovered_at,
            })
            .collect();
        ghosts.sort_by_key(|ghost| ghost.pos);
        ghosts
    }

    pub fn counts(&self) -> TrackingCounts {
        let state = self.state();
        TrackingCounts {
            total_found: state.total_found,
            tracked: state.tracked.len(),
            claimed: state.claimed.len(),
            unclaimed: state.unclaimed.len(),
        }
    }

    /// Claimed and unclaimed are disjoint and, like flame observations,
    /// only ever hold tracked positions.
    pub fn is_consistent(&self) -> bool {
        let state = self.state();
        state.claimed.is_disjoint(&state.unclaimed)
            && state.claimed.iter().all(|p| state.tracked.contains_key(p))
            && state.unclaimed.iter().all(|p| state.tracked.contains_key(p))
            && state.flames.keys().all(|p| state.tracked.contains_key(p))
    }
}

/// Freshness rule shared by every flame query.
pub fn flame_is_active(seen: Instant, now: Instant, ttl: Duration) -> bool {
    now.saturating_duration_since(seen) < ttl
}
