// THEORY:
// Unclaimed ghost heads give themselves away with flame particles. The
// `ParticleCorrelator` listens to the inbound transport for particle
// messages, keeps only the flame-type ones, and stamps the current time on
// every tracked head whose centre is within a small radius of the particle.
//
// Key architectural principles:
// 1.  **Explicit Registration Lifecycle**: Hooking into the transport is a
//     one-time transition, `Unregistered → Registered`. If the transport is
//     not ready the correlator moves to `Failed` and simply tries again on
//     the next tick. Once registered, further attempts are no-ops.
// 2.  **Cross-Thread Writes Through the Store**: The observer may run on the
//     transport's thread. It never holds state of its own; each flame is a
//     single locked write into the `TrackingStore`, visible to the very next
//     tick.
// 3.  **Lazy Expiry**: Observations are not "turned off" by a timer. The
//     lifecycle asks whether a flame is still fresh; the periodic sweep here
//     only drops entries nobody can consider fresh anymore.

use crate::config::GhostConfig;
use crate::core_modules::coordinates::BlockPos;
use crate::core_modules::tracking_store::TrackingStore;
use crate::error::TransportError;
use crate::host::{InboundMessage, InboundObserver, TextChannel, Transport};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Where the correlator stands with the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Unregistered,
    Registered,
    /// Last attempt failed; the next tick retries.
    Failed {
        attempts: u32,
        last_error: TransportError,
    },
}

/// The observer handed to the transport.
pub struct FlameObserver {
    store: Arc<TrackingStore>,
    effects: Vec<String>,
    radius: f64,
    debug: Arc<AtomicBool>,
    text: Arc<dyn TextChannel>,
}

impl FlameObserver {
    /// Handles one message as if it arrived at `now`. Returns the positions
    /// that received a flame observation.
    pub fn observe(&self, message: &InboundMessage, now: Instant) -> Vec<BlockPos> {
        let InboundMessage::Particles { effect, origin, .. } = message else {
            return Vec::new();
        };
        if !self.effects.iter().any(|known| known == effect) {
            return Vec::new();
        }

        let hits = self.store.record_flame_near(*origin, self.radius, now);
        for pos in &hits {
            tracing::debug!(%pos, effect = effect.as_str(), "Flame detected at ghost head");
            if self.debug.load(Ordering::Relaxed) {
                self.text
                    .send_line(&format!("[DEBUG] Flame detected at ghost head: {pos}"));
            }
        }
        hits
    }
}

impl InboundObserver for FlameObserver {
    /// Transport deliveries carry no timestamp, so they are stamped with the
    /// wall clock. Hosts that drive time themselves should call `observe`.
    fn on_message(&self, message: &InboundMessage) {
        self.observe(message, Instant::now());
    }
}

pub struct ParticleCorrelator {
    registration: Registration,
    observer: Arc<FlameObserver>,
    ttl: Duration,
}

impl ParticleCorrelator {
    pub fn new(
        config: &GhostConfig,
        store: Arc<TrackingStore>,
        debug: Arc<AtomicBool>,
        text: Arc<dyn TextChannel>,
    ) -> Self {
        Self {
            registration: Registration::Unregistered,
            observer: Arc::new(FlameObserver {
                store,
                effects: config.flame_effects.clone(),
                radius: config.flame_radius,
                debug,
                text,
            }),
            ttl: config.flame_ttl(),
        }
    }

    pub fn registration(&self) -> &Registration {
        &self.registration
    }

    pub fn is_registered(&self) -> bool {
        self.registration == Registration::Registered
    }

    pub fn observer(&self) -> Arc<FlameObserver> {
        self.observer.clone()
    }

    /// Registers with `transport` unless already registered.
    pub fn ensure_registered(&mut self, transport: &dyn Transport) -> &Registration {
        if self.is_registered() {
            return &self.registration;
        }

        let observer: Arc<dyn InboundObserver> = self.observer.clone();
        match transport.register(observer) {
            Ok(()) => {
                tracing::info!("Particle listener registered");
                self.observer
                    .text
                    .send_line("Particle listener registered successfully!");
                self.registration = Registration::Registered;
            }
            Err(err) => {
                let attempts = match &self.registration {
                    Registration::Failed { attempts, .. } => attempts + 1,
                    _ => 1,
                };
                // Only the first failure reaches the operator; retries run every tick.
                if attempts == 1 {
                    tracing::warn!(error = %err, "Failed to register particle listener");
                    self.observer
                        .text
                        .send_line(&format!("Failed to register particle listener: {err}"));
                } else {
                    tracing::debug!(attempts, error = %err, "Particle listener registration retry failed");
                }
                self.registration = Registration::Failed {
                    attempts,
                    last_error: err,
                };
            }
        }
        &self.registration
    }

    /// Drops flame observations past their TTL.
    pub fn sweep_expired(&self, now: Instant) -> usize {
        self.observer.store.purge_expired_flames(now, self.ttl)
    }
}
