// THEORY:
// Every tunable number the engine relies on lives in `GhostConfig`. The
// defaults are part of the observable contract (detection threshold, region
// geometry, radii, timing gates), so they are spelled out once in `Default`
// and nowhere else. Hosts that want to tune behaviour deserialize a partial
// JSON document; any field it omits keeps its default.

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Known ghost head skin identifiers used as reference fingerprints.
pub const DEFAULT_REFERENCE_TEXTURES: [&str; 2] = [
    "9c2a977b735e1685a2b75760664315fbaa7e3bbae215889bf767b53035435800",
    "426ebbe5769ae1524a3d3091984a534da04956c089d146ecab6f2d9304fb617",
];

/// Configuration for the `GhostPipeline`, allowing for tunable behavior.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GhostConfig {
    /// Texture identifiers whose sampled regions define a ghost head.
    pub reference_textures: Vec<String>,
    /// Root of the local skin store (`<root>/<id[0..2]>/<id>`).
    pub skin_store_root: PathBuf,
    /// Left edge of the compared region, in texture pixels.
    pub region_x: u32,
    /// Top edge of the compared region, in texture pixels.
    pub region_y: u32,
    pub region_width: u32,
    pub region_height: u32,
    /// Percentage of exactly-equal pixels required for a match.
    pub match_threshold_percent: f64,
    /// Half-extent of the scanned cube around the reference block.
    pub scan_radius: i32,
    /// A scan runs on every tick whose index is a multiple of this.
    pub scan_interval_ticks: u64,
    /// Delay between first sighting and fingerprint verification.
    pub verification_delay_ms: u64,
    /// Max distance from a head centre for a particle to count as "near".
    pub flame_radius: f64,
    /// How long a flame observation stays valid.
    pub flame_ttl_ms: u64,
    /// Particle categories treated as flame effects.
    pub flame_effects: Vec<String>,
    /// Max viewer distance at which lifecycle transitions are evaluated.
    pub claim_proximity: f64,
    /// Minimum spacing between accepted operator interactions.
    pub interaction_debounce_ms: u64,
    pub overlay_alpha: f32,
    /// Prefix that marks operator text as a command.
    pub command_prefix: String,
}

impl Default for GhostConfig {
    fn default() -> Self {
        Self {
            reference_textures: DEFAULT_REFERENCE_TEXTURES
                .iter()
                .map(|id| id.to_string())
                .collect(),
            skin_store_root: PathBuf::from("assets/skins"),
            region_x: 8,
            region_y: 0,
            region_width: 16,
            region_height: 8,
            match_threshold_percent: 95.0,
            scan_radius: 32,
            scan_interval_ticks: 20,
            verification_delay_ms: 1000,
            flame_radius: 0.5,
            flame_ttl_ms: 2000,
            flame_effects: vec!["flame".to_string(), "lava".to_string()],
            claim_proximity: 8.0,
            interaction_debounce_ms: 200,
            overlay_alpha: 0.3,
            command_prefix: "//ghost".to_string(),
        }
    }
}

impl GhostConfig {
    /// Loads a configuration from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn verification_delay(&self) -> Duration {
        Duration::from_millis(self.verification_delay_ms)
    }

    pub fn flame_ttl(&self) -> Duration {
        Duration::from_millis(self.flame_ttl_ms)
    }

    pub fn interaction_debounce(&self) -> Duration {
        Duration::from_millis(self.interaction_debounce_ms)
    }

    pub fn is_flame_effect(&self, effect: &str) -> bool {
        self.flame_effects.iter().any(|known| known == effect)
    }
}
