// THEORY:
// The `FingerprintResolver` answers one question for the scanner: "is the
// head at this position a ghost head?". It walks the chain
//
//     profile → textures property → base64 → JSON → URL → texture id
//             → skin image from the local store → sampled region
//             → compare against every reference fingerprint
//
// Key architectural principles:
// 1.  **Failures Are Verdicts**: Any broken link in the chain (no profile,
//     no property, undecodable payload, missing file, tiny image) produces a
//     `CannotVerify` classification. Nothing is raised to the caller; a head
//     we cannot read is simply not tracked.
// 2.  **Append-Only Reference Cache**: Reference fingerprints are the only
//     regions kept. They are sampled on first use and never invalidated. A
//     reference that fails to load is not cached, so a later call retries.
// 3.  **Candidates Are Transient**: The candidate image is loaded, sampled,
//     compared and dropped. Scanning hundreds of heads costs no memory.
// 4.  **Verbose Notes**: When asked, the resolver narrates every step into
//     the returned `Resolution`; the caller decides where the notes go.

use crate::config::GhostConfig;
use crate::core_modules::image_store::ImageStore;
use crate::core_modules::profile::{self, ProfileData, ProfileProperty};
use crate::core_modules::texture_region::{RegionRect, TextureRegion};
use crate::error::ResolveError;
use std::collections::HashMap;
use std::sync::Arc;

/// Outcome of checking one head.
#[derive(Debug)]
pub enum Classification {
    /// The head's region matched a reference fingerprint.
    Ghost {
        texture_id: String,
        reference_id: String,
        similarity: f64,
    },
    /// The head was read and compared, but matched nothing.
    NotGhost {
        /// Highest similarity seen against any reference, if any compared.
        best_similarity: Option<f64>,
    },
    /// The head could not be read far enough to compare.
    CannotVerify(ResolveError),
}

impl Classification {
    pub fn is_ghost(&self) -> bool {
        matches!(self, Classification::Ghost { .. })
    }

    /// True when the head carried texture data that was read and failed to
    /// match. A head with no profile or no textures property says nothing
    /// either way and does not count as a rejection.
    pub fn rejects(&self) -> bool {
        match self {
            Classification::Ghost { .. } => false,
            Classification::NotGhost { .. } => true,
            Classification::CannotVerify(
                ResolveError::MissingProfile | ResolveError::MissingTextureProperty,
            ) => false,
            Classification::CannotVerify(_) => true,
        }
    }
}

/// A classification plus the step-by-step notes gathered in verbose mode.
#[derive(Debug)]
pub struct Resolution {
    pub classification: Classification,
    pub notes: Vec<String>,
}

/// Result of checking a single texture property.
enum PropertyOutcome {
    Matched {
        texture_id: String,
        reference_id: String,
        similarity: f64,
    },
    Compared {
        best_similarity: Option<f64>,
    },
}

pub struct FingerprintResolver {
    store: Arc<dyn ImageStore>,
    reference_ids: Vec<String>,
    rect: RegionRect,
    threshold_percent: f64,
    /// Sampled reference regions keyed by texture id.
    reference_cache: HashMap<String, TextureRegion>,
}

impl FingerprintResolver {
    pub fn new(store: Arc<dyn ImageStore>, config: &GhostConfig) -> Self {
        Self {
            store,
            reference_ids: config.reference_textures.clone(),
            rect: RegionRect {
                x: config.region_x,
                y: config.region_y,
                width: config.region_width,
                height: config.region_height,
            },
            threshold_percent: config.match_threshold_percent,
            reference_cache: HashMap::new(),
        }
    }

    /// Number of reference fingerprints loaded so far.
    pub fn cached_references(&self) -> usize {
        self.reference_cache.len()
    }

    /// Classifies the head owning `profile`. Never fails.
    pub fn resolve(&mut self, profile: Option<&ProfileData>, verbose: bool) -> Resolution {
        let mut notes = Vec::new();
        let classification = self.classify(profile, verbose, &mut notes);
        Resolution {
            classification,
            notes,
        }
    }

    fn classify(
        &mut self,
        profile: Option<&ProfileData>,
        verbose: bool,
        notes: &mut Vec<String>,
    ) -> Classification {
        let Some(profile) = profile else {
            return Classification::CannotVerify(ResolveError::MissingProfile);
        };

        if verbose {
            notes.push(format!(
                "Profile: {} ({})",
                profile.name.as_deref().unwrap_or("Unknown"),
                profile.id.as_deref().unwrap_or("None")
            ));
        }

        let properties = match profile.texture_properties() {
            Ok(properties) => properties,
            Err(err) => return Classification::CannotVerify(err),
        };

        let mut best_similarity: Option<f64> = None;
        let mut compared_any = false;
        let mut last_error = None;

        for property in properties {
            match self.check_property(property, verbose, notes) {
                Ok(PropertyOutcome::Matched {
                    texture_id,
                    reference_id,
                    similarity,
                }) => {
                    return Classification::Ghost {
                        texture_id,
                        reference_id,
                        similarity,
                    };
                }
                Ok(PropertyOutcome::Compared {
                    best_similarity: best,
                }) => {
                    compared_any = true;
                    best_similarity = match (best_similarity, best) {
                        (Some(a), Some(b)) => Some(a.max(b)),
                        (a, b) => a.or(b),
                    };
                }
                Err(err) => {
                    if verbose {
                        notes.push(err.to_string());
                    }
                    last_error = Some(err);
                }
            }
        }

        match (compared_any, last_error) {
            (false, Some(err)) => Classification::CannotVerify(err),
            _ => Classification::NotGhost { best_similarity },
        }
    }

    fn check_property(
        &mut self,
        property: &ProfileProperty,
        verbose: bool,
        notes: &mut Vec<String>,
    ) -> Result<PropertyOutcome, ResolveError> {
        if verbose {
            notes.push(format!("Property Name: {}", property.name));
        }

        let payload = profile::decode_payload(&property.value)?;
        if verbose {
            notes.push(format!("Decoded JSON: {payload}"));
        }
        let url = profile::texture_url(&payload)?;
        let texture_id = profile::texture_id_from_url(&url)?;
        if verbose {
            notes.push(format!("Texture URL: {url}"));
            notes.push(format!("Texture ID: {texture_id}"));
            if let Some(signature) = &property.signature {
                notes.push(format!("Signature: {signature}"));
            }
        }

        if verbose {
            notes.push(format!("Attempting to load: {}", self.store.describe(&texture_id)));
        }
        let candidate_image = self.store.load(&texture_id)?;
        let candidate = TextureRegion::sample(&candidate_image, self.rect)?;
        drop(candidate_image);

        let mut best: Option<f64> = None;
        let reference_ids = self.reference_ids.clone();
        for reference_id in reference_ids {
            let Some(reference) = self.reference_region(&reference_id, verbose, notes) else {
                continue;
            };
            let Some(similarity) = candidate.similarity(reference) else {
                continue;
            };
            if verbose {
                notes.push(format!("Similarity to {reference_id}: {similarity:.2}%"));
            }
            if similarity >= self.threshold_percent {
                return Ok(PropertyOutcome::Matched {
                    texture_id,
                    reference_id,
                    similarity,
                });
            }
            best = Some(best.map_or(similarity, |b: f64| b.max(similarity)));
        }

        Ok(PropertyOutcome::Compared {
            best_similarity: best,
        })
    }

    /// Cached reference region, loading it on first use.
    fn reference_region(
        &mut self,
        reference_id: &str,
        verbose: bool,
        notes: &mut Vec<String>,
    ) -> Option<&TextureRegion> {
        if !self.reference_cache.contains_key(reference_id) {
            let sampled = self
                .store
                .load(reference_id)
                .map_err(ResolveError::from)
                .and_then(|image| TextureRegion::sample(&image, self.rect));
            match sampled {
                Ok(region) => {
                    tracing::debug!(reference = reference_id, "Cached reference fingerprint");
                    self.reference_cache.insert(reference_id.to_string(), region);
                }
                Err(err) => {
                    tracing::debug!(reference = reference_id, error = %err, "Reference fingerprint unavailable");
                    if verbose {
                        notes.push(format!("Reference {reference_id} unavailable: {err}"));
                    }
                    return None;
                }
            }
        }
        self.reference_cache.get(reference_id)
    }
}
