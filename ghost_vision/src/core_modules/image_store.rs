// THEORY:
// Skin textures are read from a local, content-addressed store. The host
// downloads skins into `<root>/<first two chars of id>/<id>`; the engine
// only ever reads. `ImageStore` is the seam: the disk implementation is what
// runs in production, the memory implementation serves hosts that already
// hold decoded skins and the test suites.
//
// "File not there" and "file there but not an image" are different
// failures and are reported as different `StoreError` variants, even though
// the resolver ends up treating both as "cannot verify".

use crate::error::StoreError;
use image::RgbaImage;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::RwLock;

/// Read-only access to skin textures by identifier.
pub trait ImageStore: Send + Sync {
    fn load(&self, texture_id: &str) -> Result<RgbaImage, StoreError>;

    /// Where `load` looks for `texture_id`, for diagnostics.
    fn describe(&self, texture_id: &str) -> String;
}

/// Identifiers are content hashes; anything else could walk out of the store root.
pub fn validate_identifier(texture_id: &str) -> Result<(), StoreError> {
    if texture_id.len() < 2 || !texture_id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(StoreError::InvalidIdentifier(texture_id.to_string()));
    }
    Ok(())
}

/// Store laid out on disk as `<root>/<shard>/<identifier>`.
#[derive(Debug, Clone)]
pub struct DiskImageStore {
    root: PathBuf,
}

impl DiskImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path a texture is expected at.
    pub fn path_for(&self, texture_id: &str) -> Result<PathBuf, StoreError> {
        validate_identifier(texture_id)?;
        Ok(self.root.join(&texture_id[..2]).join(texture_id))
    }
}

impl ImageStore for DiskImageStore {
    fn load(&self, texture_id: &str) -> Result<RgbaImage, StoreError> {
        let path = self.path_for(texture_id)?;

        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(texture_id.to_string()));
            }
            Err(err) => return Err(StoreError::Io(err)),
        };

        // Skin files carry no extension; the format is guessed from content.
        let image = image::load_from_memory(&bytes)?;
        Ok(image.to_rgba8())
    }

    fn describe(&self, texture_id: &str) -> String {
        match self.path_for(texture_id) {
            Ok(path) => path.display().to_string(),
            Err(err) => err.to_string(),
        }
    }
}

/// In-memory store keyed by identifier.
#[derive(Debug, Default)]
pub struct MemoryImageStore {
    images: RwLock<HashMap<String, RgbaImage>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, texture_id: impl Into<String>, image: RgbaImage) {
        let mut images = self
            .images
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        images.insert(texture_id.into(), image);
    }

    pub fn len(&self) -> usize {
        self.images
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ImageStore for MemoryImageStore {
    fn load(&self, texture_id: &str) -> Result<RgbaImage, StoreError> {
        validate_identifier(texture_id)?;
        let images = self
            .images
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        images
            .get(texture_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(texture_id.to_string()))
    }

    fn describe(&self, texture_id: &str) -> String {
        format!("memory:{texture_id}")
    }
}
