use thiserror::Error;

/// Failure to read a texture from the local skin store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid texture identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("Texture '{0}' not found in store")]
    NotFound(String),

    #[error("I/O error reading texture: {0}")]
    Io(#[from] std::io::Error),

    #[error("Texture could not be decoded: {0}")]
    Decode(#[from] image::ImageError),
}

/// Why a profile could not be verified as a ghost head. Never propagated
/// past the resolver; it only feeds diagnostics.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("No profile found for this head")]
    MissingProfile,

    #[error("No texture properties found in profile")]
    MissingTextureProperty,

    #[error("Couldn't decode base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Malformed texture payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Texture payload carries no url")]
    MissingUrl,

    #[error("No texture identifier in url '{0}'")]
    BadUrl(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Texture {width}x{height} too small for region comparison")]
    RegionOutOfBounds { width: u32, height: u32 },
}

/// The inbound transport refused an observer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Transport not ready: {0}")]
    NotReady(String),

    #[error("Transport already has an observer")]
    AlreadyTaken,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
