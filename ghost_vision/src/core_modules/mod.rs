pub mod channel_transport;
pub mod command;
pub mod coordinates;
pub mod fingerprint_resolver;
pub mod image_store;
pub mod lifecycle;
pub mod overlay;
pub mod particle_correlator;
pub mod profile;
pub mod scanner;
pub mod texture_region;
pub mod tracking_store;
