// THEORY:
// A head block carries an owner profile. The profile's `textures` property
// holds a base64-encoded JSON document that points at the skin:
//
//     {"textures":{"SKIN":{"url":"http://textures.minecraft.net/texture/<id>"}}}
//
// This module turns one property value into the texture identifier `<id>`,
// the key into the local skin store. Each step can fail independently and
// each failure is a distinct `ResolveError`, so diagnostics can say exactly
// where verification stopped.

use crate::error::ResolveError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use std::collections::HashMap;

/// Name of the profile property that carries texture descriptors.
pub const TEXTURES_PROPERTY: &str = "textures";

/// One named, base64-encoded profile property.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileProperty {
    pub name: String,
    /// Base64 payload.
    pub value: String,
    pub signature: Option<String>,
}

/// Owner profile attached to a head block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileData {
    pub name: Option<String>,
    pub id: Option<String>,
    /// Properties grouped by name; a name may carry several values.
    pub properties: HashMap<String, Vec<ProfileProperty>>,
}

impl ProfileData {
    /// Convenience constructor for a profile with a single `textures` value.
    pub fn with_texture_payload(payload_base64: impl Into<String>) -> Self {
        let mut profile = Self::default();
        profile.add_property(ProfileProperty {
            name: TEXTURES_PROPERTY.to_string(),
            value: payload_base64.into(),
            signature: None,
        });
        profile
    }

    pub fn add_property(&mut self, property: ProfileProperty) {
        self.properties
            .entry(property.name.clone())
            .or_default()
            .push(property);
    }

    /// The texture properties, or an error if there are none.
    pub fn texture_properties(&self) -> Result<&[ProfileProperty], ResolveError> {
        match self.properties.get(TEXTURES_PROPERTY) {
            Some(values) if !values.is_empty() => Ok(values.as_slice()),
            _ => Err(ResolveError::MissingTextureProperty),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TexturePayload {
    #[serde(default)]
    textures: HashMap<String, TextureEntry>,
}

#[derive(Debug, Deserialize)]
struct TextureEntry {
    url: Option<String>,
}

/// Decodes a base64 property value into its JSON text.
pub fn decode_payload(value_base64: &str) -> Result<String, ResolveError> {
    let bytes = STANDARD.decode(value_base64.trim())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Extracts the skin URL from a decoded payload. `SKIN` wins; otherwise the
/// first entry (by key order) that carries a URL.
pub fn texture_url(payload_json: &str) -> Result<String, ResolveError> {
    let payload: TexturePayload = serde_json::from_str(payload_json)?;

    if let Some(url) = payload.textures.get("SKIN").and_then(|entry| entry.url.clone()) {
        return Ok(url);
    }

    let mut keys: Vec<&String> = payload.textures.keys().collect();
    keys.sort();
    keys.into_iter()
        .find_map(|key| payload.textures[key].url.clone())
        .ok_or(ResolveError::MissingUrl)
}

/// The trailing path segment of a texture URL.
pub fn texture_id_from_url(url: &str) -> Result<String, ResolveError> {
    match url.rsplit_once('/') {
        Some((_, id)) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(ResolveError::BadUrl(url.to_string())),
    }
}

/// Full chain: base64 value → JSON → URL → texture identifier.
pub fn texture_id_from_property(value_base64: &str) -> Result<String, ResolveError> {
    let json = decode_payload(value_base64)?;
    let url = texture_url(&json)?;
    texture_id_from_url(&url)
}

/// Builds a property value for a texture URL, the inverse of the chain above.
pub fn encode_texture_payload(url: &str) -> String {
    let json = serde_json::json!({ "textures": { "SKIN": { "url": url } } });
    STANDARD.encode(json.to_string())
}
