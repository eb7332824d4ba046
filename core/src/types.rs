//! Catalog data model and the wire DTOs it is parsed from.
//!
//! # Design
//! Wire structs mirror the catalog's JSON loosely: every field is optional
//! so a missing key never aborts deserialization. Validation happens in the
//! typed constructors (`CatalogConfig::from_wire`, `CatalogItem::from_json`),
//! which return `Result` instead of panicking on absent data.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::CatalogError;

/// Poster size used when the preferred one is not offered by the catalog.
pub const FALLBACK_POSTER_SIZE: &str = "w342";

/// Image-serving configuration of the catalog.
///
/// Immutable once built. `image_base_url` and `poster_sizes` are never
/// empty, and `default_poster_size` is always one of `poster_sizes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    image_base_url: String,
    poster_sizes: Vec<String>,
    default_poster_size: String,
}

impl CatalogConfig {
    /// Build a configuration from already-extracted parts.
    ///
    /// `preferred_size` becomes the default when offered; otherwise the
    /// default is `FALLBACK_POSTER_SIZE` when offered, else the first size.
    pub fn new(
        image_base_url: impl Into<String>,
        poster_sizes: Vec<String>,
        preferred_size: &str,
    ) -> Result<Self, CatalogError> {
        let image_base_url = image_base_url.into();
        if image_base_url.is_empty() {
            return Err(CatalogError::ConfigParse(
                "missing image base url".to_string(),
            ));
        }
        let offered = |size: &str| poster_sizes.iter().any(|s| s == size);
        let default_poster_size = if offered(preferred_size) {
            preferred_size.to_string()
        } else if offered(FALLBACK_POSTER_SIZE) {
            FALLBACK_POSTER_SIZE.to_string()
        } else {
            poster_sizes
                .first()
                .cloned()
                .ok_or_else(|| CatalogError::ConfigParse("missing poster sizes".to_string()))?
        };
        Ok(Self {
            image_base_url,
            poster_sizes,
            default_poster_size,
        })
    }

    /// Parse a configuration response body.
    pub fn from_json(body: &str, preferred_size: &str) -> Result<Self, CatalogError> {
        let value = json_object(body).map_err(CatalogError::ConfigParse)?;
        if let Some(images) = value.get("images").filter(|i| !i.is_null() && !i.is_object()) {
            return Err(CatalogError::ConfigParse(format!(
                "images is not an object: {images}"
            )));
        }
        let wire = ConfigurationResponse::deserialize(&value)
            .map_err(|e| CatalogError::ConfigParse(e.to_string()))?;
        Self::from_wire(wire, preferred_size)
    }

    pub(crate) fn from_wire(
        wire: ConfigurationResponse,
        preferred_size: &str,
    ) -> Result<Self, CatalogError> {
        let images = wire
            .images
            .ok_or_else(|| CatalogError::ConfigParse("missing images object".to_string()))?;
        let base_url = images
            .secure_base_url
            .filter(|u| !u.is_empty())
            .or(images.base_url)
            .unwrap_or_default();
        let sizes: Vec<String> = images
            .poster_sizes
            .unwrap_or_default()
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        Self::new(base_url, sizes, preferred_size)
    }

    pub fn image_base_url(&self) -> &str {
        &self.image_base_url
    }

    pub fn poster_sizes(&self) -> &[String] {
        &self.poster_sizes
    }

    pub fn default_poster_size(&self) -> &str {
        &self.default_poster_size
    }

    /// Full image URL for `poster_path` at `size`.
    ///
    /// Returns `None` for an absent or empty path. Sizes the catalog does not
    /// offer are replaced by the default size.
    pub fn resolve_image_url(&self, size: &str, poster_path: Option<&str>) -> Option<String> {
        let path = poster_path.filter(|p| !p.is_empty())?;
        let size = if self.poster_sizes.iter().any(|s| s == size) {
            size
        } else {
            self.default_poster_size.as_str()
        };
        Some(format!("{}{size}{path}", self.image_base_url))
    }

    /// Full image URL for `poster_path` at the default size.
    pub fn resolve_default_image_url(&self, poster_path: Option<&str>) -> Option<String> {
        self.resolve_image_url(&self.default_poster_size, poster_path)
    }
}

/// A single movie of the now-playing listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct CatalogItem {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub overview: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub poster_path: Option<String>,
}

impl CatalogItem {
    /// Parse one listing record. Missing fields default; a record that is
    /// not an object, or has a field of the wrong type, is an error.
    pub fn from_json(record: &Value) -> Result<Self, CatalogError> {
        if !record.is_object() {
            return Err(CatalogError::Parse(format!(
                "listing record is not an object: {record}"
            )));
        }
        CatalogItem::deserialize(record).map_err(|e| CatalogError::Parse(e.to_string()))
    }

    /// Poster URL of this item at the configuration's default size.
    pub fn poster_url(&self, config: &CatalogConfig) -> Option<String> {
        config.resolve_default_image_url(self.poster_path.as_deref())
    }
}

/// Parse `body` and require a top-level JSON object. Derived struct
/// deserializers also accept arrays (fields by position), so the shape is
/// checked on the untyped value first.
fn json_object(body: &str) -> Result<Value, String> {
    let value: Value = serde_json::from_str(body).map_err(|e| e.to_string())?;
    if !value.is_object() {
        return Err(format!("response body is not a JSON object: {value}"));
    }
    Ok(value)
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

fn empty_as_none<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(d)?.filter(|s| !s.is_empty()))
}

// ---------------------------------------------------------------------------
// Wire DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct ConfigurationResponse {
    pub images: Option<ImagesSection>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImagesSection {
    pub secure_base_url: Option<String>,
    pub base_url: Option<String>,
    pub poster_sizes: Option<Vec<String>>,
}

/// Listing envelope. Records stay untyped until `CatalogItem::from_json`
/// so a bad record is reported with its own message.
#[derive(Debug, Deserialize)]
pub(crate) struct NowPlayingResponse {
    pub results: Vec<Value>,
}

impl NowPlayingResponse {
    pub(crate) fn from_json(body: &str) -> Result<Self, CatalogError> {
        let value = json_object(body).map_err(CatalogError::Parse)?;
        NowPlayingResponse::deserialize(&value).map_err(|e| CatalogError::Parse(e.to_string()))
    }
}
