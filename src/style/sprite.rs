//! Sprite atlas resolution for Mapbox Style Spec icons.
//!
//! Mapbox styles reference sprites via a base URL that resolves to:
//! - `{sprite}.json` - JSON metadata with icon positions
//! - `{sprite}.png` - Sprite atlas image
//! - `{sprite}@2x.json` / `{sprite}@2x.png` - High-DPI variants
//!
//! Candidates are tried in order, high density first. The first candidate
//! whose index loads wins and its image must then load too; a missing image
//! never falls through to the next density.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{StyleError, StyleResult};
use crate::fetch::ResourceFetcher;

/// Device pixel ratio from which the `@2x` variant is preferred.
pub const HIGH_DENSITY_THRESHOLD: f64 = 1.5;

const MAPBOX_SPRITE_PREFIX: &str = "mapbox://sprites/";
const MAPBOX_STYLES_API: &str = "https://api.mapbox.com/styles/v1/";

/// A single sprite entry in the atlas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteEntry {
    /// X position in atlas (pixels).
    pub x: u32,
    /// Y position in atlas (pixels).
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel ratio (1 for standard, 2 for @2x).
    #[serde(rename = "pixelRatio")]
    #[serde(default = "default_pixel_ratio")]
    pub pixel_ratio: f32,
    /// Whether the sprite is an SDF (signed distance field).
    #[serde(default)]
    pub sdf: bool,
    /// Optional content area for 9-slice scaling.
    #[serde(default)]
    pub content: Option<[u32; 4]>,
    /// Optional stretch areas for 9-slice scaling.
    #[serde(rename = "stretchX")]
    #[serde(default)]
    pub stretch_x: Option<Vec<[u32; 2]>>,
    #[serde(rename = "stretchY")]
    #[serde(default)]
    pub stretch_y: Option<Vec<[u32; 2]>>,
}

fn default_pixel_ratio() -> f32 {
    1.0
}

/// Decoded sprite image, RGBA8.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl SpriteImage {
    /// Decode PNG (or any format the image crate was built with) bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let img = image::load_from_memory(bytes)?;
        let rgba = img.to_rgba8();
        Ok(Self {
            width: rgba.width(),
            height: rgba.height(),
            data: rgba.into_raw(),
        })
    }
}

/// Sprite atlas containing the icon index and its image.
#[derive(Debug, Clone, Default)]
pub struct SpriteAtlas {
    /// Sprite entries by name.
    pub entries: HashMap<String, SpriteEntry>,
    /// Atlas image.
    pub image: Option<SpriteImage>,
    /// Pixel ratio of the variant that was loaded (1 or 2).
    pub pixel_ratio: f32,
    /// Base URL the atlas was loaded from, including any density suffix.
    pub url: Option<String>,
}

impl SpriteAtlas {
    /// Atlas with no icons; every lookup misses.
    pub fn empty() -> Self {
        Self {
            pixel_ratio: 1.0,
            ..Default::default()
        }
    }

    /// Entry for `name` if its region lies inside the loaded atlas image.
    ///
    /// Regions reaching past the image count as missing icons.
    pub fn region(&self, name: &str) -> Option<&SpriteEntry> {
        let entry = self.entries.get(name)?;
        match &self.image {
            Some(image) if !entry_fits(entry, image) => None,
            _ => Some(entry),
        }
    }

    /// Get sprite UV coordinates (normalized 0-1).
    pub fn get_uvs(&self, name: &str) -> Option<[f32; 4]> {
        let entry = self.region(name)?;
        let image = self.image.as_ref()?;
        if image.width == 0 || image.height == 0 {
            return None;
        }
        let (w, h) = (image.width as f64, image.height as f64);
        let u0 = entry.x as f64 / w;
        let v0 = entry.y as f64 / h;
        let u1 = (entry.x as u64 + entry.width as u64) as f64 / w;
        let v1 = (entry.y as u64 + entry.height as u64) as f64 / h;
        Some([u0 as f32, v0 as f32, u1 as f32, v1 as f32])
    }
}

fn entry_fits(entry: &SpriteEntry, image: &SpriteImage) -> bool {
    entry.x as u64 + entry.width as u64 <= image.width as u64
        && entry.y as u64 + entry.height as u64 <= image.height as u64
}

/// One density variant of a sprite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteCandidate {
    base: String,
    query: String,
    scale: u32,
}

impl SpriteCandidate {
    fn new(sprite_url: &str, scale: u32) -> Self {
        // Suffix and extension go before any query string (tokens)
        let (base, query) = match sprite_url.find('?') {
            Some(i) => (&sprite_url[..i], &sprite_url[i..]),
            None => (sprite_url, ""),
        };
        Self {
            base: base.to_string(),
            query: query.to_string(),
            scale,
        }
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    fn suffix(&self) -> String {
        if self.scale > 1 {
            format!("@{}x", self.scale)
        } else {
            String::new()
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}{}", self.base, self.suffix())
    }

    pub fn json_url(&self) -> String {
        format!("{}{}.json{}", self.base, self.suffix(), self.query)
    }

    pub fn image_url(&self) -> String {
        format!("{}{}.png{}", self.base, self.suffix(), self.query)
    }
}

/// Ordered density candidates for `sprite_url`.
///
/// A ratio of 1.5 or more yields `[@2x, 1x]`; anything lower only `[1x]`.
pub fn sprite_candidates(sprite_url: &str, pixel_ratio: f64) -> Vec<SpriteCandidate> {
    let mut candidates = Vec::with_capacity(2);
    if pixel_ratio >= HIGH_DENSITY_THRESHOLD {
        candidates.push(SpriteCandidate::new(sprite_url, 2));
    }
    candidates.push(SpriteCandidate::new(sprite_url, 1));
    candidates
}

/// Turn a style's `sprite` value into a fetchable base URL.
///
/// `mapbox://sprites/<user>/<style>` expands to the Styles API; absolute URLs
/// are used as-is; anything else is resolved against `base_directory`.
pub fn normalize_sprite_url(
    reference: &str,
    base_directory: Option<&str>,
    access_token: Option<&str>,
) -> String {
    if let Some(path) = reference.strip_prefix(MAPBOX_SPRITE_PREFIX) {
        let mut url = format!("{}{}/sprite", MAPBOX_STYLES_API, path.trim_end_matches('/'));
        if let Some(token) = access_token {
            url.push_str("?access_token=");
            url.push_str(token);
        }
        return url;
    }
    if url::Url::parse(reference).is_ok() {
        return reference.to_string();
    }
    let base = match base_directory {
        Some(base) if !base.is_empty() => base,
        _ => return reference.to_string(),
    };
    let base = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    };
    match url::Url::parse(&base) {
        Ok(base_url) => base_url
            .join(reference)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| reference.to_string()),
        Err(_) => join_path(&base, reference),
    }
}

/// URL-style join for plain relative or absolute paths.
fn join_path(base_dir: &str, reference: &str) -> String {
    if reference.starts_with('/') {
        return reference.to_string();
    }
    let absolute = base_dir.starts_with('/');
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for part in reference.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if matches!(segments.last(), Some(last) if *last != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }
    let joined = segments.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

enum Attempt {
    Loaded(SpriteAtlas),
    IndexMissing { url: String, reason: String },
}

/// Resolves and loads the sprite pair for one style application.
pub struct SpriteResolver<'a> {
    fetcher: &'a dyn ResourceFetcher,
    pixel_ratio: f64,
    base_directory: Option<&'a str>,
    access_token: Option<&'a str>,
}

impl<'a> SpriteResolver<'a> {
    pub fn new(fetcher: &'a dyn ResourceFetcher, pixel_ratio: f64) -> Self {
        Self {
            fetcher,
            pixel_ratio,
            base_directory: None,
            access_token: None,
        }
    }

    pub fn with_base_directory(mut self, base_directory: Option<&'a str>) -> Self {
        self.base_directory = base_directory;
        self
    }

    pub fn with_access_token(mut self, access_token: Option<&'a str>) -> Self {
        self.access_token = access_token;
        self
    }

    /// Load the atlas for `sprite`.
    ///
    /// A missing or empty reference is not an error and yields an empty atlas
    /// without touching the fetcher.
    ///
    /// Any failure to get a usable index (not found, transport failure,
    /// unparsable JSON) moves on to the next density. When none is left the
    /// error is `SpriteNotFound` for the last index tried, and its `reason`
    /// says which kind of failure it was.
    pub async fn resolve(&self, sprite: Option<&str>) -> StyleResult<SpriteAtlas> {
        let reference = match sprite.map(str::trim) {
            Some(r) if !r.is_empty() => r,
            _ => {
                log::debug!("style declares no sprite; icons resolve to nothing");
                return Ok(SpriteAtlas::empty());
            }
        };

        let sprite_url = normalize_sprite_url(reference, self.base_directory, self.access_token);
        let candidates = sprite_candidates(&sprite_url, self.pixel_ratio);

        let mut last_failure = None;
        for candidate in &candidates {
            match self.attempt(candidate).await? {
                Attempt::Loaded(atlas) => return Ok(atlas),
                Attempt::IndexMissing { url, reason } => {
                    log::warn!("sprite index {} unavailable: {}", url, reason);
                    last_failure = Some((url, reason));
                }
            }
        }

        let (url, reason) =
            last_failure.unwrap_or_else(|| (sprite_url.clone(), "no candidates".to_string()));
        Err(StyleError::sprite_not_found(url, reason))
    }

    async fn attempt(&self, candidate: &SpriteCandidate) -> StyleResult<Attempt> {
        let json_url = candidate.json_url();
        log::debug!("fetching sprite index {}", json_url);

        let bytes = match self.fetcher.fetch(&json_url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let reason = if e.is_not_found() {
                    e.to_string()
                } else {
                    format!("transport error: {}", e)
                };
                return Ok(Attempt::IndexMissing {
                    url: json_url,
                    reason,
                });
            }
        };
        let entries: HashMap<String, SpriteEntry> = match serde_json::from_slice(&bytes) {
            Ok(entries) => entries,
            Err(e) => {
                return Ok(Attempt::IndexMissing {
                    url: json_url,
                    reason: format!("invalid sprite index: {}", e),
                })
            }
        };

        // The index was found: its image is required from here on.
        let image_url = candidate.image_url();
        log::debug!("fetching sprite image {}", image_url);
        let image_bytes = self
            .fetcher
            .fetch(&image_url)
            .await
            .map_err(|e| StyleError::sprite_image(&image_url, e))?;
        let image = SpriteImage::decode(&image_bytes)
            .map_err(|e| StyleError::sprite_image(&image_url, e))?;

        Ok(Attempt::Loaded(SpriteAtlas {
            entries,
            image: Some(image),
            pixel_ratio: candidate.scale() as f32,
            url: Some(candidate.base_url()),
        }))
    }
}
