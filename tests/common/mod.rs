// tests/common/mod.rs
// Shared fixtures: an OSM Liberty style, sprite pairs and a call-recording fetcher

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use gl_style_apply::{FetchError, ResourceFetcher};
use serde_json::{json, Value};

pub const SOURCE: &str = "openmaptiles";
pub const RASTER_SOURCE: &str = "natural_earth_shaded_relief";
pub const SPRITE_HOST: &str = "https://tiles.example.com/fixtures/osm-liberty/osm-liberty";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Trimmed OSM Liberty style. `sprite: None` omits the field entirely.
pub fn osm_liberty(sprite: Option<&str>) -> Value {
    let mut style = json!({
        "version": 8,
        "name": "OSM Liberty",
        "sources": {
            "openmaptiles": {
                "type": "vector",
                "url": "https://api.maptiler.com/tiles/v3/tiles.json"
            },
            "natural_earth_shaded_relief": {
                "type": "raster",
                "tiles": ["https://klokantech.github.io/naturalearthtiles/tiles/natural_earth_2_shaded_relief.raster/{z}/{x}/{y}.png"],
                "tileSize": 256,
                "maxzoom": 6
            }
        },
        "glyphs": "https://orangemug.github.io/font-glyphs/glyphs/{fontstack}/{range}.pbf",
        "layers": [
            {"id": "background", "type": "background", "paint": {"background-color": "rgb(239,239,239)"}},
            {"id": "natural_earth", "type": "raster", "source": "natural_earth_shaded_relief",
             "maxzoom": 6, "paint": {"raster-opacity": {"base": 1.5, "stops": [[0, 0.6], [6, 0.1]]}}},
            {"id": "landcover_wood", "type": "fill", "source": "openmaptiles", "source-layer": "landcover",
             "filter": ["all", ["==", "$type", "Polygon"], ["==", "class", "wood"]],
             "paint": {"fill-color": "hsla(98, 61%, 72%, 0.7)", "fill-opacity": 0.4}},
            {"id": "park", "type": "fill", "source": "openmaptiles", "source-layer": "park",
             "paint": {"fill-color": "#d8e8c8", "fill-opacity": 0.7, "fill-outline-color": "rgba(95, 208, 100, 1)"}},
            {"id": "park_outline", "type": "line", "source": "openmaptiles", "source-layer": "park",
             "paint": {"line-dasharray": [1, 1.5], "line-color": "rgba(228, 241, 215, 1)"}},
            {"id": "water", "type": "fill", "source": "openmaptiles", "source-layer": "water",
             "filter": ["all", ["!=", "brunnel", "tunnel"]], "paint": {"fill-color": "rgb(158,189,255)"}},
            {"id": "road_motorway", "type": "line", "source": "openmaptiles", "source-layer": "transportation",
             "minzoom": 5,
             "filter": ["all", ["==", "$type", "LineString"], ["==", "class", "motorway"]],
             "layout": {"line-cap": "round", "line-join": "round"},
             "paint": {
                 "line-color": {"base": 1, "stops": [[5, "hsl(26, 87%, 62%)"], [6, "#fc8"]]},
                 "line-width": {"base": 1.2, "stops": [[5, 0], [7, 1], [20, 18]]}
             }},
            {"id": "road_major_rail", "type": "line", "source": "openmaptiles", "source-layer": "transportation",
             "filter": ["all", ["==", "$type", "LineString"], ["==", "class", "rail"]],
             "paint": {"line-color": "#bbb", "line-width": {"base": 1.4, "stops": [[14, 0.4], [15, 0.75], [20, 2]]}}},
            {"id": "poi", "type": "symbol", "source": "openmaptiles", "source-layer": "poi",
             "filter": ["all", ["==", "$type", "Point"], [">=", "rank", 7]],
             "layout": {
                 "icon-image": "{class}_11",
                 "text-field": "{name}",
                 "text-font": ["Roboto Condensed Italic"],
                 "text-size": 12,
                 "text-anchor": "top",
                 "text-offset": [0, 0.6],
                 "text-max-width": 9
             },
             "paint": {"text-color": "#666", "text-halo-color": "#ffffff", "text-halo-width": 1}},
            {"id": "place_city", "type": "symbol", "source": "openmaptiles", "source-layer": "place",
             "filter": ["==", ["get", "class"], "city"],
             "layout": {
                 "text-field": ["coalesce", ["get", "name:latin"], ["get", "name"]],
                 "text-font": ["Roboto Medium"],
                 "text-size": ["interpolate", ["linear"], ["zoom"], 4, 12, 10, 22],
                 "text-transform": "uppercase"
             },
             "paint": {"text-color": "#333"}}
        ]
    });
    if let (Some(sprite), Some(obj)) = (sprite, style.as_object_mut()) {
        obj.insert("sprite".to_string(), Value::from(sprite));
    }
    style
}

/// Sprite index with the icons the POI layer uses.
pub fn sprite_index(pixel_ratio: u32) -> Vec<u8> {
    let size = 11 * pixel_ratio;
    serde_json::to_vec(&json!({
        "park_11": {"x": 0, "y": 0, "width": size, "height": size, "pixelRatio": pixel_ratio},
        "zoo_11": {"x": size, "y": 0, "width": size, "height": size, "pixelRatio": pixel_ratio, "sdf": false}
    }))
    .unwrap()
}

/// PNG atlas wide enough for [`sprite_index`].
pub fn sprite_png(pixel_ratio: u32) -> Vec<u8> {
    let size = 11 * pixel_ratio;
    let img = image::RgbaImage::from_pixel(size * 2, size, image::Rgba([40, 160, 40, 255]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// Write `<stem>.json`/`<stem>.png` (and `@2x` variants when `hires`) into `dir`.
pub fn write_sprite(dir: &Path, stem: &str, hires: bool) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(format!("{}.json", stem)), sprite_index(1)).unwrap();
    std::fs::write(dir.join(format!("{}.png", stem)), sprite_png(1)).unwrap();
    if hires {
        std::fs::write(dir.join(format!("{}@2x.json", stem)), sprite_index(2)).unwrap();
        std::fs::write(dir.join(format!("{}@2x.png", stem)), sprite_png(2)).unwrap();
    }
}

/// In-memory fetcher that records every requested URL.
#[derive(Default)]
pub struct RecordingFetcher {
    resources: HashMap<String, Vec<u8>>,
    failures: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl RecordingFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.resources.insert(url.into(), bytes);
        self
    }

    /// Fail `url` with a transport error instead of "not found".
    pub fn with_transport_failure(mut self, url: impl Into<String>, message: &str) -> Self {
        self.failures.insert(url.into(), message.to_string());
        self
    }

    /// Serve the sprite pair at `base` (plus `@2x` when `hires`).
    pub fn with_sprite(self, base: &str, hires: bool) -> Self {
        let this = self
            .with_resource(format!("{}.json", base), sprite_index(1))
            .with_resource(format!("{}.png", base), sprite_png(1));
        if hires {
            this.with_resource(format!("{}@2x.json", base), sprite_index(2))
                .with_resource(format!("{}@2x.png", base), sprite_png(2))
        } else {
            this
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResourceFetcher for RecordingFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(message) = self.failures.get(url) {
            return Err(FetchError::transport(url, message));
        }
        self.resources
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::not_found(url))
    }
}
