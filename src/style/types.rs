//! Style document types for the Mapbox GL Style Spec.

use std::collections::BTreeMap;
use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::style::expressions::{evaluate_expression, is_expression, EvalContext};
use crate::style::functions::StopFunction;

/// The only style schema version this crate understands.
pub const SUPPORTED_VERSION: u64 = 8;

/// Complete style document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleSpec {
    /// Style version (always 8 for Mapbox GL). Required.
    #[serde(deserialize_with = "deserialize_version")]
    pub version: u64,
    /// Style name.
    #[serde(default)]
    pub name: String,
    /// Data sources keyed by source name.
    #[serde(default)]
    pub sources: BTreeMap<String, SourceSpec>,
    /// Style layers, in paint order.
    #[serde(default)]
    pub layers: Vec<StyleLayer>,
    /// Sprite base URL (optional).
    #[serde(default)]
    pub sprite: Option<String>,
    /// Glyphs URL template (optional).
    #[serde(default)]
    pub glyphs: Option<String>,
}

/// Accepts `8` and `8.0` alike: both are the same JSON number.
fn deserialize_version<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let number = serde_json::Number::deserialize(deserializer)?;
    if let Some(version) = number.as_u64() {
        return Ok(version);
    }
    match number.as_f64() {
        Some(v) if v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 => Ok(v as u64),
        _ => Err(de::Error::custom(format!("invalid style version {}", number))),
    }
}

/// A data source entry of the style document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSpec {
    #[serde(rename = "type")]
    pub source_type: SourceType,
    /// TileJSON URL (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Tile URL templates (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiles: Option<Vec<String>>,
    /// Everything else (attribution, bounds, data, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Source types of the style spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Vector,
    Raster,
    #[serde(rename = "raster-dem")]
    RasterDem,
    GeoJson,
    Image,
    Video,
    #[serde(other)]
    Unknown,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Vector => "vector",
            SourceType::Raster => "raster",
            SourceType::RasterDem => "raster-dem",
            SourceType::GeoJson => "geojson",
            SourceType::Image => "image",
            SourceType::Video => "video",
            SourceType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Paint or layout properties of a layer, keyed by property name.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// A single style layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleLayer {
    /// Unique layer ID.
    pub id: String,
    /// Layer type (fill, line, symbol, background).
    #[serde(rename = "type")]
    pub layer_type: LayerType,
    /// Source ID (for data layers).
    #[serde(default)]
    pub source: Option<String>,
    /// Source layer name (for vector tile sources).
    #[serde(rename = "source-layer")]
    #[serde(default)]
    pub source_layer: Option<String>,
    /// Filter, legacy or expression syntax (optional).
    #[serde(default)]
    pub filter: Option<Value>,
    /// Layout properties (visibility, text, icons).
    #[serde(default)]
    pub layout: PropertyMap,
    /// Paint properties (colors, widths, opacities).
    #[serde(default)]
    pub paint: PropertyMap,
    /// Minimum zoom level.
    #[serde(default)]
    pub minzoom: Option<f64>,
    /// Maximum zoom level (exclusive).
    #[serde(default)]
    pub maxzoom: Option<f64>,
}

/// Layer types supported by Mapbox GL Style Spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerType {
    Fill,
    Line,
    Symbol,
    Background,
    Circle,
    Raster,
    Hillshade,
    FillExtrusion,
    #[serde(other)]
    Unknown,
}

/// A paint/layout property value.
///
/// Every property is one of three shapes; evaluation dispatches on the tag so
/// call sites never inspect raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum PropertyValue {
    /// Plain value used as-is.
    Literal(Value),
    /// Legacy `{"stops": [...]}` function.
    Stops(StopFunction),
    /// Expression tree (e.g., `["interpolate", ...]`).
    Expression(Value),
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        if let Some(function) = StopFunction::from_value(&value) {
            return PropertyValue::Stops(function);
        }
        if is_expression(&value) {
            PropertyValue::Expression(value)
        } else {
            PropertyValue::Literal(value)
        }
    }
}

impl From<PropertyValue> for Value {
    fn from(value: PropertyValue) -> Self {
        match value {
            PropertyValue::Literal(v) | PropertyValue::Expression(v) => v,
            PropertyValue::Stops(function) => function.to_value(),
        }
    }
}

impl PropertyValue {
    /// Evaluate for one feature at one zoom level.
    pub fn evaluate(&self, ctx: &EvalContext) -> Option<Value> {
        match self {
            PropertyValue::Literal(v) => Some(v.clone()),
            PropertyValue::Stops(function) => function.evaluate(ctx),
            PropertyValue::Expression(expr) => evaluate_expression(expr, ctx),
        }
    }

    pub fn evaluate_f64(&self, ctx: &EvalContext) -> Option<f64> {
        self.evaluate(ctx)?.as_f64()
    }

    pub fn evaluate_color(&self, ctx: &EvalContext) -> Option<[f32; 4]> {
        color_from_value(&self.evaluate(ctx)?)
    }

    pub fn evaluate_string(&self, ctx: &EvalContext) -> Option<String> {
        match self.evaluate(ctx)? {
            Value::String(s) => Some(s),
            Value::Null => None,
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, PropertyValue::Literal(_))
    }
}

/// Convert an evaluated value to RGBA [0..1].
///
/// Accepts CSS color strings and the `[r, g, b, a]` arrays produced by color
/// expressions.
pub fn color_from_value(value: &Value) -> Option<[f32; 4]> {
    match value {
        Value::String(s) => parse_color_string(s),
        Value::Array(arr) if arr.len() >= 3 => {
            let r = arr[0].as_f64()? as f32;
            let g = arr[1].as_f64()? as f32;
            let b = arr[2].as_f64()? as f32;
            let a = arr.get(3).and_then(|v| v.as_f64()).unwrap_or(1.0) as f32;
            Some([r, g, b, a])
        }
        _ => None,
    }
}

/// Encode RGBA as the array form used inside expression results.
pub fn color_to_value(rgba: [f32; 4]) -> Value {
    Value::Array(
        rgba.iter()
            .filter_map(|c| serde_json::Number::from_f64(*c as f64).map(Value::Number))
            .collect(),
    )
}

/// Parse a CSS color string to RGBA.
pub fn parse_color_string(s: &str) -> Option<[f32; 4]> {
    let s = s.trim();

    // Hex colors
    if s.starts_with('#') {
        return parse_hex_color(s);
    }

    // RGB/RGBA functions
    if s.starts_with("rgb") {
        return parse_rgb_color(s);
    }

    // HSL/HSLA functions
    if s.starts_with("hsl") {
        return parse_hsl_color(s);
    }

    // Named colors (subset)
    match s.to_lowercase().as_str() {
        "black" => Some([0.0, 0.0, 0.0, 1.0]),
        "white" => Some([1.0, 1.0, 1.0, 1.0]),
        "red" => Some([1.0, 0.0, 0.0, 1.0]),
        "green" => Some([0.0, 0.5, 0.0, 1.0]),
        "blue" => Some([0.0, 0.0, 1.0, 1.0]),
        "yellow" => Some([1.0, 1.0, 0.0, 1.0]),
        "cyan" | "aqua" => Some([0.0, 1.0, 1.0, 1.0]),
        "magenta" | "fuchsia" => Some([1.0, 0.0, 1.0, 1.0]),
        "gray" | "grey" => Some([0.5, 0.5, 0.5, 1.0]),
        "silver" => Some([0.753, 0.753, 0.753, 1.0]),
        "orange" => Some([1.0, 0.647, 0.0, 1.0]),
        "transparent" => Some([0.0, 0.0, 0.0, 0.0]),
        _ => None,
    }
}

fn parse_hex_color(s: &str) -> Option<[f32; 4]> {
    let hex = s.trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    let short = |i: usize| u8::from_str_radix(&hex[i..i + 1].repeat(2), 16).ok();
    let long = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let (r, g, b, a) = match hex.len() {
        3 => (short(0)?, short(1)?, short(2)?, 255),
        4 => (short(0)?, short(1)?, short(2)?, short(3)?),
        6 => (long(0)?, long(2)?, long(4)?, 255),
        8 => (long(0)?, long(2)?, long(4)?, long(6)?),
        _ => return None,
    };
    Some([
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        a as f32 / 255.0,
    ])
}

fn parse_rgb_color(s: &str) -> Option<[f32; 4]> {
    let inner = s
        .trim_start_matches("rgba(")
        .trim_start_matches("rgb(")
        .trim_end_matches(')');
    let parts: Vec<&str> = inner.split(',').map(|p| p.trim()).collect();

    if parts.len() < 3 {
        return None;
    }

    let r: f32 = parts[0].trim_end_matches('%').parse().ok()?;
    let g: f32 = parts[1].trim_end_matches('%').parse().ok()?;
    let b: f32 = parts[2].trim_end_matches('%').parse().ok()?;

    let (r, g, b) = if parts[0].contains('%') {
        (r / 100.0, g / 100.0, b / 100.0)
    } else {
        (r / 255.0, g / 255.0, b / 255.0)
    };

    let a = if parts.len() >= 4 {
        parts[3].parse().unwrap_or(1.0)
    } else {
        1.0
    };

    Some([r, g, b, a])
}

fn parse_hsl_color(s: &str) -> Option<[f32; 4]> {
    let inner = s
        .trim_start_matches("hsla(")
        .trim_start_matches("hsl(")
        .trim_end_matches(')');
    let parts: Vec<&str> = inner.split(',').map(|p| p.trim()).collect();

    if parts.len() < 3 {
        return None;
    }

    let h: f32 = parts[0].parse().ok()?;
    let s_val: f32 = parts[1].trim_end_matches('%').parse::<f32>().ok()? / 100.0;
    let l: f32 = parts[2].trim_end_matches('%').parse::<f32>().ok()? / 100.0;

    let a = if parts.len() >= 4 {
        parts[3].parse().unwrap_or(1.0)
    } else {
        1.0
    };

    let (r, g, b) = hsl_to_rgb(h / 360.0, s_val, l);
    Some([r, g, b, a])
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (f32, f32, f32) {
    if s == 0.0 {
        return (l, l, l);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    let r = hue_to_rgb(p, q, h + 1.0 / 3.0);
    let g = hue_to_rgb(p, q, h);
    let b = hue_to_rgb(p, q, h - 1.0 / 3.0);

    (r, g, b)
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 0.5 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_hex_colors() {
        assert_eq!(parse_hex_color("#fff"), Some([1.0, 1.0, 1.0, 1.0]));
        assert_eq!(parse_hex_color("#000"), Some([0.0, 0.0, 0.0, 1.0]));
        assert_eq!(parse_hex_color("#ff0000"), Some([1.0, 0.0, 0.0, 1.0]));
        assert_eq!(parse_hex_color("#00ff00ff"), Some([0.0, 1.0, 0.0, 1.0]));
        assert_eq!(parse_hex_color("#12345"), None);
    }

    #[test]
    fn test_parse_rgb_colors() {
        let rgba = parse_rgb_color("rgb(255, 0, 0)").unwrap();
        assert!((rgba[0] - 1.0).abs() < 0.01);
        assert!((rgba[1] - 0.0).abs() < 0.01);

        let rgba = parse_rgb_color("rgba(0, 255, 0, 0.5)").unwrap();
        assert!((rgba[1] - 1.0).abs() < 0.01);
        assert!((rgba[3] - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_parse_hsl_color() {
        let rgba = parse_color_string("hsl(0, 100%, 50%)").unwrap();
        assert!((rgba[0] - 1.0).abs() < 0.01);
        assert!(rgba[1].abs() < 0.01);
    }

    #[test]
    fn test_property_value_classification() {
        assert!(matches!(
            PropertyValue::from(json!("#fff")),
            PropertyValue::Literal(_)
        ));
        assert!(matches!(
            PropertyValue::from(json!({"base": 1.4, "stops": [[5, 1], [10, 4]]})),
            PropertyValue::Stops(_)
        ));
        assert!(matches!(
            PropertyValue::from(json!(["get", "color"])),
            PropertyValue::Expression(_)
        ));
        // Font stacks and dash arrays are arrays but not expressions.
        assert!(matches!(
            PropertyValue::from(json!(["Open Sans Regular"])),
            PropertyValue::Literal(_)
        ));
        assert!(matches!(
            PropertyValue::from(json!([2, 1])),
            PropertyValue::Literal(_)
        ));
    }

    #[test]
    fn test_layer_deserializes_property_maps() {
        let layer: StyleLayer = serde_json::from_value(json!({
            "id": "roads",
            "type": "line",
            "source": "openmaptiles",
            "source-layer": "transportation",
            "paint": {
                "line-color": "#ffffff",
                "line-width": {"base": 1.2, "stops": [[10, 1], [16, 6]]}
            }
        }))
        .unwrap();
        assert_eq!(layer.layer_type, LayerType::Line);
        assert!(layer.paint["line-color"].is_literal());
        assert!(matches!(layer.paint["line-width"], PropertyValue::Stops(_)));
    }

    #[test]
    fn test_source_types() {
        let spec: SourceSpec =
            serde_json::from_value(json!({"type": "raster-dem", "url": "x"})).unwrap();
        assert_eq!(spec.source_type, SourceType::RasterDem);
        let spec: SourceSpec =
            serde_json::from_value(json!({"type": "geojson", "data": {}})).unwrap();
        assert_eq!(spec.source_type, SourceType::GeoJson);
        assert!(spec.extra.contains_key("data"));
    }

    #[test]
    fn test_color_from_array_value() {
        assert_eq!(
            color_from_value(&json!([1.0, 0.5, 0.0])),
            Some([1.0, 0.5, 0.0, 1.0])
        );
    }
}
