//! Features handed to a compiled style function.

use serde_json::{Map, Value};

/// Geometry type of a feature, as seen by `$type` filters and `["geometry-type"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryType {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
    /// Geometry kinds the style language has no name for.
    Unknown,
}

impl GeometryType {
    /// Name used by style filters. Multi geometries report their base type.
    pub fn style_name(&self) -> Option<&'static str> {
        match self {
            GeometryType::Point | GeometryType::MultiPoint => Some("Point"),
            GeometryType::LineString | GeometryType::MultiLineString => Some("LineString"),
            GeometryType::Polygon | GeometryType::MultiPolygon => Some("Polygon"),
            GeometryType::Unknown => None,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "Point" => GeometryType::Point,
            "MultiPoint" => GeometryType::MultiPoint,
            "LineString" => GeometryType::LineString,
            "MultiLineString" => GeometryType::MultiLineString,
            "Polygon" => GeometryType::Polygon,
            "MultiPolygon" => GeometryType::MultiPolygon,
            _ => GeometryType::Unknown,
        }
    }
}

/// A single map feature: properties plus geometry kind.
///
/// `source_layer` is the layer name inside a multi-layer vector tile
/// (matched against a style layer's `source-layer`).
#[derive(Debug, Clone)]
pub struct Feature {
    pub id: Option<Value>,
    pub geometry_type: GeometryType,
    pub source_layer: Option<String>,
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn new(geometry_type: GeometryType) -> Self {
        Self {
            id: None,
            geometry_type,
            source_layer: None,
            properties: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_source_layer(mut self, layer: impl Into<String>) -> Self {
        self.source_layer = Some(layer.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}
