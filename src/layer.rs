//! Target layers that accept a compiled style function
//!
//! The rendering engine owns its layers; this module only describes what the
//! style engine needs from one: what kind of layer it is, what kind of source
//! is attached, and a slot holding the installed style function.

use std::fmt;
use std::sync::RwLock;

use crate::style::compiler::StyleFunction;
use crate::style::types::SourceType;

/// Kinds of rendering layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Layer of individually styled vector features
    Vector,
    /// Layer of vector tiles (multi-layer tile sources)
    VectorTile,
    /// Single rendered image
    Image,
    /// Raster tiles
    Tile,
}

impl LayerKind {
    /// Whether a per-feature style function can be installed on this layer
    pub fn hosts_style_function(&self) -> bool {
        matches!(self, LayerKind::Vector | LayerKind::VectorTile)
    }

    /// Source kind assumed when the layer has no source attached yet
    pub fn default_source(&self) -> SourceKind {
        match self {
            LayerKind::Vector => SourceKind::Vector,
            LayerKind::VectorTile => SourceKind::VectorTile,
            LayerKind::Image => SourceKind::Image,
            LayerKind::Tile => SourceKind::Raster,
        }
    }

    pub fn debug_label(&self) -> &'static str {
        match self {
            LayerKind::Vector => "layer.Vector",
            LayerKind::VectorTile => "layer.VectorTile",
            LayerKind::Image => "layer.Image",
            LayerKind::Tile => "layer.Tile",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.debug_label())
    }
}

/// Kinds of source object attached to a rendering layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// In-memory feature collection
    Vector,
    /// Vector tile pyramid
    VectorTile,
    Raster,
    Image,
}

impl SourceKind {
    /// Style source types this source object can be fed from
    pub fn accepted_style_sources(&self) -> &'static [SourceType] {
        match self {
            SourceKind::Vector => &[SourceType::Vector, SourceType::GeoJson],
            SourceKind::VectorTile => &[SourceType::Vector],
            SourceKind::Raster => &[SourceType::Raster, SourceType::RasterDem],
            SourceKind::Image => &[SourceType::Image],
        }
    }

    pub fn accepts(&self, style_source: &SourceType) -> bool {
        self.accepted_style_sources().contains(style_source)
    }
}

/// What the style engine needs from a rendering layer.
///
/// `set_style_function` is a single replacement of the installed function.
/// Concurrent applications against the same layer race on it and the last one
/// to finish wins.
pub trait StyleTarget: Send + Sync {
    fn kind(&self) -> LayerKind;

    /// Source object attached to the layer, if any
    fn source_kind(&self) -> Option<SourceKind>;

    fn set_style_function(&self, function: StyleFunction);

    fn style_function(&self) -> Option<StyleFunction>;
}

/// Minimal layer implementation with an interior style slot
pub struct MapLayer {
    kind: LayerKind,
    source: Option<SourceKind>,
    style: RwLock<Option<StyleFunction>>,
}

impl MapLayer {
    pub fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            source: None,
            style: RwLock::new(None),
        }
    }

    pub fn vector() -> Self {
        Self::new(LayerKind::Vector)
    }

    pub fn vector_tile() -> Self {
        Self::new(LayerKind::VectorTile).with_source(SourceKind::VectorTile)
    }

    pub fn image() -> Self {
        Self::new(LayerKind::Image).with_source(SourceKind::Image)
    }

    pub fn with_source(mut self, source: SourceKind) -> Self {
        self.source = Some(source);
        self
    }
}

impl StyleTarget for MapLayer {
    fn kind(&self) -> LayerKind {
        self.kind
    }

    fn source_kind(&self) -> Option<SourceKind> {
        self.source
    }

    fn set_style_function(&self, function: StyleFunction) {
        let mut slot = self.style.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(function);
    }

    fn style_function(&self) -> Option<StyleFunction> {
        self.style
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl fmt::Debug for MapLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapLayer")
            .field("kind", &self.kind)
            .field("source", &self.source)
            .field("styled", &self.style_function().is_some())
            .finish()
    }
}
