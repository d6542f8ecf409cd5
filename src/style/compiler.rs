//! Style function compiler.
//!
//! Binds the layers of a validated style to one source and produces a
//! function from (feature, resolution) to render instructions. Layers are
//! scanned in document order and every matching layer contributes, so later
//! layers paint on top of earlier ones.

use std::sync::Arc;

use crate::feature::Feature;
use crate::style::converters::{layer_paints, RenderInstruction};
use crate::style::expressions::EvalContext;
use crate::style::filter::FilterExpr;
use crate::style::sprite::SpriteAtlas;
use crate::style::types::{LayerType, StyleLayer, StyleSpec};

/// Installed per-feature style function: (feature, resolution) -> instructions.
pub type StyleFunction = Arc<dyn Fn(&Feature, f64) -> Vec<RenderInstruction> + Send + Sync>;

/// Resolution (m/px) of zoom 0 for 512px web-mercator tiles.
pub const WEB_MERCATOR_MAX_RESOLUTION: f64 = 78271.51696402048;

/// Highest zoom of the default resolution table.
pub const DEFAULT_MAX_ZOOM: usize = 24;

/// Web-mercator resolutions for zoom 0..=24, largest first.
pub fn default_resolutions() -> Vec<f64> {
    (0..=DEFAULT_MAX_ZOOM)
        .map(|z| WEB_MERCATOR_MAX_RESOLUTION / 2f64.powi(z as i32))
        .collect()
}

/// Fractional zoom for `resolution` given a descending resolution table.
///
/// Zoom `i` is `resolutions[i]`; values between entries interpolate
/// logarithmically and values outside the table clamp to its ends.
pub fn zoom_for_resolution(resolution: f64, resolutions: &[f64]) -> f64 {
    let (first, last) = match (resolutions.first(), resolutions.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return (WEB_MERCATOR_MAX_RESOLUTION / resolution).log2().max(0.0),
    };
    if resolution >= first {
        return 0.0;
    }
    if resolution <= last {
        return (resolutions.len() - 1) as f64;
    }
    for (i, pair) in resolutions.windows(2).enumerate() {
        let (hi, lo) = (pair[0], pair[1]);
        if resolution <= hi && resolution > lo {
            return i as f64 + (hi / resolution).ln() / (hi / lo).ln();
        }
    }
    (resolutions.len() - 1) as f64
}

/// One style layer bound to the compiled source.
#[derive(Debug, Clone)]
struct CompiledLayer {
    z_index: usize,
    layer: StyleLayer,
    filter: FilterExpr,
}

impl CompiledLayer {
    fn applies_to(&self, feature: &Feature, zoom: f64) -> bool {
        if !self.layer.in_zoom_range(zoom) {
            return false;
        }
        // Background layers ignore filter and source-layer
        if self.layer.layer_type == LayerType::Background {
            return true;
        }
        if let Some(source_layer) = &self.layer.source_layer {
            if feature.source_layer.as_deref() != Some(source_layer.as_str()) {
                return false;
            }
        }
        self.filter.matches(feature, zoom)
    }
}

/// Style compiled against one source, with its sprite atlas.
#[derive(Debug, Clone)]
pub struct CompiledStyle {
    layers: Vec<CompiledLayer>,
    atlas: SpriteAtlas,
    resolutions: Vec<f64>,
}

impl CompiledStyle {
    /// Compile the layers of `spec` bound to `source_name`.
    ///
    /// Background layers are always kept. Layers hidden with
    /// `visibility: none` are dropped here.
    pub fn compile(spec: &StyleSpec, source_name: &str, atlas: SpriteAtlas) -> Self {
        let layers: Vec<CompiledLayer> = spec
            .layers
            .iter()
            .enumerate()
            .filter(|(_, layer)| {
                layer.layer_type == LayerType::Background
                    || layer.source.as_deref() == Some(source_name)
            })
            .filter(|(_, layer)| layer.is_visible())
            .map(|(z_index, layer)| CompiledLayer {
                z_index,
                layer: layer.clone(),
                filter: FilterExpr::new(layer.filter.as_ref()),
            })
            .collect();

        log::debug!(
            "Compiled {} of {} style layers for source '{}'",
            layers.len(),
            spec.layers.len(),
            source_name
        );

        Self {
            layers,
            atlas,
            resolutions: default_resolutions(),
        }
    }

    pub fn with_resolutions(mut self, resolutions: Vec<f64>) -> Self {
        self.resolutions = resolutions;
        self
    }

    /// IDs of the compiled layers in paint order.
    pub fn layer_ids(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|l| l.layer.id.as_str())
    }

    pub fn atlas(&self) -> &SpriteAtlas {
        &self.atlas
    }

    pub fn zoom_for_resolution(&self, resolution: f64) -> f64 {
        zoom_for_resolution(resolution, &self.resolutions)
    }

    /// Instructions for `feature` at view `resolution`.
    pub fn evaluate(&self, feature: &Feature, resolution: f64) -> Vec<RenderInstruction> {
        self.evaluate_at_zoom(feature, self.zoom_for_resolution(resolution))
    }

    /// Instructions for `feature` at `zoom`, in document order.
    pub fn evaluate_at_zoom(&self, feature: &Feature, zoom: f64) -> Vec<RenderInstruction> {
        let ctx = EvalContext::for_feature(feature, zoom);
        let mut out = Vec::new();
        for compiled in &self.layers {
            if !compiled.applies_to(feature, zoom) {
                continue;
            }
            out.extend(
                layer_paints(&compiled.layer, &ctx, &self.atlas)
                    .into_iter()
                    .map(|paint| RenderInstruction {
                        layer_id: compiled.layer.id.clone(),
                        z_index: compiled.z_index,
                        paint,
                    }),
            );
        }
        out
    }

    /// Move into a shareable style function.
    pub fn into_function(self) -> StyleFunction {
        Arc::new(move |feature: &Feature, resolution: f64| self.evaluate(feature, resolution))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::GeometryType;
    use crate::style::converters::Paint;
    use serde_json::json;

    fn spec() -> StyleSpec {
        serde_json::from_value(json!({
            "version": 8,
            "sources": {
                "osm": {"type": "vector"},
                "other": {"type": "vector"}
            },
            "layers": [
                {"id": "bg", "type": "background", "paint": {"background-color": "#eee"}},
                {"id": "landuse", "type": "fill", "source": "osm", "source-layer": "landuse",
                 "paint": {"fill-color": "#0f0"}},
                {"id": "park", "type": "fill", "source": "osm", "source-layer": "landuse",
                 "filter": ["==", "class", "park"], "paint": {"fill-color": "#00f"}},
                {"id": "hidden", "type": "fill", "source": "osm", "source-layer": "landuse",
                 "layout": {"visibility": "none"}},
                {"id": "elsewhere", "type": "fill", "source": "other", "source-layer": "landuse"},
                {"id": "detail", "type": "fill", "source": "osm", "source-layer": "landuse",
                 "minzoom": 14, "maxzoom": 16}
            ]
        }))
        .unwrap()
    }

    fn park() -> Feature {
        Feature::new(GeometryType::Polygon)
            .with_source_layer("landuse")
            .with_property("class", "park")
    }

    #[test]
    fn test_layers_bound_to_source() {
        let compiled = CompiledStyle::compile(&spec(), "osm", SpriteAtlas::empty());
        let ids: Vec<&str> = compiled.layer_ids().collect();
        assert_eq!(ids, vec!["bg", "landuse", "park", "detail"]);
    }

    #[test]
    fn test_all_matches_in_document_order() {
        let compiled = CompiledStyle::compile(&spec(), "osm", SpriteAtlas::empty());
        let out = compiled.evaluate_at_zoom(&park(), 10.0);
        let ids: Vec<&str> = out.iter().map(|i| i.layer_id.as_str()).collect();
        assert_eq!(ids, vec!["bg", "landuse", "park"]);
        let z: Vec<usize> = out.iter().map(|i| i.z_index).collect();
        assert_eq!(z, vec![0, 1, 2]);
        assert!(matches!(out[2].paint, Paint::Fill { color, .. } if color[2] == 1.0));
    }

    #[test]
    fn test_source_layer_and_zoom_range() {
        let compiled = CompiledStyle::compile(&spec(), "osm", SpriteAtlas::empty());
        let road = Feature::new(GeometryType::LineString).with_source_layer("road");
        let ids: Vec<String> = compiled
            .evaluate_at_zoom(&road, 10.0)
            .into_iter()
            .map(|i| i.layer_id)
            .collect();
        assert_eq!(ids, vec!["bg"]);

        let has_detail = |zoom: f64| {
            compiled
                .evaluate_at_zoom(&park(), zoom)
                .iter()
                .any(|i| i.layer_id == "detail")
        };
        assert!(!has_detail(13.9));
        assert!(has_detail(14.0));
        assert!(has_detail(15.9));
        assert!(!has_detail(16.0));
    }

    #[test]
    fn test_zoom_for_resolution() {
        let res = default_resolutions();
        assert_eq!(res.len(), 25);
        assert_eq!(zoom_for_resolution(res[0], &res), 0.0);
        assert_eq!(zoom_for_resolution(res[0] * 4.0, &res), 0.0);
        assert!((zoom_for_resolution(res[10], &res) - 10.0).abs() < 1e-9);
        assert!((zoom_for_resolution(res[10] / 2f64.sqrt(), &res) - 10.5).abs() < 1e-9);
        assert_eq!(zoom_for_resolution(res[24] / 8.0, &res), 24.0);
    }

    #[test]
    fn test_function_uses_resolution() {
        let function = CompiledStyle::compile(&spec(), "osm", SpriteAtlas::empty()).into_function();
        let res = default_resolutions();
        assert!(function(&park(), res[15])
            .iter()
            .any(|i| i.layer_id == "detail"));
        assert!(!function(&park(), res[5])
            .iter()
            .any(|i| i.layer_id == "detail"));
    }
}
