//! Converters from evaluated style properties to render instructions.
//!
//! Instructions are resolution-agnostic directives (colors, widths, icon
//! regions, label text). Drawing them is the rendering layer's job.

use serde_json::{Map, Value};

use crate::style::expressions::{value_to_string, EvalContext};
use crate::style::sprite::SpriteAtlas;
use crate::style::types::{LayerType, PropertyMap, PropertyValue, StyleLayer};

/// RGBA color in 0..1, opacity already applied to alpha.
pub type Rgba = [f32; 4];

const BLACK: Rgba = [0.0, 0.0, 0.0, 1.0];
const TRANSPARENT: Rgba = [0.0, 0.0, 0.0, 0.0];
const DEFAULT_FONT_STACK: [&str; 2] = ["Open Sans Regular", "Arial Unicode MS Regular"];

/// One instruction produced by one style layer for one feature.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderInstruction {
    pub layer_id: String,
    /// Position of the producing layer in the style document.
    pub z_index: usize,
    pub paint: Paint,
}

/// Icon resolved against the sprite atlas.
#[derive(Debug, Clone, PartialEq)]
pub struct IconRef {
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
    pub sdf: bool,
    /// Normalized atlas coordinates [u0, v0, u1, v1] when the image is loaded.
    pub uv: Option<[f32; 4]>,
}

impl IconRef {
    /// Look `name` up in `atlas`; `None` when the sprite has no usable icon
    /// of that name.
    pub fn resolve(atlas: &SpriteAtlas, name: &str) -> Option<Self> {
        let entry = atlas.region(name)?;
        Some(Self {
            name: name.to_string(),
            x: entry.x,
            y: entry.y,
            width: entry.width,
            height: entry.height,
            pixel_ratio: entry.pixel_ratio,
            sdf: entry.sdf,
            uv: atlas.get_uvs(name),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    #[default]
    Center,
    Left,
    Right,
    Top,
    Bottom,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Anchor {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "center" => Anchor::Center,
            "left" => Anchor::Left,
            "right" => Anchor::Right,
            "top" => Anchor::Top,
            "bottom" => Anchor::Bottom,
            "top-left" => Anchor::TopLeft,
            "top-right" => Anchor::TopRight,
            "bottom-left" => Anchor::BottomLeft,
            "bottom-right" => Anchor::BottomRight,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    Bevel,
    Round,
    #[default]
    Miter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SymbolPlacement {
    #[default]
    Point,
    Line,
    LineCenter,
}

/// Paint directive for one feature.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Background {
        color: Rgba,
    },
    Fill {
        color: Rgba,
        outline_color: Option<Rgba>,
        pattern: Option<IconRef>,
    },
    Line {
        color: Rgba,
        width: f32,
        /// Dash lengths in pixels (style values are in line widths).
        dash: Option<Vec<f32>>,
        cap: LineCap,
        join: LineJoin,
        pattern: Option<IconRef>,
    },
    Circle {
        color: Rgba,
        radius: f32,
        stroke_color: Rgba,
        stroke_width: f32,
    },
    Icon {
        icon: IconRef,
        anchor: Anchor,
        /// icon-size divided by the icon's pixel ratio.
        scale: f32,
        /// Degrees clockwise.
        rotation: f32,
        opacity: f32,
        /// Tint for SDF icons.
        color: Option<Rgba>,
        offset: [f32; 2],
    },
    Text {
        text: String,
        font: Vec<String>,
        /// CSS font shorthand derived from the first face of the stack.
        font_css: String,
        size: f32,
        color: Rgba,
        halo_color: Rgba,
        halo_width: f32,
        anchor: Anchor,
        /// Offset from anchor in pixels.
        offset: [f32; 2],
        placement: SymbolPlacement,
        /// Wrap width in pixels.
        max_width: f32,
        letter_spacing: f32,
    },
}

/// Property lookups for one layer and one feature.
struct Props<'a> {
    layer: &'a StyleLayer,
    ctx: &'a EvalContext<'a>,
}

impl<'a> Props<'a> {
    fn find(&self, name: &str) -> Option<&'a PropertyValue> {
        let map: &PropertyMap = if is_layout_property(name) {
            &self.layer.layout
        } else {
            &self.layer.paint
        };
        map.get(name)
    }

    fn number(&self, name: &str, default: f64) -> f32 {
        self.find(name)
            .and_then(|p| p.evaluate_f64(self.ctx))
            .unwrap_or(default) as f32
    }

    fn color(&self, name: &str) -> Option<Rgba> {
        self.find(name)?.evaluate_color(self.ctx)
    }

    /// String value; legacy `{token}` templates are filled from properties.
    fn string(&self, name: &str) -> Option<String> {
        let prop = self.find(name)?;
        let s = prop.evaluate_string(self.ctx)?;
        Some(match prop {
            PropertyValue::Expression(_) => s,
            _ => fill_template(&s, self.ctx.properties),
        })
    }

    fn numbers(&self, name: &str) -> Option<Vec<f32>> {
        match self.find(name)?.evaluate(self.ctx)? {
            Value::Array(items) => items
                .iter()
                .map(|v| v.as_f64().map(|n| n as f32))
                .collect(),
            _ => None,
        }
    }

    fn strings(&self, name: &str) -> Option<Vec<String>> {
        match self.find(name)?.evaluate(self.ctx)? {
            Value::Array(items) => items
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => None,
        }
    }

    fn keyword(&self, name: &str) -> Option<String> {
        self.find(name)?.evaluate_string(self.ctx)
    }

    fn color_with_opacity(&self, color: &str, opacity: &str, default: Rgba) -> Rgba {
        let mut rgba = self.color(color).unwrap_or(default);
        rgba[3] *= self.number(opacity, 1.0);
        rgba
    }

    fn icon(&self, name: &str, atlas: &SpriteAtlas) -> Option<IconRef> {
        let icon_name = self.string(name)?;
        if icon_name.is_empty() {
            return None;
        }
        IconRef::resolve(atlas, &icon_name)
    }
}

fn is_layout_property(name: &str) -> bool {
    matches!(
        name,
        "visibility"
            | "line-cap"
            | "line-join"
            | "symbol-placement"
            | "icon-image"
            | "icon-size"
            | "icon-rotate"
            | "icon-anchor"
            | "icon-offset"
            | "text-field"
            | "text-font"
            | "text-size"
            | "text-anchor"
            | "text-offset"
            | "text-transform"
            | "text-max-width"
            | "text-letter-spacing"
    )
}

/// Replace `{key}` tokens with feature property values (missing -> empty).
pub fn fill_template(template: &str, properties: &Map<String, Value>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                if let Some(value) = properties.get(key) {
                    out.push_str(&value_to_string(value));
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// CSS font shorthand for the first face of a GL font stack.
///
/// Weight and style are read from the face name, e.g. "Open Sans Bold Italic"
/// becomes `italic 700 16px "Open Sans"`.
pub fn font_css(font_stack: &[String], size: f32) -> String {
    let face = font_stack.first().map(String::as_str).unwrap_or(DEFAULT_FONT_STACK[0]);
    let mut weight = 400;
    let mut style = "normal";
    let mut family = Vec::new();
    for word in face.split_whitespace() {
        match word.to_lowercase().as_str() {
            "thin" | "hairline" => weight = 100,
            "extralight" | "ultralight" => weight = 200,
            "light" => weight = 300,
            "regular" | "normal" | "book" | "roman" => weight = 400,
            "medium" => weight = 500,
            "semibold" | "demibold" => weight = 600,
            "bold" => weight = 700,
            "extrabold" | "ultrabold" => weight = 800,
            "black" | "heavy" => weight = 900,
            "italic" => style = "italic",
            "oblique" => style = "oblique",
            _ => family.push(word),
        }
    }
    format!("{} {} {}px \"{}\"", style, weight, size, family.join(" "))
}

/// Evaluate `layer` for one feature into paint directives.
///
/// Unresolvable icons are dropped; everything else falls back to the
/// style-spec defaults.
pub fn layer_paints(layer: &StyleLayer, ctx: &EvalContext, atlas: &SpriteAtlas) -> Vec<Paint> {
    let props = Props { layer, ctx };
    match layer.layer_type {
        LayerType::Background => vec![Paint::Background {
            color: props.color_with_opacity("background-color", "background-opacity", BLACK),
        }],
        LayerType::Fill => vec![fill_paint(&props, atlas)],
        LayerType::Line => vec![line_paint(&props, atlas)],
        LayerType::Circle => vec![circle_paint(&props)],
        LayerType::Symbol => symbol_paints(&props, atlas),
        _ => Vec::new(),
    }
}

fn fill_paint(props: &Props, atlas: &SpriteAtlas) -> Paint {
    let opacity = props.number("fill-opacity", 1.0);
    let mut color = props.color("fill-color").unwrap_or(BLACK);
    color[3] *= opacity;
    let outline_color = props.color("fill-outline-color").map(|mut c| {
        c[3] *= opacity;
        c
    });
    Paint::Fill {
        color,
        outline_color,
        pattern: props.icon("fill-pattern", atlas),
    }
}

fn line_paint(props: &Props, atlas: &SpriteAtlas) -> Paint {
    let width = props.number("line-width", 1.0);
    let dash = props
        .numbers("line-dasharray")
        .map(|d| d.into_iter().map(|len| len * width).collect());
    let cap = match props.keyword("line-cap").as_deref() {
        Some("round") => LineCap::Round,
        Some("square") => LineCap::Square,
        _ => LineCap::Butt,
    };
    let join = match props.keyword("line-join").as_deref() {
        Some("round") => LineJoin::Round,
        Some("bevel") => LineJoin::Bevel,
        _ => LineJoin::Miter,
    };
    Paint::Line {
        color: props.color_with_opacity("line-color", "line-opacity", BLACK),
        width,
        dash,
        cap,
        join,
        pattern: props.icon("line-pattern", atlas),
    }
}

fn circle_paint(props: &Props) -> Paint {
    Paint::Circle {
        color: props.color_with_opacity("circle-color", "circle-opacity", BLACK),
        radius: props.number("circle-radius", 5.0),
        stroke_color: props.color_with_opacity(
            "circle-stroke-color",
            "circle-stroke-opacity",
            BLACK,
        ),
        stroke_width: props.number("circle-stroke-width", 0.0),
    }
}

fn symbol_paints(props: &Props, atlas: &SpriteAtlas) -> Vec<Paint> {
    let mut paints = Vec::with_capacity(2);

    if let Some(icon) = props.icon("icon-image", atlas) {
        let size = props.number("icon-size", 1.0);
        let scale = if icon.pixel_ratio > 0.0 {
            size / icon.pixel_ratio
        } else {
            size
        };
        let offset = props.numbers("icon-offset").unwrap_or_default();
        paints.push(Paint::Icon {
            anchor: props
                .keyword("icon-anchor")
                .and_then(|a| Anchor::from_name(&a))
                .unwrap_or_default(),
            scale,
            rotation: props.number("icon-rotate", 0.0),
            opacity: props.number("icon-opacity", 1.0),
            color: if icon.sdf { props.color("icon-color") } else { None },
            offset: [
                offset.first().copied().unwrap_or(0.0) * size,
                offset.get(1).copied().unwrap_or(0.0) * size,
            ],
            icon,
        });
    }

    if let Some(text) = props.string("text-field").filter(|t| !t.is_empty()) {
        let text = match props.keyword("text-transform").as_deref() {
            Some("uppercase") => text.to_uppercase(),
            Some("lowercase") => text.to_lowercase(),
            _ => text,
        };
        let size = props.number("text-size", 16.0);
        let font = props
            .strings("text-font")
            .unwrap_or_else(|| DEFAULT_FONT_STACK.iter().map(|s| s.to_string()).collect());
        // Offsets and widths are in ems
        let offset = props.numbers("text-offset").unwrap_or_default();
        let placement = match props.keyword("symbol-placement").as_deref() {
            Some("line") => SymbolPlacement::Line,
            Some("line-center") => SymbolPlacement::LineCenter,
            _ => SymbolPlacement::Point,
        };
        paints.push(Paint::Text {
            font_css: font_css(&font, size),
            font,
            size,
            color: props.color_with_opacity("text-color", "text-opacity", BLACK),
            halo_color: props.color("text-halo-color").unwrap_or(TRANSPARENT),
            halo_width: props.number("text-halo-width", 0.0),
            anchor: props
                .keyword("text-anchor")
                .and_then(|a| Anchor::from_name(&a))
                .unwrap_or_default(),
            offset: [
                offset.first().copied().unwrap_or(0.0) * size,
                offset.get(1).copied().unwrap_or(0.0) * size,
            ],
            placement,
            max_width: props.number("text-max-width", 10.0) * size,
            letter_spacing: props.number("text-letter-spacing", 0.0) * size,
            text,
        });
    }

    paints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::sprite::{SpriteEntry, SpriteImage};
    use serde_json::json;

    fn layer(v: Value) -> StyleLayer {
        serde_json::from_value(v).unwrap()
    }

    fn atlas() -> SpriteAtlas {
        let mut atlas = SpriteAtlas::empty();
        atlas.pixel_ratio = 2.0;
        atlas.image = Some(SpriteImage {
            width: 64,
            height: 64,
            data: vec![0; 64 * 64 * 4],
        });
        atlas.entries.insert(
            "park_11".to_string(),
            SpriteEntry {
                x: 0,
                y: 0,
                width: 32,
                height: 32,
                pixel_ratio: 2.0,
                sdf: false,
                content: None,
                stretch_x: None,
                stretch_y: None,
            },
        );
        atlas
    }

    #[test]
    fn test_fill_paint() {
        let l = layer(json!({
            "id": "water", "type": "fill", "source": "s",
            "paint": {"fill-color": "#ff0000", "fill-opacity": 0.5}
        }));
        let props = Map::new();
        let ctx = EvalContext::new(&props, 10.0);
        let paints = layer_paints(&l, &ctx, &SpriteAtlas::empty());
        match &paints[0] {
            Paint::Fill { color, outline_color, pattern } => {
                assert!((color[0] - 1.0).abs() < 0.01);
                assert!((color[3] - 0.5).abs() < 0.01);
                assert!(outline_color.is_none());
                assert!(pattern.is_none());
            }
            other => panic!("unexpected paint {:?}", other),
        }
    }

    #[test]
    fn test_line_paint_with_zoom_stops() {
        let l = layer(json!({
            "id": "road", "type": "line", "source": "s",
            "layout": {"line-cap": "round"},
            "paint": {
                "line-color": "#00ff00",
                "line-width": {"stops": [[10, 1], [20, 11]]},
                "line-dasharray": [2, 1]
            }
        }));
        let props = Map::new();
        let ctx = EvalContext::new(&props, 15.0);
        match &layer_paints(&l, &ctx, &SpriteAtlas::empty())[0] {
            Paint::Line { color, width, dash, cap, .. } => {
                assert!((color[1] - 1.0).abs() < 0.01);
                assert!((width - 6.0).abs() < 1e-5);
                assert_eq!(dash.as_deref(), Some(&[12.0, 6.0][..]));
                assert_eq!(*cap, LineCap::Round);
            }
            other => panic!("unexpected paint {:?}", other),
        }
    }

    #[test]
    fn test_symbol_icon_and_text() {
        let l = layer(json!({
            "id": "poi", "type": "symbol", "source": "s",
            "layout": {
                "icon-image": "{class}_11",
                "text-field": "{name}",
                "text-font": ["Roboto Condensed Italic"],
                "text-size": 12,
                "text-offset": [0, 1],
                "text-transform": "uppercase"
            }
        }));
        let mut props = Map::new();
        props.insert("class".into(), json!("park"));
        props.insert("name".into(), json!("Central"));
        let ctx = EvalContext::new(&props, 14.0);
        let paints = layer_paints(&l, &ctx, &atlas());
        assert_eq!(paints.len(), 2);
        match &paints[0] {
            Paint::Icon { icon, scale, .. } => {
                assert_eq!(icon.name, "park_11");
                assert!((scale - 0.5).abs() < 1e-6);
                assert_eq!(icon.uv, Some([0.0, 0.0, 0.5, 0.5]));
            }
            other => panic!("unexpected paint {:?}", other),
        }
        match &paints[1] {
            Paint::Text { text, font_css, offset, .. } => {
                assert_eq!(text, "CENTRAL");
                assert_eq!(font_css, "italic 400 12px \"Roboto Condensed\"");
                assert_eq!(*offset, [0.0, 12.0]);
            }
            other => panic!("unexpected paint {:?}", other),
        }
    }

    #[test]
    fn test_unresolved_icon_is_dropped() {
        let l = layer(json!({
            "id": "poi", "type": "symbol", "source": "s",
            "layout": {"icon-image": "{class}_11"}
        }));
        let mut props = Map::new();
        props.insert("class".into(), json!("zoo"));
        let ctx = EvalContext::new(&props, 14.0);
        assert!(layer_paints(&l, &ctx, &atlas()).is_empty());
        assert!(layer_paints(&l, &ctx, &SpriteAtlas::empty()).is_empty());
    }

    #[test]
    fn test_fill_template() {
        let mut props = Map::new();
        props.insert("name".into(), json!("Oslo"));
        props.insert("rank".into(), json!(3));
        assert_eq!(fill_template("{name} ({rank})", &props), "Oslo (3)");
        assert_eq!(fill_template("{missing}x", &props), "x");
        assert_eq!(fill_template("open {brace", &props), "open {brace");
    }

    #[test]
    fn test_font_css() {
        let stack = vec!["Open Sans Bold".to_string()];
        assert_eq!(font_css(&stack, 14.0), "normal 700 14px \"Open Sans\"");
        assert_eq!(font_css(&[], 16.0), "normal 400 16px \"Open Sans\"");
    }

    #[test]
    fn test_background_defaults() {
        let l = layer(json!({"id": "bg", "type": "background"}));
        let props = Map::new();
        let ctx = EvalContext::new(&props, 0.0);
        assert_eq!(
            layer_paints(&l, &ctx, &SpriteAtlas::empty()),
            vec![Paint::Background { color: BLACK }]
        );
    }
}
