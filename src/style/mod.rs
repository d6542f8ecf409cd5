//! Mapbox GL style engine.
//!
//! Validates GL style documents (version 8) against a target layer, loads the
//! sprite atlas they reference and compiles their layers into a per-feature
//! style function.
//!
//! Supported layer types:
//! - `background`: color (drawn under every feature)
//! - `fill`: color, opacity, outline, pattern
//! - `line`: color, width, opacity, dash, cap, join, pattern
//! - `circle`: radius, color, stroke
//! - `symbol`: icon from the sprite and text label
//!
//! Other layer types are accepted in the document and produce no
//! instructions.
//!
//! See <https://docs.mapbox.com/mapbox-gl-js/style-spec/> for full spec.

pub mod apply;
pub mod compiler;
pub mod converters;
pub mod expressions;
pub mod filter;
pub mod functions;
pub mod parser;
pub mod sprite;
pub mod types;

pub use apply::{apply_style, ApplyOptions, ApplyState, StyleApplier};
pub use compiler::{default_resolutions, zoom_for_resolution, CompiledStyle, StyleFunction};
pub use converters::{IconRef, Paint, RenderInstruction, Rgba};
pub use expressions::{evaluate_color, evaluate_expression, evaluate_number, EvalContext};
pub use filter::FilterExpr;
pub use functions::{FunctionType, StopFunction};
pub use parser::{load_style, parse_style_str, validate_style, StyleInput, ValidatedStyle};
pub use sprite::{SpriteAtlas, SpriteEntry, SpriteImage, SpriteResolver};
pub use types::{LayerType, PropertyValue, SourceSpec, SourceType, StyleLayer, StyleSpec};
