//! Apply Mapbox GL styles to vector layers.
//!
//! A style document is checked against the layer it will be installed on,
//! its sprite atlas is fetched (picking the density variant that matches the
//! output pixel ratio) and its layers are compiled into a function from a
//! feature and a view resolution to render instructions.
//!
//! ```no_run
//! use gl_style_apply::{apply_style, Feature, GeometryType, MapLayer, StyleTarget};
//!
//! let layer = MapLayer::vector_tile();
//! let style = std::fs::read_to_string("style.json").unwrap();
//! pollster::block_on(apply_style(&layer, style, "openmaptiles", Some("styles/"))).unwrap();
//!
//! let style_fn = layer.style_function().unwrap();
//! let feature = Feature::new(GeometryType::Polygon)
//!     .with_source_layer("water")
//!     .with_property("class", "lake");
//! for instruction in style_fn(&feature, 152.87) {
//!     println!("{} -> {:?}", instruction.layer_id, instruction.paint);
//! }
//! ```

pub mod error;
pub mod feature;
pub mod fetch;
pub mod layer;
pub mod style;

pub use error::{StyleError, StyleResult};
pub use feature::{Feature, GeometryType};
pub use fetch::{FetchError, FileFetcher, ResourceFetcher};
#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
pub use layer::{LayerKind, MapLayer, SourceKind, StyleTarget};
pub use style::{
    apply_style, ApplyOptions, ApplyState, CompiledStyle, Paint, RenderInstruction, StyleApplier,
    StyleFunction, StyleInput,
};
