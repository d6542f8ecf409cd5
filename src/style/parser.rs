//! Mapbox GL style loader and validator.
//!
//! Parses a style given as JSON text or an already structured document and
//! checks it against the layer it will be installed on. Validation is pure:
//! nothing is fetched and the layer is not touched.

use serde_json::Value;

use crate::error::{StyleError, StyleResult};
use crate::layer::StyleTarget;
use crate::style::types::{PropertyValue, SourceSpec, StyleLayer, StyleSpec, SUPPORTED_VERSION};

/// The forms a caller may hand a style in.
#[derive(Debug, Clone)]
pub enum StyleInput {
    /// Serialized JSON document.
    Json(String),
    /// Parsed but untyped document.
    Value(Value),
    /// Typed document.
    Spec(StyleSpec),
}

impl From<&str> for StyleInput {
    fn from(json: &str) -> Self {
        StyleInput::Json(json.to_string())
    }
}

impl From<String> for StyleInput {
    fn from(json: String) -> Self {
        StyleInput::Json(json)
    }
}

impl From<Value> for StyleInput {
    fn from(value: Value) -> Self {
        StyleInput::Value(value)
    }
}

impl From<StyleSpec> for StyleInput {
    fn from(spec: StyleSpec) -> Self {
        StyleInput::Spec(spec)
    }
}

/// A style checked against its target layer.
#[derive(Debug, Clone)]
pub struct ValidatedStyle {
    pub spec: StyleSpec,
    pub source_name: String,
    /// The style's definition of `source_name`.
    pub source: SourceSpec,
}

/// Parse a style from JSON text.
pub fn parse_style_str(json: &str) -> StyleResult<StyleSpec> {
    let value: Value = serde_json::from_str(json)?;
    parse_style_value(value)
}

/// Parse a style from an untyped document.
///
/// The version is checked before the typed decode so that a document from
/// another schema version reports its version rather than a shape error.
pub fn parse_style_value(value: Value) -> StyleResult<StyleSpec> {
    check_version(value.get("version").unwrap_or(&Value::Null))?;
    Ok(serde_json::from_value(value)?)
}

/// Parse any accepted input form.
pub fn load_style(input: StyleInput) -> StyleResult<StyleSpec> {
    match input {
        StyleInput::Json(json) => parse_style_str(&json),
        StyleInput::Value(value) => parse_style_value(value),
        StyleInput::Spec(spec) => {
            check_version(&Value::from(spec.version))?;
            Ok(spec)
        }
    }
}

/// Numeric comparison, so `8.0` is accepted like `8`.
fn check_version(found: &Value) -> StyleResult<()> {
    if found.as_f64() == Some(SUPPORTED_VERSION as f64) {
        Ok(())
    } else {
        Err(StyleError::UnsupportedVersion {
            expected: SUPPORTED_VERSION,
            found: found.clone(),
        })
    }
}

/// Load `input` and check it can style `target` from `source_name`.
///
/// Checks run in order: document, version, layer kind, source.
pub fn validate_style(
    input: StyleInput,
    target: &dyn StyleTarget,
    source_name: &str,
) -> StyleResult<ValidatedStyle> {
    let spec = load_style(input)?;

    let kind = target.kind();
    if !kind.hosts_style_function() {
        return Err(StyleError::layer_type(format!(
            "{} cannot host a per-feature style function",
            kind
        )));
    }

    let source_kind = target
        .source_kind()
        .unwrap_or_else(|| kind.default_source());
    let expected = source_kind
        .accepted_style_sources()
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(" or ");

    let source = spec
        .sources
        .get(source_name)
        .cloned()
        .ok_or_else(|| StyleError::source_mismatch(source_name, &expected, "no such source"))?;
    if !source_kind.accepts(&source.source_type) {
        return Err(StyleError::source_mismatch(
            source_name,
            &expected,
            source.source_type,
        ));
    }

    Ok(ValidatedStyle {
        spec,
        source_name: source_name.to_string(),
        source,
    })
}

impl StyleLayer {
    /// Check if layer is visible (default true if not specified).
    pub fn is_visible(&self) -> bool {
        match self.layout.get("visibility") {
            Some(PropertyValue::Literal(Value::String(v))) => v != "none",
            _ => true,
        }
    }

    /// Check if `zoom` lies in `[minzoom, maxzoom)`.
    pub fn in_zoom_range(&self, zoom: f64) -> bool {
        let min_ok = self.minzoom.map(|z| zoom >= z).unwrap_or(true);
        let max_ok = self.maxzoom.map(|z| zoom < z).unwrap_or(true);
        min_ok && max_ok
    }
}
