//! Mapbox Style Spec expression evaluation.
//!
//! Implements evaluation of data-driven expressions including:
//! - `interpolate`: Linear/exponential interpolation between stops
//! - `step`: Stepped/discrete values at breakpoints
//! - `match`: Pattern matching on property values
//! - `get`, `has`, `in`, `id`: Feature lookup
//! - `coalesce`: First non-null value
//! - Math operators: `+`, `-`, `*`, `/`, `%`, `^`
//! - Comparison: `==`, `!=`, `<`, `<=`, `>`, `>=`
//! - Logic: `all`, `any`, `!`, `case`
//! - String and color: `concat`, `format`, `upcase`, `rgb`, `to-color`, ...
//!
//! Evaluation never fails loudly: a malformed or type-mismatched expression
//! yields `None` and the caller falls back to the property default.

use serde_json::{Number, Value};

use crate::feature::Feature;
use crate::style::types::{color_to_value, parse_color_string};

/// Operators recognised as the head of an expression array.
const OPERATORS: &[&str] = &[
    "get", "has", "at", "length", "in", "id", "properties", "interpolate",
    "interpolate-hcl", "interpolate-lab", "step", "match", "case", "coalesce",
    "==", "!=", "<", "<=", ">", ">=", "all", "any", "!", "+", "-", "*", "/",
    "%", "^", "abs", "ceil", "floor", "round", "min", "max", "ln", "log10",
    "log2", "sin", "cos", "tan", "sqrt", "concat", "downcase", "upcase",
    "format", "image", "to-number", "to-string", "to-boolean", "to-color",
    "typeof", "number", "string", "boolean", "rgb", "rgba", "zoom",
    "geometry-type", "literal",
];

/// Expression evaluation context containing feature data and zoom level.
#[derive(Debug, Clone)]
pub struct EvalContext<'a> {
    /// Feature properties map.
    pub properties: &'a serde_json::Map<String, Value>,
    /// Current zoom level.
    pub zoom: f64,
    /// Geometry type (optional).
    pub geometry_type: Option<&'a str>,
    /// Feature id (optional).
    pub feature_id: Option<&'a Value>,
}

impl<'a> EvalContext<'a> {
    pub fn new(properties: &'a serde_json::Map<String, Value>, zoom: f64) -> Self {
        Self {
            properties,
            zoom,
            geometry_type: None,
            feature_id: None,
        }
    }

    /// Context for evaluating style properties of `feature`.
    pub fn for_feature(feature: &'a Feature, zoom: f64) -> Self {
        Self {
            properties: &feature.properties,
            zoom,
            geometry_type: feature.geometry_type.style_name(),
            feature_id: feature.id.as_ref(),
        }
    }

    pub fn with_geometry_type(mut self, geom_type: &'a str) -> Self {
        self.geometry_type = Some(geom_type);
        self
    }
}

/// Whether `value` is an expression rather than a literal.
///
/// Literal arrays (font stacks, dash arrays, offsets) never start with an
/// operator name, which is what tells them apart.
pub fn is_expression(value: &Value) -> bool {
    value
        .as_array()
        .and_then(|arr| arr.first())
        .and_then(Value::as_str)
        .map(|op| OPERATORS.contains(&op))
        .unwrap_or(false)
}

/// Evaluate an expression and return a typed result.
pub fn evaluate_expression(expr: &Value, ctx: &EvalContext) -> Option<Value> {
    match expr {
        Value::Null => Some(Value::Null),
        Value::Bool(b) => Some(Value::Bool(*b)),
        Value::Number(n) => Some(Value::Number(n.clone())),
        Value::String(s) => Some(Value::String(s.clone())),
        Value::Array(arr) => evaluate_array_expression(arr, ctx),
        Value::Object(_) => Some(expr.clone()), // Objects pass through
    }
}

/// Evaluate an array-based expression.
fn evaluate_array_expression(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    if arr.is_empty() {
        return None;
    }

    let op = arr[0].as_str()?;

    match op {
        // Feature access
        "get" => eval_get(arr, ctx),
        "has" => eval_has(arr, ctx),
        "at" => eval_at(arr, ctx),
        "length" => eval_length(arr, ctx),
        "in" => eval_in(arr, ctx),
        "id" => Some(ctx.feature_id.cloned().unwrap_or(Value::Null)),
        "properties" => Some(Value::Object(ctx.properties.clone())),

        // Interpolation
        "interpolate" | "interpolate-hcl" | "interpolate-lab" => eval_interpolate(arr, ctx),
        "step" => eval_step(arr, ctx),

        // Pattern matching
        "match" => eval_match(arr, ctx),
        "case" => eval_case(arr, ctx),
        "coalesce" => eval_coalesce(arr, ctx),

        // Comparison
        "==" => eval_eq(arr, ctx),
        "!=" => eval_neq(arr, ctx),
        "<" => eval_compare(arr, ctx, |a, b| a < b),
        "<=" => eval_compare(arr, ctx, |a, b| a <= b),
        ">" => eval_compare(arr, ctx, |a, b| a > b),
        ">=" => eval_compare(arr, ctx, |a, b| a >= b),

        // Logic
        "all" => eval_all(arr, ctx),
        "any" => eval_any(arr, ctx),
        "!" => eval_not(arr, ctx),

        // Math
        "+" => eval_add(arr, ctx),
        "-" => eval_sub(arr, ctx),
        "*" => eval_mul(arr, ctx),
        "/" => eval_binary(arr, ctx, |a, b| if b == 0.0 { None } else { Some(a / b) }),
        "%" => eval_binary(arr, ctx, |a, b| if b == 0.0 { None } else { Some(a % b) }),
        "^" => eval_binary(arr, ctx, |a, b| Some(a.powf(b))),
        "abs" => eval_unary(arr, ctx, f64::abs),
        "ceil" => eval_unary(arr, ctx, f64::ceil),
        "floor" => eval_unary(arr, ctx, f64::floor),
        "round" => eval_unary(arr, ctx, f64::round),
        "ln" => eval_unary(arr, ctx, f64::ln),
        "log10" => eval_unary(arr, ctx, f64::log10),
        "log2" => eval_unary(arr, ctx, f64::log2),
        "sin" => eval_unary(arr, ctx, f64::sin),
        "cos" => eval_unary(arr, ctx, f64::cos),
        "tan" => eval_unary(arr, ctx, f64::tan),
        "sqrt" => eval_unary(arr, ctx, f64::sqrt),
        "min" => eval_fold(arr, ctx, f64::INFINITY, f64::min),
        "max" => eval_fold(arr, ctx, f64::NEG_INFINITY, f64::max),

        // String
        "concat" => eval_concat(&arr[1..], ctx),
        "format" => eval_format(arr, ctx),
        "downcase" => eval_downcase(arr, ctx),
        "upcase" => eval_upcase(arr, ctx),
        "image" => evaluate_expression(arr.get(1)?, ctx),

        // Type
        "to-number" => eval_to_number(arr, ctx),
        "to-string" => eval_to_string(arr, ctx),
        "to-boolean" => eval_to_boolean(arr, ctx),
        "to-color" => eval_to_color(arr, ctx),
        "typeof" => eval_typeof(arr, ctx),
        "number" => eval_assert(arr, ctx, Value::is_number),
        "string" => eval_assert(arr, ctx, Value::is_string),
        "boolean" => eval_assert(arr, ctx, Value::is_boolean),

        // Color
        "rgb" => eval_rgba(arr, ctx, false),
        "rgba" => eval_rgba(arr, ctx, true),

        // Special
        "zoom" => number(ctx.zoom),
        "geometry-type" => ctx.geometry_type.map(|s| Value::String(s.to_string())),
        "literal" => arr.get(1).cloned(),

        _ => None, // Unknown operator
    }
}

/// Whole results stay integers so string conversions print `6`, not `6.0`.
fn number(v: f64) -> Option<Value> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0; // 2^53
    if v.fract() == 0.0 && v.abs() <= MAX_EXACT {
        return Some(Value::Number(if v >= 0.0 {
            Number::from(v as u64)
        } else {
            Number::from(v as i64)
        }));
    }
    Number::from_f64(v).map(Value::Number)
}

// Property access
fn eval_get(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    let key = evaluate_expression(arr.get(1)?, ctx)?;
    let key = key.as_str()?;
    let found = match arr.get(2) {
        Some(object) => evaluate_expression(object, ctx)?.get(key).cloned(),
        None => ctx.properties.get(key).cloned(),
    };
    // A missing property is null, not an evaluation failure.
    Some(found.unwrap_or(Value::Null))
}

fn eval_has(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    let key = evaluate_expression(arr.get(1)?, ctx)?;
    let key = key.as_str()?;
    let present = match arr.get(2) {
        Some(object) => evaluate_expression(object, ctx)?.get(key).is_some(),
        None => ctx.properties.contains_key(key),
    };
    Some(Value::Bool(present))
}

fn eval_at(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    let index = evaluate_expression(arr.get(1)?, ctx)?.as_f64()?;
    if index < 0.0 || index.fract() != 0.0 {
        return None;
    }
    let index = index as usize;
    let array = evaluate_expression(arr.get(2)?, ctx)?;
    array.as_array()?.get(index).cloned()
}

fn eval_length(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    let val = evaluate_expression(arr.get(1)?, ctx)?;
    let len = match &val {
        Value::String(s) => s.chars().count(),
        Value::Array(a) => a.len(),
        _ => return None,
    };
    Some(Value::Number(Number::from(len as u64)))
}

fn eval_in(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    let needle = evaluate_expression(arr.get(1)?, ctx)?;
    let haystack = evaluate_expression(arr.get(2)?, ctx)?;
    let found = match (&needle, &haystack) {
        (Value::String(n), Value::String(h)) => h.contains(n.as_str()),
        (_, Value::Array(items)) => items.iter().any(|item| values_equal(&needle, item)),
        _ => return None,
    };
    Some(Value::Bool(found))
}

/// Interpolation progress between `lower` and `upper` for `input`.
///
/// `base == 1` is linear; any other base is exponential, matching the style
/// spec: `(base^(input - lower) - 1) / (base^(upper - lower) - 1)`.
pub(crate) fn interpolation_factor(input: f64, base: f64, lower: f64, upper: f64) -> f64 {
    let difference = upper - lower;
    if difference == 0.0 {
        return 0.0;
    }
    let progress = input - lower;
    if (base - 1.0).abs() < f64::EPSILON {
        progress / difference
    } else {
        (base.powf(progress) - 1.0) / (base.powf(difference) - 1.0)
    }
}

// Interpolation
fn eval_interpolate(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    // ["interpolate", ["linear"] | ["exponential", base], input, stop1, val1, stop2, val2, ...]
    if arr.len() < 5 {
        return None;
    }

    let input = evaluate_expression(arr.get(2)?, ctx)?.as_f64()?;

    let base = match arr.get(1)?.as_array() {
        Some(interp) => match interp.first()?.as_str()? {
            "exponential" => interp.get(1).and_then(Value::as_f64).unwrap_or(1.0),
            // cubic-bezier falls back to linear
            _ => 1.0,
        },
        None => 1.0,
    };

    let stops: Vec<(f64, &Value)> = arr[3..]
        .chunks(2)
        .filter_map(|chunk| match chunk {
            [stop, output] => Some((stop.as_f64()?, output)),
            _ => None,
        })
        .collect();

    let (first, last) = (stops.first()?, stops.last()?);
    if input <= first.0 {
        return evaluate_expression(first.1, ctx);
    }
    if input >= last.0 {
        return evaluate_expression(last.1, ctx);
    }

    let upper = stops.iter().position(|(stop, _)| *stop > input)?;
    let (stop_low, out_low) = stops[upper - 1];
    let (stop_high, out_high) = stops[upper];
    let t = interpolation_factor(input, base, stop_low, stop_high);
    let low = evaluate_expression(out_low, ctx)?;
    let high = evaluate_expression(out_high, ctx)?;
    interpolate_values(&low, &high, t)
}

/// Whether two outputs can be blended by [`interpolate_values`].
pub(crate) fn is_interpolatable(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => parse_color_string(s).is_some(),
        Value::Array(items) => items.iter().all(Value::is_number),
        _ => false,
    }
}

pub(crate) fn interpolate_values(a: &Value, b: &Value, t: f64) -> Option<Value> {
    match (a, b) {
        (Value::Number(na), Value::Number(nb)) => {
            let va = na.as_f64()?;
            let vb = nb.as_f64()?;
            number(va + (vb - va) * t)
        }
        (Value::Array(aa), Value::Array(ab)) if aa.len() == ab.len() => {
            // Interpolate arrays element-wise (e.g., colors)
            let result: Option<Vec<Value>> = aa
                .iter()
                .zip(ab.iter())
                .map(|(ea, eb)| interpolate_values(ea, eb, t))
                .collect();
            result.map(Value::Array)
        }
        _ => {
            // Try to parse as colors and interpolate
            let ca = color_array(a);
            let cb = color_array(b);
            if let (Some(ca), Some(cb)) = (ca, cb) {
                let mut mixed = [0.0f32; 4];
                for i in 0..4 {
                    mixed[i] = ca[i] + (cb[i] - ca[i]) * t as f32;
                }
                Some(color_to_value(mixed))
            } else if t < 0.5 {
                // Can't interpolate, return closest
                Some(a.clone())
            } else {
                Some(b.clone())
            }
        }
    }
}

fn color_array(value: &Value) -> Option<[f32; 4]> {
    crate::style::types::color_from_value(value)
}

fn eval_step(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    // ["step", input, default, stop1, val1, stop2, val2, ...]
    if arr.len() < 3 {
        return None;
    }

    let input = evaluate_expression(arr.get(1)?, ctx)?.as_f64()?;

    // Largest stop <= input wins; below the first stop the default applies.
    let mut result = arr.get(2)?;
    for chunk in arr[3..].chunks(2) {
        if let [stop, output] = chunk {
            if input >= stop.as_f64()? {
                result = output;
            } else {
                break;
            }
        }
    }

    evaluate_expression(result, ctx)
}

fn eval_match(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    // ["match", input, label1, output1, label2, output2, ..., default]
    if arr.len() < 4 {
        return None;
    }

    let input = evaluate_expression(arr.get(1)?, ctx)?;
    let pairs = &arr[2..arr.len() - 1];
    let default = arr.last()?;

    for chunk in pairs.chunks(2) {
        if let [label, output] = chunk {
            // Label can be a single value or array of values
            let matches = match label.as_array() {
                Some(labels) => labels.iter().any(|l| values_equal(&input, l)),
                None => values_equal(&input, label),
            };

            if matches {
                return evaluate_expression(output, ctx);
            }
        }
    }

    evaluate_expression(default, ctx)
}

fn eval_case(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    // ["case", cond1, output1, cond2, output2, ..., default]
    if arr.len() < 3 {
        return None;
    }

    let pairs = &arr[1..arr.len() - 1];
    let default = arr.last()?;

    for chunk in pairs.chunks(2) {
        if let [condition, output] = chunk {
            let condition = evaluate_expression(condition, ctx)?;
            if condition.as_bool().unwrap_or(false) {
                return evaluate_expression(output, ctx);
            }
        }
    }

    evaluate_expression(default, ctx)
}

fn eval_coalesce(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    arr[1..]
        .iter()
        .filter_map(|expr| evaluate_expression(expr, ctx))
        .find(|val| !val.is_null())
}

// Comparison operators
fn eval_eq(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    let a = evaluate_expression(arr.get(1)?, ctx)?;
    let b = evaluate_expression(arr.get(2)?, ctx)?;
    Some(Value::Bool(values_equal(&a, &b)))
}

fn eval_neq(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    let a = evaluate_expression(arr.get(1)?, ctx)?;
    let b = evaluate_expression(arr.get(2)?, ctx)?;
    Some(Value::Bool(!values_equal(&a, &b)))
}

fn eval_compare(
    arr: &[Value],
    ctx: &EvalContext,
    cmp: fn(std::cmp::Ordering, std::cmp::Ordering) -> bool,
) -> Option<Value> {
    let a = evaluate_expression(arr.get(1)?, ctx)?;
    let b = evaluate_expression(arr.get(2)?, ctx)?;
    let ordering = compare_values(&a, &b)?;
    Some(Value::Bool(cmp(ordering, std::cmp::Ordering::Equal)))
}

/// Order two numbers or two strings; mixed types do not compare.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

// Logic operators
fn eval_all(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    for expr in &arr[1..] {
        let val = evaluate_expression(expr, ctx)?;
        if !val.as_bool().unwrap_or(false) {
            return Some(Value::Bool(false));
        }
    }
    Some(Value::Bool(true))
}

fn eval_any(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    for expr in &arr[1..] {
        let val = evaluate_expression(expr, ctx)?;
        if val.as_bool().unwrap_or(false) {
            return Some(Value::Bool(true));
        }
    }
    Some(Value::Bool(false))
}

fn eval_not(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    let val = evaluate_expression(arr.get(1)?, ctx)?;
    Some(Value::Bool(!val.as_bool().unwrap_or(false)))
}

// Math operators
fn eval_add(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    let mut sum = 0.0;
    for expr in &arr[1..] {
        sum += evaluate_expression(expr, ctx)?.as_f64()?;
    }
    number(sum)
}

fn eval_sub(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    let a = evaluate_expression(arr.get(1)?, ctx)?.as_f64()?;
    if arr.len() == 2 {
        // Unary negation
        return number(-a);
    }
    let b = evaluate_expression(arr.get(2)?, ctx)?.as_f64()?;
    number(a - b)
}

fn eval_mul(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    let mut product = 1.0;
    for expr in &arr[1..] {
        product *= evaluate_expression(expr, ctx)?.as_f64()?;
    }
    number(product)
}

fn eval_binary(arr: &[Value], ctx: &EvalContext, op: fn(f64, f64) -> Option<f64>) -> Option<Value> {
    let a = evaluate_expression(arr.get(1)?, ctx)?.as_f64()?;
    let b = evaluate_expression(arr.get(2)?, ctx)?.as_f64()?;
    number(op(a, b)?)
}

fn eval_unary(arr: &[Value], ctx: &EvalContext, op: fn(f64) -> f64) -> Option<Value> {
    let a = evaluate_expression(arr.get(1)?, ctx)?.as_f64()?;
    number(op(a))
}

fn eval_fold(arr: &[Value], ctx: &EvalContext, init: f64, op: fn(f64, f64) -> f64) -> Option<Value> {
    if arr.len() < 2 {
        return None;
    }
    let mut acc = init;
    for expr in &arr[1..] {
        acc = op(acc, evaluate_expression(expr, ctx)?.as_f64()?);
    }
    number(acc)
}

// String operators
fn eval_concat(parts: &[Value], ctx: &EvalContext) -> Option<Value> {
    let mut result = String::new();
    for expr in parts {
        let val = evaluate_expression(expr, ctx)?;
        result.push_str(&value_to_string(&val));
    }
    Some(Value::String(result))
}

fn eval_format(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    // ["format", text1, {options}, text2, {options}, ...]; styling options are dropped
    let sections: Vec<Value> = arr[1..]
        .iter()
        .filter(|section| !section.is_object())
        .cloned()
        .collect();
    eval_concat(&sections, ctx)
}

fn eval_downcase(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    let s = evaluate_expression(arr.get(1)?, ctx)?.as_str()?.to_lowercase();
    Some(Value::String(s))
}

fn eval_upcase(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    let s = evaluate_expression(arr.get(1)?, ctx)?.as_str()?.to_uppercase();
    Some(Value::String(s))
}

// Type conversion
fn eval_to_number(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    // Tries each argument in turn
    for expr in &arr[1..] {
        let val = evaluate_expression(expr, ctx)?;
        let num = match &val {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Null => Some(0.0),
            _ => None,
        };
        if let Some(num) = num {
            return number(num);
        }
    }
    None
}

fn eval_to_string(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    let val = evaluate_expression(arr.get(1)?, ctx)?;
    Some(Value::String(value_to_string(&val)))
}

fn eval_to_boolean(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    let val = evaluate_expression(arr.get(1)?, ctx)?;
    let b = match &val {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|v| v != 0.0 && !v.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Null => false,
        _ => true,
    };
    Some(Value::Bool(b))
}

fn eval_to_color(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    for expr in &arr[1..] {
        let val = evaluate_expression(expr, ctx)?;
        if let Some(rgba) = color_array(&val) {
            return Some(color_to_value(rgba));
        }
    }
    None
}

fn eval_typeof(arr: &[Value], ctx: &EvalContext) -> Option<Value> {
    let val = evaluate_expression(arr.get(1)?, ctx)?;
    let type_name = match &val {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    Some(Value::String(type_name.to_string()))
}

fn eval_assert(arr: &[Value], ctx: &EvalContext, accepts: fn(&Value) -> bool) -> Option<Value> {
    arr[1..]
        .iter()
        .filter_map(|expr| evaluate_expression(expr, ctx))
        .find(|val| accepts(val))
}

// Color constructors
fn eval_rgba(arr: &[Value], ctx: &EvalContext, with_alpha: bool) -> Option<Value> {
    let r = evaluate_expression(arr.get(1)?, ctx)?.as_f64()? / 255.0;
    let g = evaluate_expression(arr.get(2)?, ctx)?.as_f64()? / 255.0;
    let b = evaluate_expression(arr.get(3)?, ctx)?.as_f64()? / 255.0;
    let a = if with_alpha {
        evaluate_expression(arr.get(4)?, ctx)?.as_f64()?
    } else {
        1.0
    };
    Some(color_to_value([r as f32, g as f32, b as f32, a as f32]))
}

// Helper functions
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y))
        }
        _ => false,
    }
}

pub(crate) fn value_to_string(val: &Value) -> String {
    match val {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => val.to_string(),
    }
}

/// Evaluate a color expression to RGBA.
pub fn evaluate_color(expr: &Value, ctx: &EvalContext) -> Option<[f32; 4]> {
    color_array(&evaluate_expression(expr, ctx)?)
}

/// Evaluate a number expression.
pub fn evaluate_number(expr: &Value, ctx: &EvalContext) -> Option<f64> {
    evaluate_expression(expr, ctx)?.as_f64()
}
