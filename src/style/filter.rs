//! Layer filters in both legacy (`["==", "class", "road"]`) and expression
//! (`["==", ["get", "class"], "road"]`) syntax.

use std::cmp::Ordering;

use serde_json::Value;

use crate::feature::Feature;
use crate::style::expressions::{compare_values, evaluate_expression, values_equal, EvalContext};

/// A layer filter, classified once at compile time.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// No filter: every feature matches.
    Always,
    Legacy(Value),
    Expression(Value),
}

impl FilterExpr {
    pub fn new(filter: Option<&Value>) -> Self {
        match filter {
            None | Some(Value::Null) => FilterExpr::Always,
            Some(f) if is_expression_filter(f) => FilterExpr::Expression(f.clone()),
            Some(f) => FilterExpr::Legacy(f.clone()),
        }
    }

    /// Evaluate filter against a feature at a zoom level.
    pub fn matches(&self, feature: &Feature, zoom: f64) -> bool {
        match self {
            FilterExpr::Always => true,
            FilterExpr::Legacy(filter) => evaluate_legacy(filter, feature),
            FilterExpr::Expression(expr) => {
                let ctx = EvalContext::for_feature(feature, zoom);
                evaluate_expression(expr, &ctx)
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false)
            }
        }
    }
}

/// Whether a filter uses expression syntax.
///
/// Legacy filters name properties with bare strings, so the shape of the
/// operands decides.
pub fn is_expression_filter(filter: &Value) -> bool {
    let arr = match filter {
        Value::Bool(_) => return true,
        Value::Array(arr) if !arr.is_empty() => arr,
        _ => return false,
    };
    let op = match arr[0].as_str() {
        Some(op) => op,
        None => return false,
    };
    match op {
        "has" => arr.len() >= 2 && arr[1] != "$id" && arr[1] != "$type",
        "in" => arr.len() >= 3 && (!arr[1].is_string() || arr[2].is_array()),
        "!in" | "!has" | "none" => false,
        "==" | "!=" | ">" | ">=" | "<" | "<=" => {
            arr.len() != 3 || arr[1].is_array() || arr[2].is_array()
        }
        "any" | "all" => arr[1..]
            .iter()
            .all(|f| f.is_boolean() || is_expression_filter(f)),
        _ => true,
    }
}

fn lookup(feature: &Feature, key: &str) -> Option<Value> {
    match key {
        "$type" => feature.geometry_type.style_name().map(Value::from),
        "$id" => feature.id.clone(),
        _ => feature.properties.get(key).cloned(),
    }
}

fn evaluate_legacy(filter: &Value, feature: &Feature) -> bool {
    let arr = match filter {
        Value::Bool(b) => return *b,
        Value::Array(arr) if !arr.is_empty() => arr,
        _ => return true,
    };

    let op = match arr[0].as_str() {
        Some(s) => s,
        None => return true,
    };
    let key = arr.get(1).and_then(Value::as_str).unwrap_or("");

    match op {
        "==" | "!=" => {
            if arr.len() != 3 {
                return true;
            }
            let equal = lookup(feature, key)
                .map(|v| values_equal(&v, &arr[2]))
                .unwrap_or(false);
            equal == (op == "==")
        }
        "<" | "<=" | ">" | ">=" => {
            if arr.len() != 3 {
                return true;
            }
            let ordering = lookup(feature, key).and_then(|v| compare_values(&v, &arr[2]));
            match ordering {
                Some(o) => match op {
                    "<" => o == Ordering::Less,
                    "<=" => o != Ordering::Greater,
                    ">" => o == Ordering::Greater,
                    _ => o != Ordering::Less,
                },
                None => false,
            }
        }
        "in" | "!in" => {
            if arr.len() < 2 {
                return true;
            }
            let found = lookup(feature, key)
                .map(|v| arr[2..].iter().any(|candidate| values_equal(&v, candidate)))
                .unwrap_or(false);
            found == (op == "in")
        }
        "has" => lookup(feature, key).is_some(),
        "!has" => lookup(feature, key).is_none(),
        "all" => arr[1..].iter().all(|sub| evaluate_legacy(sub, feature)),
        "any" => arr[1..].iter().any(|sub| evaluate_legacy(sub, feature)),
        "none" => !arr[1..].iter().any(|sub| evaluate_legacy(sub, feature)),
        _ => true, // Unknown operators pass through
    }
}
