//! Legacy style functions (`{"stops": [...]}`).
//!
//! Three input shapes are supported:
//! - zoom functions: stop inputs are zoom levels
//! - property functions: `property` is set, stop inputs are property values
//! - zoom-and-property functions: stop inputs are `{"zoom": z, "value": v}`
//!
//! Interpolation between stops uses the declared `base`
//! (1 = linear, otherwise exponential). Inputs outside the stop range clamp to
//! the first/last stop; an input exactly on a stop yields that stop's output.

use serde_json::{Map, Value};

use crate::style::expressions::{
    compare_values, interpolate_values, interpolation_factor, is_interpolatable, values_equal,
    EvalContext,
};

/// How a function maps its input onto stop outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionType {
    Exponential,
    Interval,
    Categorical,
    Identity,
}

impl FunctionType {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "exponential" => Some(Self::Exponential),
            "interval" => Some(Self::Interval),
            "categorical" => Some(Self::Categorical),
            "identity" => Some(Self::Identity),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Exponential => "exponential",
            Self::Interval => "interval",
            Self::Categorical => "categorical",
            Self::Identity => "identity",
        }
    }
}

/// A parsed legacy function.
#[derive(Debug, Clone, PartialEq)]
pub struct StopFunction {
    /// Declared type; `None` means inferred from the stops.
    pub function_type: Option<FunctionType>,
    pub base: f64,
    /// Feature property used as input; zoom when absent.
    pub property: Option<String>,
    pub stops: Vec<(Value, Value)>,
    pub default: Option<Value>,
}

impl StopFunction {
    /// Parse a function object, or `None` if `value` is not one.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let function_type = match obj.get("type") {
            Some(t) => Some(FunctionType::from_name(t.as_str()?)?),
            None => None,
        };
        let property = obj
            .get("property")
            .and_then(Value::as_str)
            .map(str::to_string);

        let stops = match obj.get("stops") {
            Some(stops) => stops
                .as_array()?
                .iter()
                .map(|stop| match stop.as_array()?.as_slice() {
                    [input, output] => Some((input.clone(), output.clone())),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()?,
            // Identity functions need no stops; anything else does.
            None if function_type == Some(FunctionType::Identity) && property.is_some() => {
                Vec::new()
            }
            None => return None,
        };

        Some(Self {
            function_type,
            base: obj.get("base").and_then(Value::as_f64).unwrap_or(1.0),
            property,
            stops,
            default: obj.get("default").cloned(),
        })
    }

    /// Serialize back to the style JSON form.
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        if let Some(t) = self.function_type {
            obj.insert("type".into(), Value::from(t.name()));
        }
        if (self.base - 1.0).abs() > f64::EPSILON {
            obj.insert("base".into(), Value::from(self.base));
        }
        if let Some(property) = &self.property {
            obj.insert("property".into(), Value::from(property.as_str()));
        }
        if !self.stops.is_empty() {
            let stops = self
                .stops
                .iter()
                .map(|(i, o)| Value::Array(vec![i.clone(), o.clone()]))
                .collect();
            obj.insert("stops".into(), Value::Array(stops));
        }
        if let Some(default) = &self.default {
            obj.insert("default".into(), default.clone());
        }
        Value::Object(obj)
    }

    fn is_composite(&self) -> bool {
        self.property.is_some() && self.stops.iter().any(|(input, _)| input.is_object())
    }

    fn resolved_type(&self) -> FunctionType {
        if let Some(t) = self.function_type {
            return t;
        }
        let categorical_input = self
            .stops
            .iter()
            .any(|(input, _)| input.is_string() || input.is_boolean());
        if categorical_input {
            FunctionType::Categorical
        } else if self.stops.iter().all(|(_, output)| is_interpolatable(output)) {
            FunctionType::Exponential
        } else {
            FunctionType::Interval
        }
    }

    /// Evaluate for one feature at one zoom level.
    pub fn evaluate(&self, ctx: &EvalContext) -> Option<Value> {
        if self.is_composite() {
            return self.evaluate_composite(ctx);
        }
        let input = match &self.property {
            Some(property) => ctx.properties.get(property).cloned(),
            None => serde_json::Number::from_f64(ctx.zoom).map(Value::Number),
        };
        let result = match input {
            Some(input) if !input.is_null() => self.evaluate_stops(&self.stops, &input),
            _ => None,
        };
        result.or_else(|| self.default.clone())
    }

    fn evaluate_stops(&self, stops: &[(Value, Value)], input: &Value) -> Option<Value> {
        match self.resolved_type() {
            FunctionType::Identity => Some(input.clone()),
            FunctionType::Categorical => stops
                .iter()
                .find(|(stop, _)| values_equal(stop, input))
                .map(|(_, output)| output.clone()),
            FunctionType::Interval => interval(stops, input),
            FunctionType::Exponential => exponential(stops, input.as_f64()?, self.base),
        }
    }

    /// Zoom-and-property: evaluate the property dimension at each stop zoom,
    /// then interpolate those results across zoom.
    fn evaluate_composite(&self, ctx: &EvalContext) -> Option<Value> {
        let input = ctx
            .properties
            .get(self.property.as_deref()?)
            .filter(|v| !v.is_null());
        let input = match input {
            Some(input) => input,
            None => return self.default.clone(),
        };

        let mut zoom_levels: Vec<f64> = Vec::new();
        for (stop, _) in &self.stops {
            let zoom = stop.get("zoom")?.as_f64()?;
            if !zoom_levels.iter().any(|z| (*z - zoom).abs() < f64::EPSILON) {
                zoom_levels.push(zoom);
            }
        }
        zoom_levels.sort_by(|a, b| a.total_cmp(b));

        let mut per_zoom = Vec::with_capacity(zoom_levels.len());
        for zoom in zoom_levels {
            let inner: Vec<(Value, Value)> = self
                .stops
                .iter()
                .filter(|(stop, _)| {
                    stop.get("zoom").and_then(Value::as_f64) == Some(zoom)
                })
                .filter_map(|(stop, output)| Some((stop.get("value")?.clone(), output.clone())))
                .collect();
            if let Some(output) = self.evaluate_stops(&inner, input) {
                per_zoom.push((Value::from(zoom), output));
            }
        }

        let zoom_dimension = match self.resolved_type() {
            FunctionType::Exponential => exponential(&per_zoom, ctx.zoom, self.base),
            _ => interval(&per_zoom, &Value::from(ctx.zoom)),
        };
        zoom_dimension.or_else(|| self.default.clone())
    }
}

fn exponential(stops: &[(Value, Value)], input: f64, base: f64) -> Option<Value> {
    let first = stops.first()?;
    let last = stops.last()?;
    if input <= first.0.as_f64()? {
        return Some(first.1.clone());
    }
    if input >= last.0.as_f64()? {
        return Some(last.1.clone());
    }

    let upper = stops
        .iter()
        .position(|(stop, _)| stop.as_f64().map(|s| s > input).unwrap_or(false))?;
    let (lower_in, lower_out) = &stops[upper - 1];
    let (upper_in, upper_out) = &stops[upper];
    if !is_interpolatable(lower_out) || !is_interpolatable(upper_out) {
        return Some(lower_out.clone());
    }
    let t = interpolation_factor(input, base, lower_in.as_f64()?, upper_in.as_f64()?);
    interpolate_values(lower_out, upper_out, t)
}

fn interval(stops: &[(Value, Value)], input: &Value) -> Option<Value> {
    let first = stops.first()?;
    let mut result = &first.1;
    for (stop, output) in stops {
        match compare_values(input, stop) {
            Some(std::cmp::Ordering::Less) => break,
            Some(_) => result = output,
            None => return None,
        }
    }
    Some(result.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn zoom_ctx(props: &Map<String, Value>, zoom: f64) -> EvalContext<'_> {
        EvalContext::new(props, zoom)
    }

    fn eval(function: &Value, props: &Map<String, Value>, zoom: f64) -> Option<Value> {
        StopFunction::from_value(function)
            .unwrap()
            .evaluate(&zoom_ctx(props, zoom))
    }

    #[test]
    fn test_linear_zoom_function() {
        let f = json!({"stops": [[10, 1], [20, 11]]});
        let props = Map::new();
        assert_eq!(eval(&f, &props, 15.0).and_then(|v| v.as_f64()), Some(6.0));
        // Clamped outside the stop range
        assert_eq!(eval(&f, &props, 2.0).and_then(|v| v.as_f64()), Some(1.0));
        assert_eq!(eval(&f, &props, 22.0).and_then(|v| v.as_f64()), Some(11.0));
        // Exactly on a stop
        assert_eq!(eval(&f, &props, 20.0).and_then(|v| v.as_f64()), Some(11.0));
        assert_eq!(eval(&f, &props, 10.0).and_then(|v| v.as_f64()), Some(1.0));
    }

    #[test]
    fn test_exponential_zoom_function() {
        let f = json!({"base": 2, "stops": [[0, 0], [2, 3]]});
        let props = Map::new();
        let v = eval(&f, &props, 1.0).and_then(|v| v.as_f64()).unwrap();
        assert!((v - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_interval_function() {
        let f = json!({"type": "interval", "stops": [[5, "a"], [10, "b"]]});
        let props = Map::new();
        assert_eq!(eval(&f, &props, 3.0), Some(json!("a")));
        assert_eq!(eval(&f, &props, 7.0), Some(json!("a")));
        assert_eq!(eval(&f, &props, 10.0), Some(json!("b")));
    }

    #[test]
    fn test_non_numeric_outputs_default_to_interval() {
        let f = json!({"stops": [[5, "round"], [10, "butt"]]});
        let props = Map::new();
        assert_eq!(eval(&f, &props, 9.0), Some(json!("round")));
        assert_eq!(eval(&f, &props, 11.0), Some(json!("butt")));
    }

    #[test]
    fn test_categorical_property_function() {
        let f = json!({
            "property": "class",
            "type": "categorical",
            "stops": [["park", "#00ff00"], ["water", "#0000ff"]],
            "default": "#cccccc"
        });
        let mut props = Map::new();
        props.insert("class".into(), json!("water"));
        assert_eq!(eval(&f, &props, 5.0), Some(json!("#0000ff")));
        props.insert("class".into(), json!("rock"));
        assert_eq!(eval(&f, &props, 5.0), Some(json!("#cccccc")));
        props.remove("class");
        assert_eq!(eval(&f, &props, 5.0), Some(json!("#cccccc")));
    }

    #[test]
    fn test_identity_function() {
        let f = json!({"property": "width", "type": "identity"});
        let mut props = Map::new();
        props.insert("width".into(), json!(3));
        assert_eq!(eval(&f, &props, 5.0), Some(json!(3)));
    }

    #[test]
    fn test_color_stops_interpolate() {
        let f = json!({"stops": [[0, "#000000"], [10, "#ffffff"]]});
        let props = Map::new();
        let v = eval(&f, &props, 5.0).unwrap();
        let rgba = crate::style::types::color_from_value(&v).unwrap();
        assert!((rgba[1] - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_composite_function() {
        let f = json!({
            "property": "rank",
            "stops": [
                [{"zoom": 0, "value": 0}, 0],
                [{"zoom": 0, "value": 10}, 10],
                [{"zoom": 10, "value": 0}, 100],
                [{"zoom": 10, "value": 10}, 200]
            ]
        });
        let mut props = Map::new();
        props.insert("rank".into(), json!(5));
        // z0 -> 5, z10 -> 150, halfway -> 77.5
        let v = eval(&f, &props, 5.0).and_then(|v| v.as_f64()).unwrap();
        assert!((v - 77.5).abs() < 1e-9);
    }

    #[test]
    fn test_not_a_function() {
        assert!(StopFunction::from_value(&json!({"color": "red"})).is_none());
        assert!(StopFunction::from_value(&json!([1, 2])).is_none());
        assert!(StopFunction::from_value(&json!({"stops": [[1]]})).is_none());
    }

    #[test]
    fn test_round_trip_object_form() {
        let src = json!({"base": 1.5, "stops": [[4, 1], [12, 3]]});
        let f = StopFunction::from_value(&src).unwrap();
        assert_eq!(f.to_value(), src);
    }
}
