//! Macro expansion of single parameter values
//!
//! A parameter value in an experiment definition is one of:
//!
//! - a scalar number or `null` → one-element list
//! - an explicit list → used as is
//! - a range macro `{"min": a, "max": b, "step": s}` → `a, a+s, a+2s, ...`
//! - anything else (strings, booleans) → passed through unexpanded
//!
//! Range generation rounds every value to 4 decimal digits. A value is
//! included if `round(value, 4) <= max`; generation halts at the first value
//! that exceeds `max`.

use serde_json::{Map, Value};

use crate::{Error, Result};

/// Step used by range macros without an explicit `step`
pub const DEFAULT_STEP: f64 = 1.0;

/// Upper bound on the number of values a single range macro may produce
pub const MAX_RANGE_VALUES: usize = 1_000_000;

const ROUNDING_FACTOR: f64 = 10_000.0;

/// Result of expanding one parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Expansion {
    /// Concrete candidate values
    Values(Vec<Value>),
    /// Value that is not expandable and was left untouched
    Passthrough(Value),
}

impl Expansion {
    /// Turn the expansion into a candidate list, wrapping passthrough values.
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Self::Values(values) => values,
            Self::Passthrough(value) => vec![value],
        }
    }

    /// Whether the value was left unexpanded.
    #[must_use]
    pub const fn is_passthrough(&self) -> bool {
        matches!(self, Self::Passthrough(_))
    }
}

/// Expand a parameter value, logging and passing the value through if it is
/// a malformed range macro.
#[must_use]
pub fn expand(value: &Value) -> Expansion {
    try_expand(value).unwrap_or_else(|e| {
        tracing::warn!("Skipping expansion of {value}: {e}");
        Expansion::Passthrough(value.clone())
    })
}

/// Expand a parameter value.
///
/// # Errors
///
/// Returns `Error::MalformedMacro` if `value` is an object that is not a
/// valid range macro.
pub fn try_expand(value: &Value) -> Result<Expansion> {
    match value {
        Value::Null | Value::Number(_) => Ok(Expansion::Values(vec![value.clone()])),
        Value::Array(values) => Ok(Expansion::Values(values.clone())),
        Value::Object(range) => expand_range(range).map(Expansion::Values),
        Value::String(_) | Value::Bool(_) => Ok(Expansion::Passthrough(value.clone())),
    }
}

/// Expand a `{min, max, step}` range macro.
///
/// If `min` and `step` are both integers (or `step` is absent) the values are
/// integers, otherwise they are floats rounded to 4 decimal digits.
///
/// # Errors
///
/// Returns `Error::MalformedMacro` if `min` or `max` is missing or not a
/// number, if `step` is not a positive number, or if the range would produce
/// more than `MAX_RANGE_VALUES` values.
pub fn expand_range(range: &Map<String, Value>) -> Result<Vec<Value>> {
    let bound = |name: &str| {
        range
            .get(name)
            .and_then(Value::as_number)
            .ok_or_else(|| {
                Error::MalformedMacro(format!(
                    "'{name}' is missing or not a number in {}",
                    Value::Object(range.clone())
                ))
            })
    };
    let min = bound("min")?;
    let max = bound("max")?.as_f64().unwrap_or(f64::NAN);
    let step = match range.get("step") {
        None => None,
        Some(step) => Some(step.as_number().ok_or_else(|| {
            Error::MalformedMacro(format!("'step' is not a number: {step}"))
        })?),
    };

    let step_f = step.and_then(serde_json::Number::as_f64).unwrap_or(DEFAULT_STEP);
    if !(step_f.is_finite() && step_f > 0.0) {
        return Err(Error::MalformedMacro(format!(
            "'step' must be positive, got {step_f}"
        )));
    }
    if max.is_nan() {
        return Err(Error::MalformedMacro("'max' is not representable".into()));
    }

    let integer_step = step.map_or(Some(1), serde_json::Number::as_i64);
    match (min.as_i64(), integer_step) {
        (Some(min), Some(step)) => integer_range(min, max, step),
        _ => float_range(min.as_f64().unwrap_or(f64::NAN), max, step_f),
    }
}

#[allow(clippy::cast_precision_loss)]
fn integer_range(min: i64, max: f64, step: i64) -> Result<Vec<Value>> {
    let mut values = Vec::new();
    let mut x = Some(min);
    while let Some(current) = x.filter(|v| *v as f64 <= max) {
        push_bounded(&mut values, Value::from(current))?;
        x = current.checked_add(step);
    }
    Ok(values)
}

fn float_range(min: f64, max: f64, step: f64) -> Result<Vec<Value>> {
    let mut values = Vec::new();
    let mut x = min;
    loop {
        let rounded = round4(x);
        if rounded.is_nan() || rounded > max {
            return Ok(values);
        }
        push_bounded(&mut values, Value::from(rounded))?;
        x += step;
    }
}

fn push_bounded(values: &mut Vec<Value>, value: Value) -> Result<()> {
    if values.len() >= MAX_RANGE_VALUES {
        return Err(Error::MalformedMacro(format!(
            "range produces more than {MAX_RANGE_VALUES} values"
        )));
    }
    values.push(value);
    Ok(())
}

/// Round to 4 decimal digits.
#[must_use]
pub fn round4(x: f64) -> f64 {
    (x * ROUNDING_FACTOR).round() / ROUNDING_FACTOR
}
