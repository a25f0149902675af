//! Math built-in object.
//!
//! `abs` and `max` also carry inlined forms, which call sites run without entering the builtin
//! as long as every argument is already a number.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::to_number;
use crate::runner::ds::value::{JsNumberType, JsValue};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext, InlineOutcome};

use super::core::argument;

/// Register the Math object with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let math = BuiltInObject::new("Math")
        .add_property("E", JsValue::Number(JsNumberType::Float(std::f64::consts::E)))
        .add_property("PI", JsValue::Number(JsNumberType::Float(std::f64::consts::PI)))
        .add_inlined_method("abs", 1, math_abs, inlined_abs)
        .add_inlined_method("max", 2, math_max, inlined_max)
        .add_method("min", 2, math_min)
        .add_method("floor", 1, math_floor)
        .add_method("sqrt", 1, math_sqrt);

    registry.register_object(math);
}

fn number_argument(
    ctx: &mut EvalContext,
    args: &[JsValue],
    index: usize,
) -> Result<f64, JErrorType> {
    to_number(ctx, &argument(args, index))
}

/// `abs` of a number, keeping integers integral.
fn abs_of(n: &JsNumberType) -> JsValue {
    match n {
        JsNumberType::Integer(i) => match i.checked_abs() {
            Some(a) => JsValue::from_i64(a),
            None => JsValue::from_f64((*i as f64).abs()),
        },
        other => JsValue::from_f64(other.as_f64().abs()),
    }
}

fn math_abs(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    if let Some(JsValue::Number(n)) = args.first() {
        return Ok(abs_of(n));
    }
    Ok(JsValue::from_f64(number_argument(ctx, &args, 0)?.abs()))
}

fn inlined_abs(_this: &JsValue, args: &[JsValue]) -> InlineOutcome {
    match args.first() {
        Some(JsValue::Number(n)) => InlineOutcome::Value(abs_of(n)),
        _ => InlineOutcome::RewriteToCall,
    }
}

/// Largest of `values`; `NaN` wins over everything.
fn max_of(values: impl Iterator<Item = f64>) -> f64 {
    let mut result = f64::NEG_INFINITY;
    for v in values {
        if v.is_nan() {
            return f64::NAN;
        }
        if v > result {
            result = v;
        }
    }
    result
}

fn min_of(values: impl Iterator<Item = f64>) -> f64 {
    let mut result = f64::INFINITY;
    for v in values {
        if v.is_nan() {
            return f64::NAN;
        }
        if v < result {
            result = v;
        }
    }
    result
}

fn math_max(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let mut numbers = Vec::with_capacity(args.len());
    for arg in &args {
        numbers.push(to_number(ctx, arg)?);
    }
    Ok(JsValue::from_f64(max_of(numbers.into_iter())))
}

fn inlined_max(_this: &JsValue, args: &[JsValue]) -> InlineOutcome {
    let mut numbers = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            JsValue::Number(n) => numbers.push(n.as_f64()),
            _ => return InlineOutcome::RewriteToCall,
        }
    }
    InlineOutcome::Value(JsValue::from_f64(max_of(numbers.into_iter())))
}

fn math_min(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let mut numbers = Vec::with_capacity(args.len());
    for arg in &args {
        numbers.push(to_number(ctx, arg)?);
    }
    Ok(JsValue::from_f64(min_of(numbers.into_iter())))
}

fn math_floor(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::from_f64(number_argument(ctx, &args, 0)?.floor()))
}

fn math_sqrt(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::from_f64(number_argument(ctx, &args, 0)?.sqrt()))
}
