use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::{
    is_primitive, to_number, to_primitive, PreferredType,
};
use crate::runner::ds::value::{JsNumberType, JsValue};
use crate::runner::plugin::types::EvalContext;

fn is_same_value(a: &JsValue, b: &JsValue, strict_mode: bool) -> bool {
    match (a, b) {
        (JsValue::Number(na), JsValue::Number(nb)) => match (na, nb) {
            (JsNumberType::NaN, JsNumberType::NaN) => !strict_mode,
            (JsNumberType::Integer(x), JsNumberType::Integer(y)) => x == y,
            _ => {
                let (x, y) = (na.as_f64(), nb.as_f64());
                if !strict_mode && x == 0.0 && y == 0.0 {
                    x.is_sign_negative() == y.is_sign_negative()
                } else {
                    x == y
                }
            }
        },
        _ => a == b,
    }
}

/// `SameValue`: `NaN` equals itself and `+0` differs from `-0`.
pub fn same_value(a: &JsValue, b: &JsValue) -> bool {
    is_same_value(a, b, false)
}

/// `===`.
pub fn strict_equality_comparison(a: &JsValue, b: &JsValue) -> bool {
    is_same_value(a, b, true)
}

/// `==`.
pub fn abstract_equality_comparison(
    ctx: &mut EvalContext,
    a: &JsValue,
    b: &JsValue,
) -> Result<bool, JErrorType> {
    match (a, b) {
        (JsValue::Undefined | JsValue::Null, JsValue::Undefined | JsValue::Null) => Ok(true),
        (JsValue::Undefined | JsValue::Null, _) | (_, JsValue::Undefined | JsValue::Null) => {
            Ok(false)
        }
        (JsValue::Number(_), JsValue::String(_)) | (JsValue::String(_), JsValue::Number(_)) => {
            Ok(to_number(ctx, a)? == to_number(ctx, b)?)
        }
        (JsValue::Boolean(_), _) => {
            let n = JsValue::from_f64(to_number(ctx, a)?);
            abstract_equality_comparison(ctx, &n, b)
        }
        (_, JsValue::Boolean(_)) => {
            let n = JsValue::from_f64(to_number(ctx, b)?);
            abstract_equality_comparison(ctx, a, &n)
        }
        _ if is_primitive(a) != is_primitive(b) => {
            if is_primitive(a) {
                let pb = to_primitive(ctx, b, PreferredType::Default)?;
                abstract_equality_comparison(ctx, a, &pb)
            } else {
                let pa = to_primitive(ctx, a, PreferredType::Default)?;
                abstract_equality_comparison(ctx, &pa, b)
            }
        }
        _ => Ok(strict_equality_comparison(a, b)),
    }
}

/// Abstract relational comparison `a < b`. `None` stands for an undefined result (a `NaN`
/// operand).
pub fn abstract_relational_comparison(
    ctx: &mut EvalContext,
    a: &JsValue,
    b: &JsValue,
) -> Result<Option<bool>, JErrorType> {
    let pa = to_primitive(ctx, a, PreferredType::Number)?;
    let pb = to_primitive(ctx, b, PreferredType::Number)?;
    if let (JsValue::String(x), JsValue::String(y)) = (&pa, &pb) {
        return Ok(Some(x < y));
    }
    let x = to_number(ctx, &pa)?;
    let y = to_number(ctx, &pb)?;
    if x.is_nan() || y.is_nan() {
        Ok(None)
    } else {
        Ok(Some(x < y))
    }
}
