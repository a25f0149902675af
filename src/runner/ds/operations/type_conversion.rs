use crate::runner::call::call_value;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::interop::HostValue;
use crate::runner::ds::object::ObjectType;
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::{get, get_method, is_callable};
use crate::runner::ds::symbol::SYMBOL_TO_PRIMITIVE;
use crate::runner::ds::value::{JsNumberType, JsValue};
use crate::runner::eval::types::ValueResult;
use crate::runner::plugin::types::EvalContext;

pub const TYPE_STR_UNDEFINED: &str = "undefined";
pub const TYPE_STR_NULL: &str = "null";
pub const TYPE_STR_BOOLEAN: &str = "boolean";
pub const TYPE_STR_STRING: &str = "string";
pub const TYPE_STR_SYMBOL: &str = "symbol";
pub const TYPE_STR_NUMBER: &str = "number";
pub const TYPE_STR_OBJECT: &str = "object";
pub const TYPE_STR_FUNCTION: &str = "function";

/// Result of `typeof`.
pub fn get_type(a: &JsValue) -> &'static str {
    match a {
        JsValue::Undefined => TYPE_STR_UNDEFINED,
        JsValue::Null => TYPE_STR_OBJECT,
        JsValue::Boolean(_) => TYPE_STR_BOOLEAN,
        JsValue::String(_) => TYPE_STR_STRING,
        JsValue::Symbol(_) => TYPE_STR_SYMBOL,
        JsValue::Number(_) => TYPE_STR_NUMBER,
        JsValue::Object(o) => {
            if o.read().is_callable() {
                TYPE_STR_FUNCTION
            } else {
                TYPE_STR_OBJECT
            }
        }
        JsValue::Host(HostValue::Package(_)) | JsValue::Foreign(_) => TYPE_STR_OBJECT,
        JsValue::Host(_) | JsValue::NoSuchMethod(_) => TYPE_STR_FUNCTION,
    }
}

/// Primitive in the language sense. Foreign and host values count as non-primitive.
pub fn is_primitive(v: &JsValue) -> bool {
    !matches!(
        v,
        JsValue::Object(_) | JsValue::Foreign(_) | JsValue::Host(_) | JsValue::NoSuchMethod(_)
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferredType {
    Default,
    String,
    Number,
}
impl PreferredType {
    fn hint(&self) -> &'static str {
        match self {
            PreferredType::Default => "default",
            PreferredType::String => "string",
            PreferredType::Number => "number",
        }
    }
}

pub fn to_primitive(
    ctx: &mut EvalContext,
    v: &JsValue,
    preferred_type: PreferredType,
) -> ValueResult {
    match v {
        JsValue::Object(o) => {
            let exotic = get_method(ctx, v, &PropertyKey::Sym(SYMBOL_TO_PRIMITIVE.clone()))?;
            if !exotic.is_undefined() {
                let result = call_value(
                    ctx,
                    &exotic,
                    v.clone(),
                    vec![JsValue::new_string(preferred_type.hint())],
                )?;
                return if is_primitive(&result) {
                    Ok(result)
                } else {
                    Err(JErrorType::TypeError(
                        "Cannot convert object to primitive value".to_string(),
                    ))
                };
            }
            let order = match preferred_type {
                PreferredType::String => ["toString", "valueOf"],
                _ => ["valueOf", "toString"],
            };
            for name in order.iter() {
                let method = get(ctx, o, &PropertyKey::from(*name), v)?;
                if is_callable(&method) {
                    let result = call_value(ctx, &method, v.clone(), vec![])?;
                    if is_primitive(&result) {
                        return Ok(result);
                    }
                }
            }
            Err(JErrorType::TypeError(
                "Cannot convert object to primitive value".to_string(),
            ))
        }
        JsValue::Foreign(_) | JsValue::Host(_) | JsValue::NoSuchMethod(_) => {
            Ok(JsValue::String(safe_to_string(v)))
        }
        _ => Ok(v.clone()),
    }
}

pub fn string_to_number(s: &str) -> f64 {
    let s = s.trim();
    match s {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => {
            if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                return i64::from_str_radix(hex, 16)
                    .map(|i| i as f64)
                    .unwrap_or(f64::NAN);
            }
            if s.chars().any(|c| c.is_alphabetic() && c != 'e' && c != 'E') {
                return f64::NAN;
            }
            s.parse::<f64>().unwrap_or(f64::NAN)
        }
    }
}

pub fn to_number(ctx: &mut EvalContext, v: &JsValue) -> Result<f64, JErrorType> {
    match v {
        JsValue::Undefined => Ok(f64::NAN),
        JsValue::Null => Ok(0.0),
        JsValue::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        JsValue::Number(n) => Ok(n.as_f64()),
        JsValue::String(s) => Ok(string_to_number(s)),
        JsValue::Symbol(_) => Err(JErrorType::TypeError(
            "Cannot convert a Symbol value to a number".to_string(),
        )),
        _ => {
            let pv = to_primitive(ctx, v, PreferredType::Number)?;
            to_number(ctx, &pv)
        }
    }
}

pub fn number_to_string(n: &JsNumberType) -> String {
    n.to_string()
}

pub fn to_string(ctx: &mut EvalContext, v: &JsValue) -> Result<String, JErrorType> {
    match v {
        JsValue::String(s) => Ok(s.to_string()),
        JsValue::Number(n) => Ok(number_to_string(n)),
        JsValue::Symbol(_) => Err(JErrorType::TypeError(
            "Cannot convert a Symbol value to a string".to_string(),
        )),
        JsValue::Object(_) => {
            let pv = to_primitive(ctx, v, PreferredType::String)?;
            to_string(ctx, &pv)
        }
        _ => Ok(safe_to_string(v)),
    }
}

pub fn to_boolean(v: &JsValue) -> bool {
    match v {
        JsValue::Undefined | JsValue::Null => false,
        JsValue::Boolean(b) => *b,
        JsValue::String(s) => !s.is_empty(),
        JsValue::Number(n) => {
            let f = n.as_f64();
            !(f.is_nan() || f == 0.0)
        }
        _ => true,
    }
}

pub fn to_property_key(ctx: &mut EvalContext, v: &JsValue) -> Result<PropertyKey, JErrorType> {
    match v {
        JsValue::Symbol(s) => Ok(PropertyKey::Sym(s.clone())),
        _ => Ok(PropertyKey::Str(to_string(ctx, v)?)),
    }
}

/// Display text for diagnostics. Never runs user code.
pub fn safe_to_string(v: &JsValue) -> String {
    match v {
        JsValue::String(s) => s.to_string(),
        JsValue::Object(o) => match &*o.read() {
            ObjectType::Function(f) => format!("function {}", f.data.name),
            ObjectType::BoundFunction(_) => "bound function".to_string(),
            ObjectType::Array(_) => "[object Array]".to_string(),
            ObjectType::Proxy(_) => "[object Proxy]".to_string(),
            _ => "[object Object]".to_string(),
        },
        _ => v.to_string(),
    }
}
