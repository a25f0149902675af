use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::runner::ds::interop::{ForeignRef, HostValue, NoSuchMethodAdapter};
use crate::runner::ds::object::{JsObjectType, ObjectType};
use crate::runner::ds::operations::type_conversion::{TYPE_STR_NULL, TYPE_STR_UNDEFINED};
use crate::runner::ds::symbol::SymbolData;

pub enum JsValue {
    Undefined,
    Null,
    Boolean(bool),
    String(String),
    Symbol(SymbolData),
    Number(JsNumberType),
    Object(JsObjectType),
    Foreign(ForeignRef),
    Host(HostValue),
    NoSuchMethod(Arc<NoSuchMethodAdapter>),
}
impl Clone for JsValue {
    fn clone(&self) -> Self {
        match self {
            JsValue::Undefined => JsValue::Undefined,
            JsValue::String(d) => JsValue::String(d.to_string()),
            JsValue::Boolean(d) => JsValue::Boolean(*d),
            JsValue::Null => JsValue::Null,
            JsValue::Number(d) => JsValue::Number(d.clone()),
            JsValue::Object(o) => JsValue::Object(o.clone()),
            JsValue::Symbol(d) => JsValue::Symbol(d.clone()),
            JsValue::Foreign(f) => JsValue::Foreign(f.clone()),
            JsValue::Host(h) => JsValue::Host(h.clone()),
            JsValue::NoSuchMethod(a) => JsValue::NoSuchMethod(a.clone()),
        }
    }
}
impl Display for JsValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "{}", TYPE_STR_UNDEFINED),
            JsValue::Null => write!(f, "{}", TYPE_STR_NULL),
            JsValue::Boolean(b) => write!(f, "{}", b),
            JsValue::String(s) => write!(f, "\"{}\"", s),
            JsValue::Symbol(s) => write!(f, "{}", s),
            JsValue::Number(n) => write!(f, "{}", n),
            JsValue::Object(o) => match &*o.read() {
                ObjectType::Function(func) => write!(f, "function {}", func.data.name),
                ObjectType::BoundFunction(_) => write!(f, "bound function"),
                ObjectType::Array(_) => write!(f, "[object Array]"),
                ObjectType::Proxy(_) => write!(f, "[object Proxy]"),
                _ => write!(f, "[object Object]"),
            },
            JsValue::Foreign(o) => write!(f, "foreign {:?}", o),
            JsValue::Host(h) => write!(f, "{}", h),
            JsValue::NoSuchMethod(a) => write!(f, "noSuchMethod({})", a.key),
        }
    }
}

impl fmt::Debug for JsValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "JsValue::Undefined"),
            JsValue::Null => write!(f, "JsValue::Null"),
            JsValue::Boolean(b) => write!(f, "JsValue::Boolean({})", b),
            JsValue::String(s) => write!(f, "JsValue::String({:?})", s),
            JsValue::Symbol(s) => write!(f, "JsValue::Symbol({})", s),
            JsValue::Number(n) => write!(f, "JsValue::Number({:?})", n),
            JsValue::Object(_) => write!(f, "JsValue::Object(...)"),
            JsValue::Foreign(o) => write!(f, "JsValue::Foreign({:?})", o),
            JsValue::Host(h) => write!(f, "JsValue::Host({})", h),
            JsValue::NoSuchMethod(a) => write!(f, "JsValue::NoSuchMethod({})", a.key),
        }
    }
}

/// Reference variants compare by identity.
impl PartialEq for JsValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (JsValue::Undefined, JsValue::Undefined) => true,
            (JsValue::Null, JsValue::Null) => true,
            (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
            (JsValue::String(a), JsValue::String(b)) => a == b,
            (JsValue::Number(a), JsValue::Number(b)) => a == b,
            (JsValue::Object(a), JsValue::Object(b)) => Arc::ptr_eq(a, b),
            (JsValue::Symbol(a), JsValue::Symbol(b)) => a == b,
            (JsValue::Foreign(a), JsValue::Foreign(b)) => Arc::ptr_eq(a, b),
            (JsValue::Host(a), JsValue::Host(b)) => a == b,
            (JsValue::NoSuchMethod(a), JsValue::NoSuchMethod(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl JsValue {
    pub fn as_object(&self) -> Option<&JsObjectType> {
        match self {
            JsValue::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, JsValue::Object(_))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, JsValue::Undefined)
    }

    pub fn is_same_object(&self, other: &JsObjectType) -> bool {
        match self {
            JsValue::Object(o) => Arc::ptr_eq(o, other),
            _ => false,
        }
    }

    pub fn new_string(s: &str) -> Self {
        JsValue::String(s.to_string())
    }

    pub fn from_i64(i: i64) -> Self {
        JsValue::Number(JsNumberType::Integer(i))
    }

    pub fn from_f64(f: f64) -> Self {
        JsValue::Number(JsNumberType::from_f64(f))
    }
}

#[derive(Debug, Clone)]
pub enum JsNumberType {
    Integer(i64),
    Float(f64),
    NaN,
    PositiveInfinity,
    NegativeInfinity,
}
impl JsNumberType {
    pub fn as_f64(&self) -> f64 {
        match self {
            JsNumberType::Integer(i) => *i as f64,
            JsNumberType::Float(f) => *f,
            JsNumberType::NaN => f64::NAN,
            JsNumberType::PositiveInfinity => f64::INFINITY,
            JsNumberType::NegativeInfinity => f64::NEG_INFINITY,
        }
    }

    /// Normalises integral floats into `Integer`, so `2.0` and `2` share one representation.
    pub fn from_f64(f: f64) -> Self {
        if f.is_nan() {
            JsNumberType::NaN
        } else if f == f64::INFINITY {
            JsNumberType::PositiveInfinity
        } else if f == f64::NEG_INFINITY {
            JsNumberType::NegativeInfinity
        } else if f.fract() == 0.0 && f.abs() < i64::MAX as f64 && !(f == 0.0 && f.is_sign_negative())
        {
            JsNumberType::Integer(f as i64)
        } else {
            JsNumberType::Float(f)
        }
    }
}
impl PartialEq for JsNumberType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (JsNumberType::Integer(a), JsNumberType::Integer(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}
impl Display for JsNumberType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            JsNumberType::Integer(i) => write!(f, "{}", i),
            JsNumberType::Float(nf) => write!(f, "{}", nf),
            JsNumberType::NaN => write!(f, "NaN"),
            JsNumberType::PositiveInfinity => write!(f, "Infinity"),
            JsNumberType::NegativeInfinity => write!(f, "-Infinity"),
        }
    }
}
