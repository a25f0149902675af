//! Values that live outside the script heap: foreign objects reached through a message-based
//! bridge, host classes/methods/packages, and `__noSuchMethod__` adapters.

use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use thiserror::Error;

use crate::runner::ds::value::JsValue;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum InteropError {
    #[error("message '{0}' is not supported")]
    UnsupportedMessage(String),
    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),
    #[error("expected {expected} argument(s) but got {actual}")]
    Arity { expected: usize, actual: usize },
    #[error("unsupported argument type: {0}")]
    UnsupportedType(String),
}

/// Message interface of a foreign object. Every message is optional; the defaults report the
/// message as unsupported.
pub trait ForeignObject: Send + Sync + Debug {
    fn execute(&self, _args: &[JsValue]) -> Result<JsValue, InteropError> {
        Err(InteropError::UnsupportedMessage("execute".to_string()))
    }

    fn instantiate(&self, _args: &[JsValue]) -> Result<JsValue, InteropError> {
        Err(InteropError::UnsupportedMessage("instantiate".to_string()))
    }

    fn invoke_member(&self, member: &str, _args: &[JsValue]) -> Result<JsValue, InteropError> {
        Err(InteropError::UnknownIdentifier(member.to_string()))
    }

    fn is_member_invocable(&self, _member: &str) -> bool {
        false
    }

    fn read_member(&self, member: &str) -> Result<JsValue, InteropError> {
        Err(InteropError::UnknownIdentifier(member.to_string()))
    }

    fn is_null(&self) -> bool {
        false
    }

    fn array_size(&self) -> Option<usize> {
        None
    }

    fn read_array_element(&self, _index: usize) -> Option<JsValue> {
        None
    }
}

pub type ForeignRef = Arc<dyn ForeignObject>;

/// Host-side list produced when a script array crosses into a host call.
#[derive(Debug)]
pub struct HostList {
    pub items: Vec<JsValue>,
}
impl ForeignObject for HostList {
    fn array_size(&self) -> Option<usize> {
        Some(self.items.len())
    }

    fn read_array_element(&self, index: usize) -> Option<JsValue> {
        self.items.get(index).cloned()
    }
}

/// Coarse classification of an argument for overload selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostType {
    Number,
    String,
    Boolean,
    List,
    Object,
    Any,
}
impl HostType {
    pub fn of(value: &JsValue) -> HostType {
        match value {
            JsValue::Number(_) => HostType::Number,
            JsValue::String(_) => HostType::String,
            JsValue::Boolean(_) => HostType::Boolean,
            JsValue::Foreign(f) if f.array_size().is_some() => HostType::List,
            JsValue::Object(_) | JsValue::Foreign(_) | JsValue::Host(_) => HostType::Object,
            _ => HostType::Any,
        }
    }

    /// Whether a parameter declared as `self` takes an argument classified as `actual`.
    pub fn accepts(&self, actual: HostType) -> bool {
        match self {
            HostType::Any => true,
            HostType::Object => matches!(actual, HostType::Object | HostType::List),
            declared => *declared == actual,
        }
    }
}

pub type HostFn =
    Arc<dyn Fn(Option<&JsValue>, &[JsValue]) -> Result<JsValue, InteropError> + Send + Sync>;

#[derive(Clone)]
pub struct HostOverload {
    pub parameters: Vec<HostType>,
    pub invoke: HostFn,
}
impl HostOverload {
    pub fn new(parameters: Vec<HostType>, invoke: HostFn) -> Self {
        HostOverload { parameters, invoke }
    }

    pub fn matches(&self, signature: &[HostType]) -> bool {
        self.parameters.len() == signature.len()
            && self
                .parameters
                .iter()
                .zip(signature.iter())
                .all(|(declared, actual)| declared.accepts(*actual))
    }
}
impl Debug for HostOverload {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "HostOverload({:?})", self.parameters)
    }
}

#[derive(Debug)]
pub struct HostClass {
    pub name: String,
    pub is_abstract: bool,
    pub is_public: bool,
    pub constructors: Vec<HostOverload>,
}
impl HostClass {
    /// Concrete subclass adding no members, used to instantiate an abstract class.
    pub fn extend(&self) -> HostClass {
        HostClass {
            name: format!("{}Adapter", self.name),
            is_abstract: false,
            is_public: true,
            constructors: self.constructors.clone(),
        }
    }
}

#[derive(Debug)]
pub struct HostMethod {
    pub name: String,
    pub is_static: bool,
    pub overloads: Vec<HostOverload>,
}

#[derive(Debug)]
pub struct HostPackage {
    pub name: String,
}

#[derive(Debug, Clone)]
pub enum HostValue {
    Class(Arc<HostClass>),
    Method(Arc<HostMethod>),
    Package(Arc<HostPackage>),
}
impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HostValue::Class(a), HostValue::Class(b)) => Arc::ptr_eq(a, b),
            (HostValue::Method(a), HostValue::Method(b)) => Arc::ptr_eq(a, b),
            (HostValue::Package(a), HostValue::Package(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
impl Display for HostValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Class(c) => write!(f, "class {}", c.name),
            HostValue::Method(m) => write!(f, "method {}", m.name),
            HostValue::Package(p) => write!(f, "package {}", p.name),
        }
    }
}

/// Stand-in callee for a missing method when the receiver defines `__noSuchMethod__`.
#[derive(Debug)]
pub struct NoSuchMethodAdapter {
    pub key: String,
    pub handler: JsValue,
    pub this: JsValue,
}
