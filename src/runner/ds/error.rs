use std::sync::Arc;

use thiserror::Error;

use crate::runner::ds::interop::InteropError;
use crate::runner::ds::object::{JsObjectType, ObjectBase, ObjectType};
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Error,
    ReferenceError,
    TypeError,
    RangeError,
    SyntaxError,
}
impl ErrorKind {
    pub fn constructor_name(&self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::SyntaxError => "SyntaxError",
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum JErrorType {
    #[error("Uncaught reference error: {0}.")]
    ReferenceError(String),
    #[error("Uncaught type error: {0}.")]
    TypeError(String),
    #[error("Uncaught range error: {0}.")]
    RangeError(String),
    #[error("Uncaught syntax error: {0}.")]
    SyntaxError(String),
    #[error("Uncaught class not found: {0}.")]
    ClassNotFound(String),
    #[error("Uncaught interop error: {0}.")]
    Interop(#[from] InteropError),
    #[error("Uncaught {0}.")]
    Thrown(JsValue),
}
impl JErrorType {
    pub fn new_copy(other: &Self) -> Self {
        other.clone()
    }

    /// Message text for the message-only variants; `None` for a thrown value.
    pub fn message(&self) -> Option<String> {
        match self {
            JErrorType::ReferenceError(m)
            | JErrorType::TypeError(m)
            | JErrorType::RangeError(m)
            | JErrorType::SyntaxError(m)
            | JErrorType::ClassNotFound(m) => Some(m.to_string()),
            JErrorType::Interop(e) => Some(e.to_string()),
            JErrorType::Thrown(_) => None,
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            JErrorType::ReferenceError(_) => Some(ErrorKind::ReferenceError),
            JErrorType::TypeError(_) | JErrorType::Interop(_) => Some(ErrorKind::TypeError),
            JErrorType::RangeError(_) => Some(ErrorKind::RangeError),
            JErrorType::SyntaxError(_) => Some(ErrorKind::SyntaxError),
            JErrorType::ClassNotFound(_) => Some(ErrorKind::Error),
            JErrorType::Thrown(_) => None,
        }
    }

    /// The language value a `catch` clause sees. Message-only errors become error objects of the
    /// catching realm.
    pub fn into_thrown_value(self, realm: &Arc<Realm>) -> JsValue {
        match self {
            JErrorType::Thrown(v) => v,
            other => {
                let kind = other.kind().unwrap_or(ErrorKind::Error);
                let message = other.message().unwrap_or_default();
                JsValue::Object(create_error_object(realm, kind, &message))
            }
        }
    }
}

/// Builds an error object of `kind` whose prototype belongs to `realm`.
pub fn create_error_object(
    realm: &Arc<Realm>,
    kind: ErrorKind,
    message: &str,
) -> JsObjectType {
    let proto = realm
        .intrinsics
        .prototypes
        .get(kind.constructor_name())
        .cloned();
    let mut base = match proto {
        Some(p) => ObjectBase::with_prototype(&p),
        None => ObjectBase::new_with_shape(realm.initial_shape.clone()),
    };
    base.insert_data_property(
        PropertyKey::Str("message".to_string()),
        JsValue::String(message.to_string()),
        true,
        false,
        true,
    );
    ObjectType::Ordinary(base).into_js_object()
}

/// Eagerly materialises an error in a specific realm. Used where the realm of the error object
/// must not depend on where it is caught.
pub fn thrown_in_realm(realm: &Arc<Realm>, kind: ErrorKind, message: &str) -> JErrorType {
    JErrorType::Thrown(JsValue::Object(create_error_object(realm, kind, message)))
}
