//! Error built-in objects.
//!
//! Provides Error, TypeError, ReferenceError, SyntaxError and RangeError constructors.

use crate::runner::ds::error::{ErrorKind, JErrorType};
use crate::runner::ds::object::{ObjectBase, ObjectType};
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::get_v;
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext, NativeConstructFn, NativeFn};

use super::core::{argument, prototype_from_constructor};

/// Register all error types with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let error = BuiltInObject::new("Error")
        .with_constructor(1, error_call, Some(error_construct))
        .add_prototype_method("toString", 0, error_to_string)
        .add_prototype_property("name", JsValue::new_string("Error"))
        .add_prototype_property("message", JsValue::new_string(""));
    registry.register_object(error);

    registry.register_object(native_error(
        ErrorKind::TypeError,
        type_error_call,
        type_error_construct,
    ));
    registry.register_object(native_error(
        ErrorKind::ReferenceError,
        reference_error_call,
        reference_error_construct,
    ));
    registry.register_object(native_error(
        ErrorKind::SyntaxError,
        syntax_error_call,
        syntax_error_construct,
    ));
    registry.register_object(native_error(
        ErrorKind::RangeError,
        range_error_call,
        range_error_construct,
    ));
}

fn native_error(
    kind: ErrorKind,
    call: NativeFn,
    construct: NativeConstructFn,
) -> BuiltInObject {
    BuiltInObject::new(kind.constructor_name())
        .with_prototype("Error")
        .with_constructor(1, call, Some(construct))
        .add_prototype_property("name", JsValue::new_string(kind.constructor_name()))
}

/// Shared body of every error constructor. Called without `new`, the error still gets the
/// intrinsic prototype of its kind.
fn construct_error(
    ctx: &mut EvalContext,
    new_target: &JsValue,
    args: &[JsValue],
    kind: ErrorKind,
) -> Result<JsValue, JErrorType> {
    let proto = prototype_from_constructor(ctx, new_target, kind.constructor_name())?;
    let mut base = ObjectBase::with_prototype(&proto);
    let message = argument(args, 0);
    if !message.is_undefined() {
        let message = to_string(ctx, &message)?;
        base.insert_data_property(
            PropertyKey::from("message"),
            JsValue::String(message),
            true,
            false,
            true,
        );
    }
    Ok(JsValue::Object(ObjectType::Ordinary(base).into_js_object()))
}

fn error_call(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    construct_error(ctx, &JsValue::Undefined, &args, ErrorKind::Error)
}

fn error_construct(
    ctx: &mut EvalContext,
    new_target: &JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    construct_error(ctx, new_target, &args, ErrorKind::Error)
}

fn type_error_call(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    construct_error(ctx, &JsValue::Undefined, &args, ErrorKind::TypeError)
}

fn type_error_construct(
    ctx: &mut EvalContext,
    new_target: &JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    construct_error(ctx, new_target, &args, ErrorKind::TypeError)
}

fn reference_error_call(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    construct_error(ctx, &JsValue::Undefined, &args, ErrorKind::ReferenceError)
}

fn reference_error_construct(
    ctx: &mut EvalContext,
    new_target: &JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    construct_error(ctx, new_target, &args, ErrorKind::ReferenceError)
}

fn syntax_error_call(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    construct_error(ctx, &JsValue::Undefined, &args, ErrorKind::SyntaxError)
}

fn syntax_error_construct(
    ctx: &mut EvalContext,
    new_target: &JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    construct_error(ctx, new_target, &args, ErrorKind::SyntaxError)
}

fn range_error_call(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    construct_error(ctx, &JsValue::Undefined, &args, ErrorKind::RangeError)
}

fn range_error_construct(
    ctx: &mut EvalContext,
    new_target: &JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    construct_error(ctx, new_target, &args, ErrorKind::RangeError)
}

/// `Error.prototype.toString`: `name: message`, leaving out whichever part is empty.
fn error_to_string(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    if !this.is_object() {
        return Err(JErrorType::TypeError(
            "Error.prototype.toString requires that 'this' be an Object".to_string(),
        ));
    }
    let name = match get_v(ctx, &this, &PropertyKey::from("name"))? {
        JsValue::Undefined => "Error".to_string(),
        other => to_string(ctx, &other)?,
    };
    let message = match get_v(ctx, &this, &PropertyKey::from("message"))? {
        JsValue::Undefined => String::new(),
        other => to_string(ctx, &other)?,
    };
    Ok(JsValue::String(if message.is_empty() {
        name
    } else if name.is_empty() {
        message
    } else {
        format!("{}: {}", name, message)
    }))
}
