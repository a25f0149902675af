//! Object built-in.
//!
//! Provides the Object constructor, `Object.getPrototypeOf`, `Object.create` and the basic
//! `Object.prototype` methods.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::ObjectType;
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::{
    get_prototype_of, has_own_property, ordinary_object_create,
};
use crate::runner::ds::operations::type_conversion::to_property_key;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::core::{argument, prototype_from_constructor};

/// Register the Object built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let object = BuiltInObject::new("Object")
        .with_constructor(1, object_call, Some(object_construct))
        .add_method("getPrototypeOf", 1, object_get_prototype_of)
        .add_method("create", 2, object_create)
        .add_prototype_method("toString", 0, object_to_string)
        .add_prototype_method("valueOf", 0, object_value_of)
        .add_prototype_method("hasOwnProperty", 1, object_has_own_property);

    registry.register_object(object);
}

/// `Object(value)`: objects pass through, everything else yields a fresh plain object.
fn object_call(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    match argument(&args, 0) {
        value @ JsValue::Object(_) => Ok(value),
        _ => Ok(JsValue::Object(ctx.realm.new_plain_object())),
    }
}

/// `new Object(value)`. A subclass new-target supplies the prototype.
fn object_construct(
    ctx: &mut EvalContext,
    new_target: &JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let is_self = match (new_target, ctx.realm.constructor("Object")) {
        (JsValue::Object(_), Some(object)) => *new_target == object,
        _ => true,
    };
    if is_self {
        return object_call(ctx, JsValue::Undefined, args);
    }
    let proto = prototype_from_constructor(ctx, new_target, "Object")?;
    Ok(JsValue::Object(ordinary_object_create(Some(&proto))))
}

fn object_get_prototype_of(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    match argument(&args, 0) {
        JsValue::Object(o) => Ok(get_prototype_of(&o)
            .map(JsValue::Object)
            .unwrap_or(JsValue::Null)),
        other => Err(JErrorType::TypeError(format!(
            "Cannot convert {} to object",
            other
        ))),
    }
}

fn object_create(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    match argument(&args, 0) {
        JsValue::Object(proto) => Ok(JsValue::Object(ordinary_object_create(Some(&proto)))),
        JsValue::Null => Ok(JsValue::Object(ordinary_object_create(None))),
        other => Err(JErrorType::TypeError(format!(
            "Object prototype may only be an Object or null: {}",
            other
        ))),
    }
}

fn object_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let tag = match &this {
        JsValue::Undefined => "Undefined",
        JsValue::Null => "Null",
        JsValue::Object(o) => match &*o.read() {
            ObjectType::Array(_) => "Array",
            ObjectType::Function(_) | ObjectType::BoundFunction(_) => "Function",
            _ => "Object",
        },
        _ => "Object",
    };
    Ok(JsValue::String(format!("[object {}]", tag)))
}

fn object_value_of(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(this)
}

fn object_has_own_property(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let key: PropertyKey = to_property_key(ctx, &argument(&args, 0))?;
    match &this {
        JsValue::Object(o) => Ok(JsValue::Boolean(has_own_property(o, &key))),
        _ => Ok(JsValue::Boolean(false)),
    }
}
