//! Reflect built-in object.

use crate::runner::call::{call_value, construct_with_new_target};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::object::{is_callable, is_constructor};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::core::argument;
use super::function::create_list_from_array;

pub fn register(registry: &mut BuiltInRegistry) {
    let reflect = BuiltInObject::new("Reflect")
        .add_method("apply", 3, reflect_apply)
        .add_method("construct", 2, reflect_construct);

    registry.register_object(reflect);
}

/// `Reflect.apply(target, thisArgument, argumentsList)`.
fn reflect_apply(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let target = argument(&args, 0);
    if !is_callable(&target) {
        return Err(JErrorType::TypeError(format!(
            "Function.prototype.apply was called on {}, which is not a function",
            target
        )));
    }
    let list = create_list_from_array(&argument(&args, 2))?;
    call_value(ctx, &target, argument(&args, 1), list)
}

/// `Reflect.construct(target, argumentsList[, newTarget])`. The new-target defaults to the
/// target; both must be constructors.
fn reflect_construct(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let target = argument(&args, 0);
    if !is_constructor(&target) {
        return Err(JErrorType::TypeError(format!(
            "{} is not a constructor",
            target
        )));
    }
    let new_target = match args.get(2) {
        Some(nt) => nt.clone(),
        None => target.clone(),
    };
    if !is_constructor(&new_target) {
        return Err(JErrorType::TypeError(format!(
            "{} is not a constructor",
            new_target
        )));
    }
    let list = create_list_from_array(&argument(&args, 1))?;
    construct_with_new_target(ctx, &target, list, new_target)
}
