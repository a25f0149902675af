//! `Function.prototype.call`, `apply` and `bind`.

use crate::runner::call::call_value;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::{insert_name_and_length, BoundFunctionObject};
use crate::runner::ds::object::{ObjectBase, ObjectType};
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::{array_elements, get, get_prototype_of, is_callable};
use crate::runner::ds::value::{JsNumberType, JsValue};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::core::argument;

pub fn register(registry: &mut BuiltInRegistry) {
    let function = BuiltInObject::new("Function")
        .with_no_global()
        .add_prototype_method("call", 1, function_call)
        .add_prototype_method("apply", 2, function_apply)
        .add_prototype_method("bind", 1, function_bind);

    registry.register_object(function);
}

fn function_call(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    if !is_callable(&this) {
        return Err(JErrorType::TypeError(format!(
            "Function.prototype.call was called on {}, which is not a function",
            this
        )));
    }
    let mut args = args.into_iter();
    let this_arg = args.next().unwrap_or(JsValue::Undefined);
    call_value(ctx, &this, this_arg, args.collect())
}

fn function_apply(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    if !is_callable(&this) {
        return Err(JErrorType::TypeError(format!(
            "Function.prototype.apply was called on {}, which is not a function",
            this
        )));
    }
    let list = create_list_from_array(&argument(&args, 1))?;
    call_value(ctx, &this, argument(&args, 0), list)
}

/// Argument list of `apply` and `Reflect` calls. `undefined` and `null` mean no arguments.
pub(crate) fn create_list_from_array(value: &JsValue) -> Result<Vec<JsValue>, JErrorType> {
    match value {
        JsValue::Undefined | JsValue::Null => Ok(Vec::new()),
        _ => array_elements(value).ok_or_else(|| {
            JErrorType::TypeError("CreateListFromArrayLike called on non-array".to_string())
        }),
    }
}

/// Creates a bound function. Its descriptor is shared by every bound function whose target has
/// the same constructor and async flags.
fn function_bind(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let target = match &this {
        JsValue::Object(o) if is_callable(&this) => o.clone(),
        _ => {
            return Err(JErrorType::TypeError(
                "Bind must be called on a function".to_string(),
            ))
        }
    };
    let (is_constructor, is_async) = {
        let guard = target.read();
        let is_async = guard
            .function_data()
            .map(|data| data.flags.is_async)
            .unwrap_or(false);
        (guard.is_constructor(), is_async)
    };
    let data = ctx.engine.bound_function_data(is_constructor, is_async);

    let mut args = args.into_iter();
    let bound_this = args.next().unwrap_or(JsValue::Undefined);
    let bound_args: Vec<JsValue> = args.collect();

    let target_name = match get(ctx, &target, &PropertyKey::from("name"), &this)? {
        JsValue::String(s) => s,
        _ => String::new(),
    };
    let target_length = match get(ctx, &target, &PropertyKey::from("length"), &this)? {
        JsValue::Number(JsNumberType::Integer(i)) if i > 0 => i as usize,
        _ => 0,
    };
    let mut base = match get_prototype_of(&target) {
        Some(proto) => ObjectBase::with_prototype(&proto),
        None => ObjectBase::new_without_prototype(),
    };
    insert_name_and_length(
        &mut base,
        &format!("bound {}", target_name),
        target_length.saturating_sub(bound_args.len()),
    );
    Ok(JsValue::Object(
        ObjectType::BoundFunction(BoundFunctionObject {
            base,
            data,
            target: this,
            bound_this,
            bound_args,
        })
        .into_js_object(),
    ))
}
