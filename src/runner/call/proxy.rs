//! `[[Call]]` and `[[Construct]]` of proxy objects.

use crate::runner::call::{
    call_value, construct_with_new_target, not_callable_error, Invocation, InvocationKind,
};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::ObjectType;
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::{create_array_from_list, get_method};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::types::ValueResult;
use crate::runner::plugin::types::EvalContext;

pub(crate) fn invoke_proxy(
    ctx: &mut EvalContext,
    kind: InvocationKind,
    inv: Invocation,
    expression: Option<&str>,
) -> ValueResult {
    let proxy = match &inv.callee {
        JsValue::Object(o) => o.clone(),
        _ => unreachable!("proxy dispatch on a non-object"),
    };
    let (target, handler, callable, constructor) = match &*proxy.read() {
        ObjectType::Proxy(p) => (
            JsValue::Object(p.target.clone()),
            JsValue::Object(p.handler.clone()),
            p.callable,
            p.constructor,
        ),
        _ => unreachable!("proxy dispatch on an ordinary object"),
    };
    if !kind.is_construct() {
        if !callable {
            return Err(not_callable_error(kind, &inv.callee, expression));
        }
        let trap = get_method(ctx, &handler, &PropertyKey::from("apply"))?;
        if trap.is_undefined() {
            return call_value(ctx, &target, inv.this, inv.args);
        }
        let args = create_array_from_list(&ctx.realm, inv.args);
        return call_value(ctx, &trap, handler, vec![target, inv.this, args]);
    }
    if !constructor {
        return Err(not_callable_error(kind, &inv.callee, expression));
    }
    let new_target = inv
        .receiver_for(kind)
        .1
        .unwrap_or_else(|| inv.callee.clone());
    let trap = get_method(ctx, &handler, &PropertyKey::from("construct"))?;
    if trap.is_undefined() {
        return construct_with_new_target(ctx, &target, inv.args, new_target);
    }
    let args = create_array_from_list(&ctx.realm, inv.args);
    let result = call_value(ctx, &trap, handler, vec![target, args, new_target])?;
    if result.is_object() {
        Ok(result)
    } else {
        Err(JErrorType::TypeError(
            "proxy [[Construct]] must return an object".to_string(),
        ))
    }
}
