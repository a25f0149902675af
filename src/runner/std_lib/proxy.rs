//! Proxy constructor.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::ObjectType;
use crate::runner::ds::proxy_object::ProxyObject;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::core::argument;

pub fn register(registry: &mut BuiltInRegistry) {
    let proxy = BuiltInObject::new("Proxy").with_constructor(2, proxy_call, Some(proxy_construct));

    registry.register_object(proxy);
}

fn proxy_call(
    _ctx: &mut EvalContext,
    _this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Err(JErrorType::TypeError(
        "Constructor Proxy requires 'new'".to_string(),
    ))
}

/// `new Proxy(target, handler)`. Callability is taken from the target here and never changes.
fn proxy_construct(
    _ctx: &mut EvalContext,
    _new_target: &JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    match (argument(&args, 0), argument(&args, 1)) {
        (JsValue::Object(target), JsValue::Object(handler)) => Ok(JsValue::Object(
            ObjectType::Proxy(ProxyObject::new(target, handler)).into_js_object(),
        )),
        _ => Err(JErrorType::TypeError(
            "Cannot create proxy with a non-object as target or handler".to_string(),
        )),
    }
}
