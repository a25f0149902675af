//! Core built-ins registration.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::function_realm;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::get;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::EvalContext;

use super::array;
use super::error;
use super::function;
use super::math;
use super::object;
use super::proxy;
use super::reflect;
use super::symbol;

/// Register all core built-in objects with the registry. `Object` and `Function` go first since
/// the rest inherit from their prototypes.
pub fn register_core_builtins(registry: &mut BuiltInRegistry) {
    object::register(registry);
    function::register(registry);
    error::register(registry);
    array::register(registry);
    math::register(registry);
    reflect::register(registry);
    proxy::register(registry);
    symbol::register(registry);
}

/// Argument `index`, or `undefined` when absent.
pub(crate) fn argument(args: &[JsValue], index: usize) -> JsValue {
    args.get(index).cloned().unwrap_or(JsValue::Undefined)
}

/// `GetPrototypeFromConstructor`: `new_target.prototype` when it is an object, else the
/// intrinsic `default_name` prototype of the new-target's realm.
pub(crate) fn prototype_from_constructor(
    ctx: &mut EvalContext,
    new_target: &JsValue,
    default_name: &str,
) -> Result<JsObjectType, JErrorType> {
    let realm = match new_target {
        JsValue::Object(nt) => {
            if let JsValue::Object(proto) =
                get(ctx, nt, &PropertyKey::from("prototype"), new_target)?
            {
                return Ok(proto);
            }
            function_realm(nt).unwrap_or_else(|| ctx.realm.clone())
        }
        _ => ctx.realm.clone(),
    };
    Ok(realm
        .prototype(default_name)
        .cloned()
        .unwrap_or_else(|| realm.intrinsics.object_prototype.clone()))
}
