use std::sync::Arc;

use crate::runner::call::call_value;
use crate::runner::ds::array_object::ArrayObject;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::interop::{HostValue, InteropError};
use crate::runner::ds::object::{JsObjectType, ObjectBase, ObjectType};
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyKey};
use crate::runner::ds::realm::Realm;
use crate::runner::ds::shape::{child_shape_of, Shape};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::types::ValueResult;
use crate::runner::plugin::types::EvalContext;

enum GetStep {
    Found(JsValue),
    Getter(Option<JsValue>),
    Proto(Option<JsObjectType>),
    Proxy(JsObjectType, JsObjectType),
}

/// `[[Get]]` walking the prototype chain. Locks are released before any accessor or trap runs.
pub fn get(
    ctx: &mut EvalContext,
    o: &JsObjectType,
    p: &PropertyKey,
    receiver: &JsValue,
) -> ValueResult {
    let mut current = o.clone();
    loop {
        let step = {
            let guard = current.read();
            match &*guard {
                ObjectType::Proxy(proxy) => GetStep::Proxy(proxy.target.clone(), proxy.handler.clone()),
                other => {
                    let object = other.as_js_object();
                    match object.get_own_property(p) {
                        Some(PropertyDescriptor::Data { value, .. }) => GetStep::Found(value),
                        Some(PropertyDescriptor::Accessor { get, .. }) => GetStep::Getter(get),
                        None => GetStep::Proto(object.get_prototype_of()),
                    }
                }
            }
        };
        match step {
            GetStep::Found(value) => return Ok(value),
            GetStep::Getter(Some(getter)) => {
                return call_value(ctx, &getter, receiver.clone(), vec![])
            }
            GetStep::Getter(None) | GetStep::Proto(None) => return Ok(JsValue::Undefined),
            GetStep::Proto(Some(proto)) => current = proto,
            GetStep::Proxy(target, handler) => {
                let handler = JsValue::Object(handler);
                let trap = get_method(ctx, &handler, &PropertyKey::from("get"))?;
                if trap.is_undefined() {
                    current = target;
                } else {
                    return call_value(
                        ctx,
                        &trap,
                        handler,
                        vec![JsValue::Object(target), p.to_value(), receiver.clone()],
                    );
                }
            }
        }
    }
}

/// `GetV`: property read on any value. Primitives read through `Object.prototype`.
pub fn get_v(ctx: &mut EvalContext, v: &JsValue, p: &PropertyKey) -> ValueResult {
    match v {
        JsValue::Object(o) => get(ctx, o, p, v),
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
            "Cannot read property '{}' of {}",
            p, v
        ))),
        JsValue::String(s) if p.as_str() == Some("length") => {
            Ok(JsValue::from_i64(s.chars().count() as i64))
        }
        JsValue::Foreign(f) => match p.as_str() {
            Some(name) => match f.read_member(name) {
                Ok(value) => Ok(value),
                Err(InteropError::UnknownIdentifier(_)) => Ok(JsValue::Undefined),
                Err(e) => Err(e.into()),
            },
            None => Ok(JsValue::Undefined),
        },
        JsValue::Host(_) | JsValue::NoSuchMethod(_) => Ok(JsValue::Undefined),
        _ => {
            let proto = ctx.realm.intrinsics.object_prototype.clone();
            get(ctx, &proto, p, v)
        }
    }
}

/// `GetMethod`: `undefined` for absent or nullish properties, an error for non-callables.
pub fn get_method(ctx: &mut EvalContext, v: &JsValue, p: &PropertyKey) -> ValueResult {
    let f = get_v(ctx, v, p)?;
    match &f {
        JsValue::Undefined | JsValue::Null => Ok(JsValue::Undefined),
        _ if is_callable(&f) => Ok(f),
        _ => Err(JErrorType::TypeError(format!("'{}' is not a function", p))),
    }
}

enum SetStep {
    Writable,
    ReadOnly,
    Setter(Option<JsValue>),
    Proto(Option<JsObjectType>),
}

/// `[[Set]]`. Returns `false` when the assignment was rejected.
pub fn set(
    ctx: &mut EvalContext,
    o: &JsObjectType,
    p: PropertyKey,
    value: JsValue,
    receiver: &JsValue,
) -> Result<bool, JErrorType> {
    let mut current = resolve_proxy_target(o);
    loop {
        let step = {
            let guard = current.read();
            let object = guard.as_js_object();
            match object.get_own_property(&p) {
                Some(PropertyDescriptor::Data { writable: true, .. }) => SetStep::Writable,
                Some(PropertyDescriptor::Data { .. }) => SetStep::ReadOnly,
                Some(PropertyDescriptor::Accessor { set, .. }) => SetStep::Setter(set),
                None => SetStep::Proto(object.get_prototype_of()),
            }
        };
        match step {
            SetStep::Writable | SetStep::Proto(None) => break,
            SetStep::ReadOnly | SetStep::Setter(None) => return Ok(false),
            SetStep::Setter(Some(setter)) => {
                call_value(ctx, &setter, receiver.clone(), vec![value])?;
                return Ok(true);
            }
            SetStep::Proto(Some(proto)) => current = resolve_proxy_target(&proto),
        }
    }
    match receiver {
        JsValue::Object(r) => {
            let r = resolve_proxy_target(r);
            let mut guard = r.write();
            Ok(guard.as_js_object_mut().put_own_value(p, value))
        }
        _ => Ok(false),
    }
}

fn resolve_proxy_target(o: &JsObjectType) -> JsObjectType {
    let mut current = o.clone();
    loop {
        let target = match &*current.read() {
            ObjectType::Proxy(proxy) => Some(proxy.target.clone()),
            _ => None,
        };
        match target {
            Some(target) => current = target,
            None => return current,
        }
    }
}

pub fn has_own_property(o: &JsObjectType, p: &PropertyKey) -> bool {
    o.read().as_js_object().get_own_property(p).is_some()
}

/// `[[HasProperty]]` through the prototype chain. Proxies forward to their target.
pub fn has_property(o: &JsObjectType, p: &PropertyKey) -> bool {
    let mut current = resolve_proxy_target(o);
    loop {
        let next = {
            let guard = current.read();
            let object = guard.as_js_object();
            if object.get_own_property(p).is_some() {
                return true;
            }
            object.get_prototype_of()
        };
        match next {
            Some(proto) => current = resolve_proxy_target(&proto),
            None => return false,
        }
    }
}

/// `CreateDataProperty`.
pub fn define_data_property(o: &JsObjectType, p: PropertyKey, value: JsValue) -> bool {
    o.write()
        .as_js_object_mut()
        .define_own_property(p, PropertyDescriptor::new_data(value))
}

pub fn get_prototype_of(o: &JsObjectType) -> Option<JsObjectType> {
    resolve_proxy_target(o).read().as_js_object().get_prototype_of()
}

/// `[[SetPrototypeOf]]`. Rejects cycles and non-extensible objects.
pub fn set_prototype_of(o: &JsObjectType, proto: Option<JsObjectType>) -> bool {
    let mut cursor = proto.clone();
    while let Some(p) = cursor {
        if Arc::ptr_eq(&p, o) {
            return false;
        }
        cursor = get_prototype_of(&p);
    }
    let shape = match &proto {
        Some(p) => child_shape_of(p),
        None => Shape::new(None),
    };
    let mut guard = o.write();
    let object = guard.as_js_object_mut();
    if !object.is_extensible() {
        return false;
    }
    object.get_object_base_mut().set_shape(shape);
    true
}

pub fn is_callable(v: &JsValue) -> bool {
    match v {
        JsValue::Object(o) => o.read().is_callable(),
        JsValue::Foreign(_) | JsValue::NoSuchMethod(_) => true,
        JsValue::Host(HostValue::Class(_)) | JsValue::Host(HostValue::Method(_)) => true,
        _ => false,
    }
}

pub fn is_constructor(v: &JsValue) -> bool {
    match v {
        JsValue::Object(o) => o.read().is_constructor(),
        JsValue::Foreign(_) | JsValue::Host(HostValue::Class(_)) => true,
        _ => false,
    }
}

/// `CreateArrayFromList` in `realm`.
pub fn create_array_from_list(realm: &Realm, items: Vec<JsValue>) -> JsValue {
    let base = ObjectBase::with_prototype(&realm.intrinsics.array_prototype);
    JsValue::Object(ObjectType::Array(ArrayObject::new(base, items)).into_js_object())
}

/// `OrdinaryObjectCreate`. `None` makes an object without a prototype.
pub fn ordinary_object_create(proto: Option<&JsObjectType>) -> JsObjectType {
    let base = match proto {
        Some(p) => ObjectBase::with_prototype(p),
        None => ObjectBase::new_without_prototype(),
    };
    ObjectType::Ordinary(base).into_js_object()
}

/// Elements of an array object, or `None` if `v` is not one.
pub fn array_elements(v: &JsValue) -> Option<Vec<JsValue>> {
    match v {
        JsValue::Object(o) => match &*o.read() {
            ObjectType::Array(a) => Some(a.elements.clone()),
            _ => None,
        },
        _ => None,
    }
}
