//! Array built-in and `%ArrayIteratorPrototype%`.

use crate::runner::ds::array_object::{ArrayIteratorObject, ArrayObject};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{ObjectBase, ObjectType};
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::define_data_property;
use crate::runner::ds::value::{JsNumberType, JsValue};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::core::prototype_from_constructor;

/// Register the Array built-in and its iterator prototype with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let array = BuiltInObject::new("Array")
        .with_constructor(1, array_call, Some(array_construct))
        .add_prototype_method("values", 0, array_values)
        .add_prototype_method("push", 1, array_push);
    registry.register_object(array);

    let iterator = BuiltInObject::new("ArrayIterator")
        .with_no_global()
        .add_prototype_method("next", 0, array_iterator_next);
    registry.register_object(iterator);
}

/// `Array(...)` behaves like `new Array(...)`.
fn array_call(
    ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    array_construct(ctx, &JsValue::Undefined, args)
}

/// A single numeric argument is a length; anything else lists the elements.
fn array_construct(
    ctx: &mut EvalContext,
    new_target: &JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let proto = prototype_from_constructor(ctx, new_target, "Array")?;
    let length = match args.as_slice() {
        [JsValue::Number(JsNumberType::Integer(i))] if *i >= 0 && *i <= u32::MAX as i64 => {
            Some(*i as usize)
        }
        [JsValue::Number(_)] => {
            return Err(JErrorType::RangeError("Invalid array length".to_string()))
        }
        _ => None,
    };
    let elements = match length {
        Some(len) => vec![JsValue::Undefined; len],
        None => args,
    };
    Ok(JsValue::Object(
        ObjectType::Array(ArrayObject::new(ObjectBase::with_prototype(&proto), elements))
            .into_js_object(),
    ))
}

/// `Array.prototype.values`, also installed as `Array.prototype[Symbol.iterator]`.
fn array_values(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    if !this.is_object() {
        return Err(JErrorType::TypeError(format!(
            "Array.prototype.values called on {}",
            this
        )));
    }
    let base = ObjectBase::with_prototype(&ctx.realm.intrinsics.array_iterator_prototype);
    Ok(JsValue::Object(
        ObjectType::ArrayIterator(ArrayIteratorObject {
            base,
            iterated: this,
            next_index: 0,
            done: false,
        })
        .into_js_object(),
    ))
}

fn array_push(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let array = match &this {
        JsValue::Object(o) => o.clone(),
        _ => {
            return Err(JErrorType::TypeError(
                "Array.prototype.push called on non-object".to_string(),
            ))
        }
    };
    let mut guard = array.write();
    match &mut *guard {
        ObjectType::Array(a) => {
            a.elements.extend(args);
            Ok(JsValue::from_i64(a.elements.len() as i64))
        }
        _ => Err(JErrorType::TypeError(
            "Array.prototype.push called on non-array".to_string(),
        )),
    }
}

/// `%ArrayIteratorPrototype%.next`. Reads the iterated array's current elements, so pushes made
/// during iteration are seen.
fn array_iterator_next(
    ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let iterator = match &this {
        JsValue::Object(o) => o.clone(),
        _ => return Err(incompatible_receiver()),
    };
    let (iterated, index, done) = match &*iterator.read() {
        ObjectType::ArrayIterator(it) => (it.iterated.clone(), it.next_index, it.done),
        _ => return Err(incompatible_receiver()),
    };
    let value = if done {
        None
    } else {
        match &iterated {
            JsValue::Object(o) => match &*o.read() {
                ObjectType::Array(a) => a.elements.get(index).cloned(),
                _ => None,
            },
            _ => None,
        }
    };
    if let ObjectType::ArrayIterator(it) = &mut *iterator.write() {
        match value {
            Some(_) => it.next_index = index + 1,
            None => it.done = true,
        }
    }
    let is_done = value.is_none();
    Ok(iterator_result(ctx, value.unwrap_or(JsValue::Undefined), is_done))
}

fn incompatible_receiver() -> JErrorType {
    JErrorType::TypeError("next method called on incompatible receiver".to_string())
}

/// `{ value, done }`.
fn iterator_result(ctx: &EvalContext, value: JsValue, done: bool) -> JsValue {
    let result = ctx.realm.new_plain_object();
    define_data_property(&result, PropertyKey::from("value"), value);
    define_data_property(&result, PropertyKey::from("done"), JsValue::Boolean(done));
    JsValue::Object(result)
}
