//! `Symbol` namespace holding the well-known symbols.

use crate::runner::ds::symbol::{SYMBOL_HAS_INSTANCE, SYMBOL_ITERATOR, SYMBOL_TO_PRIMITIVE};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::BuiltInObject;

pub fn register(registry: &mut BuiltInRegistry) {
    let symbol = BuiltInObject::new("Symbol")
        .add_property("iterator", JsValue::Symbol(SYMBOL_ITERATOR.clone()))
        .add_property("hasInstance", JsValue::Symbol(SYMBOL_HAS_INSTANCE.clone()))
        .add_property("toPrimitive", JsValue::Symbol(SYMBOL_TO_PRIMITIVE.clone()));

    registry.register_object(symbol);
}
