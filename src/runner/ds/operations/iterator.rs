use crate::runner::call::call_value;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::{get_method, get_v};
use crate::runner::ds::operations::type_conversion::{safe_to_string, to_boolean};
use crate::runner::ds::symbol::SYMBOL_ITERATOR;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

pub struct IteratorRecord {
    pub iterator: JsValue,
    pub next_method: JsValue,
}

/// One step of iteration. Exhaustion is a control signal, never an error.
#[derive(Debug)]
pub enum IteratorStep {
    Value(JsValue),
    Done,
}

pub fn get_iterator(ctx: &mut EvalContext, obj: &JsValue) -> Result<IteratorRecord, JErrorType> {
    let method = get_method(ctx, obj, &PropertyKey::Sym(SYMBOL_ITERATOR.clone()))?;
    if method.is_undefined() {
        return Err(JErrorType::TypeError(format!(
            "{} is not iterable",
            safe_to_string(obj)
        )));
    }
    let iterator = call_value(ctx, &method, obj.clone(), vec![])?;
    if !iterator.is_object() {
        return Err(JErrorType::TypeError(
            "Result of the Symbol.iterator method is not an object".to_string(),
        ));
    }
    let next_method = get_v(ctx, &iterator, &PropertyKey::from("next"))?;
    Ok(IteratorRecord {
        iterator,
        next_method,
    })
}

pub fn iterator_step(
    ctx: &mut EvalContext,
    record: &IteratorRecord,
) -> Result<IteratorStep, JErrorType> {
    let result = call_value(ctx, &record.next_method, record.iterator.clone(), vec![])?;
    if !result.is_object() {
        return Err(JErrorType::TypeError(format!(
            "Iterator result {} is not an object",
            result
        )));
    }
    let done = get_v(ctx, &result, &PropertyKey::from("done"))?;
    if to_boolean(&done) {
        return Ok(IteratorStep::Done);
    }
    Ok(IteratorStep::Value(get_v(
        ctx,
        &result,
        &PropertyKey::from("value"),
    )?))
}
