//! Argument materialization.

use crate::parser::ast::{ExpressionOrSpreadElement, ExpressionType};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::ObjectType;
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::iterator::{get_iterator, iterator_step, IteratorStep};
use crate::runner::ds::operations::object::get_v;
use crate::runner::ds::symbol::SYMBOL_ITERATOR;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::expression::evaluate_expression;
use crate::runner::plugin::types::EvalContext;

/// Argument expressions of a call site, shaped once when the site is built.
#[derive(Debug)]
pub enum ArgumentList {
    Zero,
    One(Box<ExpressionType>),
    Many(Vec<ExpressionType>),
    /// At least one element is a spread.
    Spread(Vec<ExpressionOrSpreadElement>),
}

impl ArgumentList {
    pub fn from_elements(elements: Vec<ExpressionOrSpreadElement>) -> Self {
        let has_spread = elements
            .iter()
            .any(|e| matches!(e, ExpressionOrSpreadElement::SpreadElement(_)));
        if has_spread {
            return ArgumentList::Spread(elements);
        }
        let mut expressions: Vec<ExpressionType> = elements
            .into_iter()
            .filter_map(|e| match e {
                ExpressionOrSpreadElement::Expression(expr) => Some(*expr),
                ExpressionOrSpreadElement::SpreadElement(_) => None,
            })
            .collect();
        match expressions.len() {
            0 => ArgumentList::Zero,
            1 => match expressions.pop() {
                Some(only) => ArgumentList::One(Box::new(only)),
                None => ArgumentList::Zero,
            },
            _ => ArgumentList::Many(expressions),
        }
    }

    /// Number of argument values when known without evaluating.
    pub fn fixed_len(&self) -> Option<usize> {
        match self {
            ArgumentList::Zero => Some(0),
            ArgumentList::One(_) => Some(1),
            ArgumentList::Many(e) => Some(e.len()),
            ArgumentList::Spread(_) => None,
        }
    }
}

/// Growable argument buffer for spread calls. Capacity doubles when full.
pub struct ArgumentBuffer {
    items: Vec<JsValue>,
}

impl ArgumentBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        ArgumentBuffer {
            items: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: JsValue) {
        if self.items.len() == self.items.capacity() {
            let grow_by = self.items.capacity().max(4);
            self.items.reserve_exact(grow_by);
        }
        self.items.push(value);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// The values, copied down to exactly their length.
    pub fn into_exact(self) -> Vec<JsValue> {
        self.items.into_boxed_slice().into_vec()
    }
}

/// Evaluates the arguments left to right, draining spread sources in iteration order.
pub fn evaluate_arguments(
    ctx: &mut EvalContext,
    arguments: &ArgumentList,
) -> Result<Vec<JsValue>, JErrorType> {
    match arguments {
        ArgumentList::Zero => Ok(Vec::new()),
        ArgumentList::One(expr) => Ok(vec![evaluate_expression(expr, ctx)?]),
        ArgumentList::Many(exprs) => {
            let mut values = Vec::with_capacity(exprs.len());
            for expr in exprs {
                values.push(evaluate_expression(expr, ctx)?);
            }
            Ok(values)
        }
        ArgumentList::Spread(elements) => {
            let mut buffer = ArgumentBuffer::with_capacity(elements.len());
            for element in elements {
                match element {
                    ExpressionOrSpreadElement::Expression(expr) => {
                        buffer.push(evaluate_expression(expr, ctx)?)
                    }
                    ExpressionOrSpreadElement::SpreadElement(expr) => {
                        let source = evaluate_expression(expr, ctx)?;
                        spread_into(ctx, &source, &mut buffer)?;
                    }
                }
            }
            Ok(buffer.into_exact())
        }
    }
}

/// Appends every value `source` iterates over.
pub fn spread_into(
    ctx: &mut EvalContext,
    source: &JsValue,
    buffer: &mut ArgumentBuffer,
) -> Result<(), JErrorType> {
    if let Some(elements) = intrinsic_array_elements(ctx, source)? {
        for value in elements {
            buffer.push(value);
        }
        return Ok(());
    }
    let record = get_iterator(ctx, source)?;
    loop {
        match iterator_step(ctx, &record)? {
            IteratorStep::Value(value) => buffer.push(value),
            IteratorStep::Done => return Ok(()),
        }
    }
}

/// Elements of an array that still iterates with `%ArrayProto_values%` and an unmodified
/// `%ArrayIteratorPrototype%.next`.
fn intrinsic_array_elements(
    ctx: &mut EvalContext,
    source: &JsValue,
) -> Result<Option<Vec<JsValue>>, JErrorType> {
    let is_array = match source {
        JsValue::Object(o) => matches!(&*o.read(), ObjectType::Array(_)),
        _ => false,
    };
    if !is_array {
        return Ok(None);
    }
    let iterate = get_v(ctx, source, &PropertyKey::Sym(SYMBOL_ITERATOR.clone()))?;
    if iterate != ctx.realm.intrinsics.array_values {
        return Ok(None);
    }
    let iterator_prototype = JsValue::Object(ctx.realm.intrinsics.array_iterator_prototype.clone());
    let next = get_v(ctx, &iterator_prototype, &PropertyKey::from("next"))?;
    if next != ctx.realm.intrinsics.array_iterator_next {
        return Ok(None);
    }
    Ok(match source {
        JsValue::Object(o) => match &*o.read() {
            ObjectType::Array(a) => Some(a.elements.clone()),
            _ => None,
        },
        _ => None,
    })
}
