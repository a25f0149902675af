use std::sync::Arc;

use crate::parser::ast::{
    ExpressionOrSpreadElement, ExpressionType, HasMeta, MemberExpressionType, Meta,
};
use crate::runner::call::arguments::{evaluate_arguments, ArgumentList};
use crate::runner::call::cache::CallCache;
use crate::runner::call::{
    perform_call, perform_construct, perform_construct_with_new_target, InvocationKind,
};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::interop::NoSuchMethodAdapter;
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::{get, get_prototype_of, get_v, is_callable};
use crate::runner::ds::operations::type_conversion::to_property_key;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::expression::evaluate_expression;
use crate::runner::eval::types::ValueResult;
use crate::runner::plugin::types::EvalContext;

#[derive(Debug)]
pub enum MemberKey {
    Static(String),
    Computed(Box<ExpressionType>),
}

#[derive(Debug)]
pub enum CalleeExpression {
    Plain(Box<ExpressionType>),
    /// `object.property(...)` or `object[property](...)`: the object is the receiver.
    Member {
        object: Box<ExpressionType>,
        property: MemberKey,
    },
    /// `super(...)` in a derived constructor.
    Super,
}

/// A call, `new` or `super(...)` expression together with its inline cache.
#[derive(Debug)]
pub struct CallSite {
    pub meta: Meta,
    pub callee: CalleeExpression,
    pub arguments: ArgumentList,
    cache: CallCache,
}

impl CallSite {
    /// `callee(...)`. A member expression callee becomes a method call on its object.
    pub fn call(
        meta: Meta,
        callee: ExpressionType,
        arguments: Vec<ExpressionOrSpreadElement>,
    ) -> Self {
        let expression = callee.get_meta().to_formatted_code();
        match callee {
            ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
                object,
                property,
                ..
            }) => CallSite::build(
                meta,
                InvocationKind::Call,
                expression,
                CalleeExpression::Member {
                    object,
                    property: MemberKey::Static(property.name),
                },
                arguments,
            ),
            ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
                object,
                property,
                ..
            }) => CallSite::build(
                meta,
                InvocationKind::Call,
                expression,
                CalleeExpression::Member {
                    object,
                    property: MemberKey::Computed(property),
                },
                arguments,
            ),
            other => CallSite::build(
                meta,
                InvocationKind::Call,
                expression,
                CalleeExpression::Plain(Box::new(other)),
                arguments,
            ),
        }
    }

    /// `object.property(...)`.
    pub fn invoke(
        meta: Meta,
        object: ExpressionType,
        property: &str,
        arguments: Vec<ExpressionOrSpreadElement>,
    ) -> Self {
        let expression = format!("{}.{}", object.get_meta().to_formatted_code(), property);
        CallSite::build(
            meta,
            InvocationKind::Call,
            expression,
            CalleeExpression::Member {
                object: Box::new(object),
                property: MemberKey::Static(property.to_string()),
            },
            arguments,
        )
    }

    pub fn new_expression(
        meta: Meta,
        callee: ExpressionType,
        arguments: Vec<ExpressionOrSpreadElement>,
    ) -> Self {
        let expression = callee.get_meta().to_formatted_code();
        CallSite::build(
            meta,
            InvocationKind::New,
            expression,
            CalleeExpression::Plain(Box::new(callee)),
            arguments,
        )
    }

    pub fn super_call(meta: Meta, arguments: Vec<ExpressionOrSpreadElement>) -> Self {
        CallSite::build(
            meta,
            InvocationKind::NewTarget,
            "super".to_string(),
            CalleeExpression::Super,
            arguments,
        )
    }

    fn build(
        meta: Meta,
        kind: InvocationKind,
        expression: String,
        callee: CalleeExpression,
        arguments: Vec<ExpressionOrSpreadElement>,
    ) -> Self {
        let property_key = match &callee {
            CalleeExpression::Member {
                property: MemberKey::Static(name),
                ..
            } => Some(name.clone()),
            _ => None,
        };
        CallSite {
            meta,
            callee,
            arguments: ArgumentList::from_elements(arguments),
            cache: CallCache::new(kind, expression, property_key),
        }
    }

    pub fn kind(&self) -> InvocationKind {
        self.cache.kind()
    }

    pub fn cache(&self) -> &CallCache {
        &self.cache
    }

    /// Callee and receiver first, then the arguments, then dispatch.
    pub fn evaluate(&self, ctx: &mut EvalContext) -> ValueResult {
        match self.cache.kind() {
            InvocationKind::Call => {
                let (this, callee) = self.evaluate_callee(ctx)?;
                let args = evaluate_arguments(ctx, &self.arguments)?;
                perform_call(ctx, &self.cache, this, callee, args)
            }
            InvocationKind::New => {
                let (_, callee) = self.evaluate_callee(ctx)?;
                let args = evaluate_arguments(ctx, &self.arguments)?;
                perform_construct(ctx, &self.cache, callee, args)
            }
            InvocationKind::NewTarget => self.evaluate_super_call(ctx),
        }
    }

    fn evaluate_callee(&self, ctx: &mut EvalContext) -> Result<(JsValue, JsValue), JErrorType> {
        match &self.callee {
            CalleeExpression::Plain(expr) => {
                Ok((JsValue::Undefined, evaluate_expression(expr, ctx)?))
            }
            CalleeExpression::Member { object, property } => {
                let receiver = evaluate_expression(object, ctx)?;
                let key = match property {
                    MemberKey::Static(name) => {
                        if let JsValue::Foreign(_) = receiver {
                            return Ok((receiver.clone(), receiver));
                        }
                        PropertyKey::from(name.as_str())
                    }
                    MemberKey::Computed(expr) => {
                        let value = evaluate_expression(expr, ctx)?;
                        to_property_key(ctx, &value)?
                    }
                };
                let callee = get_v(ctx, &receiver, &key)?;
                if callee.is_undefined() && ctx.engine.config().no_such_method {
                    if let Some(adapter) = no_such_method_adapter(ctx, &receiver, &key)? {
                        return Ok((receiver, adapter));
                    }
                }
                Ok((receiver, callee))
            }
            CalleeExpression::Super => Err(JErrorType::SyntaxError(
                "'super' keyword unexpected here".to_string(),
            )),
        }
    }

    fn evaluate_super_call(&self, ctx: &mut EvalContext) -> ValueResult {
        let (function, new_target) = match ctx.frame() {
            Some(frame) => (frame.function.clone(), frame.new_target.clone()),
            None => (None, None),
        };
        let function = function.ok_or_else(|| {
            JErrorType::SyntaxError("'super' keyword unexpected here".to_string())
        })?;
        let callee = get_prototype_of(&function)
            .map(JsValue::Object)
            .unwrap_or(JsValue::Null);
        let args = evaluate_arguments(ctx, &self.arguments)?;
        let new_target = new_target.unwrap_or(JsValue::Undefined);
        let result = perform_construct_with_new_target(ctx, &self.cache, callee, new_target, args)?;
        match ctx.frame_mut() {
            Some(frame) if frame.this.is_some() => Err(JErrorType::ReferenceError(
                "Super constructor may only be called once".to_string(),
            )),
            Some(frame) => {
                frame.this = Some(result.clone());
                Ok(result)
            }
            None => Ok(result),
        }
    }
}

/// Adapter standing in for a missing method when the receiver has a callable
/// `__noSuchMethod__`.
fn no_such_method_adapter(
    ctx: &mut EvalContext,
    receiver: &JsValue,
    key: &PropertyKey,
) -> Result<Option<JsValue>, JErrorType> {
    let (object, name) = match (receiver, key.as_str()) {
        (JsValue::Object(o), Some(name)) => (o.clone(), name),
        _ => return Ok(None),
    };
    let handler = get(ctx, &object, &PropertyKey::from("__noSuchMethod__"), receiver)?;
    if !is_callable(&handler) {
        return Ok(None);
    }
    Ok(Some(JsValue::NoSuchMethod(Arc::new(NoSuchMethodAdapter {
        key: name.to_string(),
        handler,
        this: receiver.clone(),
    }))))
}
