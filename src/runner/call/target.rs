use crate::runner::call::bound::{call_bound_uncached, construct_bound_uncached};
use crate::runner::call::construct::ConstructTarget;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::{function_realm, FunctionCode, FunctionData};
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::function::call_script_function;
use crate::runner::eval::types::ValueResult;
use crate::runner::plugin::types::{EvalContext, NativeFn};

/// What invoking a function descriptor for one invocation kind does. Resolved once per
/// descriptor and kind.
pub enum CallTarget {
    Script,
    ClassConstructorCall,
    Native(NativeFn),
    Construct(ConstructTarget),
    NotConstructor,
    BoundCall,
    BoundConstruct,
}

impl CallTarget {
    pub fn for_call(data: &FunctionData) -> CallTarget {
        if data.flags.is_class_constructor {
            return CallTarget::ClassConstructorCall;
        }
        match &data.code {
            FunctionCode::Script(_) => CallTarget::Script,
            FunctionCode::Native(native) => CallTarget::Native(native.call),
            FunctionCode::Bound => CallTarget::BoundCall,
            FunctionCode::ClassDefault => CallTarget::ClassConstructorCall,
        }
    }

    pub fn for_construct(data: &FunctionData) -> CallTarget {
        if !data.flags.is_constructor {
            return CallTarget::NotConstructor;
        }
        match &data.code {
            FunctionCode::Bound => CallTarget::BoundConstruct,
            _ => CallTarget::Construct(ConstructTarget::new(data)),
        }
    }

    /// Invokes `function`. For construct targets `this` is ignored and `new_target` defaults to
    /// the function itself.
    pub fn invoke(
        &self,
        ctx: &mut EvalContext,
        function: &JsObjectType,
        this: JsValue,
        new_target: Option<JsValue>,
        args: Vec<JsValue>,
    ) -> ValueResult {
        match self {
            CallTarget::Script => {
                call_script_function(ctx, function, Some(this), None, args).map(|(v, _)| v)
            }
            CallTarget::ClassConstructorCall => Err(JErrorType::TypeError(format!(
                "Class constructor {} cannot be invoked without 'new'",
                function_name(function)
            ))),
            CallTarget::Native(call) => {
                let realm = function_realm(function);
                ctx.in_realm(realm, |ctx| call(ctx, this, args))
            }
            CallTarget::Construct(target) => {
                let new_target = new_target.unwrap_or_else(|| JsValue::Object(function.clone()));
                target.construct(ctx, function, new_target, args)
            }
            CallTarget::NotConstructor => Err(JErrorType::TypeError(format!(
                "{} is not a constructor",
                function_name(function)
            ))),
            CallTarget::BoundCall => call_bound_uncached(ctx, function, args),
            CallTarget::BoundConstruct => {
                construct_bound_uncached(ctx, function, new_target, args)
            }
        }
    }
}

pub(crate) fn function_name(function: &JsObjectType) -> String {
    match function.read().function_data() {
        Some(data) if !data.name.is_empty() => data.name.clone(),
        _ => "anonymous".to_string(),
    }
}
