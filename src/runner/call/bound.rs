//! Bound-function unwrapping.

use std::sync::Arc;

use crate::runner::call::cache::{create_callable_entry, CacheEntry, CallCache};
use crate::runner::call::{call_value, construct_with_new_target, Invocation, InvocationKind};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::{bound_layer, FunctionData};
use crate::runner::ds::object::{JsObjectType, ObjectType};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::types::ValueResult;
use crate::runner::plugin::config::EngineConfig;
use crate::runner::plugin::types::EvalContext;

/// Node for one bound function object with its chain resolved up front.
///
/// For `Call` and `New` every layer is collapsed. For `NewTarget` only the outer layer is, since
/// each layer has to compare the new-target with itself at call time.
pub struct BoundInstance {
    pub(crate) function: JsObjectType,
    pub(crate) data: Arc<FunctionData>,
    target: JsObjectType,
    /// Effective `this` for `Call`. Unused when constructing.
    this: JsValue,
    prefix: Vec<JsValue>,
    inner: Box<CacheEntry>,
}

impl BoundInstance {
    /// `None` when the chain does not end in an ordinary function object.
    pub(crate) fn build(
        function: &JsObjectType,
        data: &Arc<FunctionData>,
        kind: InvocationKind,
        config: &EngineConfig,
        expression: &str,
    ) -> Option<BoundInstance> {
        let layer = bound_layer(function)?;
        let mut this = layer.bound_this;
        let mut prefix = layer.bound_args;
        let mut target = layer.target;
        if kind != InvocationKind::NewTarget {
            while let Some(inner) = target.as_object().and_then(bound_layer) {
                this = inner.bound_this;
                let mut args = inner.bound_args;
                args.extend(prefix);
                prefix = args;
                target = inner.target;
            }
        }
        let target = target.as_object()?.clone();
        let target_data = {
            let guard = target.read();
            match &*guard {
                ObjectType::Function(f) => f.data.clone(),
                ObjectType::BoundFunction(b) if kind == InvocationKind::NewTarget => b.data.clone(),
                _ => return None,
            }
        };
        let inner = create_callable_entry(&target, &target_data, kind, true, config, expression);
        Some(BoundInstance {
            function: function.clone(),
            data: data.clone(),
            target,
            this,
            prefix,
            inner: Box::new(inner),
        })
    }

    pub(crate) fn execute(
        &self,
        ctx: &mut EvalContext,
        site: &CallCache,
        inv: Invocation,
    ) -> ValueResult {
        let mut args = Vec::with_capacity(self.prefix.len() + inv.args.len());
        args.extend(self.prefix.iter().cloned());
        args.extend(inv.args);
        let callee = JsValue::Object(self.target.clone());
        let next = match site.kind() {
            InvocationKind::Call => Invocation::call(self.this.clone(), callee, args),
            InvocationKind::New => Invocation::construct(callee, args),
            InvocationKind::NewTarget => {
                let new_target = match inv.new_target {
                    Some(nt) if !nt.is_same_object(&self.function) => nt,
                    _ => callee.clone(),
                };
                Invocation::construct_with_new_target(callee, new_target, args)
            }
        };
        self.inner.execute(ctx, site, next)
    }
}

/// Node shared by all bound functions with one descriptor. Unwraps one layer per call and
/// dispatches the next through its own cache.
pub struct DynamicBound {
    pub(crate) data: Arc<FunctionData>,
    inner: CallCache,
}

impl DynamicBound {
    pub(crate) fn new(data: Arc<FunctionData>, kind: InvocationKind, expression: &str) -> Self {
        DynamicBound {
            data,
            inner: CallCache::new(kind, expression, None),
        }
    }

    pub fn inner(&self) -> &CallCache {
        &self.inner
    }

    pub(crate) fn execute(&self, ctx: &mut EvalContext, inv: Invocation) -> ValueResult {
        let function = match &inv.callee {
            JsValue::Object(o) => o.clone(),
            _ => unreachable!("bound dispatch on a non-object"),
        };
        let layer = match bound_layer(&function) {
            Some(layer) => layer,
            None => unreachable!("bound dispatch on an unbound function"),
        };
        let mut args = layer.bound_args;
        args.extend(inv.args);
        let next = match self.inner.kind() {
            InvocationKind::Call => Invocation::call(layer.bound_this, layer.target, args),
            InvocationKind::New => Invocation::construct(layer.target, args),
            InvocationKind::NewTarget => {
                let new_target = match inv.new_target {
                    Some(nt) if !nt.is_same_object(&function) => nt,
                    _ => layer.target.clone(),
                };
                Invocation::construct_with_new_target(layer.target, new_target, args)
            }
        };
        self.inner.dispatch(ctx, next)
    }
}

/// `[[Call]]` of a bound function outside any cache.
pub(crate) fn call_bound_uncached(
    ctx: &mut EvalContext,
    function: &JsObjectType,
    args: Vec<JsValue>,
) -> ValueResult {
    let layer = bound_layer(function)
        .ok_or_else(|| JErrorType::TypeError("not a bound function".to_string()))?;
    let mut full = layer.bound_args;
    full.extend(args);
    call_value(ctx, &layer.target, layer.bound_this, full)
}

/// `[[Construct]]` of a bound function outside any cache.
pub(crate) fn construct_bound_uncached(
    ctx: &mut EvalContext,
    function: &JsObjectType,
    new_target: Option<JsValue>,
    args: Vec<JsValue>,
) -> ValueResult {
    let layer = bound_layer(function)
        .ok_or_else(|| JErrorType::TypeError("not a bound function".to_string()))?;
    let mut full = layer.bound_args;
    full.extend(args);
    let new_target = match new_target {
        Some(nt) if !nt.is_same_object(function) => nt,
        _ => layer.target.clone(),
    };
    construct_with_new_target(ctx, &layer.target, full, new_target)
}
