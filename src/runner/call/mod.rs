//! Adaptive call dispatch.
//!
//! Every call, `new` and `super(...)` expression owns a [`CallSite`](site::CallSite), and every
//! site owns a [`CallCache`]: a singly linked chain of specialized nodes, each guarding on a
//! property of the callee and knowing how to invoke it. The chain is read without locks and
//! rewritten under a per-site lock.
//!
//! ```text
//! head -> [instance: f#1] -> [shared: g] -> [proxy] -> None
//!            newest                            uncached nodes sit near the tail
//! ```
//!
//! Once a site has seen more distinct functions than
//! [`function_cache_limit`](crate::runner::plugin::config::EngineConfig::function_cache_limit),
//! the function nodes collapse into a single generic node. Values that are not functions at all
//! end at the generic fallback node, which handles host interop and raises "is not a function".
//!
//! [`call_value`], [`construct_value`] and [`construct_with_new_target`] run the same semantics
//! without a cache, for builtins and internal callers.

pub mod arguments;
pub mod bound;
pub mod cache;
pub mod classify;
pub mod construct;
pub mod fallback;
pub mod foreign;
pub mod proxy;
pub mod published;
pub mod site;
pub mod target;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::safe_to_string;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::types::ValueResult;
use crate::runner::plugin::types::EvalContext;

pub use cache::{CacheNodeKind, CacheState, CallCache};
pub use classify::{classify, CalleeKind};
pub use site::CallSite;

/// How a site invokes its callee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationKind {
    /// `f(...)` and `o.m(...)`.
    Call,
    /// `new F(...)`. The new-target is the callee.
    New,
    /// `super(...)` and `Reflect.construct`: the new-target is supplied separately.
    NewTarget,
}

impl InvocationKind {
    pub fn is_construct(&self) -> bool {
        !matches!(self, InvocationKind::Call)
    }
}

/// Operands of one dispatch.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub this: JsValue,
    pub callee: JsValue,
    pub new_target: Option<JsValue>,
    pub args: Vec<JsValue>,
}

impl Invocation {
    pub fn call(this: JsValue, callee: JsValue, args: Vec<JsValue>) -> Self {
        Invocation {
            this,
            callee,
            new_target: None,
            args,
        }
    }

    pub fn construct(callee: JsValue, args: Vec<JsValue>) -> Self {
        Invocation {
            this: JsValue::Undefined,
            callee,
            new_target: None,
            args,
        }
    }

    pub fn construct_with_new_target(
        callee: JsValue,
        new_target: JsValue,
        args: Vec<JsValue>,
    ) -> Self {
        Invocation {
            this: JsValue::Undefined,
            callee,
            new_target: Some(new_target),
            args,
        }
    }

    /// `this` and new-target as the callee's body sees them for `kind`.
    pub fn receiver_for(&self, kind: InvocationKind) -> (JsValue, Option<JsValue>) {
        match kind {
            InvocationKind::Call => (self.this.clone(), None),
            InvocationKind::New => (JsValue::Undefined, Some(self.callee.clone())),
            InvocationKind::NewTarget => (
                JsValue::Undefined,
                Some(
                    self.new_target
                        .clone()
                        .unwrap_or_else(|| self.callee.clone()),
                ),
            ),
        }
    }
}

pub fn perform_call(
    ctx: &mut EvalContext,
    cache: &CallCache,
    this: JsValue,
    callee: JsValue,
    args: Vec<JsValue>,
) -> ValueResult {
    debug_assert_eq!(cache.kind(), InvocationKind::Call);
    cache.dispatch(ctx, Invocation::call(this, callee, args))
}

pub fn perform_construct(
    ctx: &mut EvalContext,
    cache: &CallCache,
    callee: JsValue,
    args: Vec<JsValue>,
) -> ValueResult {
    debug_assert_eq!(cache.kind(), InvocationKind::New);
    cache.dispatch(ctx, Invocation::construct(callee, args))
}

pub fn perform_construct_with_new_target(
    ctx: &mut EvalContext,
    cache: &CallCache,
    callee: JsValue,
    new_target: JsValue,
    args: Vec<JsValue>,
) -> ValueResult {
    debug_assert_eq!(cache.kind(), InvocationKind::NewTarget);
    cache.dispatch(
        ctx,
        Invocation::construct_with_new_target(callee, new_target, args),
    )
}

/// `Call(F, V, args)` without a call-site cache.
pub fn call_value(
    ctx: &mut EvalContext,
    callee: &JsValue,
    this: JsValue,
    args: Vec<JsValue>,
) -> ValueResult {
    invoke_uncached(
        ctx,
        InvocationKind::Call,
        Invocation::call(this, callee.clone(), args),
        None,
    )
}

/// `Construct(F, args)` without a call-site cache.
pub fn construct_value(ctx: &mut EvalContext, callee: &JsValue, args: Vec<JsValue>) -> ValueResult {
    invoke_uncached(
        ctx,
        InvocationKind::New,
        Invocation::construct(callee.clone(), args),
        None,
    )
}

/// `Construct(F, args, newTarget)` without a call-site cache.
pub fn construct_with_new_target(
    ctx: &mut EvalContext,
    callee: &JsValue,
    args: Vec<JsValue>,
    new_target: JsValue,
) -> ValueResult {
    invoke_uncached(
        ctx,
        InvocationKind::NewTarget,
        Invocation::construct_with_new_target(callee.clone(), new_target, args),
        None,
    )
}

/// Dispatch through the generic path of every category.
pub(crate) fn invoke_uncached(
    ctx: &mut EvalContext,
    kind: InvocationKind,
    inv: Invocation,
    expression: Option<&str>,
) -> ValueResult {
    match classify(&inv.callee) {
        CalleeKind::Function | CalleeKind::BoundFunction => {
            invoke_function_generic(ctx, kind, inv)
        }
        CalleeKind::CallableProxy | CalleeKind::NonCallableProxy => {
            proxy::invoke_proxy(ctx, kind, inv, expression)
        }
        CalleeKind::Foreign => foreign::invoke_foreign(kind, inv),
        CalleeKind::NoSuchMethodAdapter => match &inv.callee {
            JsValue::NoSuchMethod(adapter) if kind == InvocationKind::Call => {
                let mut args = Vec::with_capacity(inv.args.len() + 1);
                args.push(JsValue::String(adapter.key.clone()));
                args.extend(inv.args);
                call_value(ctx, &adapter.handler, adapter.this.clone(), args)
            }
            _ => Err(not_callable_error(kind, &inv.callee, expression)),
        },
        CalleeKind::HostClass
        | CalleeKind::HostMethod
        | CalleeKind::HostPackage
        | CalleeKind::NotCallable => fallback::invoke_fallback(ctx, kind, inv, expression, None),
    }
}

/// Indirect call through the descriptor's target for `kind`. The callee must be an ordinary or
/// bound function.
pub(crate) fn invoke_function_generic(
    ctx: &mut EvalContext,
    kind: InvocationKind,
    inv: Invocation,
) -> ValueResult {
    let function = match &inv.callee {
        JsValue::Object(o) => o.clone(),
        _ => unreachable!("generic function dispatch on a non-object"),
    };
    let target = match function.read().function_data() {
        Some(data) => data.target_for(kind),
        None => unreachable!("generic function dispatch on a non-function"),
    };
    let (this, new_target) = inv.receiver_for(kind);
    target.invoke(ctx, &function, this, new_target, inv.args)
}

/// "X is not a function" or "X is not a constructor", naming the callee by its source text when
/// known.
pub(crate) fn not_callable_error(
    kind: InvocationKind,
    callee: &JsValue,
    expression: Option<&str>,
) -> JErrorType {
    let name = match expression {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => safe_to_string(callee),
    };
    if kind.is_construct() {
        JErrorType::TypeError(format!("{} is not a constructor", name))
    } else {
        JErrorType::TypeError(format!("{} is not a function", name))
    }
}
