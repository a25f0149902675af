//! Calls into the foreign-object bridge.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::runner::call::{call_value, Invocation, InvocationKind};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::interop::InteropError;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::types::ValueResult;
use crate::runner::plugin::types::EvalContext;

/// `execute` for calls, `instantiate` for `new` and `super(...)`.
pub(crate) fn invoke_foreign(kind: InvocationKind, inv: Invocation) -> ValueResult {
    let foreign = match &inv.callee {
        JsValue::Foreign(f) => f.clone(),
        _ => unreachable!("foreign dispatch on a script value"),
    };
    let result = if kind.is_construct() {
        foreign.instantiate(&inv.args)
    } else {
        foreign.execute(&inv.args)
    };
    result.map_err(Into::into)
}

/// `receiver.key(...)` on a foreign receiver. Starts out sending `invoke_member` directly and
/// switches to asking `is_member_invocable` first after the receiver rejects the message once.
pub struct ForeignInvoke {
    key: String,
    optimistic: AtomicBool,
}

impl ForeignInvoke {
    pub fn new(key: String) -> Self {
        ForeignInvoke {
            key,
            optimistic: AtomicBool::new(true),
        }
    }

    pub fn is_optimistic(&self) -> bool {
        self.optimistic.load(Ordering::Acquire)
    }

    pub(crate) fn execute(
        &self,
        ctx: &mut EvalContext,
        inv: Invocation,
        expression: &str,
    ) -> ValueResult {
        let receiver = match &inv.this {
            JsValue::Foreign(f) => f.clone(),
            _ => unreachable!("foreign member call without a foreign receiver"),
        };
        if receiver.is_null() {
            return Err(JErrorType::TypeError(format!(
                "Cannot read property '{}' of null",
                self.key
            )));
        }
        if self.is_optimistic() {
            match receiver.invoke_member(&self.key, &inv.args) {
                Err(InteropError::UnknownIdentifier(_)) | Err(InteropError::UnsupportedMessage(_)) => {
                    self.optimistic.store(false, Ordering::Release);
                    debug!(
                        site = expression,
                        key = self.key.as_str(),
                        "foreign member invocation turned pessimistic"
                    );
                }
                other => return other.map_err(Into::into),
            }
        } else if receiver.is_member_invocable(&self.key) {
            return receiver.invoke_member(&self.key, &inv.args).map_err(Into::into);
        }
        let member = match receiver.read_member(&self.key) {
            Ok(value) => value,
            Err(InteropError::UnknownIdentifier(_)) => JsValue::Undefined,
            Err(e) => return Err(e.into()),
        };
        match member {
            JsValue::Foreign(f) => f.execute(&inv.args).map_err(Into::into),
            JsValue::Undefined => Err(JErrorType::TypeError(format!(
                "{} is not a function",
                expression
            ))),
            callable => call_value(ctx, &callable, inv.this, inv.args),
        }
    }
}
