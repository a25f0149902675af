use std::sync::Arc;

use crate::runner::ds::function_object::FunctionData;
use crate::runner::ds::interop::HostValue;
use crate::runner::ds::object::ObjectType;
use crate::runner::ds::value::JsValue;

/// Dispatch category of a callee. Stable for the lifetime of the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalleeKind {
    Function,
    BoundFunction,
    CallableProxy,
    NonCallableProxy,
    Foreign,
    HostClass,
    HostMethod,
    HostPackage,
    NoSuchMethodAdapter,
    NotCallable,
}

impl CalleeKind {
    pub fn is_function(&self) -> bool {
        matches!(self, CalleeKind::Function | CalleeKind::BoundFunction)
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self, CalleeKind::CallableProxy | CalleeKind::NonCallableProxy)
    }

    /// Values only the generic fallback node handles.
    pub fn is_fallback(&self) -> bool {
        matches!(
            self,
            CalleeKind::HostClass
                | CalleeKind::HostMethod
                | CalleeKind::HostPackage
                | CalleeKind::NotCallable
        )
    }
}

fn kind_of(object: &ObjectType) -> CalleeKind {
    match object {
        ObjectType::Function(_) => CalleeKind::Function,
        ObjectType::BoundFunction(_) => CalleeKind::BoundFunction,
        ObjectType::Proxy(p) if p.callable => CalleeKind::CallableProxy,
        ObjectType::Proxy(_) => CalleeKind::NonCallableProxy,
        _ => CalleeKind::NotCallable,
    }
}

pub fn classify(value: &JsValue) -> CalleeKind {
    match value {
        JsValue::Object(o) => kind_of(&o.read()),
        JsValue::Foreign(_) => CalleeKind::Foreign,
        JsValue::Host(HostValue::Class(_)) => CalleeKind::HostClass,
        JsValue::Host(HostValue::Method(_)) => CalleeKind::HostMethod,
        JsValue::Host(HostValue::Package(_)) => CalleeKind::HostPackage,
        JsValue::NoSuchMethod(_) => CalleeKind::NoSuchMethodAdapter,
        _ => CalleeKind::NotCallable,
    }
}

/// What the cache guards test, computed once per dispatch under a single read lock.
pub struct CalleeProbe {
    pub kind: CalleeKind,
    /// Descriptor of an ordinary or bound function callee.
    pub data: Option<Arc<FunctionData>>,
    /// The callee is the foreign receiver of a member call.
    pub foreign_receiver: bool,
}

impl CalleeProbe {
    pub fn of(callee: &JsValue, this: &JsValue, member_site: bool) -> Self {
        let (kind, data) = match callee {
            JsValue::Object(o) => {
                let guard = o.read();
                (kind_of(&guard), guard.function_data().cloned())
            }
            other => (classify(other), None),
        };
        let foreign_receiver = member_site
            && match (callee, this) {
                (JsValue::Foreign(c), JsValue::Foreign(t)) => Arc::ptr_eq(c, t),
                _ => false,
            };
        CalleeProbe {
            kind,
            data,
            foreign_receiver,
        }
    }

    pub fn data_is(&self, data: &Arc<FunctionData>) -> bool {
        self.data.as_ref().map_or(false, |d| Arc::ptr_eq(d, data))
    }
}
