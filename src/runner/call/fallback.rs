//! Last node of a chain: host classes, host methods, host packages, and the "is not a function"
//! error for everything else.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::runner::call::{not_callable_error, Invocation, InvocationKind};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::interop::{HostClass, HostList, HostMethod, HostOverload, HostType, HostValue};
use crate::runner::ds::operations::object::array_elements;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::types::ValueResult;
use crate::runner::plugin::types::EvalContext;

/// Signatures remembered per fallback node.
pub const OVERLOAD_CACHE_CAPACITY: usize = 64;

/// Host class or method an overload was resolved against. The cache holds it, so its address
/// stays unique while the entry lives.
#[derive(Clone)]
pub enum OverloadOwner {
    Class(Arc<HostClass>),
    Method(Arc<HostMethod>),
}

impl OverloadOwner {
    fn address(&self) -> usize {
        match self {
            OverloadOwner::Class(c) => Arc::as_ptr(c) as *const () as usize,
            OverloadOwner::Method(m) => Arc::as_ptr(m) as *const () as usize,
        }
    }

    fn is(&self, other: &OverloadOwner) -> bool {
        match (self, other) {
            (OverloadOwner::Class(a), OverloadOwner::Class(b)) => Arc::ptr_eq(a, b),
            (OverloadOwner::Method(a), OverloadOwner::Method(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Maps an owner and a coarse argument signature to the index of the overload chosen for it.
pub struct OverloadCache {
    entries: RwLock<FxHashMap<(usize, Vec<HostType>), (OverloadOwner, usize)>>,
}

impl OverloadCache {
    pub fn new() -> Self {
        OverloadCache {
            entries: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn resolve(
        &self,
        owner: &OverloadOwner,
        overloads: &[HostOverload],
        args: &[JsValue],
    ) -> Option<usize> {
        let key = (
            owner.address(),
            args.iter().map(HostType::of).collect::<Vec<_>>(),
        );
        if let Some((held, index)) = self.entries.read().get(&key) {
            if held.is(owner) && *index < overloads.len() {
                return Some(*index);
            }
        }
        let index = select_overload(overloads, &key.1)?;
        let mut entries = self.entries.write();
        if entries.len() < OVERLOAD_CACHE_CAPACITY || entries.contains_key(&key) {
            entries.insert(key, (owner.clone(), index));
        }
        Some(index)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for OverloadCache {
    fn default() -> Self {
        Self::new()
    }
}

fn select_overload(overloads: &[HostOverload], signature: &[HostType]) -> Option<usize> {
    overloads.iter().position(|o| o.matches(signature))
}

fn resolve_overload(
    cache: Option<&OverloadCache>,
    owner: &OverloadOwner,
    overloads: &[HostOverload],
    args: &[JsValue],
) -> Option<usize> {
    match cache {
        Some(cache) => cache.resolve(owner, overloads, args),
        None => {
            let signature: Vec<HostType> = args.iter().map(HostType::of).collect();
            select_overload(overloads, &signature)
        }
    }
}

/// Script arrays cross into host calls as host lists. Everything else passes unchanged.
pub fn flatten_argument(value: JsValue) -> JsValue {
    match array_elements(&value) {
        Some(items) => JsValue::Foreign(Arc::new(HostList { items })),
        None => value,
    }
}

fn construct_host_class(
    class: &Arc<HostClass>,
    args: Vec<JsValue>,
    overloads: Option<&OverloadCache>,
) -> ValueResult {
    if !class.is_public {
        return Err(JErrorType::TypeError(format!(
            "new cannot be used with non-public java type {}",
            class.name
        )));
    }
    let extended;
    let effective: &HostClass = if class.is_abstract {
        extended = class.extend();
        &extended
    } else {
        class
    };
    let args: Vec<JsValue> = args.into_iter().map(flatten_argument).collect();
    let owner = OverloadOwner::Class(class.clone());
    let constructor = resolve_overload(overloads, &owner, &effective.constructors, &args)
        .and_then(|index| effective.constructors.get(index))
        .ok_or_else(|| {
            JErrorType::TypeError(format!(
                "no constructor of {} takes these arguments",
                effective.name
            ))
        })?;
    (constructor.invoke)(None, &args).map_err(Into::into)
}

pub(crate) fn invoke_fallback(
    ctx: &mut EvalContext,
    kind: InvocationKind,
    inv: Invocation,
    expression: Option<&str>,
    overloads: Option<&OverloadCache>,
) -> ValueResult {
    if !ctx.engine.config().host_interop {
        return Err(not_callable_error(kind, &inv.callee, expression));
    }
    match &inv.callee {
        JsValue::Host(HostValue::Class(class)) if kind.is_construct() => {
            construct_host_class(class, inv.args, overloads)
        }
        JsValue::Host(HostValue::Method(method)) if !kind.is_construct() => {
            let args: Vec<JsValue> = inv.args.into_iter().map(flatten_argument).collect();
            let owner = OverloadOwner::Method(method.clone());
            let overload = resolve_overload(overloads, &owner, &method.overloads, &args)
                .and_then(|index| method.overloads.get(index))
                .ok_or_else(|| {
                    JErrorType::TypeError(format!(
                        "no overload of {} takes these arguments",
                        method.name
                    ))
                })?;
            let receiver = if method.is_static {
                None
            } else {
                Some(&inv.this)
            };
            (overload.invoke)(receiver, &args).map_err(Into::into)
        }
        JsValue::Host(HostValue::Package(package)) => {
            Err(JErrorType::ClassNotFound(package.name.clone()))
        }
        _ => Err(not_callable_error(kind, &inv.callee, expression)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overload(parameters: Vec<HostType>, tag: i64) -> HostOverload {
        HostOverload::new(
            parameters,
            Arc::new(move |_: Option<&JsValue>, _: &[JsValue]| Ok(JsValue::from_i64(tag))),
        )
    }

    fn method(overloads: Vec<HostOverload>) -> Arc<HostMethod> {
        Arc::new(HostMethod {
            name: "m".to_string(),
            is_static: true,
            overloads,
        })
    }

    #[test]
    fn resolution_is_remembered_per_signature() {
        let m = method(vec![
            overload(vec![HostType::String], 1),
            overload(vec![HostType::Number], 2),
        ]);
        let owner = OverloadOwner::Method(m.clone());
        let cache = OverloadCache::new();
        assert_eq!(cache.resolve(&owner, &m.overloads, &[JsValue::from_i64(3)]), Some(1));
        assert_eq!(cache.resolve(&owner, &m.overloads, &[JsValue::from_i64(4)]), Some(1));
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.resolve(&owner, &m.overloads, &[JsValue::new_string("x")]),
            Some(0)
        );
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn cached_entries_keep_their_owner_alive() {
        let m = method(vec![overload(vec![HostType::Number], 1)]);
        let cache = OverloadCache::new();
        cache.resolve(
            &OverloadOwner::Method(m.clone()),
            &m.overloads,
            &[JsValue::from_i64(1)],
        );
        assert_eq!(Arc::strong_count(&m), 2);
    }

    #[test]
    fn stale_index_is_resolved_again() {
        let m = method(vec![
            overload(vec![HostType::String], 1),
            overload(vec![HostType::Number], 2),
        ]);
        let owner = OverloadOwner::Method(m.clone());
        let cache = OverloadCache::new();
        assert_eq!(cache.resolve(&owner, &m.overloads, &[JsValue::from_i64(3)]), Some(1));
        let shorter = vec![overload(vec![HostType::Number], 3)];
        assert_eq!(cache.resolve(&owner, &shorter, &[JsValue::from_i64(3)]), Some(0));
    }

    #[test]
    fn unmatched_signatures_are_not_cached() {
        let m = method(vec![overload(vec![HostType::Boolean], 1)]);
        let cache = OverloadCache::new();
        assert_eq!(cache.resolve(&OverloadOwner::Method(m.clone()), &m.overloads, &[]), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn cache_stops_growing_at_capacity() {
        let overloads = vec![overload(vec![HostType::Any], 1)];
        let cache = OverloadCache::new();
        for _ in 0..OVERLOAD_CACHE_CAPACITY + 10 {
            let owner = OverloadOwner::Method(method(overloads.clone()));
            assert_eq!(cache.resolve(&owner, &overloads, &[JsValue::Null]), Some(0));
        }
        assert_eq!(cache.len(), OVERLOAD_CACHE_CAPACITY);
    }

    #[test]
    fn only_arrays_are_flattened() {
        assert_eq!(flatten_argument(JsValue::from_i64(1)), JsValue::from_i64(1));
        assert_eq!(flatten_argument(JsValue::Null), JsValue::Null);
    }
}
