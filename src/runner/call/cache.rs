//! The per-site cache chain and its specialization state machine.

use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::runner::call::bound::{BoundInstance, DynamicBound};
use crate::runner::call::classify::CalleeProbe;
use crate::runner::call::fallback::{invoke_fallback, OverloadCache};
use crate::runner::call::foreign::{invoke_foreign, ForeignInvoke};
use crate::runner::call::proxy::invoke_proxy;
use crate::runner::call::published::Published;
use crate::runner::call::target::CallTarget;
use crate::runner::call::{
    invoke_function_generic, not_callable_error, CalleeKind, Invocation, InvocationKind,
};
use crate::runner::ds::function_object::FunctionData;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::types::ValueResult;
use crate::runner::plugin::config::EngineConfig;
use crate::runner::plugin::types::{EvalContext, InlineOutcome, InlinedFn};

/// Tag of a node, for introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheNodeKind {
    FunctionInstance,
    SharedFunction,
    BoundInstance,
    DynamicBound,
    InlinedBuiltin,
    /// An inlined builtin that hit its precondition and now always calls.
    DemotedBuiltin,
    Proxy,
    ForeignExecute,
    ForeignInvoke,
    ForeignInstantiate,
    NoSuchMethod,
    GenericFunction,
    GenericFallback,
}

impl CacheNodeKind {
    /// Counted against `function_cache_limit`.
    pub fn is_cached(&self) -> bool {
        matches!(
            self,
            CacheNodeKind::FunctionInstance
                | CacheNodeKind::SharedFunction
                | CacheNodeKind::BoundInstance
                | CacheNodeKind::DynamicBound
                | CacheNodeKind::InlinedBuiltin
                | CacheNodeKind::DemotedBuiltin
        )
    }

    pub fn is_generic(&self) -> bool {
        matches!(
            self,
            CacheNodeKind::GenericFunction | CacheNodeKind::GenericFallback
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Uninitialized,
    Monomorphic,
    Polymorphic,
    Megamorphic,
}

pub enum InlineKey {
    Instance(JsObjectType),
    Shared(Arc<FunctionData>),
}

/// Runs a trivial builtin body without a frame until the body first asks for a real call.
pub struct InlinedBuiltin {
    key: InlineKey,
    data: Arc<FunctionData>,
    body: InlinedFn,
    target: Arc<CallTarget>,
    demoted: AtomicBool,
}

impl InlinedBuiltin {
    fn new(key: InlineKey, data: Arc<FunctionData>, body: InlinedFn) -> Self {
        let target = data.call_target();
        InlinedBuiltin {
            key,
            data,
            body,
            target,
            demoted: AtomicBool::new(false),
        }
    }

    pub fn is_demoted(&self) -> bool {
        self.demoted.load(Ordering::Acquire)
    }

    fn accepts(&self, probe: &CalleeProbe, callee: &JsValue) -> bool {
        if probe.kind != CalleeKind::Function {
            return false;
        }
        match &self.key {
            InlineKey::Instance(function) => callee.is_same_object(function),
            InlineKey::Shared(data) => probe.data_is(data),
        }
    }

    fn execute(&self, ctx: &mut EvalContext, site: &CallCache, inv: Invocation) -> ValueResult {
        if !self.is_demoted() {
            match (self.body)(&inv.this, &inv.args) {
                InlineOutcome::Value(value) => return Ok(value),
                InlineOutcome::RewriteToCall => {
                    if !self.demoted.swap(true, Ordering::AcqRel) {
                        debug!(
                            site = site.expression(),
                            kind = ?CacheNodeKind::DemotedBuiltin,
                            builtin = self.data.name.as_str(),
                            "inlined builtin demoted"
                        );
                    }
                }
            }
        }
        let function = match &inv.callee {
            JsValue::Object(o) => o.clone(),
            _ => unreachable!("inlined builtin on a non-object"),
        };
        self.target.invoke(ctx, &function, inv.this, None, inv.args)
    }
}

/// Redirects adapter calls to the receiver's `__noSuchMethod__` through a nested call cache.
pub struct NoSuchMethodEntry {
    inner: CallCache,
}

impl NoSuchMethodEntry {
    pub fn inner(&self) -> &CallCache {
        &self.inner
    }

    fn execute(&self, ctx: &mut EvalContext, site: &CallCache, inv: Invocation) -> ValueResult {
        let adapter = match &inv.callee {
            JsValue::NoSuchMethod(adapter) if site.kind() == InvocationKind::Call => adapter.clone(),
            _ => {
                return Err(not_callable_error(
                    site.kind(),
                    &inv.callee,
                    Some(site.expression()),
                ))
            }
        };
        let mut args = Vec::with_capacity(inv.args.len() + 1);
        args.push(JsValue::String(adapter.key.clone()));
        args.extend(inv.args);
        self.inner.dispatch(
            ctx,
            Invocation::call(adapter.this.clone(), adapter.handler.clone(), args),
        )
    }
}

pub enum CacheEntry {
    FunctionInstance {
        function: JsObjectType,
        data: Arc<FunctionData>,
        target: Arc<CallTarget>,
    },
    SharedFunction {
        data: Arc<FunctionData>,
        target: Arc<CallTarget>,
    },
    BoundInstance(BoundInstance),
    DynamicBound(DynamicBound),
    InlinedBuiltin(InlinedBuiltin),
    Proxy,
    ForeignExecute,
    ForeignInvoke(ForeignInvoke),
    ForeignInstantiate,
    NoSuchMethod(NoSuchMethodEntry),
    GenericFunction,
    GenericFallback(OverloadCache),
}

impl CacheEntry {
    pub fn kind(&self) -> CacheNodeKind {
        match self {
            CacheEntry::FunctionInstance { .. } => CacheNodeKind::FunctionInstance,
            CacheEntry::SharedFunction { .. } => CacheNodeKind::SharedFunction,
            CacheEntry::BoundInstance(_) => CacheNodeKind::BoundInstance,
            CacheEntry::DynamicBound(_) => CacheNodeKind::DynamicBound,
            CacheEntry::InlinedBuiltin(i) if i.is_demoted() => CacheNodeKind::DemotedBuiltin,
            CacheEntry::InlinedBuiltin(_) => CacheNodeKind::InlinedBuiltin,
            CacheEntry::Proxy => CacheNodeKind::Proxy,
            CacheEntry::ForeignExecute => CacheNodeKind::ForeignExecute,
            CacheEntry::ForeignInvoke(_) => CacheNodeKind::ForeignInvoke,
            CacheEntry::ForeignInstantiate => CacheNodeKind::ForeignInstantiate,
            CacheEntry::NoSuchMethod(_) => CacheNodeKind::NoSuchMethod,
            CacheEntry::GenericFunction => CacheNodeKind::GenericFunction,
            CacheEntry::GenericFallback(_) => CacheNodeKind::GenericFallback,
        }
    }

    pub fn accepts(&self, probe: &CalleeProbe, callee: &JsValue) -> bool {
        match self {
            CacheEntry::FunctionInstance { function, .. } => {
                probe.kind == CalleeKind::Function && callee.is_same_object(function)
            }
            CacheEntry::SharedFunction { data, .. } => {
                probe.kind == CalleeKind::Function && probe.data_is(data)
            }
            CacheEntry::BoundInstance(b) => {
                probe.kind == CalleeKind::BoundFunction && callee.is_same_object(&b.function)
            }
            CacheEntry::DynamicBound(d) => {
                probe.kind == CalleeKind::BoundFunction && probe.data_is(&d.data)
            }
            CacheEntry::InlinedBuiltin(i) => i.accepts(probe, callee),
            CacheEntry::Proxy => probe.kind.is_proxy(),
            CacheEntry::ForeignExecute => probe.kind == CalleeKind::Foreign && !probe.foreign_receiver,
            CacheEntry::ForeignInvoke(_) => probe.kind == CalleeKind::Foreign && probe.foreign_receiver,
            CacheEntry::ForeignInstantiate => probe.kind == CalleeKind::Foreign,
            CacheEntry::NoSuchMethod(_) => probe.kind == CalleeKind::NoSuchMethodAdapter,
            CacheEntry::GenericFunction => probe.kind.is_function(),
            CacheEntry::GenericFallback(_) => probe.kind.is_fallback(),
        }
    }

    pub(crate) fn execute(
        &self,
        ctx: &mut EvalContext,
        site: &CallCache,
        inv: Invocation,
    ) -> ValueResult {
        let kind = site.kind();
        match self {
            CacheEntry::FunctionInstance {
                function, target, ..
            } => {
                let (this, new_target) = inv.receiver_for(kind);
                target.invoke(ctx, function, this, new_target, inv.args)
            }
            CacheEntry::SharedFunction { target, .. } => {
                let function = match &inv.callee {
                    JsValue::Object(o) => o.clone(),
                    _ => unreachable!("shared function node on a non-object"),
                };
                let (this, new_target) = inv.receiver_for(kind);
                target.invoke(ctx, &function, this, new_target, inv.args)
            }
            CacheEntry::BoundInstance(b) => b.execute(ctx, site, inv),
            CacheEntry::DynamicBound(d) => d.execute(ctx, inv),
            CacheEntry::InlinedBuiltin(i) => i.execute(ctx, site, inv),
            CacheEntry::Proxy => invoke_proxy(ctx, kind, inv, Some(site.expression())),
            CacheEntry::ForeignExecute | CacheEntry::ForeignInstantiate => invoke_foreign(kind, inv),
            CacheEntry::ForeignInvoke(f) => f.execute(ctx, inv, site.expression()),
            CacheEntry::NoSuchMethod(n) => n.execute(ctx, site, inv),
            CacheEntry::GenericFunction => invoke_function_generic(ctx, kind, inv),
            CacheEntry::GenericFallback(overloads) => {
                invoke_fallback(ctx, kind, inv, Some(site.expression()), Some(overloads))
            }
        }
    }

    /// Descriptor of a node keyed on one function object.
    pub fn instance_data(&self) -> Option<&Arc<FunctionData>> {
        match self {
            CacheEntry::FunctionInstance { data, .. } => Some(data),
            CacheEntry::BoundInstance(b) => Some(&b.data),
            CacheEntry::InlinedBuiltin(InlinedBuiltin {
                key: InlineKey::Instance(_),
                data,
                ..
            }) => Some(data),
            _ => None,
        }
    }
}

/// Builds the specialized entry for an ordinary or bound function callee.
pub(crate) fn create_callable_entry(
    function: &JsObjectType,
    data: &Arc<FunctionData>,
    kind: InvocationKind,
    on_instance: bool,
    config: &EngineConfig,
    expression: &str,
) -> CacheEntry {
    if data.flags.is_bound {
        if on_instance {
            if let Some(bound) = BoundInstance::build(function, data, kind, config, expression) {
                return CacheEntry::BoundInstance(bound);
            }
        }
        return CacheEntry::DynamicBound(DynamicBound::new(data.clone(), kind, expression));
    }
    if config.inline_trivial_builtins && kind == InvocationKind::Call {
        if let Some(body) = data.inlined() {
            let key = if on_instance {
                InlineKey::Instance(function.clone())
            } else {
                InlineKey::Shared(data.clone())
            };
            return CacheEntry::InlinedBuiltin(InlinedBuiltin::new(key, data.clone(), body));
        }
    }
    let target = data.target_for(kind);
    if on_instance {
        CacheEntry::FunctionInstance {
            function: function.clone(),
            data: data.clone(),
            target,
        }
    } else {
        CacheEntry::SharedFunction {
            data: data.clone(),
            target,
        }
    }
}

pub struct CacheNode {
    pub entry: Arc<CacheEntry>,
    pub next: Option<Arc<CacheNode>>,
}

fn nodes_of(head: &Option<Arc<CacheNode>>) -> Vec<Arc<CacheNode>> {
    let mut nodes = Vec::new();
    let mut cursor = head.clone();
    while let Some(node) = cursor {
        cursor = node.next.clone();
        nodes.push(node);
    }
    nodes
}

fn link(
    entries: impl DoubleEndedIterator<Item = Arc<CacheEntry>>,
    tail: Option<Arc<CacheNode>>,
) -> Option<Arc<CacheNode>> {
    entries
        .rev()
        .fold(tail, |next, entry| Some(Arc::new(CacheNode { entry, next })))
}

/// New chain with the node at `index` replaced. Nodes after it are shared with the old chain.
fn replace_at(
    head: &Option<Arc<CacheNode>>,
    index: usize,
    entry: Arc<CacheEntry>,
) -> Option<Arc<CacheNode>> {
    let nodes = nodes_of(head);
    let replaced = Some(Arc::new(CacheNode {
        entry,
        next: nodes[index].next.clone(),
    }));
    link(nodes[..index].iter().map(|n| n.entry.clone()), replaced)
}

/// The chain without its cached nodes, in the same order.
fn drop_cached_nodes(head: &Option<Arc<CacheNode>>) -> Option<Arc<CacheNode>> {
    let kept: Vec<_> = nodes_of(head)
        .into_iter()
        .filter(|n| !n.entry.kind().is_cached())
        .map(|n| n.entry.clone())
        .collect();
    link(kept.into_iter(), None)
}

fn transition(entry: &CacheEntry) -> &'static str {
    match entry {
        CacheEntry::FunctionInstance { .. } | CacheEntry::BoundInstance(_) => {
            "instance node installed"
        }
        CacheEntry::InlinedBuiltin(InlinedBuiltin {
            key: InlineKey::Instance(_),
            ..
        }) => "instance node installed",
        CacheEntry::SharedFunction { .. }
        | CacheEntry::DynamicBound(_)
        | CacheEntry::InlinedBuiltin(_) => "shared node installed",
        CacheEntry::GenericFunction => "promoted to generic function",
        CacheEntry::GenericFallback(_) => "generic fallback installed",
        _ => "uncached node installed",
    }
}

/// Inline cache of one call site.
pub struct CallCache {
    kind: InvocationKind,
    head: Published<CacheNode>,
    lock: Mutex<()>,
    expression: String,
    property_key: Option<String>,
}

impl CallCache {
    pub fn new(
        kind: InvocationKind,
        expression: impl Into<String>,
        property_key: Option<String>,
    ) -> Self {
        CallCache {
            kind,
            head: Published::new(),
            lock: Mutex::new(()),
            expression: expression.into(),
            property_key,
        }
    }

    pub fn kind(&self) -> InvocationKind {
        self.kind
    }

    /// Source text of the callee expression.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn property_key(&self) -> Option<&str> {
        self.property_key.as_deref()
    }

    pub fn dispatch(&self, ctx: &mut EvalContext, inv: Invocation) -> ValueResult {
        let probe = CalleeProbe::of(&inv.callee, &inv.this, self.property_key.is_some());
        let mut cursor = self.head.load();
        while let Some(node) = cursor {
            if node.entry.accepts(&probe, &inv.callee) {
                return node.entry.execute(ctx, self, inv);
            }
            cursor = node.next.clone();
        }
        let engine = ctx.engine.clone();
        let entry = self.specialize(engine.config(), &probe, &inv.callee);
        if !entry.accepts(&probe, &inv.callee) {
            unreachable!("inconsistent guard at {}", self.expression);
        }
        entry.execute(ctx, self, inv)
    }

    fn specialize(
        &self,
        config: &EngineConfig,
        probe: &CalleeProbe,
        callee: &JsValue,
    ) -> Arc<CacheEntry> {
        let _guard = self.lock.lock();
        let head = self.head.load();
        let mut cached = 0;
        let mut has_generic = false;
        let mut cursor = head.clone();
        while let Some(node) = cursor {
            if node.entry.accepts(probe, callee) {
                return node.entry.clone();
            }
            let kind = node.entry.kind();
            if kind.is_cached() {
                cached += 1;
            }
            if kind.is_generic() {
                has_generic = true;
            }
            cursor = node.next.clone();
        }

        let (entry, new_head) = match (probe.kind.is_function(), callee, &probe.data) {
            (true, JsValue::Object(function), Some(data))
                if cached < config.function_cache_limit && !has_generic =>
            {
                if config.instance_caching() {
                    let nodes = nodes_of(&head);
                    let existing = nodes.iter().position(|n| {
                        n.entry
                            .instance_data()
                            .map_or(false, |d| Arc::ptr_eq(d, data))
                    });
                    if let Some(index) = existing {
                        let replacement = Arc::new(match &*nodes[index].entry {
                            CacheEntry::FunctionInstance { data, target, .. } => {
                                CacheEntry::SharedFunction {
                                    data: data.clone(),
                                    target: target.clone(),
                                }
                            }
                            _ => create_callable_entry(
                                function,
                                data,
                                self.kind,
                                false,
                                config,
                                &self.expression,
                            ),
                        });
                        self.head.publish(replace_at(&head, index, replacement.clone()));
                        debug!(
                            site = self.expression.as_str(),
                            depth = cached,
                            kind = ?replacement.kind(),
                            "instance node upgraded to shared"
                        );
                        return replacement;
                    }
                    let entry = Arc::new(create_callable_entry(
                        function,
                        data,
                        self.kind,
                        true,
                        config,
                        &self.expression,
                    ));
                    (entry.clone(), link(std::iter::once(entry), head))
                } else {
                    let entry = Arc::new(create_callable_entry(
                        function,
                        data,
                        self.kind,
                        false,
                        config,
                        &self.expression,
                    ));
                    (entry.clone(), link(std::iter::once(entry), head))
                }
            }
            (true, _, _) => {
                let entry = Arc::new(CacheEntry::GenericFunction);
                (entry.clone(), link(std::iter::once(entry), drop_cached_nodes(&head)))
            }
            (false, _, _) => {
                let entry = Arc::new(self.uncached_entry(probe));
                let tail = if entry.kind().is_generic() {
                    drop_cached_nodes(&head)
                } else {
                    head
                };
                (entry.clone(), link(std::iter::once(entry), tail))
            }
        };
        self.head.publish(new_head);
        debug!(
            site = self.expression.as_str(),
            depth = cached,
            kind = ?entry.kind(),
            "{}",
            transition(&entry)
        );
        entry
    }

    fn uncached_entry(&self, probe: &CalleeProbe) -> CacheEntry {
        match probe.kind {
            CalleeKind::CallableProxy | CalleeKind::NonCallableProxy => CacheEntry::Proxy,
            CalleeKind::Foreign if self.kind.is_construct() => CacheEntry::ForeignInstantiate,
            CalleeKind::Foreign if probe.foreign_receiver => {
                CacheEntry::ForeignInvoke(ForeignInvoke::new(
                    self.property_key.clone().unwrap_or_default(),
                ))
            }
            CalleeKind::Foreign => CacheEntry::ForeignExecute,
            CalleeKind::NoSuchMethodAdapter => CacheEntry::NoSuchMethod(NoSuchMethodEntry {
                inner: CallCache::new(InvocationKind::Call, self.expression.as_str(), None),
            }),
            _ => CacheEntry::GenericFallback(OverloadCache::new()),
        }
    }

    /// Node kinds from head to tail.
    pub fn snapshot(&self) -> Vec<CacheNodeKind> {
        nodes_of(&self.head.load())
            .iter()
            .map(|n| n.entry.kind())
            .collect()
    }

    pub fn cached_count(&self) -> usize {
        self.snapshot().iter().filter(|k| k.is_cached()).count()
    }

    /// Classified by the head node.
    pub fn state(&self) -> CacheState {
        let kinds = self.snapshot();
        if kinds.is_empty() {
            CacheState::Uninitialized
        } else if kinds[0].is_generic() {
            CacheState::Megamorphic
        } else if kinds.len() > 1 {
            CacheState::Polymorphic
        } else {
            CacheState::Monomorphic
        }
    }

    /// Entry at `index` from the head.
    pub fn entry_at(&self, index: usize) -> Option<Arc<CacheEntry>> {
        nodes_of(&self.head.load())
            .get(index)
            .map(|n| n.entry.clone())
    }
}

impl Debug for CallCache {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallCache")
            .field("kind", &self.kind)
            .field("expression", &self.expression)
            .field("nodes", &self.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::error::JErrorType;

    fn noop(_: &mut EvalContext, _: JsValue, _: Vec<JsValue>) -> Result<JsValue, JErrorType> {
        Ok(JsValue::Undefined)
    }

    fn shared() -> Arc<CacheEntry> {
        let data = Arc::new(FunctionData::new_native("f", 0, noop, None, None));
        let target = data.call_target();
        Arc::new(CacheEntry::SharedFunction { data, target })
    }

    fn kinds(head: &Option<Arc<CacheNode>>) -> Vec<CacheNodeKind> {
        nodes_of(head).iter().map(|n| n.entry.kind()).collect()
    }

    #[test]
    fn dropping_cached_nodes_keeps_uncached_order() {
        let head = link(
            vec![
                shared(),
                Arc::new(CacheEntry::Proxy),
                shared(),
                Arc::new(CacheEntry::ForeignExecute),
            ]
            .into_iter(),
            None,
        );
        assert_eq!(
            kinds(&drop_cached_nodes(&head)),
            vec![CacheNodeKind::Proxy, CacheNodeKind::ForeignExecute]
        );
    }

    #[test]
    fn replacing_a_node_shares_the_suffix() {
        let head = link(
            vec![shared(), shared(), Arc::new(CacheEntry::Proxy)].into_iter(),
            None,
        );
        let old = nodes_of(&head);
        let new_head = replace_at(&head, 1, Arc::new(CacheEntry::GenericFunction));
        let new = nodes_of(&new_head);
        assert_eq!(
            kinds(&new_head),
            vec![
                CacheNodeKind::SharedFunction,
                CacheNodeKind::GenericFunction,
                CacheNodeKind::Proxy
            ]
        );
        assert!(Arc::ptr_eq(&old[2], &new[2]));
        assert!(!Arc::ptr_eq(&old[0], &new[0]));
        assert!(Arc::ptr_eq(&old[0].entry, &new[0].entry));
    }

    #[test]
    fn fresh_cache_is_uninitialized() {
        let cache = CallCache::new(InvocationKind::Call, "f", None);
        assert_eq!(cache.state(), CacheState::Uninitialized);
        assert!(cache.snapshot().is_empty());
        assert_eq!(cache.cached_count(), 0);
    }
}
