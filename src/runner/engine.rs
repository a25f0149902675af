//! Runtime-context object shared by every thread and realm of one interpreter instance.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::runner::ds::function_object::{FunctionCode, FunctionData, FunctionFlags};
use crate::runner::ds::realm::Realm;
use crate::runner::plugin::config::EngineConfig;
use crate::runner::plugin::registry::BuiltInRegistry;

pub struct Engine {
    config: EngineConfig,
    registry: BuiltInRegistry,
    /// Builtin descriptors by qualified name, e.g. `"Math.abs"`. Shared by all realms.
    builtin_data: Mutex<FxHashMap<String, Arc<FunctionData>>>,
    /// Bound-function descriptors keyed on the target's constructor and async flags.
    bound_data: Mutex<FxHashMap<(bool, bool), Arc<FunctionData>>>,
    realms: Mutex<Vec<Arc<Realm>>>,
    next_realm_id: AtomicUsize,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Arc<Engine> {
        Engine::with_registry(config, BuiltInRegistry::with_core())
    }

    pub fn with_registry(config: EngineConfig, registry: BuiltInRegistry) -> Arc<Engine> {
        Arc::new(Engine {
            config,
            registry,
            builtin_data: Mutex::new(FxHashMap::default()),
            bound_data: Mutex::new(FxHashMap::default()),
            realms: Mutex::new(Vec::new()),
            next_realm_id: AtomicUsize::new(0),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &BuiltInRegistry {
        &self.registry
    }

    /// Creates a realm with freshly installed builtins. The engine keeps it alive.
    pub fn create_realm(self: &Arc<Self>) -> Arc<Realm> {
        let id = self.next_realm_id.fetch_add(1, Ordering::Relaxed);
        let realm = Realm::new(self, id);
        self.realms.lock().push(realm.clone());
        realm
    }

    pub fn realm_count(&self) -> usize {
        self.realms.lock().len()
    }

    /// Descriptor of the builtin `key`, created by `make` on first request.
    pub fn builtin_function_data(
        &self,
        key: &str,
        make: impl FnOnce() -> FunctionData,
    ) -> Arc<FunctionData> {
        let mut table = self.builtin_data.lock();
        if let Some(data) = table.get(key) {
            return data.clone();
        }
        let data = Arc::new(make());
        table.insert(key.to_string(), data.clone());
        data
    }

    /// Descriptor shared by all bound functions whose target has the given flags.
    pub fn bound_function_data(&self, is_constructor: bool, is_async: bool) -> Arc<FunctionData> {
        self.bound_data
            .lock()
            .entry((is_constructor, is_async))
            .or_insert_with(|| {
                Arc::new(FunctionData::new(
                    "bound",
                    0,
                    FunctionFlags {
                        is_constructor,
                        is_async,
                        is_bound: true,
                        ..FunctionFlags::default()
                    },
                    FunctionCode::Bound,
                ))
            })
            .clone()
    }
}
