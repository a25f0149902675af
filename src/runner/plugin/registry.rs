//! Built-in registry for managing built-in objects.

use rustc_hash::FxHashMap;
use thiserror::Error;

use super::types::{BuiltInMethod, BuiltInObject, PluginInfo};
use crate::runner::plugin::types::NativeFn;
use crate::runner::std_lib::register_core_builtins;

/// Error type for registry operations.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Object not found in registry.
    #[error("Object not found: {0}")]
    ObjectNotFound(String),
    /// Method not found on object.
    #[error("Method not found: {0}.{1}")]
    MethodNotFound(String, String),
}

/// Registry for built-in objects.
/// Objects are installed into every realm in registration order, so a parent must be registered
/// before the objects naming it as their prototype.
pub struct BuiltInRegistry {
    objects: Vec<BuiltInObject>,
    index: FxHashMap<String, usize>,
    plugins: Vec<PluginInfo>,
}

impl BuiltInRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        BuiltInRegistry {
            objects: Vec::new(),
            index: FxHashMap::default(),
            plugins: Vec::new(),
        }
    }

    /// Create a registry with the core built-ins.
    pub fn with_core() -> Self {
        let mut registry = Self::new();
        register_core_builtins(&mut registry);
        let provides = registry.objects.iter().map(|o| o.name.clone()).collect();
        registry
            .plugins
            .push(PluginInfo::new("core", "0.1.0").with_provides(provides));
        registry
    }

    /// Register a built-in object. Registering a name again replaces the earlier definition in
    /// place.
    pub fn register_object(&mut self, obj: BuiltInObject) {
        match self.index.get(&obj.name) {
            Some(&i) => self.objects[i] = obj,
            None => {
                self.index.insert(obj.name.clone(), self.objects.len());
                self.objects.push(obj);
            }
        }
    }

    /// Get a registered object by name.
    pub fn get_object(&self, name: &str) -> Option<&BuiltInObject> {
        self.index.get(name).map(|&i| &self.objects[i])
    }

    /// Override an existing static method.
    pub fn override_method(
        &mut self,
        object: &str,
        method: &str,
        func: NativeFn,
    ) -> Result<(), PluginError> {
        let i = *self
            .index
            .get(object)
            .ok_or_else(|| PluginError::ObjectNotFound(object.to_string()))?;
        let slot: &mut BuiltInMethod = self.objects[i]
            .methods
            .iter_mut()
            .find(|m| m.name == method)
            .ok_or_else(|| PluginError::MethodNotFound(object.to_string(), method.to_string()))?;
        slot.call = func;
        slot.inlined = None;
        Ok(())
    }

    /// Check if an object exists in the registry.
    pub fn has_object(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn objects(&self) -> &[BuiltInObject] {
        &self.objects
    }

    pub fn loaded_plugins(&self) -> &[PluginInfo] {
        &self.plugins
    }
}

impl Default for BuiltInRegistry {
    fn default() -> Self {
        Self::with_core()
    }
}
