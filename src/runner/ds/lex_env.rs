use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::JsValue;

pub type JsLexEnvironmentType = Arc<LexEnvironment>;

struct Binding {
    value: JsValue,
    mutable: bool,
    initialized: bool,
}

/// Declarative environment record plus the link to its outer environment.
pub struct LexEnvironment {
    bindings: RwLock<FxHashMap<String, Binding>>,
    pub outer: Option<JsLexEnvironmentType>,
}
impl LexEnvironment {
    pub fn new(outer: Option<JsLexEnvironmentType>) -> JsLexEnvironmentType {
        Arc::new(LexEnvironment {
            bindings: RwLock::new(FxHashMap::default()),
            outer,
        })
    }

    pub fn has_own_binding(&self, name: &str) -> bool {
        self.bindings.read().contains_key(name)
    }

    /// Whether `name` resolves here or in an outer environment.
    pub fn has_binding(&self, name: &str) -> bool {
        let mut env: &LexEnvironment = self;
        loop {
            if env.has_own_binding(name) {
                return true;
            }
            match &env.outer {
                Some(outer) => env = outer.as_ref(),
                None => return false,
            }
        }
    }

    /// Creates or replaces a binding in this record.
    pub fn declare(&self, name: &str, value: JsValue, mutable: bool) {
        self.bindings.write().insert(
            name.to_string(),
            Binding {
                value,
                mutable,
                initialized: true,
            },
        );
    }

    /// `let`/`const` hoisting: the name exists but reading it is an error until initialised.
    pub fn declare_uninitialized(&self, name: &str, mutable: bool) {
        self.bindings.write().insert(
            name.to_string(),
            Binding {
                value: JsValue::Undefined,
                mutable,
                initialized: false,
            },
        );
    }

    pub fn initialize(&self, name: &str, value: JsValue) {
        if let Some(binding) = self.bindings.write().get_mut(name) {
            binding.value = value;
            binding.initialized = true;
        }
    }

    pub fn get_binding_value(&self, name: &str) -> Result<JsValue, JErrorType> {
        let mut env: &LexEnvironment = self;
        loop {
            if let Some(binding) = env.bindings.read().get(name) {
                return if binding.initialized {
                    Ok(binding.value.clone())
                } else {
                    Err(JErrorType::ReferenceError(format!(
                        "Cannot access '{}' before initialization",
                        name
                    )))
                };
            }
            match &env.outer {
                Some(outer) => env = outer.as_ref(),
                None => {
                    return Err(JErrorType::ReferenceError(format!(
                        "{} is not defined",
                        name
                    )))
                }
            }
        }
    }

    pub fn set_mutable_binding(&self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        let mut env: &LexEnvironment = self;
        loop {
            if let Some(binding) = env.bindings.write().get_mut(name) {
                if !binding.initialized {
                    return Err(JErrorType::ReferenceError(format!(
                        "Cannot access '{}' before initialization",
                        name
                    )));
                }
                if !binding.mutable {
                    return Err(JErrorType::TypeError(
                        "Assignment to constant variable".to_string(),
                    ));
                }
                binding.value = value;
                return Ok(());
            }
            match &env.outer {
                Some(outer) => env = outer.as_ref(),
                None => {
                    return Err(JErrorType::ReferenceError(format!(
                        "{} is not defined",
                        name
                    )))
                }
            }
        }
    }
}
