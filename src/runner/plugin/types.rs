//! Core types shared by the evaluator, the builtins and the call-dispatch core.

use std::sync::Arc;

use crate::parser::ast::ProgramData;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;
use crate::runner::engine::Engine;
use crate::runner::eval::statement::execute_program;
use crate::runner::eval::types::{Frame, ValueResult};

/// Per-thread execution state. The engine and realms are shared; frames are not.
pub struct EvalContext {
    pub engine: Arc<Engine>,
    /// Realm of the code currently running. Switched on entry to a function of another realm.
    pub realm: Arc<Realm>,
    pub(crate) frames: Vec<Frame>,
}

impl EvalContext {
    /// Fresh engine with the default configuration and one realm.
    pub fn new() -> Self {
        EvalContext::with_engine(Engine::new(Default::default()))
    }

    pub fn with_engine(engine: Arc<Engine>) -> Self {
        let realm = engine.create_realm();
        EvalContext::with_realm(engine, realm)
    }

    pub fn with_realm(engine: Arc<Engine>, realm: Arc<Realm>) -> Self {
        EvalContext {
            engine,
            realm,
            frames: Vec::new(),
        }
    }

    /// Environment that identifier lookups start from.
    pub fn current_env(&self) -> JsLexEnvironmentType {
        match self.frames.last() {
            Some(frame) => frame.env.clone(),
            None => self.realm.global_env.clone(),
        }
    }

    pub fn call_depth(&self) -> usize {
        self.frames.len()
    }

    pub fn get_binding(&self, name: &str) -> Result<JsValue, JErrorType> {
        self.current_env().get_binding_value(name)
    }

    /// Defines `name` both as a global binding and as a property of the global object.
    pub fn define_global(&mut self, name: &str, value: JsValue) {
        self.realm.define_global(name, value);
    }

    pub fn run_program(&mut self, program: &ProgramData) -> ValueResult {
        execute_program(program, self)
    }

    pub(crate) fn push_frame(&mut self, frame: Frame) -> Result<(), JErrorType> {
        if self.frames.len() >= self.engine.config().max_call_depth {
            return Err(JErrorType::RangeError(
                "Maximum call stack size exceeded".to_string(),
            ));
        }
        self.frames.push(frame);
        Ok(())
    }

    pub(crate) fn pop_frame(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    pub(crate) fn frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub(crate) fn frame_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    /// Runs `body` with `realm` as the current realm, restoring the previous one afterwards.
    pub(crate) fn in_realm<R>(
        &mut self,
        realm: Option<Arc<Realm>>,
        body: impl FnOnce(&mut EvalContext) -> R,
    ) -> R {
        match realm {
            Some(realm) if !Arc::ptr_eq(&realm, &self.realm) => {
                let caller = std::mem::replace(&mut self.realm, realm);
                let result = body(self);
                self.realm = caller;
                result
            }
            _ => body(self),
        }
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Function signature for built-in methods.
/// Native functions receive the evaluation context, `this` value, and arguments.
pub type NativeFn =
    fn(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType>;

/// `[[Construct]]` of a builtin. Receives the new-target instead of a receiver and produces the
/// object itself.
pub type NativeConstructFn = fn(
    ctx: &mut EvalContext,
    new_target: &JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType>;

/// Body of a builtin that can run without a frame: no calls out, no errors.
pub type InlinedFn = fn(this: &JsValue, args: &[JsValue]) -> InlineOutcome;

/// Result of an inlined builtin body.
#[derive(Debug)]
pub enum InlineOutcome {
    Value(JsValue),
    /// The inlined form cannot handle these arguments; the caller must run the real call.
    RewriteToCall,
}

/// A builtin method before it is materialised into a realm.
pub struct BuiltInMethod {
    pub name: String,
    pub length: usize,
    pub call: NativeFn,
    pub inlined: Option<InlinedFn>,
}

pub struct BuiltInConstructor {
    pub length: usize,
    pub call: NativeFn,
    pub construct: Option<NativeConstructFn>,
}

/// Built-in object definition.
/// Represents a JavaScript built-in object like Array, Object, Math, etc.
pub struct BuiltInObject {
    /// Name of the object (e.g., "Array", "Object", "Math").
    pub name: String,

    /// Name of the object whose prototype is the parent of this one's prototype.
    pub prototype: Option<String>,

    /// Methods defined on the object itself.
    pub methods: Vec<BuiltInMethod>,

    /// Methods defined on its prototype object.
    pub prototype_methods: Vec<BuiltInMethod>,

    /// Static properties.
    pub properties: Vec<(PropertyKey, JsValue)>,

    pub prototype_properties: Vec<(PropertyKey, JsValue)>,

    /// Constructor function, if this object is constructable.
    pub constructor: Option<BuiltInConstructor>,

    /// Whether the object is bound as a global.
    pub global: bool,
}

impl BuiltInObject {
    /// Create a new built-in object with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        BuiltInObject {
            name: name.into(),
            prototype: Some("Object".to_string()),
            methods: Vec::new(),
            prototype_methods: Vec::new(),
            properties: Vec::new(),
            prototype_properties: Vec::new(),
            constructor: None,
            global: true,
        }
    }

    /// Set the prototype chain parent.
    pub fn with_prototype(mut self, prototype: impl Into<String>) -> Self {
        self.prototype = Some(prototype.into());
        self
    }

    /// Installed without a global binding, e.g. `%ArrayIteratorPrototype%`.
    pub fn with_no_global(mut self) -> Self {
        self.global = false;
        self
    }

    /// Add a native method.
    pub fn add_method(mut self, name: impl Into<String>, length: usize, func: NativeFn) -> Self {
        self.methods.push(BuiltInMethod {
            name: name.into(),
            length,
            call: func,
            inlined: None,
        });
        self
    }

    /// Add a native method that also has a frameless inlined form.
    pub fn add_inlined_method(
        mut self,
        name: impl Into<String>,
        length: usize,
        func: NativeFn,
        inlined: InlinedFn,
    ) -> Self {
        self.methods.push(BuiltInMethod {
            name: name.into(),
            length,
            call: func,
            inlined: Some(inlined),
        });
        self
    }

    pub fn add_prototype_method(
        mut self,
        name: impl Into<String>,
        length: usize,
        func: NativeFn,
    ) -> Self {
        self.prototype_methods.push(BuiltInMethod {
            name: name.into(),
            length,
            call: func,
            inlined: None,
        });
        self
    }

    /// Add a property.
    pub fn add_property(mut self, key: impl Into<PropertyKey>, value: JsValue) -> Self {
        self.properties.push((key.into(), value));
        self
    }

    pub fn add_prototype_property(mut self, key: impl Into<PropertyKey>, value: JsValue) -> Self {
        self.prototype_properties.push((key.into(), value));
        self
    }

    /// Set the constructor function.
    pub fn with_constructor(
        mut self,
        length: usize,
        call: NativeFn,
        construct: Option<NativeConstructFn>,
    ) -> Self {
        self.constructor = Some(BuiltInConstructor {
            length,
            call,
            construct,
        });
        self
    }

    /// Whether installing this object creates a prototype object.
    pub fn has_prototype_object(&self) -> bool {
        self.constructor.is_some()
            || !self.prototype_methods.is_empty()
            || !self.prototype_properties.is_empty()
    }
}

/// Plugin metadata.
/// Contains information about a loaded plugin.
#[derive(Debug, Clone)]
pub struct PluginInfo {
    /// Plugin name.
    pub name: String,

    /// Plugin version.
    pub version: String,

    /// List of object names this plugin provides.
    pub provides: Vec<String>,
}

impl PluginInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        PluginInfo {
            name: name.into(),
            version: version.into(),
            provides: Vec::new(),
        }
    }

    pub fn with_provides(mut self, provides: Vec<String>) -> Self {
        self.provides = provides;
        self
    }
}
