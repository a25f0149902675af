//! Builtin registry, execution context and engine configuration.
//!
//! Builtins are described once, as [`BuiltInObject`] definitions in a [`BuiltInRegistry`], and
//! materialised into every realm the [`Engine`](crate::runner::engine::Engine) creates. The
//! function descriptors behind those builtins are created once per engine and shared by all
//! realms, so a call site that sees `Math.abs` from two realms sees the same descriptor.
//!
//! ## Example: Custom builtin
//!
//! ```
//! use just_dispatch::runner::ds::value::JsValue;
//! use just_dispatch::runner::engine::Engine;
//! use just_dispatch::runner::plugin::registry::BuiltInRegistry;
//! use just_dispatch::runner::plugin::types::{BuiltInObject, EvalContext};
//! use just_dispatch::runner::ds::error::JErrorType;
//!
//! fn double(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
//!     match args.first() {
//!         Some(JsValue::Number(n)) => Ok(JsValue::from_f64(n.as_f64() * 2.0)),
//!         _ => Ok(JsValue::Undefined),
//!     }
//! }
//!
//! let mut registry = BuiltInRegistry::with_core();
//! registry.register_object(BuiltInObject::new("Utils").add_method("double", 1, double));
//! let engine = Engine::with_registry(Default::default(), registry);
//! let ctx = EvalContext::with_engine(engine);
//! assert!(ctx.get_binding("Utils").is_ok());
//! ```

pub mod config;
pub mod registry;
pub mod types;

pub use config::{ConfigError, EngineConfig};
pub use registry::BuiltInRegistry;
pub use types::{BuiltInObject, EvalContext, InlineOutcome, NativeFn, PluginInfo};
