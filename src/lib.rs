//! # just-dispatch - adaptive call dispatch for a JavaScript interpreter
//!
//! A tree-walking interpreter core built around per-call-site inline caches:
//! - Every call, `new` and `super(...)` expression owns a cache chain of specialized nodes
//! - Nodes specialize on function instances, shared function descriptors, bound functions,
//!   trivial builtins, proxies, foreign objects and host classes
//! - Sites that see too many distinct functions collapse into a single generic node
//! - Chains are read lock-free and may be shared by several threads and realms
//!
//! ## Quick Start
//!
//! ### Calling through a cache
//!
//! ```
//! use just_dispatch::runner::call::{perform_call, CacheNodeKind, CallCache, InvocationKind};
//! use just_dispatch::runner::ds::object_property::PropertyKey;
//! use just_dispatch::runner::ds::operations::object::get_v;
//! use just_dispatch::runner::ds::value::JsValue;
//! use just_dispatch::runner::plugin::types::EvalContext;
//!
//! let mut ctx = EvalContext::new();
//! let math = ctx.get_binding("Math").unwrap();
//! let abs = get_v(&mut ctx, &math, &PropertyKey::from("abs")).unwrap();
//!
//! let cache = CallCache::new(InvocationKind::Call, "abs", None);
//! let result = perform_call(&mut ctx, &cache, math, abs, vec![JsValue::from_i64(-4)]).unwrap();
//! assert_eq!(result, JsValue::from_i64(4));
//! assert_eq!(cache.snapshot(), vec![CacheNodeKind::InlinedBuiltin]);
//! ```
//!
//! ### Running a program
//!
//! Programs are assembled from [`parser::ast`] nodes and run with
//! [`EvalContext::run_program`](runner::plugin::types::EvalContext::run_program). Call sites are
//! built with [`CallSite::call`](runner::call::CallSite::call),
//! [`CallSite::new_expression`](runner::call::CallSite::new_expression) and
//! [`CallSite::super_call`](runner::call::CallSite::super_call); their caches persist for as long
//! as the tree does, so running the same tree again reuses what the first run learned.
//!
//! ## Configuration
//!
//! Cache limits and interop switches live in
//! [`EngineConfig`](runner::plugin::config::EngineConfig), which loads from TOML:
//!
//! ```
//! use just_dispatch::runner::engine::Engine;
//! use just_dispatch::runner::plugin::config::EngineConfig;
//! use just_dispatch::runner::plugin::types::EvalContext;
//!
//! let config = EngineConfig::from_toml_str("[dispatch]\nfunction_cache_limit = 2").unwrap();
//! let ctx = EvalContext::with_engine(Engine::new(config));
//! assert_eq!(ctx.engine.config().function_cache_limit, 2);
//! ```
//!
//! ## Architecture
//!
//! - **[`parser`]** - AST types
//! - **[`runner`]** - Execution
//!   - **[`runner::call`]** - Call sites, cache chains and the constructor protocol
//!   - **[`runner::ds`]** - Data structures (values, objects, shapes, realms, interop)
//!   - **[`runner::eval`]** - Tree-walking interpreter
//!   - **[`runner::plugin`]** - Builtin registry, execution context and configuration
//!   - **[`runner::std_lib`]** - Builtins

#[macro_use]
extern crate lazy_static;

pub mod parser;
pub mod runner;
