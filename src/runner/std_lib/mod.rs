//! Standard library built-in objects.
//!
//! Only the builtins the call-dispatch core interacts with are provided: `Object`,
//! `Function.prototype`, `Reflect`, `Math`, `Array` with its iterator, the error constructors,
//! `Proxy` and `Symbol`.

pub mod array;
pub mod core;
pub mod error;
pub mod function;
pub mod math;
pub mod object;
pub mod proxy;
pub mod reflect;
pub mod symbol;

pub use core::register_core_builtins;
