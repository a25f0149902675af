//! Tree-walking evaluator. Calls, `new` and `super(...)` are handed to the call sites in
//! [`crate::runner::call`].

pub mod expression;
pub mod function;
pub mod statement;
pub mod types;

pub use types::{Completion, EvalResult, ValueResult};
