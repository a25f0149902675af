//! Core types for the evaluation engine.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::value::JsValue;

/// Result of evaluating an expression.
pub type ValueResult = Result<JsValue, JErrorType>;

/// Result of executing a statement.
pub type EvalResult = Result<Completion, JErrorType>;

/// Completion record. Abrupt throw completions travel as `Err`.
#[derive(Debug, Clone)]
pub enum Completion {
    /// Execution continues. Carries the value of the last expression statement, if any.
    Normal(Option<JsValue>),
    /// A `return` unwinding to the function boundary.
    Return(JsValue),
}

impl Completion {
    pub fn normal() -> Self {
        Completion::Normal(None)
    }

    pub fn normal_with_value(value: JsValue) -> Self {
        Completion::Normal(Some(value))
    }

    pub fn is_abrupt(&self) -> bool {
        matches!(self, Completion::Return(_))
    }
}

/// Activation record of an interpreted function.
pub struct Frame {
    pub env: JsLexEnvironmentType,
    /// `None` until a derived constructor calls `super(...)`.
    pub this: Option<JsValue>,
    pub new_target: Option<JsValue>,
    pub function: Option<JsObjectType>,
    pub home_object: Option<JsObjectType>,
}
