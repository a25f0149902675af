//! AST of the interpreted language.
//!
//! There is no parser: embedders and tests assemble trees directly. Each node carries a [`Meta`]
//! with the source text it stands for, so diagnostics can quote the callee expression.
//!
//! [`Meta`]: ast::Meta

pub mod ast;
