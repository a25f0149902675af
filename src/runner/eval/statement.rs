//! Statement execution.

use crate::parser::ast::{
    CatchClauseData, ExpressionType, ProgramData, StatementType, VariableDeclarationKind,
    VariableDeclaratorData,
};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::lex_env::{JsLexEnvironmentType, LexEnvironment};
use crate::runner::ds::operations::type_conversion::to_boolean;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::expression::evaluate_expression;
use crate::runner::eval::function::instantiate_function;
use crate::runner::plugin::types::EvalContext;

use super::types::{Completion, EvalResult, Frame, ValueResult};

/// Runs a script in the global environment of the current realm. Returns the value of the last
/// expression statement executed.
pub fn execute_program(program: &ProgramData, ctx: &mut EvalContext) -> ValueResult {
    let env = ctx.realm.global_env.clone();
    ctx.push_frame(Frame {
        env: env.clone(),
        this: Some(JsValue::Undefined),
        new_target: None,
        function: None,
        home_object: None,
    })?;
    hoist_declarations(&program.body, &env, ctx);
    let completion = execute_statements(&program.body, ctx);
    ctx.pop_frame();
    Ok(match completion? {
        Completion::Normal(value) => value.unwrap_or(JsValue::Undefined),
        Completion::Return(value) => value,
    })
}

/// Hoisting for a function or script body: `var` names from the whole body, then the lexical
/// declarations of its top level.
pub fn hoist_declarations(
    body: &[StatementType],
    env: &JsLexEnvironmentType,
    ctx: &mut EvalContext,
) {
    hoist_var_names(body, env);
    hoist_lexical_declarations(body, env, ctx);
}

fn hoist_var_names(body: &[StatementType], env: &JsLexEnvironmentType) {
    for stmt in body {
        match stmt {
            StatementType::VariableDeclaration {
                kind: VariableDeclarationKind::Var,
                declarations,
                ..
            } => {
                for declarator in declarations {
                    if !env.has_own_binding(&declarator.id.name) {
                        env.declare(&declarator.id.name, JsValue::Undefined, true);
                    }
                }
            }
            StatementType::BlockStatement { body, .. } => hoist_var_names(body, env),
            StatementType::IfStatement {
                consequent,
                alternate,
                ..
            } => {
                hoist_var_names(std::slice::from_ref(consequent.as_ref()), env);
                if let Some(alternate) = alternate {
                    hoist_var_names(std::slice::from_ref(alternate.as_ref()), env);
                }
            }
            StatementType::WhileStatement { body, .. } => {
                hoist_var_names(std::slice::from_ref(body.as_ref()), env)
            }
            StatementType::TryStatement {
                block,
                handler,
                finalizer,
                ..
            } => {
                hoist_var_names(block, env);
                if let Some(handler) = handler {
                    hoist_var_names(&handler.body, env);
                }
                if let Some(finalizer) = finalizer {
                    hoist_var_names(finalizer, env);
                }
            }
            _ => {}
        }
    }
}

/// `let`/`const` names start uninitialized; function declarations are created up front.
fn hoist_lexical_declarations(
    body: &[StatementType],
    env: &JsLexEnvironmentType,
    ctx: &mut EvalContext,
) {
    for stmt in body {
        match stmt {
            StatementType::VariableDeclaration {
                kind: VariableDeclarationKind::Let,
                declarations,
                ..
            } => {
                for declarator in declarations {
                    env.declare_uninitialized(&declarator.id.name, true);
                }
            }
            StatementType::VariableDeclaration {
                kind: VariableDeclarationKind::Const,
                declarations,
                ..
            } => {
                for declarator in declarations {
                    env.declare_uninitialized(&declarator.id.name, false);
                }
            }
            StatementType::FunctionDeclaration(site) => {
                let function = instantiate_function(ctx, site, env.clone(), None);
                if let Some(id) = &site.literal.id {
                    env.declare(&id.name, JsValue::Object(function), true);
                }
            }
            _ => {}
        }
    }
}

/// Executes statements in order, stopping at the first `return`.
pub fn execute_statements(body: &[StatementType], ctx: &mut EvalContext) -> EvalResult {
    let mut last = None;
    for stmt in body {
        match execute_statement(stmt, ctx)? {
            Completion::Normal(Some(value)) => last = Some(value),
            Completion::Normal(None) => {}
            abrupt => return Ok(abrupt),
        }
    }
    Ok(Completion::Normal(last))
}

/// Execute a statement and return its completion.
pub fn execute_statement(stmt: &StatementType, ctx: &mut EvalContext) -> EvalResult {
    match stmt {
        StatementType::EmptyStatement { .. } | StatementType::FunctionDeclaration(_) => {
            Ok(Completion::normal())
        }

        StatementType::ExpressionStatement { expression, .. } => {
            let value = evaluate_expression(expression, ctx)?;
            Ok(Completion::normal_with_value(value))
        }

        StatementType::BlockStatement { body, .. } => execute_block(body, ctx),

        StatementType::ReturnStatement { argument, .. } => {
            let value = match argument {
                Some(arg) => evaluate_expression(arg, ctx)?,
                None => JsValue::Undefined,
            };
            Ok(Completion::Return(value))
        }

        StatementType::IfStatement {
            test,
            consequent,
            alternate,
            ..
        } => {
            if to_boolean(&evaluate_expression(test, ctx)?) {
                execute_statement(consequent, ctx)
            } else if let Some(alternate) = alternate {
                execute_statement(alternate, ctx)
            } else {
                Ok(Completion::normal())
            }
        }

        StatementType::WhileStatement { test, body, .. } => execute_while_statement(test, body, ctx),

        StatementType::ThrowStatement { argument, .. } => {
            let value = evaluate_expression(argument, ctx)?;
            Err(JErrorType::Thrown(value))
        }

        StatementType::TryStatement {
            block,
            handler,
            finalizer,
            ..
        } => execute_try_statement(block, handler.as_ref(), finalizer.as_deref(), ctx),

        StatementType::VariableDeclaration {
            kind, declarations, ..
        } => execute_variable_declaration(kind, declarations, ctx),
    }
}

/// Runs `body` with `env` as the innermost environment of the current frame.
fn in_scope<R>(
    ctx: &mut EvalContext,
    env: JsLexEnvironmentType,
    body: impl FnOnce(&mut EvalContext) -> R,
) -> R {
    let saved = ctx
        .frame_mut()
        .map(|frame| std::mem::replace(&mut frame.env, env));
    let result = body(ctx);
    if let (Some(saved), Some(frame)) = (saved, ctx.frame_mut()) {
        frame.env = saved;
    }
    result
}

fn execute_block(body: &[StatementType], ctx: &mut EvalContext) -> EvalResult {
    let env = LexEnvironment::new(Some(ctx.current_env()));
    hoist_lexical_declarations(body, &env, ctx);
    in_scope(ctx, env, |ctx| execute_statements(body, ctx))
}

fn execute_while_statement(
    test: &ExpressionType,
    body: &StatementType,
    ctx: &mut EvalContext,
) -> EvalResult {
    let mut last = None;
    while to_boolean(&evaluate_expression(test, ctx)?) {
        match execute_statement(body, ctx)? {
            Completion::Normal(value) => {
                if value.is_some() {
                    last = value;
                }
            }
            abrupt => return Ok(abrupt),
        }
    }
    Ok(Completion::Normal(last))
}

fn execute_variable_declaration(
    kind: &VariableDeclarationKind,
    declarations: &[VariableDeclaratorData],
    ctx: &mut EvalContext,
) -> EvalResult {
    for declarator in declarations {
        let name = declarator.id.name.as_str();
        match kind {
            VariableDeclarationKind::Var => {
                if let Some(init) = &declarator.init {
                    let value = evaluate_expression(init, ctx)?;
                    ctx.current_env().set_mutable_binding(name, value)?;
                }
            }
            VariableDeclarationKind::Let | VariableDeclarationKind::Const => {
                let value = match &declarator.init {
                    Some(init) => evaluate_expression(init, ctx)?,
                    None => JsValue::Undefined,
                };
                let mutable = matches!(kind, VariableDeclarationKind::Let);
                ctx.current_env().declare(name, value, mutable);
            }
        }
    }
    Ok(Completion::normal())
}

/// A `finally` block that completes abruptly overrides the try/catch result.
fn execute_try_statement(
    block: &[StatementType],
    handler: Option<&CatchClauseData>,
    finalizer: Option<&[StatementType]>,
    ctx: &mut EvalContext,
) -> EvalResult {
    let result = match (execute_block(block, ctx), handler) {
        (Err(error), Some(handler)) => execute_catch(error, handler, ctx),
        (other, _) => other,
    };
    match finalizer {
        Some(finalizer) => match execute_block(finalizer, ctx)? {
            Completion::Normal(_) => result,
            abrupt => Ok(abrupt),
        },
        None => result,
    }
}

fn execute_catch(
    error: JErrorType,
    handler: &CatchClauseData,
    ctx: &mut EvalContext,
) -> EvalResult {
    let thrown = error.into_thrown_value(&ctx.realm);
    let env = LexEnvironment::new(Some(ctx.current_env()));
    if let Some(param) = &handler.param {
        env.declare(&param.name, thrown, true);
    }
    hoist_lexical_declarations(&handler.body, &env, ctx);
    in_scope(ctx, env, |ctx| execute_statements(&handler.body, ctx))
}
