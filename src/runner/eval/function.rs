//! Entering interpreted functions and creating closures and classes.

use std::sync::Arc;

use crate::parser::ast::{ClassData, FunctionLiteral, FunctionLiteralKind, FunctionSite};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::{new_function_object, FunctionCode, FunctionData, FunctionFlags};
use crate::runner::ds::lex_env::{JsLexEnvironmentType, LexEnvironment};
use crate::runner::ds::object::{JsObjectType, ObjectType};
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyKey};
use crate::runner::ds::operations::object::{get, is_constructor, ordinary_object_create};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::expression::evaluate_expression;
use crate::runner::eval::statement::{execute_statements, hoist_declarations};
use crate::runner::eval::types::{Completion, Frame, ValueResult};
use crate::runner::plugin::types::EvalContext;

/// Runs the body of an interpreted function.
///
/// `this` is `None` only for derived constructors, which receive their receiver from
/// `super(...)`. Returns the completion value together with the final `this`, which a constructor
/// needs to decide the result of `new`.
pub fn call_script_function(
    ctx: &mut EvalContext,
    function: &JsObjectType,
    this: Option<JsValue>,
    new_target: Option<JsValue>,
    args: Vec<JsValue>,
) -> Result<(JsValue, Option<JsValue>), JErrorType> {
    let (literal, environment, realm, home_object) = match &*function.read() {
        ObjectType::Function(f) => match &f.data.code {
            FunctionCode::Script(literal) => (
                literal.clone(),
                f.environment.clone(),
                f.realm.upgrade(),
                f.home_object.clone(),
            ),
            _ => unreachable!("script entry into a native function"),
        },
        _ => unreachable!("script entry into a non-function"),
    };
    let env = LexEnvironment::new(environment);
    bind_parameters(&env, &literal, args);
    ctx.push_frame(Frame {
        env: env.clone(),
        this,
        new_target,
        function: Some(function.clone()),
        home_object,
    })?;
    let completion = ctx.in_realm(realm, |ctx| {
        hoist_declarations(&literal.body, &env, ctx);
        execute_statements(&literal.body, ctx)
    });
    let frame = ctx.pop_frame();
    let value = match completion? {
        Completion::Return(value) => value,
        Completion::Normal(_) => JsValue::Undefined,
    };
    Ok((value, frame.and_then(|f| f.this)))
}

/// Missing arguments bind `undefined`; extra ones are dropped.
fn bind_parameters(env: &JsLexEnvironmentType, literal: &FunctionLiteral, args: Vec<JsValue>) {
    let mut args = args.into_iter();
    for param in &literal.params {
        env.declare(&param.name, args.next().unwrap_or(JsValue::Undefined), true);
    }
}

/// Creates a closure over `env` for a function literal. Plain functions get a fresh `prototype`
/// object linked back through `constructor`.
pub fn instantiate_function(
    ctx: &mut EvalContext,
    site: &FunctionSite,
    env: JsLexEnvironmentType,
    home_object: Option<JsObjectType>,
) -> JsObjectType {
    let data = site.descriptor(FunctionData::from_literal);
    let function = new_function_object(
        data,
        &ctx.realm.intrinsics.function_prototype,
        Arc::downgrade(&ctx.realm),
        Some(env),
        home_object,
    );
    if site.literal.kind == FunctionLiteralKind::Normal {
        let prototype = ctx.realm.new_plain_object();
        prototype.write().as_js_object_mut().define_own_property(
            PropertyKey::from("constructor"),
            PropertyDescriptor::new_hidden(JsValue::Object(function.clone())),
        );
        define_prototype_property(&function, prototype, true);
    }
    function
}

fn define_prototype_property(function: &JsObjectType, prototype: JsObjectType, writable: bool) {
    function.write().as_js_object_mut().define_own_property(
        PropertyKey::from("prototype"),
        PropertyDescriptor::Data {
            value: JsValue::Object(prototype),
            writable,
            enumerable: false,
            configurable: false,
        },
    );
}

/// `class [id] [extends super_class] { ... }`.
pub fn evaluate_class(class: &ClassData, ctx: &mut EvalContext) -> ValueResult {
    let (prototype_parent, constructor_parent) = match &class.super_class {
        None => (
            Some(ctx.realm.intrinsics.object_prototype.clone()),
            ctx.realm.intrinsics.function_prototype.clone(),
        ),
        Some(expr) => {
            let parent = evaluate_expression(expr, ctx)?;
            match &parent {
                JsValue::Null => (None, ctx.realm.intrinsics.function_prototype.clone()),
                JsValue::Object(o) if is_constructor(&parent) => {
                    let proto = get(ctx, o, &PropertyKey::from("prototype"), &parent)?;
                    match proto {
                        JsValue::Object(p) => (Some(p), o.clone()),
                        JsValue::Null => (None, o.clone()),
                        _ => {
                            return Err(JErrorType::TypeError(
                                "Class extends value does not have valid prototype property"
                                    .to_string(),
                            ))
                        }
                    }
                }
                _ => {
                    return Err(JErrorType::TypeError(format!(
                        "Class extends value {} is not a constructor or null",
                        parent
                    )))
                }
            }
        }
    };
    let name = class
        .id
        .as_ref()
        .map(|id| id.name.to_string())
        .unwrap_or_default();
    let class_env = LexEnvironment::new(Some(ctx.current_env()));
    let prototype = ordinary_object_create(prototype_parent.as_ref());

    let constructor = match &class.constructor {
        Some(site) => {
            let data = site.descriptor(FunctionData::from_literal);
            new_function_object(
                data,
                &constructor_parent,
                Arc::downgrade(&ctx.realm),
                Some(class_env.clone()),
                Some(prototype.clone()),
            )
        }
        None => {
            let derived = class.super_class.is_some();
            let data = class
                .default_constructor
                .get_or_init(|| Arc::new(default_constructor_data(&name, derived)))
                .clone();
            new_function_object(
                data,
                &constructor_parent,
                Arc::downgrade(&ctx.realm),
                Some(class_env.clone()),
                Some(prototype.clone()),
            )
        }
    };
    define_prototype_property(&constructor, prototype.clone(), false);
    prototype.write().as_js_object_mut().define_own_property(
        PropertyKey::from("constructor"),
        PropertyDescriptor::new_hidden(JsValue::Object(constructor.clone())),
    );

    for method in &class.methods {
        let function =
            instantiate_function(ctx, &method.value, class_env.clone(), Some(prototype.clone()));
        prototype.write().as_js_object_mut().define_own_property(
            PropertyKey::from(method.key.as_str()),
            PropertyDescriptor::new_hidden(JsValue::Object(function)),
        );
    }
    if !name.is_empty() {
        class_env.declare(&name, JsValue::Object(constructor.clone()), false);
    }
    Ok(JsValue::Object(constructor))
}

/// Descriptor of the implicit constructor of a class without one.
fn default_constructor_data(name: &str, derived: bool) -> FunctionData {
    FunctionData::new(
        name,
        0,
        FunctionFlags {
            is_constructor: true,
            is_class_constructor: true,
            requires_new: true,
            needs_new_target: true,
            is_derived: derived,
            ..FunctionFlags::default()
        },
        FunctionCode::ClassDefault,
    )
}
