//! AST builders shared by the integration tests.
//!
//! There is no parser, so programs are assembled by hand. Every node gets a `Meta` holding a
//! plausible rendering of its source text; call sites use the callee's text in their error
//! messages, and `find_site` looks sites up by it.

#![allow(dead_code)]

use std::sync::Arc;

use just_dispatch::parser::ast::{
    BinaryOperator, CatchClauseData, ClassData, ExpressionOrSpreadElement, ExpressionType,
    FunctionLiteral, FunctionLiteralKind, FunctionSite, HasMeta, IdentifierData, LiteralData,
    LiteralType, LogicalOperator, MemberExpressionType, Meta, MethodDefinitionData,
    NumberLiteralType, ProgramData, PropertyData, StatementType, UnaryOperator,
    VariableDeclarationKind, VariableDeclaratorData,
};
use just_dispatch::runner::call::arguments::ArgumentList;
use just_dispatch::runner::call::site::{CalleeExpression, MemberKey};
use just_dispatch::runner::call::CallSite;
use just_dispatch::runner::ds::error::JErrorType;
use just_dispatch::runner::ds::function_object::{new_function_object, FunctionData};
use just_dispatch::runner::ds::object_property::PropertyKey;
use just_dispatch::runner::ds::operations::object::get_v;
use just_dispatch::runner::ds::value::JsValue;
use just_dispatch::runner::engine::Engine;
use just_dispatch::runner::plugin::config::EngineConfig;
use just_dispatch::runner::plugin::types::{EvalContext, NativeFn};

/// Helper to create a meta for a piece of source text.
pub fn meta(text: &str) -> Meta {
    Meta::from_source(text)
}

fn text_of(expr: &ExpressionType) -> String {
    expr.get_meta().to_formatted_code()
}

fn ident_data(name: &str) -> IdentifierData {
    IdentifierData {
        name: name.to_string(),
        meta: meta(name),
    }
}

fn literal(text: &str, value: LiteralType) -> ExpressionType {
    ExpressionType::Literal(LiteralData {
        meta: meta(text),
        value,
    })
}

/// Helper to create a number literal expression.
pub fn num_expr(n: i64) -> ExpressionType {
    literal(
        &n.to_string(),
        LiteralType::NumberLiteral(NumberLiteralType::IntegerLiteral(n)),
    )
}

pub fn float_expr(f: f64) -> ExpressionType {
    literal(
        &f.to_string(),
        LiteralType::NumberLiteral(NumberLiteralType::FloatLiteral(f)),
    )
}

/// Helper to create a string literal expression.
pub fn str_expr(s: &str) -> ExpressionType {
    literal(&format!("{:?}", s), LiteralType::StringLiteral(s.to_string()))
}

pub fn bool_expr(b: bool) -> ExpressionType {
    literal(&b.to_string(), LiteralType::BooleanLiteral(b))
}

pub fn null_expr() -> ExpressionType {
    literal("null", LiteralType::NullLiteral)
}

pub fn undefined_expr() -> ExpressionType {
    literal("undefined", LiteralType::UndefinedLiteral)
}

pub fn ident(name: &str) -> ExpressionType {
    ExpressionType::Identifier(ident_data(name))
}

pub fn this_expr() -> ExpressionType {
    ExpressionType::ThisExpression { meta: meta("this") }
}

pub fn new_target_expr() -> ExpressionType {
    ExpressionType::NewTargetExpression {
        meta: meta("new.target"),
    }
}

/// `object.property`
pub fn member(object: ExpressionType, property: &str) -> ExpressionType {
    let text = format!("{}.{}", text_of(&object), property);
    ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
        meta: meta(&text),
        object: Box::new(object),
        property: ident_data(property),
    })
}

/// `object[property]`
pub fn index(object: ExpressionType, property: ExpressionType) -> ExpressionType {
    let text = format!("{}[{}]", text_of(&object), text_of(&property));
    ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
        meta: meta(&text),
        object: Box::new(object),
        property: Box::new(property),
    })
}

pub fn arg(expr: ExpressionType) -> ExpressionOrSpreadElement {
    ExpressionOrSpreadElement::Expression(Box::new(expr))
}

pub fn spread(expr: ExpressionType) -> ExpressionOrSpreadElement {
    ExpressionOrSpreadElement::SpreadElement(Box::new(expr))
}

fn args_text(args: &[ExpressionOrSpreadElement]) -> String {
    args.iter()
        .map(|a| match a {
            ExpressionOrSpreadElement::Expression(e) => text_of(e),
            ExpressionOrSpreadElement::SpreadElement(e) => format!("...{}", text_of(e)),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// `callee(args...)`
pub fn call(callee: ExpressionType, args: Vec<ExpressionOrSpreadElement>) -> ExpressionType {
    let text = format!("{}({})", text_of(&callee), args_text(&args));
    ExpressionType::CallExpression(Box::new(CallSite::call(meta(&text), callee, args)))
}

/// `object.property(args...)`
pub fn method_call(
    object: ExpressionType,
    property: &str,
    args: Vec<ExpressionOrSpreadElement>,
) -> ExpressionType {
    call(member(object, property), args)
}

/// `new callee(args...)`
pub fn new_expr(callee: ExpressionType, args: Vec<ExpressionOrSpreadElement>) -> ExpressionType {
    let text = format!("new {}({})", text_of(&callee), args_text(&args));
    ExpressionType::NewExpression(Box::new(CallSite::new_expression(meta(&text), callee, args)))
}

/// `super(args...)`
pub fn super_call(args: Vec<ExpressionOrSpreadElement>) -> ExpressionType {
    let text = format!("super({})", args_text(&args));
    ExpressionType::SuperCallExpression(Box::new(CallSite::super_call(meta(&text), args)))
}

pub fn binary(operator: BinaryOperator, left: ExpressionType, right: ExpressionType) -> ExpressionType {
    let text = format!("{} {:?} {}", text_of(&left), operator, text_of(&right));
    ExpressionType::BinaryExpression {
        meta: meta(&text),
        operator,
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn add(left: ExpressionType, right: ExpressionType) -> ExpressionType {
    binary(BinaryOperator::Add, left, right)
}

pub fn strict_eq(left: ExpressionType, right: ExpressionType) -> ExpressionType {
    binary(BinaryOperator::StrictlyEqual, left, right)
}

pub fn less_than(left: ExpressionType, right: ExpressionType) -> ExpressionType {
    binary(BinaryOperator::LessThan, left, right)
}

pub fn instance_of(left: ExpressionType, right: ExpressionType) -> ExpressionType {
    binary(BinaryOperator::InstanceOf, left, right)
}

pub fn logical(
    operator: LogicalOperator,
    left: ExpressionType,
    right: ExpressionType,
) -> ExpressionType {
    let text = format!("{} {:?} {}", text_of(&left), operator, text_of(&right));
    ExpressionType::LogicalExpression {
        meta: meta(&text),
        operator,
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn unary(operator: UnaryOperator, argument: ExpressionType) -> ExpressionType {
    let text = format!("{:?} {}", operator, text_of(&argument));
    ExpressionType::UnaryExpression {
        meta: meta(&text),
        operator,
        argument: Box::new(argument),
    }
}

pub fn conditional(
    test: ExpressionType,
    consequent: ExpressionType,
    alternate: ExpressionType,
) -> ExpressionType {
    let text = format!(
        "{} ? {} : {}",
        text_of(&test),
        text_of(&consequent),
        text_of(&alternate)
    );
    ExpressionType::ConditionalExpression {
        meta: meta(&text),
        test: Box::new(test),
        consequent: Box::new(consequent),
        alternate: Box::new(alternate),
    }
}

pub fn assign(left: ExpressionType, right: ExpressionType) -> ExpressionType {
    let text = format!("{} = {}", text_of(&left), text_of(&right));
    ExpressionType::AssignmentExpression {
        meta: meta(&text),
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// `[elements...]`
pub fn array_expr(elements: Vec<ExpressionOrSpreadElement>) -> ExpressionType {
    let text = format!("[{}]", args_text(&elements));
    ExpressionType::ArrayExpression {
        meta: meta(&text),
        elements,
    }
}

/// `{ key: value, ... }`
pub fn object_expr(properties: Vec<(&str, ExpressionType)>) -> ExpressionType {
    let properties: Vec<PropertyData> = properties
        .into_iter()
        .map(|(key, value)| PropertyData {
            meta: meta(key),
            key: key.to_string(),
            value,
        })
        .collect();
    ExpressionType::ObjectExpression {
        meta: meta("{...}"),
        properties,
    }
}

fn function_literal(
    name: Option<&str>,
    params: &[&str],
    body: Vec<StatementType>,
    kind: FunctionLiteralKind,
) -> FunctionLiteral {
    let text = format!("function {}({}) {{...}}", name.unwrap_or(""), params.join(", "));
    FunctionLiteral {
        meta: meta(&text),
        id: name.map(ident_data),
        params: params.iter().map(|p| ident_data(p)).collect(),
        body,
        kind,
    }
}

/// `function [name](params...) { body }`
pub fn function_expr(name: Option<&str>, params: &[&str], body: Vec<StatementType>) -> ExpressionType {
    ExpressionType::FunctionExpression(FunctionSite::new(function_literal(
        name,
        params,
        body,
        FunctionLiteralKind::Normal,
    )))
}

/// `function name(params...) { body }` as a declaration.
pub fn function_decl(name: &str, params: &[&str], body: Vec<StatementType>) -> StatementType {
    StatementType::FunctionDeclaration(FunctionSite::new(function_literal(
        Some(name),
        params,
        body,
        FunctionLiteralKind::Normal,
    )))
}

/// A class method definition.
pub fn method(name: &str, params: &[&str], body: Vec<StatementType>) -> MethodDefinitionData {
    MethodDefinitionData {
        meta: meta(name),
        key: name.to_string(),
        value: FunctionSite::new(function_literal(
            Some(name),
            params,
            body,
            FunctionLiteralKind::Method,
        )),
    }
}

/// Explicit constructor of a class: its parameters and body.
pub struct Constructor<'a> {
    pub params: &'a [&'a str],
    pub body: Vec<StatementType>,
}

/// `class [name] [extends super_class] { constructor ...; methods... }`
pub fn class_expr(
    name: Option<&str>,
    super_class: Option<ExpressionType>,
    constructor: Option<Constructor>,
    methods: Vec<MethodDefinitionData>,
) -> ExpressionType {
    let derived = super_class.is_some();
    let text = match &super_class {
        Some(parent) => format!("class {} extends {}", name.unwrap_or(""), text_of(parent)),
        None => format!("class {}", name.unwrap_or("")),
    };
    let constructor = constructor.map(|c| {
        FunctionSite::new(function_literal(
            name,
            c.params,
            c.body,
            FunctionLiteralKind::ClassConstructor { derived },
        ))
    });
    ExpressionType::ClassExpression(Box::new(ClassData::new(
        meta(&text),
        name.map(ident_data),
        super_class.map(Box::new),
        constructor,
        methods,
    )))
}

/// `const name = class name ...` as a statement.
pub fn class_decl(
    name: &str,
    super_class: Option<ExpressionType>,
    constructor: Option<Constructor>,
    methods: Vec<MethodDefinitionData>,
) -> StatementType {
    const_decl(name, class_expr(Some(name), super_class, constructor, methods))
}

pub fn expr_stmt(expression: ExpressionType) -> StatementType {
    StatementType::ExpressionStatement {
        meta: expression.get_meta().clone(),
        expression: Box::new(expression),
    }
}

fn declaration(
    kind: VariableDeclarationKind,
    name: &str,
    init: Option<ExpressionType>,
) -> StatementType {
    StatementType::VariableDeclaration {
        meta: meta(name),
        kind,
        declarations: vec![VariableDeclaratorData {
            meta: meta(name),
            id: ident_data(name),
            init: init.map(Box::new),
        }],
    }
}

pub fn var_decl(name: &str, init: ExpressionType) -> StatementType {
    declaration(VariableDeclarationKind::Var, name, Some(init))
}

pub fn let_decl(name: &str, init: ExpressionType) -> StatementType {
    declaration(VariableDeclarationKind::Let, name, Some(init))
}

pub fn const_decl(name: &str, init: ExpressionType) -> StatementType {
    declaration(VariableDeclarationKind::Const, name, Some(init))
}

pub fn return_stmt(argument: ExpressionType) -> StatementType {
    StatementType::ReturnStatement {
        meta: meta("return"),
        argument: Some(Box::new(argument)),
    }
}

pub fn return_void() -> StatementType {
    StatementType::ReturnStatement {
        meta: meta("return"),
        argument: None,
    }
}

pub fn if_stmt(
    test: ExpressionType,
    consequent: StatementType,
    alternate: Option<StatementType>,
) -> StatementType {
    StatementType::IfStatement {
        meta: meta("if"),
        test: Box::new(test),
        consequent: Box::new(consequent),
        alternate: alternate.map(Box::new),
    }
}

pub fn while_stmt(test: ExpressionType, body: StatementType) -> StatementType {
    StatementType::WhileStatement {
        meta: meta("while"),
        test: Box::new(test),
        body: Box::new(body),
    }
}

pub fn throw_stmt(argument: ExpressionType) -> StatementType {
    StatementType::ThrowStatement {
        meta: meta("throw"),
        argument: Box::new(argument),
    }
}

pub fn block(body: Vec<StatementType>) -> StatementType {
    StatementType::BlockStatement {
        meta: meta("{...}"),
        body,
    }
}

/// `try { block } catch (param) { handler }`
pub fn try_catch(block: Vec<StatementType>, param: &str, handler: Vec<StatementType>) -> StatementType {
    StatementType::TryStatement {
        meta: meta("try"),
        block,
        handler: Some(CatchClauseData {
            meta: meta("catch"),
            param: Some(ident_data(param)),
            body: handler,
        }),
        finalizer: None,
    }
}

/// `try { block } finally { finalizer }`
pub fn try_finally(block: Vec<StatementType>, finalizer: Vec<StatementType>) -> StatementType {
    StatementType::TryStatement {
        meta: meta("try"),
        block,
        handler: None,
        finalizer: Some(finalizer),
    }
}

/// `name = name + amount;`
pub fn increment(name: &str, amount: ExpressionType) -> StatementType {
    expr_stmt(assign(ident(name), add(ident(name), amount)))
}

pub fn program(body: Vec<StatementType>) -> ProgramData {
    ProgramData {
        meta: meta("program"),
        body,
    }
}

/// Fresh context with the default configuration.
pub fn new_context() -> EvalContext {
    EvalContext::new()
}

/// Fresh context on an engine of its own with `config`.
pub fn context_with(config: EngineConfig) -> EvalContext {
    EvalContext::with_engine(Engine::new(config))
}

pub fn run(ctx: &mut EvalContext, program: &ProgramData) -> Result<JsValue, JErrorType> {
    ctx.run_program(program)
}

/// Runs `body` as a program in a fresh context and returns its completion value.
pub fn eval(body: Vec<StatementType>) -> Result<JsValue, JErrorType> {
    let mut ctx = new_context();
    run(&mut ctx, &program(body))
}

pub fn global(ctx: &EvalContext, name: &str) -> JsValue {
    ctx.get_binding(name)
        .unwrap_or_else(|e| panic!("no global {}: {}", name, e))
}

pub fn property(ctx: &mut EvalContext, value: &JsValue, key: &str) -> JsValue {
    get_v(ctx, value, &PropertyKey::from(key))
        .unwrap_or_else(|e| panic!("reading {}: {}", key, e))
}

/// Defines a native function as a global of the context's current realm.
pub fn define_native(ctx: &mut EvalContext, name: &str, length: usize, call: NativeFn) -> JsValue {
    let data = Arc::new(FunctionData::new_native(name, length, call, None, None));
    let function = JsValue::Object(new_function_object(
        data,
        &ctx.realm.intrinsics.function_prototype,
        Arc::downgrade(&ctx.realm),
        None,
        None,
    ));
    ctx.define_global(name, function.clone());
    function
}

/// Array elements of `value`, panicking on anything else.
pub fn elements(value: &JsValue) -> Vec<JsValue> {
    just_dispatch::runner::ds::operations::object::array_elements(value)
        .unwrap_or_else(|| panic!("not an array: {}", value))
}

/// The first call site, in source order, whose callee text is `expression`.
pub fn find_site<'a>(program: &'a ProgramData, expression: &str) -> &'a CallSite {
    let mut found = None;
    for stmt in &program.body {
        visit_statement(stmt, expression, &mut found);
    }
    found.unwrap_or_else(|| panic!("no call site for {}", expression))
}

fn visit_statements<'a>(body: &'a [StatementType], text: &str, found: &mut Option<&'a CallSite>) {
    for stmt in body {
        visit_statement(stmt, text, found);
    }
}

fn visit_statement<'a>(stmt: &'a StatementType, text: &str, found: &mut Option<&'a CallSite>) {
    match stmt {
        StatementType::ExpressionStatement { expression, .. } => {
            visit_expression(expression, text, found)
        }
        StatementType::BlockStatement { body, .. } => visit_statements(body, text, found),
        StatementType::ReturnStatement {
            argument: Some(argument),
            ..
        } => visit_expression(argument, text, found),
        StatementType::IfStatement {
            test,
            consequent,
            alternate,
            ..
        } => {
            visit_expression(test, text, found);
            visit_statement(consequent, text, found);
            if let Some(alternate) = alternate {
                visit_statement(alternate, text, found);
            }
        }
        StatementType::WhileStatement { test, body, .. } => {
            visit_expression(test, text, found);
            visit_statement(body, text, found);
        }
        StatementType::ThrowStatement { argument, .. } => visit_expression(argument, text, found),
        StatementType::TryStatement {
            block,
            handler,
            finalizer,
            ..
        } => {
            visit_statements(block, text, found);
            if let Some(handler) = handler {
                visit_statements(&handler.body, text, found);
            }
            if let Some(finalizer) = finalizer {
                visit_statements(finalizer, text, found);
            }
        }
        StatementType::VariableDeclaration { declarations, .. } => {
            for declarator in declarations {
                if let Some(init) = &declarator.init {
                    visit_expression(init, text, found);
                }
            }
        }
        StatementType::FunctionDeclaration(site) => {
            visit_statements(&site.literal.body, text, found)
        }
        _ => {}
    }
}

fn visit_expression<'a>(expr: &'a ExpressionType, text: &str, found: &mut Option<&'a CallSite>) {
    match expr {
        ExpressionType::CallExpression(site)
        | ExpressionType::NewExpression(site)
        | ExpressionType::SuperCallExpression(site) => visit_site(site, text, found),
        ExpressionType::ArrayExpression { elements, .. } => visit_elements(elements, text, found),
        ExpressionType::ObjectExpression { properties, .. } => {
            for property in properties {
                visit_expression(&property.value, text, found);
            }
        }
        ExpressionType::FunctionExpression(site) => {
            visit_statements(&site.literal.body, text, found)
        }
        ExpressionType::ClassExpression(class) => {
            if let Some(parent) = &class.super_class {
                visit_expression(parent, text, found);
            }
            if let Some(constructor) = &class.constructor {
                visit_statements(&constructor.literal.body, text, found);
            }
            for method in &class.methods {
                visit_statements(&method.value.literal.body, text, found);
            }
        }
        ExpressionType::UnaryExpression { argument, .. } => visit_expression(argument, text, found),
        ExpressionType::BinaryExpression { left, right, .. }
        | ExpressionType::LogicalExpression { left, right, .. }
        | ExpressionType::AssignmentExpression { left, right, .. } => {
            visit_expression(left, text, found);
            visit_expression(right, text, found);
        }
        ExpressionType::ConditionalExpression {
            test,
            consequent,
            alternate,
            ..
        } => {
            visit_expression(test, text, found);
            visit_expression(consequent, text, found);
            visit_expression(alternate, text, found);
        }
        ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
            object,
            ..
        }) => visit_expression(object, text, found),
        ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
            object,
            property,
            ..
        }) => {
            visit_expression(object, text, found);
            visit_expression(property, text, found);
        }
        _ => {}
    }
}

fn visit_elements<'a>(
    elements: &'a [ExpressionOrSpreadElement],
    text: &str,
    found: &mut Option<&'a CallSite>,
) {
    for element in elements {
        match element {
            ExpressionOrSpreadElement::Expression(e) | ExpressionOrSpreadElement::SpreadElement(e) => {
                visit_expression(e, text, found)
            }
        }
    }
}

fn visit_site<'a>(site: &'a CallSite, text: &str, found: &mut Option<&'a CallSite>) {
    if found.is_some() {
        return;
    }
    if site.cache().expression() == text {
        *found = Some(site);
        return;
    }
    match &site.callee {
        CalleeExpression::Plain(callee) => visit_expression(callee, text, found),
        CalleeExpression::Member { object, property } => {
            visit_expression(object, text, found);
            if let MemberKey::Computed(key) = property {
                visit_expression(key, text, found);
            }
        }
        CalleeExpression::Super => {}
    }
    match &site.arguments {
        ArgumentList::Zero => {}
        ArgumentList::One(e) => visit_expression(e, text, found),
        ArgumentList::Many(exprs) => {
            for e in exprs {
                visit_expression(e, text, found);
            }
        }
        ArgumentList::Spread(elements) => visit_elements(elements, text, found),
    }
}
