//! Expression evaluation.

use std::sync::Arc;

use crate::parser::ast::{
    BinaryOperator, ExpressionOrSpreadElement, ExpressionType, FunctionSite, LiteralData,
    LiteralType, LogicalOperator, MemberExpressionType, NumberLiteralType, PropertyData,
    UnaryOperator,
};
use crate::runner::call::arguments::{spread_into, ArgumentBuffer};
use crate::runner::call::call_value;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::bound_layer;
use crate::runner::ds::lex_env::LexEnvironment;
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::{
    create_array_from_list, define_data_property, get, get_method, get_prototype_of, get_v,
    is_callable, set,
};
use crate::runner::ds::operations::test_and_comparison::{
    abstract_equality_comparison, abstract_relational_comparison, strict_equality_comparison,
};
use crate::runner::ds::operations::type_conversion::{
    get_type, to_boolean, to_number, to_primitive, to_property_key, to_string, PreferredType,
};
use crate::runner::ds::symbol::SYMBOL_HAS_INSTANCE;
use crate::runner::ds::value::{JsNumberType, JsValue};
use crate::runner::eval::function::{evaluate_class, instantiate_function};
use crate::runner::plugin::types::EvalContext;

use super::types::ValueResult;

/// Evaluate an expression and return its value.
pub fn evaluate_expression(expr: &ExpressionType, ctx: &mut EvalContext) -> ValueResult {
    match expr {
        ExpressionType::Literal(lit) => Ok(evaluate_literal(lit)),

        ExpressionType::Identifier(id) => ctx.get_binding(&id.name),

        ExpressionType::ThisExpression { .. } => match ctx.frame() {
            Some(frame) => frame.this.clone().ok_or_else(|| {
                JErrorType::ReferenceError(
                    "Must call super constructor in derived class before accessing 'this'"
                        .to_string(),
                )
            }),
            None => Ok(JsValue::Undefined),
        },

        ExpressionType::NewTargetExpression { .. } => Ok(ctx
            .frame()
            .and_then(|frame| frame.new_target.clone())
            .unwrap_or(JsValue::Undefined)),

        ExpressionType::ArrayExpression { elements, .. } => {
            evaluate_array_expression(elements, ctx)
        }

        ExpressionType::ObjectExpression { properties, .. } => {
            evaluate_object_expression(properties, ctx)
        }

        ExpressionType::FunctionExpression(site) => evaluate_function_expression(site, ctx),

        ExpressionType::ClassExpression(class) => evaluate_class(class, ctx),

        ExpressionType::UnaryExpression {
            operator, argument, ..
        } => evaluate_unary_expression(operator, argument, ctx),

        ExpressionType::BinaryExpression {
            operator,
            left,
            right,
            ..
        } => {
            let l = evaluate_expression(left, ctx)?;
            let r = evaluate_expression(right, ctx)?;
            evaluate_binary_operation(operator, &l, &r, ctx)
        }

        ExpressionType::LogicalExpression {
            operator,
            left,
            right,
            ..
        } => {
            let l = evaluate_expression(left, ctx)?;
            match (operator, to_boolean(&l)) {
                (LogicalOperator::Or, true) | (LogicalOperator::And, false) => Ok(l),
                _ => evaluate_expression(right, ctx),
            }
        }

        ExpressionType::ConditionalExpression {
            test,
            consequent,
            alternate,
            ..
        } => {
            if to_boolean(&evaluate_expression(test, ctx)?) {
                evaluate_expression(consequent, ctx)
            } else {
                evaluate_expression(alternate, ctx)
            }
        }

        ExpressionType::AssignmentExpression { left, right, .. } => {
            evaluate_assignment_expression(left, right, ctx)
        }

        ExpressionType::MemberExpression(member) => {
            let (object, key) = evaluate_member_reference(member, ctx)?;
            get_v(ctx, &object, &key)
        }

        ExpressionType::CallExpression(site)
        | ExpressionType::NewExpression(site)
        | ExpressionType::SuperCallExpression(site) => site.evaluate(ctx),
    }
}

fn evaluate_literal(lit: &LiteralData) -> JsValue {
    match &lit.value {
        LiteralType::NullLiteral => JsValue::Null,
        LiteralType::UndefinedLiteral => JsValue::Undefined,
        LiteralType::BooleanLiteral(b) => JsValue::Boolean(*b),
        LiteralType::StringLiteral(s) => JsValue::String(s.clone()),
        LiteralType::NumberLiteral(NumberLiteralType::IntegerLiteral(i)) => {
            JsValue::Number(JsNumberType::Integer(*i))
        }
        LiteralType::NumberLiteral(NumberLiteralType::FloatLiteral(f)) => JsValue::from_f64(*f),
    }
}

/// Object value and property key of a member expression, without reading the property.
fn evaluate_member_reference(
    member: &MemberExpressionType,
    ctx: &mut EvalContext,
) -> Result<(JsValue, PropertyKey), JErrorType> {
    match member {
        MemberExpressionType::SimpleMemberExpression {
            object, property, ..
        } => {
            let object = evaluate_expression(object, ctx)?;
            Ok((object, PropertyKey::from(property.name.as_str())))
        }
        MemberExpressionType::ComputedMemberExpression {
            object, property, ..
        } => {
            let object = evaluate_expression(object, ctx)?;
            let key = evaluate_expression(property, ctx)?;
            let key = to_property_key(ctx, &key)?;
            Ok((object, key))
        }
    }
}

fn evaluate_array_expression(
    elements: &[ExpressionOrSpreadElement],
    ctx: &mut EvalContext,
) -> ValueResult {
    let mut buffer = ArgumentBuffer::with_capacity(elements.len());
    for element in elements {
        match element {
            ExpressionOrSpreadElement::Expression(expr) => {
                buffer.push(evaluate_expression(expr, ctx)?)
            }
            ExpressionOrSpreadElement::SpreadElement(expr) => {
                let source = evaluate_expression(expr, ctx)?;
                spread_into(ctx, &source, &mut buffer)?;
            }
        }
    }
    Ok(create_array_from_list(&ctx.realm, buffer.into_exact()))
}

fn evaluate_object_expression(properties: &[PropertyData], ctx: &mut EvalContext) -> ValueResult {
    let object = ctx.realm.new_plain_object();
    for property in properties {
        let value = evaluate_expression(&property.value, ctx)?;
        define_data_property(&object, PropertyKey::from(property.key.as_str()), value);
    }
    Ok(JsValue::Object(object))
}

/// A named function expression sees its own name in a scope of its own.
fn evaluate_function_expression(site: &FunctionSite, ctx: &mut EvalContext) -> ValueResult {
    match &site.literal.id {
        Some(id) => {
            let env = LexEnvironment::new(Some(ctx.current_env()));
            let function = instantiate_function(ctx, site, env.clone(), None);
            env.declare(&id.name, JsValue::Object(function.clone()), false);
            Ok(JsValue::Object(function))
        }
        None => {
            let env = ctx.current_env();
            Ok(JsValue::Object(instantiate_function(ctx, site, env, None)))
        }
    }
}

fn evaluate_unary_expression(
    operator: &UnaryOperator,
    argument: &ExpressionType,
    ctx: &mut EvalContext,
) -> ValueResult {
    if let (UnaryOperator::TypeOf, ExpressionType::Identifier(id)) = (operator, argument) {
        if !ctx.current_env().has_binding(&id.name) {
            return Ok(JsValue::new_string("undefined"));
        }
    }
    let value = evaluate_expression(argument, ctx)?;
    Ok(match operator {
        UnaryOperator::Minus => JsValue::from_f64(-to_number(ctx, &value)?),
        UnaryOperator::Plus => JsValue::from_f64(to_number(ctx, &value)?),
        UnaryOperator::LogicalNot => JsValue::Boolean(!to_boolean(&value)),
        UnaryOperator::TypeOf => JsValue::new_string(get_type(&value)),
        UnaryOperator::Void => JsValue::Undefined,
    })
}

/// Applies a binary operator to evaluated operands.
pub fn evaluate_binary_operation(
    operator: &BinaryOperator,
    l: &JsValue,
    r: &JsValue,
    ctx: &mut EvalContext,
) -> ValueResult {
    Ok(match operator {
        BinaryOperator::LooselyEqual => JsValue::Boolean(abstract_equality_comparison(ctx, l, r)?),
        BinaryOperator::LooselyUnequal => {
            JsValue::Boolean(!abstract_equality_comparison(ctx, l, r)?)
        }
        BinaryOperator::StrictlyEqual => JsValue::Boolean(strict_equality_comparison(l, r)),
        BinaryOperator::StrictlyUnequal => JsValue::Boolean(!strict_equality_comparison(l, r)),
        BinaryOperator::LessThan => {
            JsValue::Boolean(abstract_relational_comparison(ctx, l, r)? == Some(true))
        }
        BinaryOperator::GreaterThan => {
            JsValue::Boolean(abstract_relational_comparison(ctx, r, l)? == Some(true))
        }
        BinaryOperator::LessThanEqual => {
            JsValue::Boolean(abstract_relational_comparison(ctx, r, l)? == Some(false))
        }
        BinaryOperator::GreaterThanEqual => {
            JsValue::Boolean(abstract_relational_comparison(ctx, l, r)? == Some(false))
        }
        BinaryOperator::Add => {
            let lp = to_primitive(ctx, l, PreferredType::Default)?;
            let rp = to_primitive(ctx, r, PreferredType::Default)?;
            if matches!(lp, JsValue::String(_)) || matches!(rp, JsValue::String(_)) {
                let mut s = to_string(ctx, &lp)?;
                s.push_str(&to_string(ctx, &rp)?);
                JsValue::String(s)
            } else {
                numeric_operation(operator, &lp, &rp, ctx)?
            }
        }
        BinaryOperator::Subtract
        | BinaryOperator::Multiply
        | BinaryOperator::Divide
        | BinaryOperator::Modulo => numeric_operation(operator, l, r, ctx)?,
        BinaryOperator::InstanceOf => JsValue::Boolean(instance_of(ctx, l, r)?),
    })
}

/// Integer operands stay integers while the result fits.
fn numeric_operation(
    operator: &BinaryOperator,
    l: &JsValue,
    r: &JsValue,
    ctx: &mut EvalContext,
) -> ValueResult {
    if let (JsValue::Number(JsNumberType::Integer(a)), JsValue::Number(JsNumberType::Integer(b))) =
        (l, r)
    {
        let exact = match operator {
            BinaryOperator::Add => a.checked_add(*b),
            BinaryOperator::Subtract => a.checked_sub(*b),
            BinaryOperator::Multiply => a
                .checked_mul(*b)
                .filter(|p| *p != 0 || (*a >= 0 && *b >= 0)),
            _ => None,
        };
        if let Some(result) = exact {
            return Ok(JsValue::from_i64(result));
        }
    }
    let a = to_number(ctx, l)?;
    let b = to_number(ctx, r)?;
    Ok(JsValue::from_f64(match operator {
        BinaryOperator::Add => a + b,
        BinaryOperator::Subtract => a - b,
        BinaryOperator::Multiply => a * b,
        BinaryOperator::Divide => a / b,
        _ => a % b,
    }))
}

/// `InstanceofOperator(value, target)`.
pub fn instance_of(
    ctx: &mut EvalContext,
    value: &JsValue,
    target: &JsValue,
) -> Result<bool, JErrorType> {
    if !target.is_object() {
        return Err(JErrorType::TypeError(
            "Right-hand side of 'instanceof' is not an object".to_string(),
        ));
    }
    let handler = get_method(ctx, target, &PropertyKey::Sym(SYMBOL_HAS_INSTANCE.clone()))?;
    if !handler.is_undefined() {
        let result = call_value(ctx, &handler, target.clone(), vec![value.clone()])?;
        return Ok(to_boolean(&result));
    }
    if !is_callable(target) {
        return Err(JErrorType::TypeError(
            "Right-hand side of 'instanceof' is not callable".to_string(),
        ));
    }
    ordinary_has_instance(ctx, target, value)
}

/// Bound functions test against their target.
fn ordinary_has_instance(
    ctx: &mut EvalContext,
    constructor: &JsValue,
    value: &JsValue,
) -> Result<bool, JErrorType> {
    let constructor_object = match constructor {
        JsValue::Object(o) => o.clone(),
        _ => return Ok(false),
    };
    if let Some(layer) = bound_layer(&constructor_object) {
        return instance_of(ctx, value, &layer.target);
    }
    let object = match value {
        JsValue::Object(o) => o.clone(),
        _ => return Ok(false),
    };
    let prototype = get(
        ctx,
        &constructor_object,
        &PropertyKey::from("prototype"),
        constructor,
    )?;
    let prototype = match prototype {
        JsValue::Object(p) => p,
        other => {
            return Err(JErrorType::TypeError(format!(
                "Function has non-object prototype '{}' in instanceof check",
                other
            )))
        }
    };
    let mut cursor = get_prototype_of(&object);
    while let Some(current) = cursor {
        if Arc::ptr_eq(&current, &prototype) {
            return Ok(true);
        }
        cursor = get_prototype_of(&current);
    }
    Ok(false)
}

fn evaluate_assignment_expression(
    left: &ExpressionType,
    right: &ExpressionType,
    ctx: &mut EvalContext,
) -> ValueResult {
    match left {
        ExpressionType::Identifier(id) => {
            let value = evaluate_expression(right, ctx)?;
            ctx.current_env().set_mutable_binding(&id.name, value.clone())?;
            Ok(value)
        }
        ExpressionType::MemberExpression(member) => {
            let (object, key) = evaluate_member_reference(member, ctx)?;
            let value = evaluate_expression(right, ctx)?;
            match &object {
                JsValue::Object(o) => {
                    if !set(ctx, o, key.clone(), value.clone(), &object)? {
                        return Err(JErrorType::TypeError(format!(
                            "Cannot assign to read only property '{}' of object",
                            key
                        )));
                    }
                }
                JsValue::Undefined | JsValue::Null => {
                    return Err(JErrorType::TypeError(format!(
                        "Cannot set property '{}' of {}",
                        key, object
                    )))
                }
                _ => {}
            }
            Ok(value)
        }
        _ => Err(JErrorType::SyntaxError(
            "Invalid left-hand side in assignment".to_string(),
        )),
    }
}
