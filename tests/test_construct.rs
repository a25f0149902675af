//! Tests for `new`, `super(...)` and the handling of constructor results.

mod common;

use std::sync::Arc;

use common::*;
use just_dispatch::parser::ast::{ExpressionType, StatementType};
use just_dispatch::runner::call::construct::PrototypeShapeCache;
use just_dispatch::runner::call::target::CallTarget;
use just_dispatch::runner::call::{
    call_value, construct_value, perform_call, CacheNodeKind, CallCache, InvocationKind,
};
use just_dispatch::runner::ds::error::JErrorType;
use just_dispatch::runner::ds::operations::object::get_prototype_of;
use just_dispatch::runner::ds::realm::Realm;
use just_dispatch::runner::ds::value::JsValue;
use just_dispatch::runner::engine::Engine;
use just_dispatch::runner::plugin::config::EngineConfig;
use just_dispatch::runner::plugin::types::EvalContext;

fn prototype_of(value: &JsValue) -> JsValue {
    get_prototype_of(value.as_object().expect("an object"))
        .map(JsValue::Object)
        .unwrap_or(JsValue::Null)
}

fn intrinsic_prototype(realm: &Realm, name: &str) -> JsValue {
    JsValue::Object(realm.prototype(name).expect("intrinsic").clone())
}

/// Helper to define `class A { constructor(v) { this.v = v; } }`.
fn base_class() -> StatementType {
    class_decl(
        "A",
        None,
        Some(Constructor {
            params: &["v"],
            body: vec![expr_stmt(assign(member(this_expr(), "v"), ident("v")))],
        }),
        vec![],
    )
}

/// Helper to define `class name extends A { constructor() { super(1); return result; } }`.
fn derived_returning(name: &str, result: Option<ExpressionType>) -> StatementType {
    let mut body = vec![expr_stmt(super_call(vec![arg(num_expr(1))]))];
    body.push(match result {
        Some(value) => return_stmt(value),
        None => return_void(),
    });
    class_decl(
        name,
        Some(ident("A")),
        Some(Constructor { params: &[], body }),
        vec![],
    )
}

mod result_filter_tests {
    use super::*;

    #[test]
    fn test_base_constructor_primitive_result_is_ignored() {
        let prog = program(vec![
            function_decl(
                "Base",
                &[],
                vec![
                    expr_stmt(assign(member(this_expr(), "tag"), str_expr("base"))),
                    return_stmt(num_expr(42)),
                ],
            ),
            const_decl("b", new_expr(ident("Base"), vec![])),
        ]);
        let mut ctx = new_context();
        run(&mut ctx, &prog).unwrap();
        let b = global(&ctx, "b");
        assert_eq!(property(&mut ctx, &b, "tag"), JsValue::new_string("base"));
        let base = global(&ctx, "Base");
        assert_eq!(prototype_of(&b), property(&mut ctx, &base, "prototype"));
    }

    #[test]
    fn test_object_result_replaces_the_receiver() {
        let prog = program(vec![
            function_decl(
                "Maker",
                &[],
                vec![return_stmt(object_expr(vec![("made", bool_expr(true))]))],
            ),
            const_decl("m", new_expr(ident("Maker"), vec![])),
        ]);
        let mut ctx = new_context();
        run(&mut ctx, &prog).unwrap();
        let m = global(&ctx, "m");
        assert_eq!(property(&mut ctx, &m, "made"), JsValue::Boolean(true));
        assert_eq!(prototype_of(&m), intrinsic_prototype(&ctx.realm, "Object"));
    }

    #[test]
    fn test_derived_primitive_result_is_a_type_error() {
        let prog = program(vec![
            base_class(),
            derived_returning("D", Some(num_expr(42))),
            expr_stmt(new_expr(ident("D"), vec![])),
        ]);
        let mut ctx = new_context();
        let error = match run(&mut ctx, &prog) {
            Err(JErrorType::Thrown(error)) => error,
            other => panic!("expected a thrown error, got {:?}", other),
        };
        assert_eq!(prototype_of(&error), intrinsic_prototype(&ctx.realm, "TypeError"));
        assert_eq!(
            property(&mut ctx, &error, "message"),
            JsValue::new_string("Derived constructors may only return object or undefined")
        );
    }

    #[test]
    fn test_derived_type_error_is_catchable() {
        let prog = program(vec![
            base_class(),
            derived_returning("D", Some(str_expr("nope"))),
            let_decl("caught", bool_expr(false)),
            try_catch(
                vec![expr_stmt(new_expr(ident("D"), vec![]))],
                "e",
                vec![expr_stmt(assign(
                    ident("caught"),
                    instance_of(ident("e"), ident("TypeError")),
                ))],
            ),
        ]);
        let mut ctx = new_context();
        run(&mut ctx, &prog).unwrap();
        assert_eq!(global(&ctx, "caught"), JsValue::Boolean(true));
    }

    #[test]
    fn test_derived_undefined_result_is_the_initialized_this() {
        let prog = program(vec![
            base_class(),
            derived_returning("D", None),
            const_decl("d", new_expr(ident("D"), vec![])),
            const_decl("isD", instance_of(ident("d"), ident("D"))),
            const_decl("isA", instance_of(ident("d"), ident("A"))),
        ]);
        let mut ctx = new_context();
        run(&mut ctx, &prog).unwrap();
        let d = global(&ctx, "d");
        assert_eq!(property(&mut ctx, &d, "v"), JsValue::from_i64(1));
        assert_eq!(global(&ctx, "isD"), JsValue::Boolean(true));
        assert_eq!(global(&ctx, "isA"), JsValue::Boolean(true));
    }

    #[test]
    fn test_derived_object_result_is_returned() {
        let prog = program(vec![
            base_class(),
            derived_returning("D", Some(object_expr(vec![("own", num_expr(7))]))),
            const_decl("d", new_expr(ident("D"), vec![])),
        ]);
        let mut ctx = new_context();
        run(&mut ctx, &prog).unwrap();
        let d = global(&ctx, "d");
        assert_eq!(property(&mut ctx, &d, "own"), JsValue::from_i64(7));
        assert_eq!(property(&mut ctx, &d, "v"), JsValue::Undefined);
    }

    #[test]
    fn test_missing_super_call_is_a_reference_error() {
        let prog = program(vec![
            base_class(),
            class_decl(
                "NoSuper",
                Some(ident("A")),
                Some(Constructor {
                    params: &[],
                    body: vec![],
                }),
                vec![],
            ),
            expr_stmt(new_expr(ident("NoSuper"), vec![])),
        ]);
        match run(&mut new_context(), &prog) {
            Err(JErrorType::ReferenceError(message)) => {
                assert!(message.starts_with("Must call super constructor"), "{}", message)
            }
            other => panic!("expected a ReferenceError, got {:?}", other),
        }
    }
}

mod class_tests {
    use super::*;

    #[test]
    fn test_default_derived_constructor_forwards_arguments() {
        let prog = program(vec![
            base_class(),
            class_decl("E", Some(ident("A")), None, vec![]),
            const_decl("e", new_expr(ident("E"), vec![arg(num_expr(5))])),
            const_decl("isE", instance_of(ident("e"), ident("E"))),
        ]);
        let mut ctx = new_context();
        run(&mut ctx, &prog).unwrap();
        let e = global(&ctx, "e");
        assert_eq!(property(&mut ctx, &e, "v"), JsValue::from_i64(5));
        assert_eq!(global(&ctx, "isE"), JsValue::Boolean(true));
        assert_eq!(
            find_site(&prog, "E").cache().snapshot(),
            vec![CacheNodeKind::FunctionInstance]
        );
    }

    #[test]
    fn test_class_constructor_requires_new() {
        let prog = program(vec![
            base_class(),
            expr_stmt(call(ident("A"), vec![arg(num_expr(1))])),
        ]);
        match run(&mut new_context(), &prog) {
            Err(JErrorType::TypeError(message)) => assert_eq!(
                message,
                "Class constructor A cannot be invoked without 'new'"
            ),
            other => panic!("expected a TypeError, got {:?}", other),
        }
    }

    #[test]
    fn test_super_call_site_caches_the_parent() {
        let prog = program(vec![
            base_class(),
            derived_returning("D", None),
            expr_stmt(new_expr(ident("D"), vec![])),
            expr_stmt(new_expr(ident("D"), vec![])),
        ]);
        run(&mut new_context(), &prog).unwrap();
        let site = find_site(&prog, "super");
        assert_eq!(site.cache().kind(), InvocationKind::NewTarget);
        assert_eq!(site.cache().snapshot(), vec![CacheNodeKind::FunctionInstance]);
    }

    #[test]
    fn test_new_target_seen_by_the_body() {
        let prog = program(vec![
            function_decl(
                "Probe",
                &[],
                vec![return_stmt(array_expr(vec![arg(new_target_expr())]))],
            ),
            const_decl("constructed", new_expr(ident("Probe"), vec![])),
            const_decl("called", call(ident("Probe"), vec![])),
        ]);
        let mut ctx = new_context();
        run(&mut ctx, &prog).unwrap();
        assert_eq!(elements(&global(&ctx, "constructed")), vec![global(&ctx, "Probe")]);
        assert_eq!(elements(&global(&ctx, "called")), vec![JsValue::Undefined]);
    }
}

mod shape_cache_tests {
    use super::*;

    /// Runs `f` against the prototype-shape cache of `new P`.
    fn with_shape_cache<R>(
        ctx: &EvalContext,
        f: impl FnOnce(&PrototypeShapeCache) -> R,
    ) -> R {
        let p = global(ctx, "P");
        let data = p
            .as_object()
            .and_then(|o| o.read().function_data().cloned())
            .expect("P is a function");
        let target = data.construct_target();
        match &*target {
            CallTarget::Construct(construct) => f(construct.shape_cache()),
            _ => panic!("P is not a constructor"),
        }
    }

    #[test]
    fn test_one_prototype_one_shape() {
        let prog = program(vec![
            function_decl("P", &[], vec![]),
            expr_stmt(new_expr(ident("P"), vec![])),
            expr_stmt(new_expr(ident("P"), vec![])),
        ]);
        let mut ctx = new_context();
        run(&mut ctx, &prog).unwrap();
        with_shape_cache(&ctx, |cache| {
            assert_eq!(cache.len(), 1);
            assert!(!cache.is_degraded());
        });
    }

    #[test]
    fn test_degrades_past_the_property_cache_limit() {
        let prog = program(vec![
            function_decl("P", &[], vec![]),
            let_decl("last", null_expr()),
            let_decl("i", num_expr(0)),
            while_stmt(
                less_than(ident("i"), num_expr(6)),
                block(vec![
                    expr_stmt(assign(member(ident("P"), "prototype"), object_expr(vec![]))),
                    expr_stmt(assign(ident("last"), new_expr(ident("P"), vec![]))),
                    increment("i", num_expr(1)),
                ]),
            ),
            const_decl(
                "linked",
                strict_eq(
                    method_call(ident("Object"), "getPrototypeOf", vec![arg(ident("last"))]),
                    member(ident("P"), "prototype"),
                ),
            ),
        ]);
        let mut ctx = new_context();
        run(&mut ctx, &prog).unwrap();
        assert_eq!(global(&ctx, "linked"), JsValue::Boolean(true));
        with_shape_cache(&ctx, |cache| {
            assert_eq!(cache.len(), 5);
            assert!(cache.is_degraded());
        });
    }

    #[test]
    fn test_limit_comes_from_config() {
        let prog = program(vec![
            function_decl("P", &[], vec![]),
            expr_stmt(new_expr(ident("P"), vec![])),
            expr_stmt(assign(member(ident("P"), "prototype"), object_expr(vec![]))),
            expr_stmt(new_expr(ident("P"), vec![])),
        ]);
        let mut ctx = context_with(EngineConfig {
            property_cache_limit: 1,
            ..Default::default()
        });
        run(&mut ctx, &prog).unwrap();
        with_shape_cache(&ctx, |cache| {
            assert_eq!(cache.len(), 1);
            assert!(cache.is_degraded());
        });
    }
}

mod realm_tests {
    use super::*;

    fn two_realms() -> (Arc<Engine>, Arc<Realm>, Arc<Realm>) {
        let engine = Engine::new(EngineConfig::default());
        let first = engine.create_realm();
        let second = engine.create_realm();
        (engine, first, second)
    }

    #[test]
    fn test_derived_result_error_uses_the_caller_realm() {
        let (engine, first, second) = two_realms();
        let mut ctx = EvalContext::with_realm(engine.clone(), first.clone());
        run(
            &mut ctx,
            &program(vec![base_class(), derived_returning("D", Some(num_expr(42)))]),
        )
        .unwrap();
        let d = global(&ctx, "D");

        ctx.realm = second.clone();
        let error = match construct_value(&mut ctx, &d, vec![]) {
            Err(JErrorType::Thrown(error)) => error,
            other => panic!("expected a thrown error, got {:?}", other),
        };
        assert_eq!(prototype_of(&error), intrinsic_prototype(&second, "TypeError"));
        assert_ne!(prototype_of(&error), intrinsic_prototype(&first, "TypeError"));
        assert!(Arc::ptr_eq(&ctx.realm, &second));
        assert_eq!(engine.realm_count(), 2);
    }

    #[test]
    fn test_native_constructor_uses_its_own_realm() {
        let (engine, first, second) = two_realms();
        let mut ctx = EvalContext::with_realm(engine, second);
        let foreign_array = first.constructor("Array").expect("Array");
        let called = call_value(&mut ctx, &foreign_array, JsValue::Undefined, vec![]).unwrap();
        assert_eq!(prototype_of(&called), intrinsic_prototype(&first, "Array"));
        let constructed = construct_value(&mut ctx, &foreign_array, vec![]).unwrap();
        assert_eq!(prototype_of(&constructed), intrinsic_prototype(&first, "Array"));
    }

    #[test]
    fn test_builtins_of_two_realms_share_one_node() {
        let (engine, first, second) = two_realms();
        let mut ctx = EvalContext::with_realm(engine, first.clone());
        let abs_of = |ctx: &mut EvalContext, realm: &Arc<Realm>| {
            let math = realm.global_env.get_binding_value("Math").expect("Math");
            property(ctx, &math, "abs")
        };
        let first_abs = abs_of(&mut ctx, &first);
        ctx.realm = second.clone();
        let second_abs = abs_of(&mut ctx, &second);
        assert_ne!(first_abs, second_abs);

        let cache = CallCache::new(InvocationKind::Call, "abs", None);
        for abs in [first_abs.clone(), second_abs, first_abs] {
            let result = perform_call(&mut ctx, &cache, JsValue::Undefined, abs, vec![
                JsValue::from_i64(-2),
            ]);
            assert_eq!(result.unwrap(), JsValue::from_i64(2));
        }
        assert_eq!(cache.snapshot(), vec![CacheNodeKind::InlinedBuiltin]);
        assert_eq!(cache.cached_count(), 1);
    }
}
