//! Tests for calling and constructing through bound functions.

mod common;

use common::*;
use just_dispatch::parser::ast::StatementType;
use just_dispatch::runner::call::cache::CacheEntry;
use just_dispatch::runner::call::{
    call_value, construct_with_new_target, perform_call, perform_construct_with_new_target,
    CacheNodeKind, CallCache, InvocationKind,
};
use just_dispatch::runner::ds::operations::object::get_prototype_of;
use just_dispatch::runner::ds::value::JsValue;
use just_dispatch::runner::plugin::config::EngineConfig;
use just_dispatch::runner::plugin::types::EvalContext;

/// Helper to define `f`, which returns `[this, a, b, c, d]`, plus `obj`, `g = f.bind(obj, 1, 2)`
/// and `h = g.bind(null, 3)`.
fn bound_chain() -> Vec<StatementType> {
    vec![
        function_decl(
            "f",
            &["a", "b", "c", "d"],
            vec![return_stmt(array_expr(vec![
                arg(this_expr()),
                arg(ident("a")),
                arg(ident("b")),
                arg(ident("c")),
                arg(ident("d")),
            ]))],
        ),
        const_decl("obj", object_expr(vec![])),
        const_decl(
            "g",
            method_call(
                ident("f"),
                "bind",
                vec![arg(ident("obj")), arg(num_expr(1)), arg(num_expr(2))],
            ),
        ),
        const_decl(
            "h",
            method_call(ident("g"), "bind", vec![arg(null_expr()), arg(num_expr(3))]),
        ),
    ]
}

/// Asserts `value` is `[obj, 1, 2, 3, 4]`.
fn assert_flattened(ctx: &EvalContext, value: &JsValue) {
    let items = elements(value);
    assert_eq!(items.len(), 5);
    assert_eq!(items[0], global(ctx, "obj"));
    assert_eq!(
        items[1..].to_vec(),
        vec![
            JsValue::from_i64(1),
            JsValue::from_i64(2),
            JsValue::from_i64(3),
            JsValue::from_i64(4),
        ]
    );
}

mod call_tests {
    use super::*;

    #[test]
    fn test_nested_bind_prepends_inner_arguments_first() {
        let mut body = bound_chain();
        body.push(const_decl("r", call(ident("h"), vec![arg(num_expr(4))])));
        let prog = program(body);
        let mut ctx = new_context();
        run(&mut ctx, &prog).unwrap();

        let result = global(&ctx, "r");
        assert_flattened(&ctx, &result);
        assert_eq!(
            find_site(&prog, "h").cache().snapshot(),
            vec![CacheNodeKind::BoundInstance]
        );
    }

    #[test]
    fn test_uncached_call_flattens_the_same_way() {
        let mut ctx = new_context();
        run(&mut ctx, &program(bound_chain())).unwrap();
        let h = global(&ctx, "h");
        let result = call_value(&mut ctx, &h, JsValue::Undefined, vec![JsValue::from_i64(4)]);
        assert_flattened(&ctx, &result.unwrap());
    }

    #[test]
    fn test_bound_name_and_length() {
        let mut ctx = new_context();
        run(&mut ctx, &program(bound_chain())).unwrap();
        let g = global(&ctx, "g");
        let h = global(&ctx, "h");
        assert_eq!(property(&mut ctx, &g, "name"), JsValue::new_string("bound f"));
        assert_eq!(property(&mut ctx, &g, "length"), JsValue::from_i64(2));
        assert_eq!(property(&mut ctx, &h, "name"), JsValue::new_string("bound bound f"));
        assert_eq!(property(&mut ctx, &h, "length"), JsValue::from_i64(1));
    }

    #[test]
    fn test_two_bound_functions_share_one_node() {
        let mut ctx = new_context();
        run(&mut ctx, &program(bound_chain())).unwrap();
        let g = global(&ctx, "g");
        let h = global(&ctx, "h");

        let cache = CallCache::new(InvocationKind::Call, "bound", None);
        perform_call(&mut ctx, &cache, JsValue::Undefined, h, vec![JsValue::from_i64(4)]).unwrap();
        assert_eq!(cache.snapshot(), vec![CacheNodeKind::BoundInstance]);

        let result = perform_call(&mut ctx, &cache, JsValue::Undefined, g, vec![
            JsValue::from_i64(3),
            JsValue::from_i64(4),
        ]);
        assert_flattened(&ctx, &result.unwrap());
        assert_eq!(cache.snapshot(), vec![CacheNodeKind::DynamicBound]);
    }

    #[test]
    fn test_multi_context_unwraps_one_layer_per_node() {
        let mut body = bound_chain();
        body.push(const_decl("r", call(ident("h"), vec![arg(num_expr(4))])));
        let prog = program(body);
        let mut ctx = context_with(EngineConfig {
            multi_context: true,
            ..Default::default()
        });
        run(&mut ctx, &prog).unwrap();
        let result = global(&ctx, "r");
        assert_flattened(&ctx, &result);

        let site = find_site(&prog, "h").cache();
        assert_eq!(site.snapshot(), vec![CacheNodeKind::DynamicBound]);
        let outer = site.entry_at(0).unwrap();
        let middle = match &*outer {
            CacheEntry::DynamicBound(d) => {
                assert_eq!(d.inner().snapshot(), vec![CacheNodeKind::DynamicBound]);
                d.inner().entry_at(0).unwrap()
            }
            other => panic!("unexpected {:?}", other.kind()),
        };
        match &*middle {
            CacheEntry::DynamicBound(d) => {
                assert_eq!(d.inner().snapshot(), vec![CacheNodeKind::SharedFunction])
            }
            other => panic!("unexpected {:?}", other.kind()),
        }
    }
}

mod construct_tests {
    use super::*;

    /// Helper to define `class B {}`, `class Other {}` and `BoundB = B.bind(null)`.
    fn bound_class(ctx: &mut EvalContext) {
        let prog = program(vec![
            class_decl("B", None, None, vec![]),
            class_decl("Other", None, None, vec![]),
            const_decl("BoundB", method_call(ident("B"), "bind", vec![arg(null_expr())])),
        ]);
        run(ctx, &prog).unwrap();
    }

    fn prototype_of(value: &JsValue) -> JsValue {
        get_prototype_of(value.as_object().expect("an object"))
            .map(JsValue::Object)
            .unwrap_or(JsValue::Null)
    }

    #[test]
    fn test_bound_new_target_resolves_to_the_target() {
        let mut ctx = new_context();
        bound_class(&mut ctx);
        let b = global(&ctx, "B");
        let b_prototype = property(&mut ctx, &b, "prototype");
        let bound_b = global(&ctx, "BoundB");

        let instance = construct_with_new_target(&mut ctx, &bound_b, vec![], bound_b.clone());
        assert_eq!(prototype_of(&instance.unwrap()), b_prototype);

        let cache = CallCache::new(InvocationKind::NewTarget, "BoundB", None);
        let instance = perform_construct_with_new_target(
            &mut ctx,
            &cache,
            bound_b.clone(),
            bound_b,
            vec![],
        );
        assert_eq!(prototype_of(&instance.unwrap()), b_prototype);
        assert_eq!(cache.snapshot(), vec![CacheNodeKind::BoundInstance]);
    }

    #[test]
    fn test_reflect_construct_through_a_bound_class() {
        let prog = program(vec![
            class_decl("B", None, None, vec![]),
            class_decl("Other", None, None, vec![]),
            const_decl("BoundB", method_call(ident("B"), "bind", vec![arg(null_expr())])),
            const_decl(
                "same",
                method_call(
                    ident("Reflect"),
                    "construct",
                    vec![arg(ident("BoundB")), arg(array_expr(vec![])), arg(ident("BoundB"))],
                ),
            ),
            const_decl(
                "other",
                method_call(
                    ident("Reflect"),
                    "construct",
                    vec![arg(ident("BoundB")), arg(array_expr(vec![])), arg(ident("Other"))],
                ),
            ),
        ]);
        let mut ctx = new_context();
        run(&mut ctx, &prog).unwrap();
        let b = global(&ctx, "B");
        let other = global(&ctx, "Other");
        let b_prototype = property(&mut ctx, &b, "prototype");
        let other_prototype = property(&mut ctx, &other, "prototype");
        assert_eq!(prototype_of(&global(&ctx, "same")), b_prototype);
        assert_eq!(prototype_of(&global(&ctx, "other")), other_prototype);
    }

    #[test]
    fn test_explicit_new_target_is_kept() {
        let mut ctx = new_context();
        bound_class(&mut ctx);
        let other = global(&ctx, "Other");
        let other_prototype = property(&mut ctx, &other, "prototype");
        let bound_b = global(&ctx, "BoundB");

        let cache = CallCache::new(InvocationKind::NewTarget, "BoundB", None);
        let instance =
            perform_construct_with_new_target(&mut ctx, &cache, bound_b, other, vec![]);
        assert_eq!(prototype_of(&instance.unwrap()), other_prototype);
    }

    /// Helper to define `class A {}`, `class B extends A {}` (implicit constructor),
    /// `class C extends A { constructor(x) { super(); this.x = x } }`, `BoundB = B.bind(null)`,
    /// `BoundC = C.bind(null, 4)` and `BB = BoundB.bind(null)`.
    fn bound_derived_classes(ctx: &mut EvalContext) {
        let prog = program(vec![
            class_decl("A", None, None, vec![]),
            class_decl("B", Some(ident("A")), None, vec![]),
            class_decl(
                "C",
                Some(ident("A")),
                Some(Constructor {
                    params: &["x"],
                    body: vec![
                        expr_stmt(super_call(vec![])),
                        expr_stmt(assign(member(this_expr(), "x"), ident("x"))),
                    ],
                }),
                vec![],
            ),
            const_decl("BoundB", method_call(ident("B"), "bind", vec![arg(null_expr())])),
            const_decl(
                "BoundC",
                method_call(ident("C"), "bind", vec![arg(null_expr()), arg(num_expr(4))]),
            ),
            const_decl("BB", method_call(ident("BoundB"), "bind", vec![arg(null_expr())])),
        ]);
        run(ctx, &prog).unwrap();
    }

    #[test]
    fn test_bound_derived_class_with_implicit_constructor() {
        let mut ctx = new_context();
        bound_derived_classes(&mut ctx);
        let b = global(&ctx, "B");
        let b_prototype = property(&mut ctx, &b, "prototype");
        let bound_b = global(&ctx, "BoundB");

        let instance = construct_with_new_target(&mut ctx, &bound_b, vec![], bound_b.clone());
        assert_eq!(prototype_of(&instance.unwrap()), b_prototype);

        let cache = CallCache::new(InvocationKind::NewTarget, "BoundB", None);
        let instance = perform_construct_with_new_target(
            &mut ctx,
            &cache,
            bound_b.clone(),
            bound_b,
            vec![],
        );
        assert_eq!(prototype_of(&instance.unwrap()), b_prototype);
    }

    #[test]
    fn test_reflect_construct_through_a_bound_derived_class() {
        let mut ctx = new_context();
        bound_derived_classes(&mut ctx);
        let prog = program(vec![
            const_decl(
                "made",
                method_call(
                    ident("Reflect"),
                    "construct",
                    vec![arg(ident("BoundB")), arg(array_expr(vec![])), arg(ident("BoundB"))],
                ),
            ),
            const_decl("isB", instance_of(ident("made"), ident("B"))),
            const_decl("isA", instance_of(ident("made"), ident("A"))),
        ]);
        run(&mut ctx, &prog).unwrap();
        assert_eq!(global(&ctx, "isB"), JsValue::Boolean(true));
        assert_eq!(global(&ctx, "isA"), JsValue::Boolean(true));
    }

    #[test]
    fn test_bound_derived_class_with_explicit_constructor() {
        let mut ctx = new_context();
        bound_derived_classes(&mut ctx);
        let c = global(&ctx, "C");
        let c_prototype = property(&mut ctx, &c, "prototype");
        let bound_c = global(&ctx, "BoundC");

        let instance =
            construct_with_new_target(&mut ctx, &bound_c, vec![], bound_c.clone()).unwrap();
        assert_eq!(prototype_of(&instance), c_prototype);
        assert_eq!(property(&mut ctx, &instance, "x"), JsValue::from_i64(4));
    }

    #[test]
    fn test_two_bound_layers_resolve_new_target_per_layer() {
        let mut ctx = new_context();
        bound_derived_classes(&mut ctx);
        let b = global(&ctx, "B");
        let b_prototype = property(&mut ctx, &b, "prototype");
        let bound_b = global(&ctx, "BoundB");
        let bb = global(&ctx, "BB");

        for new_target in [bound_b.clone(), bb.clone()] {
            let instance = construct_with_new_target(&mut ctx, &bb, vec![], new_target.clone());
            assert_eq!(prototype_of(&instance.unwrap()), b_prototype);

            let cache = CallCache::new(InvocationKind::NewTarget, "BB", None);
            let instance =
                perform_construct_with_new_target(&mut ctx, &cache, bb.clone(), new_target, vec![]);
            assert_eq!(prototype_of(&instance.unwrap()), b_prototype);
        }
    }

    #[test]
    fn test_new_on_a_partially_applied_class() {
        let prog = program(vec![
            class_decl(
                "Point",
                None,
                Some(Constructor {
                    params: &["x", "y"],
                    body: vec![
                        expr_stmt(assign(member(this_expr(), "x"), ident("x"))),
                        expr_stmt(assign(member(this_expr(), "y"), ident("y"))),
                    ],
                }),
                vec![],
            ),
            const_decl(
                "AtOne",
                method_call(ident("Point"), "bind", vec![arg(null_expr()), arg(num_expr(1))]),
            ),
            const_decl("p", new_expr(ident("AtOne"), vec![arg(num_expr(2))])),
            const_decl("isPoint", instance_of(ident("p"), ident("Point"))),
        ]);
        let mut ctx = new_context();
        run(&mut ctx, &prog).unwrap();
        let p = global(&ctx, "p");
        assert_eq!(property(&mut ctx, &p, "x"), JsValue::from_i64(1));
        assert_eq!(property(&mut ctx, &p, "y"), JsValue::from_i64(2));
        assert_eq!(global(&ctx, "isPoint"), JsValue::Boolean(true));
        assert_eq!(
            find_site(&prog, "AtOne").cache().snapshot(),
            vec![CacheNodeKind::BoundInstance]
        );
    }
}
