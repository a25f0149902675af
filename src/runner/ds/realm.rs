use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Weak};

use rustc_hash::FxHashMap;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::{
    new_function_object, FunctionData, FunctionObject,
};
use crate::runner::ds::lex_env::{JsLexEnvironmentType, LexEnvironment};
use crate::runner::ds::object::{JsObjectType, ObjectBase, ObjectType};
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyKey};
use crate::runner::ds::shape::{child_shape_of, Shape};
use crate::runner::ds::symbol::SYMBOL_ITERATOR;
use crate::runner::ds::value::JsValue;
use crate::runner::engine::Engine;
use crate::runner::plugin::types::{BuiltInMethod, BuiltInObject, EvalContext};

/// Objects the engine itself needs to reach without a property lookup.
pub struct Intrinsics {
    pub object_prototype: JsObjectType,
    pub function_prototype: JsObjectType,
    pub array_prototype: JsObjectType,
    pub array_iterator_prototype: JsObjectType,
    /// `%ArrayProto_values%`. Spread takes its fast path only while arrays still iterate with it.
    pub array_values: JsValue,
    /// `%ArrayIteratorPrototype%.next`, guarding the same fast path.
    pub array_iterator_next: JsValue,
    pub prototypes: FxHashMap<String, JsObjectType>,
    pub constructors: FxHashMap<String, JsValue>,
}

pub struct Realm {
    pub id: usize,
    pub intrinsics: Intrinsics,
    pub global_object: JsObjectType,
    pub global_env: JsLexEnvironmentType,
    /// Shape of plain objects whose prototype is this realm's `Object.prototype`.
    pub initial_shape: Arc<Shape>,
}

impl Realm {
    pub(crate) fn new(engine: &Arc<Engine>, id: usize) -> Arc<Realm> {
        Arc::new_cyclic(|weak| bootstrap(engine, id, weak))
    }

    pub fn define_global(&self, name: &str, value: JsValue) {
        self.global_env.declare(name, value.clone(), true);
        define_hidden(&self.global_object, PropertyKey::from(name), value);
    }

    pub fn constructor(&self, name: &str) -> Option<JsValue> {
        self.intrinsics.constructors.get(name).cloned()
    }

    pub fn prototype(&self, name: &str) -> Option<&JsObjectType> {
        self.intrinsics.prototypes.get(name)
    }

    /// Fresh ordinary object inheriting from `Object.prototype`.
    pub fn new_plain_object(&self) -> JsObjectType {
        ObjectType::Ordinary(ObjectBase::new_with_shape(self.initial_shape.clone())).into_js_object()
    }
}

impl Debug for Realm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Realm(#{})", self.id)
    }
}

fn function_prototype_call(
    _ctx: &mut EvalContext,
    _this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Undefined)
}

fn define_hidden(target: &JsObjectType, key: PropertyKey, value: JsValue) {
    target
        .write()
        .as_js_object_mut()
        .define_own_property(key, PropertyDescriptor::new_hidden(value));
}

fn builtin_method(
    engine: &Engine,
    realm: &Weak<Realm>,
    function_prototype: &JsObjectType,
    key: &str,
    method: &BuiltInMethod,
) -> JsValue {
    let data = engine.builtin_function_data(key, || {
        FunctionData::new_native(
            method.name.clone(),
            method.length,
            method.call,
            None,
            method.inlined,
        )
    });
    JsValue::Object(new_function_object(
        data,
        function_prototype,
        realm.clone(),
        None,
        None,
    ))
}

fn install_prototype_members(
    engine: &Engine,
    realm: &Weak<Realm>,
    function_prototype: &JsObjectType,
    def: &BuiltInObject,
    proto: &JsObjectType,
) {
    for method in &def.prototype_methods {
        let key = format!("{}.prototype.{}", def.name, method.name);
        let f = builtin_method(engine, realm, function_prototype, &key, method);
        define_hidden(proto, PropertyKey::from(method.name.as_str()), f);
    }
    for (key, value) in &def.prototype_properties {
        define_hidden(proto, key.clone(), value.clone());
    }
}

fn bootstrap(engine: &Arc<Engine>, id: usize, realm: &Weak<Realm>) -> Realm {
    let object_prototype =
        ObjectType::Ordinary(ObjectBase::new_without_prototype()).into_js_object();
    let initial_shape = child_shape_of(&object_prototype);
    let function_prototype = ObjectType::Function(FunctionObject {
        base: ObjectBase::new_with_shape(initial_shape.clone()),
        data: engine.builtin_function_data("Function.prototype", || {
            FunctionData::new_native("", 0, function_prototype_call, None, None)
        }),
        environment: None,
        realm: realm.clone(),
        home_object: None,
    })
    .into_js_object();
    let global_object =
        ObjectType::Ordinary(ObjectBase::new_with_shape(initial_shape.clone())).into_js_object();
    let global_env = LexEnvironment::new(None);

    let mut prototypes: FxHashMap<String, JsObjectType> = FxHashMap::default();
    prototypes.insert("Object".to_string(), object_prototype.clone());
    prototypes.insert("Function".to_string(), function_prototype.clone());
    let mut constructors: FxHashMap<String, JsValue> = FxHashMap::default();

    for def in engine.registry().objects() {
        let proto = match prototypes.get(&def.name) {
            Some(existing) => Some(existing.clone()),
            None if def.has_prototype_object() => {
                let parent = def
                    .prototype
                    .as_ref()
                    .and_then(|p| prototypes.get(p))
                    .cloned()
                    .unwrap_or_else(|| object_prototype.clone());
                let proto = ObjectType::Ordinary(ObjectBase::with_prototype(&parent)).into_js_object();
                prototypes.insert(def.name.clone(), proto.clone());
                Some(proto)
            }
            None => None,
        };
        if let Some(proto) = &proto {
            install_prototype_members(engine, realm, &function_prototype, def, proto);
        }

        let holder = match &def.constructor {
            Some(ctor) => {
                let data = engine.builtin_function_data(&def.name, || {
                    FunctionData::new_native(
                        def.name.clone(),
                        ctor.length,
                        ctor.call,
                        ctor.construct,
                        None,
                    )
                });
                let f = new_function_object(data, &function_prototype, realm.clone(), None, None);
                if let Some(proto) = &proto {
                    f.write().as_js_object_mut().define_own_property(
                        PropertyKey::from("prototype"),
                        PropertyDescriptor::Data {
                            value: JsValue::Object(proto.clone()),
                            writable: false,
                            enumerable: false,
                            configurable: false,
                        },
                    );
                    define_hidden(proto, PropertyKey::from("constructor"), JsValue::Object(f.clone()));
                }
                Some(f)
            }
            None if !def.methods.is_empty() || !def.properties.is_empty() => Some(
                ObjectType::Ordinary(ObjectBase::new_with_shape(initial_shape.clone()))
                    .into_js_object(),
            ),
            None => None,
        };
        if let Some(holder) = holder {
            for method in &def.methods {
                let key = format!("{}.{}", def.name, method.name);
                let f = builtin_method(engine, realm, &function_prototype, &key, method);
                define_hidden(&holder, PropertyKey::from(method.name.as_str()), f);
            }
            for (key, value) in &def.properties {
                define_hidden(&holder, key.clone(), value.clone());
            }
            let value = JsValue::Object(holder);
            if def.global {
                global_env.declare(&def.name, value.clone(), true);
                define_hidden(&global_object, PropertyKey::from(def.name.as_str()), value.clone());
            }
            constructors.insert(def.name.clone(), value);
        }
    }

    let array_prototype = prototypes
        .get("Array")
        .cloned()
        .unwrap_or_else(|| {
            ObjectType::Ordinary(ObjectBase::new_with_shape(initial_shape.clone())).into_js_object()
        });
    let array_values = own_data_value(&array_prototype, "values");
    if !array_values.is_undefined() {
        define_hidden(
            &array_prototype,
            PropertyKey::Sym(SYMBOL_ITERATOR.clone()),
            array_values.clone(),
        );
    }
    let array_iterator_prototype = prototypes
        .get("ArrayIterator")
        .cloned()
        .unwrap_or_else(|| {
            ObjectType::Ordinary(ObjectBase::new_with_shape(initial_shape.clone())).into_js_object()
        });
    let array_iterator_next = own_data_value(&array_iterator_prototype, "next");

    Realm {
        id,
        intrinsics: Intrinsics {
            object_prototype,
            function_prototype,
            array_prototype,
            array_iterator_prototype,
            array_values,
            array_iterator_next,
            prototypes,
            constructors,
        },
        global_object,
        global_env,
        initial_shape,
    }
}

fn own_data_value(object: &JsObjectType, name: &str) -> JsValue {
    object
        .read()
        .as_js_object()
        .get_own_property(&PropertyKey::from(name))
        .and_then(|pd| match pd {
            PropertyDescriptor::Data { value, .. } => Some(value),
            PropertyDescriptor::Accessor { .. } => None,
        })
        .unwrap_or(JsValue::Undefined)
}
