use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::runner::ds::array_object::{ArrayIteratorObject, ArrayObject};
use crate::runner::ds::function_object::{BoundFunctionObject, FunctionData, FunctionObject};
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyKey};
use crate::runner::ds::proxy_object::ProxyObject;
use crate::runner::ds::shape::{child_shape_of, Shape};
use crate::runner::ds::value::JsValue;

pub type JsObjectType = Arc<RwLock<ObjectType>>;

pub enum ObjectType {
    Ordinary(ObjectBase),
    Function(FunctionObject),
    BoundFunction(BoundFunctionObject),
    Array(ArrayObject),
    ArrayIterator(ArrayIteratorObject),
    Proxy(ProxyObject),
}
impl ObjectType {
    pub fn into_js_object(self) -> JsObjectType {
        Arc::new(RwLock::new(self))
    }

    pub fn is_callable(&self) -> bool {
        match self {
            ObjectType::Function(_) | ObjectType::BoundFunction(_) => true,
            ObjectType::Proxy(p) => p.callable,
            _ => false,
        }
    }

    pub fn is_constructor(&self) -> bool {
        match self {
            ObjectType::Function(f) => f.data.flags.is_constructor,
            ObjectType::BoundFunction(f) => f.data.flags.is_constructor,
            ObjectType::Proxy(p) => p.constructor,
            _ => false,
        }
    }

    /// Descriptor of an ordinary or bound function.
    pub fn function_data(&self) -> Option<&Arc<FunctionData>> {
        match self {
            ObjectType::Function(f) => Some(&f.data),
            ObjectType::BoundFunction(f) => Some(&f.data),
            _ => None,
        }
    }

    pub fn as_js_object(&self) -> &dyn JsObject {
        match self {
            ObjectType::Ordinary(o) => o,
            ObjectType::Function(o) => o,
            ObjectType::BoundFunction(o) => o,
            ObjectType::Array(o) => o,
            ObjectType::ArrayIterator(o) => o,
            ObjectType::Proxy(o) => o,
        }
    }

    pub fn as_js_object_mut(&mut self) -> &mut dyn JsObject {
        match self {
            ObjectType::Ordinary(o) => o,
            ObjectType::Function(o) => o,
            ObjectType::BoundFunction(o) => o,
            ObjectType::Array(o) => o,
            ObjectType::ArrayIterator(o) => o,
            ObjectType::Proxy(o) => o,
        }
    }
}

pub struct ObjectBase {
    properties: HashMap<PropertyKey, PropertyDescriptor>,
    is_extensible: bool,
    shape: Arc<Shape>,
    pub(crate) proto_child_shape: Option<Arc<Shape>>,
}
impl ObjectBase {
    pub fn new_with_shape(shape: Arc<Shape>) -> Self {
        ObjectBase {
            properties: HashMap::new(),
            is_extensible: true,
            shape,
            proto_child_shape: None,
        }
    }

    pub fn with_prototype(prototype: &JsObjectType) -> Self {
        ObjectBase::new_with_shape(child_shape_of(prototype))
    }

    pub fn new_without_prototype() -> Self {
        ObjectBase::new_with_shape(Shape::new(None))
    }

    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    pub fn set_shape(&mut self, shape: Arc<Shape>) {
        self.shape = shape;
    }

    pub fn insert_data_property(
        &mut self,
        key: PropertyKey,
        value: JsValue,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    ) {
        self.properties.insert(
            key,
            PropertyDescriptor::Data {
                value,
                writable,
                enumerable,
                configurable,
            },
        );
    }

    pub fn insert_property(&mut self, key: PropertyKey, descriptor: PropertyDescriptor) {
        self.properties.insert(key, descriptor);
    }
}

impl JsObject for ObjectBase {
    fn get_object_base_mut(&mut self) -> &mut ObjectBase {
        self
    }

    fn get_object_base(&self) -> &ObjectBase {
        self
    }
}

pub trait JsObject {
    fn get_object_base_mut(&mut self) -> &mut ObjectBase;

    fn get_object_base(&self) -> &ObjectBase;

    fn get_prototype_of(&self) -> Option<JsObjectType> {
        self.get_object_base().shape.prototype().cloned()
    }

    fn is_extensible(&self) -> bool {
        self.get_object_base().is_extensible
    }

    fn prevent_extensions(&mut self) -> bool {
        self.get_object_base_mut().is_extensible = false;
        true
    }

    fn get_own_property(&self, property: &PropertyKey) -> Option<PropertyDescriptor> {
        self.get_object_base().properties.get(property).cloned()
    }

    fn define_own_property(&mut self, property: PropertyKey, descriptor: PropertyDescriptor) -> bool {
        ordinary_define_own_property(self.get_object_base_mut(), property, descriptor)
    }

    /// Ordinary `[[Set]]` once the prototype walk found no setter: overwrite a writable own data
    /// property or add a new one.
    fn put_own_value(&mut self, property: PropertyKey, value: JsValue) -> bool {
        let base = self.get_object_base_mut();
        match base.properties.get_mut(&property) {
            Some(PropertyDescriptor::Data {
                value: slot,
                writable,
                ..
            }) => {
                if *writable {
                    *slot = value;
                    true
                } else {
                    false
                }
            }
            Some(PropertyDescriptor::Accessor { .. }) => false,
            None => {
                if base.is_extensible {
                    base.properties
                        .insert(property, PropertyDescriptor::new_data(value));
                    true
                } else {
                    false
                }
            }
        }
    }

    fn delete(&mut self, property: &PropertyKey) -> bool {
        let base = self.get_object_base_mut();
        match base.properties.get(property) {
            None => true,
            Some(pd) => {
                if pd.is_configurable() {
                    base.properties.remove(property);
                    true
                } else {
                    false
                }
            }
        }
    }

    fn own_property_keys(&self) -> Vec<PropertyKey> {
        self.get_object_base().properties.keys().cloned().collect()
    }
}

fn ordinary_define_own_property(
    base: &mut ObjectBase,
    property: PropertyKey,
    descriptor: PropertyDescriptor,
) -> bool {
    match base.properties.get(&property) {
        Some(current) if !current.is_configurable() => false,
        Some(_) => {
            base.properties.insert(property, descriptor);
            true
        }
        None => {
            if base.is_extensible {
                base.properties.insert(property, descriptor);
                true
            } else {
                false
            }
        }
    }
}
