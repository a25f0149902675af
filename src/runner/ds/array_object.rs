use crate::runner::ds::object::{JsObject, ObjectBase};
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyKey};
use crate::runner::ds::value::{JsNumberType, JsValue};

lazy_static! {
    pub static ref ARRAY_LENGTH_PROP: PropertyKey = PropertyKey::Str("length".to_string());
}

/// Canonical array index of a string key, e.g. `"3"` but not `"03"` or `"-1"`.
pub fn canonical_array_index(property: &PropertyKey) -> Option<usize> {
    match property {
        PropertyKey::Str(s) => {
            if s.is_empty() || (s.len() > 1 && s.starts_with('0')) {
                return None;
            }
            if !s.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            s.parse::<u32>().ok().map(|i| i as usize)
        }
        PropertyKey::Sym(_) => None,
    }
}

/// Dense array. Indexed elements and `length` live outside the property map.
pub struct ArrayObject {
    pub base: ObjectBase,
    pub elements: Vec<JsValue>,
}
impl ArrayObject {
    pub fn new(base: ObjectBase, elements: Vec<JsValue>) -> Self {
        ArrayObject { base, elements }
    }

    fn set_length(&mut self, value: &JsValue) -> bool {
        let new_len = match value {
            JsValue::Number(JsNumberType::Integer(i)) if *i >= 0 => *i as usize,
            JsValue::Number(JsNumberType::Float(f)) if *f >= 0.0 && f.fract() == 0.0 => {
                *f as usize
            }
            _ => return false,
        };
        self.elements.resize(new_len, JsValue::Undefined);
        true
    }
}
impl JsObject for ArrayObject {
    fn get_object_base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn get_object_base(&self) -> &ObjectBase {
        &self.base
    }

    fn get_own_property(&self, property: &PropertyKey) -> Option<PropertyDescriptor> {
        if *property == *ARRAY_LENGTH_PROP {
            return Some(PropertyDescriptor::Data {
                value: JsValue::Number(JsNumberType::Integer(self.elements.len() as i64)),
                writable: true,
                enumerable: false,
                configurable: false,
            });
        }
        if let Some(idx) = canonical_array_index(property) {
            return self
                .elements
                .get(idx)
                .map(|v| PropertyDescriptor::new_data(v.clone()));
        }
        self.base.get_own_property(property)
    }

    fn define_own_property(&mut self, property: PropertyKey, descriptor: PropertyDescriptor) -> bool {
        if property == *ARRAY_LENGTH_PROP {
            return match descriptor {
                PropertyDescriptor::Data { value, .. } => self.set_length(&value),
                PropertyDescriptor::Accessor { .. } => false,
            };
        }
        if canonical_array_index(&property).is_some() {
            return match descriptor {
                PropertyDescriptor::Data { value, .. } => self.put_own_value(property, value),
                PropertyDescriptor::Accessor { .. } => false,
            };
        }
        self.base.define_own_property(property, descriptor)
    }

    fn put_own_value(&mut self, property: PropertyKey, value: JsValue) -> bool {
        if property == *ARRAY_LENGTH_PROP {
            return self.set_length(&value);
        }
        if let Some(idx) = canonical_array_index(&property) {
            if idx >= self.elements.len() {
                self.elements.resize(idx + 1, JsValue::Undefined);
            }
            self.elements[idx] = value;
            return true;
        }
        self.base.put_own_value(property, value)
    }

    fn own_property_keys(&self) -> Vec<PropertyKey> {
        let mut keys: Vec<PropertyKey> = (0..self.elements.len())
            .map(|i| PropertyKey::Str(i.to_string()))
            .collect();
        keys.push(ARRAY_LENGTH_PROP.clone());
        keys.extend(self.base.own_property_keys());
        keys
    }
}

/// State of `%ArrayIteratorPrototype%` instances created by `Array.prototype.values`.
pub struct ArrayIteratorObject {
    pub base: ObjectBase,
    pub iterated: JsValue,
    pub next_index: usize,
    pub done: bool,
}
impl JsObject for ArrayIteratorObject {
    fn get_object_base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn get_object_base(&self) -> &ObjectBase {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_index_rejects_padded_and_negative_keys() {
        assert_eq!(canonical_array_index(&PropertyKey::from("3")), Some(3));
        assert_eq!(canonical_array_index(&PropertyKey::from("0")), Some(0));
        assert_eq!(canonical_array_index(&PropertyKey::from("03")), None);
        assert_eq!(canonical_array_index(&PropertyKey::from("-1")), None);
        assert_eq!(canonical_array_index(&PropertyKey::from("length")), None);
    }

    #[test]
    fn writing_past_the_end_grows_the_array() {
        let mut array = ArrayObject::new(ObjectBase::new_without_prototype(), vec![]);
        assert!(array.put_own_value(PropertyKey::from("2"), JsValue::from_i64(7)));
        assert_eq!(array.elements.len(), 3);
        assert_eq!(array.elements[0], JsValue::Undefined);
        assert_eq!(array.elements[2], JsValue::from_i64(7));
    }
}
