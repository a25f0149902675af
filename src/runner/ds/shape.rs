use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::runner::ds::object::JsObjectType;

static NEXT_SHAPE_ID: AtomicU64 = AtomicU64::new(1);

/// Immutable layout descriptor. Only the prototype link is tracked; property storage stays in the
/// object's own map.
pub struct Shape {
    id: u64,
    prototype: Option<JsObjectType>,
}
impl Shape {
    pub fn new(prototype: Option<JsObjectType>) -> Arc<Shape> {
        Arc::new(Shape {
            id: NEXT_SHAPE_ID.fetch_add(1, Ordering::Relaxed),
            prototype,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn prototype(&self) -> Option<&JsObjectType> {
        self.prototype.as_ref()
    }
}
impl Debug for Shape {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Shape(#{}, has_prototype: {})",
            self.id,
            self.prototype.is_some()
        )
    }
}

/// Shape for objects whose prototype is `proto`. Created once per prototype and memoised on it.
pub fn child_shape_of(proto: &JsObjectType) -> Arc<Shape> {
    let existing = proto.read().as_js_object().get_object_base().proto_child_shape.clone();
    if let Some(shape) = existing {
        return shape;
    }
    let mut guard = proto.write();
    let base = guard.as_js_object_mut().get_object_base_mut();
    base.proto_child_shape
        .get_or_insert_with(|| Shape::new(Some(proto.clone())))
        .clone()
}
