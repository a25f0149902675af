//! `[[Construct]]`: allocate the receiver, run the body, filter the result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::runner::call::published::Published;
use crate::runner::call::target::function_name;
use crate::runner::call::construct_with_new_target;
use crate::runner::ds::error::{thrown_in_realm, ErrorKind, JErrorType};
use crate::runner::ds::function_object::{function_realm, FunctionCode, FunctionData};
use crate::runner::ds::object::{JsObjectType, ObjectBase, ObjectType};
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::{get, get_prototype_of, is_constructor};
use crate::runner::ds::operations::type_conversion::is_primitive;
use crate::runner::ds::shape::{child_shape_of, Shape};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::function::call_script_function;
use crate::runner::eval::types::ValueResult;
use crate::runner::plugin::types::{EvalContext, NativeConstructFn};

/// Receiver handed to the constructor body.
pub enum Receiver {
    Allocated(JsObjectType),
    /// The builtin body creates the result itself.
    SelfConstructing,
    /// Derived constructor: `this` is bound by `super(...)`.
    Deferred,
}

enum ConstructBody {
    Script,
    Native(NativeConstructFn),
    ClassDefault,
}

pub struct ConstructTarget {
    body: ConstructBody,
    derived: bool,
    shapes: PrototypeShapeCache,
}

impl ConstructTarget {
    pub fn new(data: &FunctionData) -> Self {
        let body = match &data.code {
            FunctionCode::Native(native) => match native.construct {
                Some(construct) => ConstructBody::Native(construct),
                None => unreachable!("constructor flag on a builtin without [[Construct]]"),
            },
            FunctionCode::ClassDefault => ConstructBody::ClassDefault,
            FunctionCode::Script(_) | FunctionCode::Bound => ConstructBody::Script,
        };
        ConstructTarget {
            body,
            derived: data.flags.is_derived,
            shapes: PrototypeShapeCache::new(),
        }
    }

    pub fn shape_cache(&self) -> &PrototypeShapeCache {
        &self.shapes
    }

    pub fn construct(
        &self,
        ctx: &mut EvalContext,
        function: &JsObjectType,
        new_target: JsValue,
        args: Vec<JsValue>,
    ) -> ValueResult {
        let receiver = self.allocate_receiver(ctx, &new_target)?;
        match (&self.body, receiver) {
            (ConstructBody::Native(construct), _) => {
                let realm = function_realm(function);
                ctx.in_realm(realm, |ctx| construct(ctx, &new_target, args))
            }
            (ConstructBody::ClassDefault, Receiver::Allocated(this)) => Ok(JsValue::Object(this)),
            (ConstructBody::ClassDefault, _) => {
                let parent = get_prototype_of(function)
                    .map(JsValue::Object)
                    .unwrap_or(JsValue::Null);
                if !is_constructor(&parent) {
                    return Err(JErrorType::TypeError(format!(
                        "Super constructor {} of anonymous class is not a constructor",
                        parent
                    )));
                }
                let realm = function_realm(function);
                ctx.in_realm(realm, |ctx| {
                    construct_with_new_target(ctx, &parent, args, new_target)
                })
            }
            (ConstructBody::Script, receiver) => {
                let this = match receiver {
                    Receiver::Allocated(o) => Some(JsValue::Object(o)),
                    _ => None,
                };
                let (result, this) =
                    call_script_function(ctx, function, this, Some(new_target), args)?;
                filter_constructor_result(ctx, result, this, self.derived)
            }
        }
    }

    fn allocate_receiver(
        &self,
        ctx: &mut EvalContext,
        new_target: &JsValue,
    ) -> Result<Receiver, JErrorType> {
        if let ConstructBody::Native(_) = self.body {
            return Ok(Receiver::SelfConstructing);
        }
        if self.derived {
            return Ok(Receiver::Deferred);
        }
        let new_target_object = match new_target {
            JsValue::Object(o) => o.clone(),
            _ => {
                return Err(JErrorType::TypeError(format!(
                    "{} is not a constructor",
                    new_target
                )))
            }
        };
        let prototype = get(ctx, &new_target_object, &PropertyKey::from("prototype"), new_target)?;
        let shape = match &prototype {
            JsValue::Object(proto) => {
                let limit = ctx.engine.config().property_cache_limit;
                self.shapes
                    .shape_for(proto, limit, &function_name(&new_target_object))
            }
            _ => function_realm(&new_target_object)
                .map(|realm| realm.initial_shape.clone())
                .unwrap_or_else(|| ctx.realm.initial_shape.clone()),
        };
        Ok(Receiver::Allocated(
            ObjectType::Ordinary(ObjectBase::new_with_shape(shape)).into_js_object(),
        ))
    }
}

/// Decides the value of a `new` expression from the body's completion value and the final
/// `this`. Runs in the caller's realm.
pub fn filter_constructor_result(
    ctx: &mut EvalContext,
    result: JsValue,
    this: Option<JsValue>,
    derived: bool,
) -> ValueResult {
    let accepted = if ctx.engine.config().host_interop {
        !is_primitive(&result)
    } else {
        result.is_object()
    };
    if accepted {
        return Ok(result);
    }
    if derived && !result.is_undefined() {
        return Err(thrown_in_realm(
            &ctx.realm,
            ErrorKind::TypeError,
            "Derived constructors may only return object or undefined",
        ));
    }
    this.ok_or_else(|| {
        JErrorType::ReferenceError(
            "Must call super constructor in derived class before accessing 'this' or returning from derived constructor"
                .to_string(),
        )
    })
}

struct ShapeEntry {
    prototype: JsObjectType,
    shape: Arc<Shape>,
    next: Option<Arc<ShapeEntry>>,
}

/// Per-constructor memo of prototype object to child shape. Degrades to uncached lookups after
/// `limit` distinct prototypes.
pub struct PrototypeShapeCache {
    head: Published<ShapeEntry>,
    lock: Mutex<()>,
    degraded: AtomicBool,
}

impl PrototypeShapeCache {
    pub fn new() -> Self {
        PrototypeShapeCache {
            head: Published::new(),
            lock: Mutex::new(()),
            degraded: AtomicBool::new(false),
        }
    }

    fn lookup(&self, prototype: &JsObjectType) -> Option<Arc<Shape>> {
        let mut entry = self.head.load();
        while let Some(e) = entry {
            if Arc::ptr_eq(&e.prototype, prototype) {
                return Some(e.shape.clone());
            }
            entry = e.next.clone();
        }
        None
    }

    pub fn shape_for(&self, prototype: &JsObjectType, limit: usize, site: &str) -> Arc<Shape> {
        if let Some(shape) = self.lookup(prototype) {
            return shape;
        }
        if self.degraded.load(Ordering::Acquire) {
            return child_shape_of(prototype);
        }
        let _guard = self.lock.lock();
        if let Some(shape) = self.lookup(prototype) {
            return shape;
        }
        let head = self.head.load();
        let mut count = 0;
        let mut cursor = head.clone();
        while let Some(e) = cursor {
            count += 1;
            cursor = e.next.clone();
        }
        if count >= limit {
            self.degraded.store(true, Ordering::Release);
            debug!(site, depth = count, kind = "prototype-shape", "shape cache degraded to uncached");
            return child_shape_of(prototype);
        }
        let shape = child_shape_of(prototype);
        self.head.publish(Some(Arc::new(ShapeEntry {
            prototype: prototype.clone(),
            shape: shape.clone(),
            next: head,
        })));
        shape
    }

    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut entry = self.head.load();
        while let Some(e) = entry {
            count += 1;
            entry = e.next.clone();
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        self.head.load().is_none()
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }
}

impl Default for PrototypeShapeCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proto() -> JsObjectType {
        ObjectType::Ordinary(ObjectBase::new_without_prototype()).into_js_object()
    }

    #[test]
    fn repeated_prototype_hits_the_cache() {
        let cache = PrototypeShapeCache::new();
        let p = proto();
        let first = cache.shape_for(&p, 5, "F");
        let second = cache.shape_for(&p, 5, "F");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert!(!cache.is_degraded());
    }

    #[test]
    fn degrades_after_the_limit_but_keeps_answering() {
        let cache = PrototypeShapeCache::new();
        let protos: Vec<_> = (0..3).map(|_| proto()).collect();
        for p in &protos {
            cache.shape_for(p, 2, "F");
        }
        assert!(cache.is_degraded());
        assert_eq!(cache.len(), 2);
        let shape = cache.shape_for(&protos[2], 2, "F");
        assert!(Arc::ptr_eq(shape.prototype().unwrap(), &protos[2]));
    }
}
