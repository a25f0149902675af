use crate::runner::ds::object::{JsObject, JsObjectType, ObjectBase};

/// Proxy exotic object. Whether it is callable or constructible is copied from the target when
/// the proxy is created and never changes afterwards.
pub struct ProxyObject {
    pub base: ObjectBase,
    pub target: JsObjectType,
    pub handler: JsObjectType,
    pub callable: bool,
    pub constructor: bool,
}
impl ProxyObject {
    pub fn new(target: JsObjectType, handler: JsObjectType) -> Self {
        let (callable, constructor) = {
            let t = target.read();
            (t.is_callable(), t.is_constructor())
        };
        ProxyObject {
            base: ObjectBase::new_without_prototype(),
            target,
            handler,
            callable,
            constructor,
        }
    }
}
impl JsObject for ProxyObject {
    fn get_object_base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn get_object_base(&self) -> &ObjectBase {
        &self.base
    }
}
