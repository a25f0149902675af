use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;

use crate::parser::ast::{FunctionLiteral, FunctionLiteralKind};
use crate::runner::call::target::CallTarget;
use crate::runner::call::InvocationKind;
use crate::runner::ds::lex_env::JsLexEnvironmentType;
use crate::runner::ds::object::{JsObject, JsObjectType, ObjectBase, ObjectType};
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::realm::Realm;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::{InlinedFn, NativeConstructFn, NativeFn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FunctionFlags {
    pub is_constructor: bool,
    pub is_generator: bool,
    pub is_async: bool,
    pub is_builtin: bool,
    pub needs_new_target: bool,
    pub is_derived: bool,
    pub requires_new: bool,
    pub is_class_constructor: bool,
    pub is_bound: bool,
}

pub struct NativeFunction {
    pub call: NativeFn,
    pub construct: Option<NativeConstructFn>,
    pub inlined: Option<InlinedFn>,
}

pub enum FunctionCode {
    Script(Arc<FunctionLiteral>),
    Native(NativeFunction),
    Bound,
    /// Implicit class constructor. A derived one forwards its arguments to the parent.
    ClassDefault,
}

/// Behaviour shared by every function object created from the same definition.
pub struct FunctionData {
    pub name: String,
    pub length: usize,
    pub flags: FunctionFlags,
    pub code: FunctionCode,
    call_target: OnceCell<Arc<CallTarget>>,
    construct_target: OnceCell<Arc<CallTarget>>,
    construct_new_target_target: OnceCell<Arc<CallTarget>>,
}
impl FunctionData {
    pub fn new(name: impl Into<String>, length: usize, flags: FunctionFlags, code: FunctionCode) -> Self {
        FunctionData {
            name: name.into(),
            length,
            flags,
            code,
            call_target: OnceCell::new(),
            construct_target: OnceCell::new(),
            construct_new_target_target: OnceCell::new(),
        }
    }

    pub fn from_literal(literal: &Arc<FunctionLiteral>) -> Self {
        let name = literal
            .id
            .as_ref()
            .map(|id| id.name.to_string())
            .unwrap_or_default();
        let flags = match literal.kind {
            FunctionLiteralKind::Normal => FunctionFlags {
                is_constructor: true,
                ..FunctionFlags::default()
            },
            FunctionLiteralKind::Method => FunctionFlags::default(),
            FunctionLiteralKind::ClassConstructor { derived } => FunctionFlags {
                is_constructor: true,
                is_class_constructor: true,
                requires_new: true,
                needs_new_target: true,
                is_derived: derived,
                ..FunctionFlags::default()
            },
        };
        FunctionData::new(
            name,
            literal.params.len(),
            flags,
            FunctionCode::Script(literal.clone()),
        )
    }

    pub fn new_native(
        name: impl Into<String>,
        length: usize,
        call: NativeFn,
        construct: Option<NativeConstructFn>,
        inlined: Option<InlinedFn>,
    ) -> Self {
        FunctionData::new(
            name,
            length,
            FunctionFlags {
                is_builtin: true,
                is_constructor: construct.is_some(),
                ..FunctionFlags::default()
            },
            FunctionCode::Native(NativeFunction {
                call,
                construct,
                inlined,
            }),
        )
    }

    pub fn inlined(&self) -> Option<InlinedFn> {
        match &self.code {
            FunctionCode::Native(n) => n.inlined,
            _ => None,
        }
    }

    pub fn call_target(&self) -> Arc<CallTarget> {
        self.call_target
            .get_or_init(|| Arc::new(CallTarget::for_call(self)))
            .clone()
    }

    pub fn construct_target(&self) -> Arc<CallTarget> {
        self.construct_target
            .get_or_init(|| Arc::new(CallTarget::for_construct(self)))
            .clone()
    }

    pub fn construct_new_target_target(&self) -> Arc<CallTarget> {
        self.construct_new_target_target
            .get_or_init(|| Arc::new(CallTarget::for_construct(self)))
            .clone()
    }

    pub fn target_for(&self, kind: InvocationKind) -> Arc<CallTarget> {
        match kind {
            InvocationKind::Call => self.call_target(),
            InvocationKind::New => self.construct_target(),
            InvocationKind::NewTarget => self.construct_new_target_target(),
        }
    }
}
impl Debug for FunctionData {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionData")
            .field("name", &self.name)
            .field("length", &self.length)
            .field("flags", &self.flags)
            .finish()
    }
}

pub struct FunctionObject {
    pub base: ObjectBase,
    pub data: Arc<FunctionData>,
    pub environment: Option<JsLexEnvironmentType>,
    pub realm: Weak<Realm>,
    pub home_object: Option<JsObjectType>,
}
impl JsObject for FunctionObject {
    fn get_object_base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn get_object_base(&self) -> &ObjectBase {
        &self.base
    }
}

/// Allocates a function object for `data` with the standard `name` and `length` properties.
pub fn new_function_object(
    data: Arc<FunctionData>,
    function_prototype: &JsObjectType,
    realm: Weak<Realm>,
    environment: Option<JsLexEnvironmentType>,
    home_object: Option<JsObjectType>,
) -> JsObjectType {
    let mut base = ObjectBase::with_prototype(function_prototype);
    insert_name_and_length(&mut base, &data.name, data.length);
    ObjectType::Function(FunctionObject {
        base,
        data,
        environment,
        realm,
        home_object,
    })
    .into_js_object()
}

pub(crate) fn insert_name_and_length(base: &mut ObjectBase, name: &str, length: usize) {
    base.insert_data_property(
        PropertyKey::from("name"),
        JsValue::String(name.to_string()),
        false,
        false,
        true,
    );
    base.insert_data_property(
        PropertyKey::from("length"),
        JsValue::from_i64(length as i64),
        false,
        false,
        true,
    );
}

pub struct BoundFunctionObject {
    pub base: ObjectBase,
    pub data: Arc<FunctionData>,
    pub target: JsValue,
    pub bound_this: JsValue,
    pub bound_args: Vec<JsValue>,
}
impl JsObject for BoundFunctionObject {
    fn get_object_base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn get_object_base(&self) -> &ObjectBase {
        &self.base
    }
}

/// One layer of a bound function, copied out of the object so no lock is held while calling.
#[derive(Debug, Clone)]
pub struct BoundLayer {
    pub target: JsValue,
    pub bound_this: JsValue,
    pub bound_args: Vec<JsValue>,
}

pub fn bound_layer(function: &JsObjectType) -> Option<BoundLayer> {
    match &*function.read() {
        ObjectType::BoundFunction(b) => Some(BoundLayer {
            target: b.target.clone(),
            bound_this: b.bound_this.clone(),
            bound_args: b.bound_args.clone(),
        }),
        _ => None,
    }
}

/// Realm a function runs in; `None` for values that are not ordinary functions or whose realm
/// was dropped.
pub fn function_realm(function: &JsObjectType) -> Option<Arc<Realm>> {
    match &*function.read() {
        ObjectType::Function(f) => f.realm.upgrade(),
        _ => None,
    }
}
