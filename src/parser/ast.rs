use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::runner::call::site::CallSite;
use crate::runner::ds::function_object::FunctionData;

#[derive(Clone)]
pub struct Meta {
    pub start_index: usize,
    pub end_index: usize,
    pub script: Arc<String>,
}
impl Meta {
    /// Meta covering the whole of `source`. Used when an AST is assembled without a parser.
    pub fn from_source(source: impl Into<String>) -> Self {
        let script = Arc::new(source.into());
        Meta {
            start_index: 0,
            end_index: script.len(),
            script,
        }
    }

    pub fn to_formatted_code(&self) -> String {
        self.script
            .get(self.start_index..self.end_index)
            .unwrap_or("")
            .to_string()
    }
}
impl Debug for Meta {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Meta({:?})", self.to_formatted_code())
    }
}

pub trait HasMeta {
    fn get_meta(&self) -> &Meta;
}

#[derive(Debug, Clone)]
pub struct IdentifierData {
    pub name: String,
    pub meta: Meta,
}

#[derive(Debug)]
pub enum ExpressionType {
    Literal(LiteralData),
    Identifier(IdentifierData),
    ThisExpression {
        meta: Meta,
    },
    NewTargetExpression {
        meta: Meta,
    },
    ArrayExpression {
        meta: Meta,
        elements: Vec<ExpressionOrSpreadElement>,
    },
    ObjectExpression {
        meta: Meta,
        properties: Vec<PropertyData>,
    },
    FunctionExpression(FunctionSite),
    ClassExpression(Box<ClassData>),
    UnaryExpression {
        meta: Meta,
        operator: UnaryOperator,
        argument: Box<ExpressionType>,
    },
    BinaryExpression {
        meta: Meta,
        operator: BinaryOperator,
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
    LogicalExpression {
        meta: Meta,
        operator: LogicalOperator,
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
    ConditionalExpression {
        meta: Meta,
        test: Box<ExpressionType>,
        consequent: Box<ExpressionType>,
        alternate: Box<ExpressionType>,
    },
    AssignmentExpression {
        meta: Meta,
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
    MemberExpression(MemberExpressionType),
    //A function or method call expression.
    CallExpression(Box<CallSite>),
    NewExpression(Box<CallSite>),
    SuperCallExpression(Box<CallSite>),
}

impl HasMeta for ExpressionType {
    fn get_meta(&self) -> &Meta {
        match self {
            ExpressionType::Literal(data) => &data.meta,
            ExpressionType::Identifier(data) => &data.meta,
            ExpressionType::ThisExpression { meta } => meta,
            ExpressionType::NewTargetExpression { meta } => meta,
            ExpressionType::ArrayExpression { meta, .. } => meta,
            ExpressionType::ObjectExpression { meta, .. } => meta,
            ExpressionType::FunctionExpression(site) => &site.literal.meta,
            ExpressionType::ClassExpression(data) => &data.meta,
            ExpressionType::UnaryExpression { meta, .. } => meta,
            ExpressionType::BinaryExpression { meta, .. } => meta,
            ExpressionType::LogicalExpression { meta, .. } => meta,
            ExpressionType::ConditionalExpression { meta, .. } => meta,
            ExpressionType::AssignmentExpression { meta, .. } => meta,
            ExpressionType::MemberExpression(data) => data.get_meta(),
            ExpressionType::CallExpression(site) => &site.meta,
            ExpressionType::NewExpression(site) => &site.meta,
            ExpressionType::SuperCallExpression(site) => &site.meta,
        }
    }
}

#[derive(Debug)]
pub enum MemberExpressionType {
    SimpleMemberExpression {
        meta: Meta,
        object: Box<ExpressionType>,
        property: IdentifierData,
    },
    ComputedMemberExpression {
        meta: Meta,
        object: Box<ExpressionType>,
        property: Box<ExpressionType>,
    },
}

impl HasMeta for MemberExpressionType {
    fn get_meta(&self) -> &Meta {
        match self {
            MemberExpressionType::SimpleMemberExpression { meta, .. } => meta,
            MemberExpressionType::ComputedMemberExpression { meta, .. } => meta,
        }
    }
}

#[derive(Debug)]
pub enum ExpressionOrSpreadElement {
    Expression(Box<ExpressionType>),
    SpreadElement(Box<ExpressionType>),
}

#[derive(Debug)]
pub struct PropertyData {
    pub meta: Meta,
    pub key: String,
    pub value: ExpressionType,
}

#[derive(Debug)]
pub enum UnaryOperator {
    Minus,
    Plus,
    LogicalNot,
    TypeOf,
    Void,
}

#[derive(Debug)]
pub enum BinaryOperator {
    LooselyEqual,
    LooselyUnequal,
    StrictlyEqual,
    StrictlyUnequal,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    InstanceOf,
}

#[derive(Debug)]
pub enum LogicalOperator {
    Or,
    And,
}

#[derive(Debug)]
pub struct LiteralData {
    pub meta: Meta,
    pub value: LiteralType,
}

#[derive(Debug)]
pub enum LiteralType {
    StringLiteral(String),
    BooleanLiteral(bool),
    NullLiteral,
    UndefinedLiteral,
    NumberLiteral(NumberLiteralType),
}

#[derive(Debug)]
pub enum NumberLiteralType {
    IntegerLiteral(i64),
    FloatLiteral(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FunctionLiteralKind {
    Normal,
    Method,
    ClassConstructor { derived: bool },
}

#[derive(Debug)]
pub struct FunctionLiteral {
    pub meta: Meta,
    pub id: Option<IdentifierData>,
    pub params: Vec<IdentifierData>,
    pub body: Vec<StatementType>,
    pub kind: FunctionLiteralKind,
}

/// A function literal together with the descriptor realized from it. Every closure created from
/// the same site shares that descriptor.
pub struct FunctionSite {
    pub literal: Arc<FunctionLiteral>,
    descriptor: OnceCell<Arc<FunctionData>>,
}
impl FunctionSite {
    pub fn new(literal: FunctionLiteral) -> Self {
        FunctionSite {
            literal: Arc::new(literal),
            descriptor: OnceCell::new(),
        }
    }

    pub fn descriptor(
        &self,
        realize: impl FnOnce(&Arc<FunctionLiteral>) -> FunctionData,
    ) -> Arc<FunctionData> {
        self.descriptor
            .get_or_init(|| Arc::new(realize(&self.literal)))
            .clone()
    }
}
impl Debug for FunctionSite {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FunctionSite({:?}, realized: {})",
            self.literal.id.as_ref().map(|id| id.name.as_str()),
            self.descriptor.get().is_some()
        )
    }
}

#[derive(Debug)]
pub struct MethodDefinitionData {
    pub meta: Meta,
    pub key: String,
    pub value: FunctionSite,
}

#[derive(Debug)]
pub struct ClassData {
    pub meta: Meta,
    pub id: Option<IdentifierData>,
    pub super_class: Option<Box<ExpressionType>>,
    pub constructor: Option<FunctionSite>,
    pub methods: Vec<MethodDefinitionData>,
    pub default_constructor: OnceCell<Arc<FunctionData>>,
}
impl ClassData {
    pub fn new(
        meta: Meta,
        id: Option<IdentifierData>,
        super_class: Option<Box<ExpressionType>>,
        constructor: Option<FunctionSite>,
        methods: Vec<MethodDefinitionData>,
    ) -> Self {
        ClassData {
            meta,
            id,
            super_class,
            constructor,
            methods,
            default_constructor: OnceCell::new(),
        }
    }
}

#[derive(Debug)]
pub struct ProgramData {
    pub meta: Meta,
    pub body: Vec<StatementType>,
}

impl HasMeta for ProgramData {
    fn get_meta(&self) -> &Meta {
        &self.meta
    }
}

#[derive(Debug)]
pub enum VariableDeclarationKind {
    Var,
    Let,
    Const,
}

#[derive(Debug)]
pub struct VariableDeclaratorData {
    pub meta: Meta,
    pub id: IdentifierData,
    pub init: Option<Box<ExpressionType>>,
}

#[derive(Debug)]
pub struct CatchClauseData {
    pub meta: Meta,
    pub param: Option<IdentifierData>,
    pub body: Vec<StatementType>,
}

#[derive(Debug)]
pub enum StatementType {
    ExpressionStatement {
        meta: Meta,
        expression: Box<ExpressionType>,
    },
    BlockStatement {
        meta: Meta,
        body: Vec<StatementType>,
    },
    EmptyStatement {
        meta: Meta,
    },
    ReturnStatement {
        meta: Meta,
        argument: Option<Box<ExpressionType>>,
    },
    IfStatement {
        meta: Meta,
        test: Box<ExpressionType>,
        consequent: Box<StatementType>,
        alternate: Option<Box<StatementType>>,
    },
    WhileStatement {
        meta: Meta,
        test: Box<ExpressionType>,
        body: Box<StatementType>,
    },
    ThrowStatement {
        meta: Meta,
        argument: Box<ExpressionType>,
    },
    TryStatement {
        meta: Meta,
        block: Vec<StatementType>,
        handler: Option<CatchClauseData>,
        finalizer: Option<Vec<StatementType>>,
    },
    VariableDeclaration {
        meta: Meta,
        kind: VariableDeclarationKind,
        declarations: Vec<VariableDeclaratorData>,
    },
    FunctionDeclaration(FunctionSite),
}

impl HasMeta for StatementType {
    fn get_meta(&self) -> &Meta {
        match self {
            StatementType::ExpressionStatement { meta, .. } => meta,
            StatementType::BlockStatement { meta, .. } => meta,
            StatementType::EmptyStatement { meta } => meta,
            StatementType::ReturnStatement { meta, .. } => meta,
            StatementType::IfStatement { meta, .. } => meta,
            StatementType::WhileStatement { meta, .. } => meta,
            StatementType::ThrowStatement { meta, .. } => meta,
            StatementType::TryStatement { meta, .. } => meta,
            StatementType::VariableDeclaration { meta, .. } => meta,
            StatementType::FunctionDeclaration(site) => &site.literal.meta,
        }
    }
}
