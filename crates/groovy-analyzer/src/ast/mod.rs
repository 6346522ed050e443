//! The annotated program tree produced by the Groovy frontend.
//!
//! One [`ModuleNode`] corresponds to one source document. The tree is a
//! tagged-variant structure (no class hierarchy, no visitors with escape
//! hatches): statements and expressions are plain enums, and every node
//! carries a 1-based, inclusive [`SourceSpan`]. Variable expressions refer
//! to their declaration through a [`NodeId`], which stays valid for the
//! lifetime of the module that assigned it.

mod position;

pub use position::{NodeRef, node_at_position};

use serde::{Deserialize, Serialize};

/// Identifier of a declaration node within a single module.
///
/// Ids are assigned by the frontend and are only meaningful relative to the
/// module they came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// A 1-based position inside a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourcePosition {
    pub line: u32,
    pub column: u32,
}

impl SourcePosition {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A 1-based, inclusive source range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSpan {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl SourceSpan {
    pub fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Whether the span contains `pos`, inclusive on both ends.
    pub fn contains(&self, pos: SourcePosition) -> bool {
        if pos.line < self.start_line || pos.line > self.end_line {
            return false;
        }
        if pos.line == self.start_line && pos.column < self.start_column {
            return false;
        }
        if pos.line == self.end_line && pos.column > self.end_column {
            return false;
        }
        true
    }

    /// Whether `other` lies entirely within this span.
    pub fn encloses(&self, other: &SourceSpan) -> bool {
        self.contains(SourcePosition::new(other.start_line, other.start_column))
            && self.contains(SourcePosition::new(other.end_line, other.end_column))
    }

    pub fn start(&self) -> SourcePosition {
        SourcePosition::new(self.start_line, self.start_column)
    }

    pub fn end(&self) -> SourcePosition {
        SourcePosition::new(self.end_line, self.end_column)
    }
}

/// Reference to a type by name, fully qualified when the frontend resolved it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    pub name: String,
}

impl TypeRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn object() -> Self {
        Self::new("java.lang.Object")
    }

    /// Last dotted segment of the type name.
    pub fn simple_name(&self) -> &str {
        simple_name_of(&self.name)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self.name.as_str(),
            "void" | "boolean" | "byte" | "char" | "short" | "int" | "long" | "float" | "double"
        )
    }
}

/// Last dotted segment of a possibly-qualified class name.
pub fn simple_name_of(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

// ── module level ────────────────────────────────────────────────────────────

/// Top-level compilation unit for one source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleNode {
    #[serde(default)]
    pub imports: Vec<ImportNode>,
    #[serde(default)]
    pub star_imports: Vec<StarImportNode>,
    #[serde(default)]
    pub classes: Vec<ClassNode>,
    /// Script-level statements outside any class body.
    #[serde(default)]
    pub statements: Vec<StatementNode>,
    pub span: SourceSpan,
}

/// A class-qualified import, e.g. `import java.util.concurrent.Callable`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportNode {
    /// Fully qualified class name.
    pub class_name: String,
    #[serde(default)]
    pub alias: Option<String>,
    pub span: SourceSpan,
}

/// A star import, e.g. `import groovy.transform.*`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarImportNode {
    /// Package name without the trailing `.*`.
    pub package: String,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationNode {
    pub type_name: String,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Enum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassNode {
    pub name: String,
    #[serde(default)]
    pub kind: ClassKind,
    #[serde(default)]
    pub superclass: Option<TypeRef>,
    #[serde(default)]
    pub interfaces: Vec<TypeRef>,
    #[serde(default)]
    pub annotations: Vec<AnnotationNode>,
    #[serde(default)]
    pub fields: Vec<FieldNode>,
    #[serde(default)]
    pub properties: Vec<PropertyNode>,
    #[serde(default)]
    pub methods: Vec<MethodNode>,
    pub span: SourceSpan,
}

impl ClassNode {
    pub fn find_property(&self, name: &str) -> Option<&PropertyNode> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn find_field(&self, name: &str) -> Option<&FieldNode> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn find_method(&self, name: &str) -> Option<&MethodNode> {
        self.methods.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldNode {
    pub id: NodeId,
    pub name: String,
    pub type_ref: TypeRef,
    #[serde(default)]
    pub annotations: Vec<AnnotationNode>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyNode {
    pub id: NodeId,
    pub name: String,
    pub type_ref: TypeRef,
    #[serde(default)]
    pub annotations: Vec<AnnotationNode>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodNode {
    pub name: String,
    pub return_type: TypeRef,
    #[serde(default)]
    pub parameters: Vec<ParameterNode>,
    #[serde(default)]
    pub annotations: Vec<AnnotationNode>,
    #[serde(default)]
    pub body: Option<Box<StatementNode>>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterNode {
    pub id: NodeId,
    pub name: String,
    pub type_ref: TypeRef,
    pub span: SourceSpan,
}

// ── statements ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StatementNode {
    Block(BlockStatement),
    Expression(ExpressionStatement),
    Declaration(DeclarationStatement),
    TryCatch(TryCatchStatement),
    ForLoop(ForLoopStatement),
}

impl StatementNode {
    pub fn span(&self) -> SourceSpan {
        match self {
            StatementNode::Block(s) => s.span,
            StatementNode::Expression(s) => s.span,
            StatementNode::Declaration(s) => s.span,
            StatementNode::TryCatch(s) => s.span,
            StatementNode::ForLoop(s) => s.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockStatement {
    #[serde(default)]
    pub statements: Vec<StatementNode>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionStatement {
    pub expression: ExpressionNode,
    pub span: SourceSpan,
}

/// A local declaration such as `def x = 10` or `String s = "hi"`.
///
/// `variable` is the declared target; its span covers the name token so that
/// navigation to the declaration lands on the identifier itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationStatement {
    pub id: NodeId,
    pub variable: VariableExpression,
    pub type_ref: TypeRef,
    #[serde(default)]
    pub value: Option<ExpressionNode>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TryCatchStatement {
    pub try_block: Box<StatementNode>,
    #[serde(default)]
    pub catches: Vec<CatchClause>,
    #[serde(default)]
    pub finally_block: Option<Box<StatementNode>>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatchClause {
    pub parameter: ParameterNode,
    pub body: Box<StatementNode>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForLoopStatement {
    pub parameter: ParameterNode,
    pub collection: ExpressionNode,
    pub body: Box<StatementNode>,
    pub span: SourceSpan,
}

// ── expressions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ExpressionNode {
    Variable(VariableExpression),
    Constant(ConstantExpression),
    Property(PropertyExpression),
    MethodCall(MethodCallExpression),
    Binary(BinaryExpression),
    List(ListExpression),
    Map(MapExpression),
    ClassRef(ClassRefExpression),
    ConstructorCall(ConstructorCallExpression),
}

impl ExpressionNode {
    pub fn span(&self) -> SourceSpan {
        match self {
            ExpressionNode::Variable(e) => e.span,
            ExpressionNode::Constant(e) => e.span,
            ExpressionNode::Property(e) => e.span,
            ExpressionNode::MethodCall(e) => e.span,
            ExpressionNode::Binary(e) => e.span,
            ExpressionNode::List(e) => e.span,
            ExpressionNode::Map(e) => e.span,
            ExpressionNode::ClassRef(e) => e.span,
            ExpressionNode::ConstructorCall(e) => e.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableExpression {
    pub name: String,
    /// Declaration this variable is bound to, if the frontend resolved it.
    #[serde(default)]
    pub binding: Option<NodeId>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstantExpression {
    pub value: ConstantValue,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum ConstantValue {
    String(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Null,
}

/// `receiver.property` access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyExpression {
    pub receiver: Box<ExpressionNode>,
    pub property: String,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodCallExpression {
    pub receiver: Box<ExpressionNode>,
    pub method: String,
    #[serde(default)]
    pub arguments: Vec<ExpressionNode>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryExpression {
    pub operator: String,
    pub left: Box<ExpressionNode>,
    pub right: Box<ExpressionNode>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListExpression {
    #[serde(default)]
    pub elements: Vec<ExpressionNode>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapExpression {
    #[serde(default)]
    pub entries: Vec<MapEntry>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapEntry {
    pub key: ExpressionNode,
    pub value: ExpressionNode,
}

/// A reference to a class used as a value, e.g. the `Utils` in `Utils.run()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRefExpression {
    pub type_name: String,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructorCallExpression {
    pub type_name: String,
    #[serde(default)]
    pub arguments: Vec<ExpressionNode>,
    pub span: SourceSpan,
}

// ── declaration lookup ──────────────────────────────────────────────────────

/// A resolved declaration target for a bound variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeclarationRef<'a> {
    Parameter(&'a ParameterNode),
    Field(&'a FieldNode),
    Property(&'a PropertyNode),
    Local(&'a DeclarationStatement),
}

impl<'a> DeclarationRef<'a> {
    /// Span navigation should land on: the identifier for locals, the whole
    /// declaration node otherwise.
    pub fn target_span(&self) -> SourceSpan {
        match self {
            DeclarationRef::Parameter(p) => p.span,
            DeclarationRef::Field(f) => f.span,
            DeclarationRef::Property(p) => p.span,
            DeclarationRef::Local(d) => d.variable.span,
        }
    }

    pub fn declared_type(&self) -> &'a TypeRef {
        match self {
            DeclarationRef::Parameter(p) => &p.type_ref,
            DeclarationRef::Field(f) => &f.type_ref,
            DeclarationRef::Property(p) => &p.type_ref,
            DeclarationRef::Local(d) => &d.type_ref,
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            DeclarationRef::Parameter(p) => &p.name,
            DeclarationRef::Field(f) => &f.name,
            DeclarationRef::Property(p) => &p.name,
            DeclarationRef::Local(d) => &d.variable.name,
        }
    }
}

impl ModuleNode {
    /// Locate the declaration node carrying `id`, anywhere in the module.
    pub fn declaration(&self, id: NodeId) -> Option<DeclarationRef<'_>> {
        for class in &self.classes {
            for field in &class.fields {
                if field.id == id {
                    return Some(DeclarationRef::Field(field));
                }
            }
            for property in &class.properties {
                if property.id == id {
                    return Some(DeclarationRef::Property(property));
                }
            }
            for method in &class.methods {
                for param in &method.parameters {
                    if param.id == id {
                        return Some(DeclarationRef::Parameter(param));
                    }
                }
                if let Some(body) = &method.body
                    && let Some(found) = declaration_in_statement(body, id)
                {
                    return Some(found);
                }
            }
        }
        for statement in &self.statements {
            if let Some(found) = declaration_in_statement(statement, id) {
                return Some(found);
            }
        }
        None
    }

    /// The class whose span contains `line`, used to resolve `this`.
    pub fn enclosing_class(&self, line: u32) -> Option<&ClassNode> {
        self.classes
            .iter()
            .find(|c| c.span.start_line <= line && line <= c.span.end_line)
    }

    pub fn find_class(&self, simple_name: &str) -> Option<&ClassNode> {
        self.classes
            .iter()
            .find(|c| simple_name_of(&c.name) == simple_name)
    }
}

fn declaration_in_statement(statement: &StatementNode, id: NodeId) -> Option<DeclarationRef<'_>> {
    match statement {
        StatementNode::Declaration(decl) => (decl.id == id).then_some(DeclarationRef::Local(decl)),
        StatementNode::Block(block) => block
            .statements
            .iter()
            .find_map(|s| declaration_in_statement(s, id)),
        StatementNode::Expression(_) => None,
        StatementNode::TryCatch(t) => {
            if let Some(found) = declaration_in_statement(&t.try_block, id) {
                return Some(found);
            }
            for catch in &t.catches {
                if catch.parameter.id == id {
                    return Some(DeclarationRef::Parameter(&catch.parameter));
                }
                if let Some(found) = declaration_in_statement(&catch.body, id) {
                    return Some(found);
                }
            }
            t.finally_block
                .as_deref()
                .and_then(|f| declaration_in_statement(f, id))
        }
        StatementNode::ForLoop(f) => {
            if f.parameter.id == id {
                return Some(DeclarationRef::Parameter(&f.parameter));
            }
            declaration_in_statement(&f.body, id)
        }
    }
}
