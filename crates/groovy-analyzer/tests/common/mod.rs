//! Shared fixtures: a scripted compiler frontend, hand-built program trees
//! with realistic source spans, a recording diagnostics publisher, and a
//! scriptable symbol index.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tower_lsp::lsp_types::{Diagnostic, Url};

use groovy_analyzer::ast::{
    BlockStatement, ClassRefExpression, ConstantExpression, ConstantValue, DeclarationStatement,
    ExpressionNode, ExpressionStatement, ForLoopStatement, ListExpression, MethodCallExpression,
    ModuleNode, NodeId, ParameterNode, SourceSpan, StatementNode, TypeRef, VariableExpression,
};
use groovy_analyzer::compiler::{
    CompilationEngine, CompilationPhase, Compiler, CompilerFactory, CompilerMessage,
    EngineOptions, ErrorSink,
};
use groovy_analyzer::diagnostics::DiagnosticsPublisher;
use groovy_analyzer::symbols::{SymbolIndex, SymbolIndexError, SymbolInfo};

pub fn span(sl: u32, sc: u32, el: u32, ec: u32) -> SourceSpan {
    SourceSpan::new(sl, sc, el, ec)
}

pub fn uri(name: &str) -> Url {
    Url::parse(&format!("file:///ws/{name}.groovy")).unwrap()
}

// ── scripted frontend ───────────────────────────────────────────────────────

#[derive(Clone)]
pub enum ScriptedOutcome {
    Tree(ModuleNode),
    TreeWithWarnings(ModuleNode, Vec<CompilerMessage>),
    Errors(Vec<CompilerMessage>),
    Silent,
}

/// Frontend scripted by exact source text.
#[derive(Default)]
pub struct ScriptedFrontend {
    outcomes: Mutex<HashMap<String, ScriptedOutcome>>,
}

impl ScriptedFrontend {
    pub fn script(&self, text: &str, outcome: ScriptedOutcome) {
        self.outcomes
            .lock()
            .unwrap()
            .insert(text.to_string(), outcome);
    }
}

pub struct ScriptedFrontendFactory(pub Arc<ScriptedFrontend>);

impl CompilerFactory for ScriptedFrontendFactory {
    fn create(&self) -> Box<dyn Compiler> {
        Box::new(ScriptedContext {
            frontend: Arc::clone(&self.0),
        })
    }
}

struct ScriptedContext {
    frontend: Arc<ScriptedFrontend>,
}

impl Compiler for ScriptedContext {
    fn compile(
        &mut self,
        text: &str,
        _source_id: &Url,
        _phase: CompilationPhase,
        sink: &mut ErrorSink,
    ) -> Option<ModuleNode> {
        let outcome = self.frontend.outcomes.lock().unwrap().get(text).cloned();
        match outcome {
            Some(ScriptedOutcome::Tree(module)) => Some(module),
            Some(ScriptedOutcome::TreeWithWarnings(module, warnings)) => {
                for warning in warnings {
                    sink.warning(warning);
                }
                Some(module)
            }
            Some(ScriptedOutcome::Errors(errors)) => {
                for error in errors {
                    sink.error(error);
                }
                None
            }
            Some(ScriptedOutcome::Silent) | None => None,
        }
    }
}

pub fn engine_for(frontend: &Arc<ScriptedFrontend>) -> Arc<CompilationEngine> {
    Arc::new(CompilationEngine::new(
        Arc::new(ScriptedFrontendFactory(Arc::clone(frontend))),
        EngineOptions::default(),
    ))
}

// ── recording publisher ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingPublisher {
    pub published: Mutex<Vec<(Url, Vec<Diagnostic>, Option<i32>)>>,
}

impl RecordingPublisher {
    pub fn publications(&self) -> Vec<(Url, Vec<Diagnostic>, Option<i32>)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl DiagnosticsPublisher for RecordingPublisher {
    async fn publish(&self, uri: Url, diagnostics: Vec<Diagnostic>, version: Option<i32>) {
        self.published
            .lock()
            .unwrap()
            .push((uri, diagnostics, version));
    }
}

// ── scripted symbol index ───────────────────────────────────────────────────

/// Symbol index answering every query with the same fixed entries, or
/// failing when scripted to.
#[derive(Default)]
pub struct ScriptedSymbols {
    pub entries: Vec<SymbolInfo>,
    pub fail: bool,
}

impl ScriptedSymbols {
    pub fn with_entries(entries: Vec<SymbolInfo>) -> Self {
        Self {
            entries,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            entries: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl SymbolIndex for ScriptedSymbols {
    async fn search_symbols(&self, name: &str) -> Result<Vec<SymbolInfo>, SymbolIndexError> {
        if self.fail {
            return Err(SymbolIndexError::Unavailable("store offline".into()));
        }
        Ok(self
            .entries
            .iter()
            .filter(|info| info.name == name)
            .cloned()
            .collect())
    }
}

// ── expression helpers ──────────────────────────────────────────────────────

pub fn int_const(value: i32, s: SourceSpan) -> ExpressionNode {
    ExpressionNode::Constant(ConstantExpression {
        value: ConstantValue::Int(value),
        span: s,
    })
}

pub fn string_const(value: &str, s: SourceSpan) -> ExpressionNode {
    ExpressionNode::Constant(ConstantExpression {
        value: ConstantValue::String(value.to_string()),
        span: s,
    })
}

pub fn variable(name: &str, binding: Option<NodeId>, s: SourceSpan) -> ExpressionNode {
    ExpressionNode::Variable(VariableExpression {
        name: name.to_string(),
        binding,
        span: s,
    })
}

/// The implicit `this` receiver of an unqualified call; its span covers the
/// method name text, as the frontend reports it.
pub fn implicit_this(s: SourceSpan) -> ExpressionNode {
    ExpressionNode::Variable(VariableExpression {
        name: "this".to_string(),
        binding: None,
        span: s,
    })
}

pub fn println_call(receiver_span: SourceSpan, argument: ExpressionNode, s: SourceSpan) -> StatementNode {
    StatementNode::Expression(ExpressionStatement {
        expression: ExpressionNode::MethodCall(MethodCallExpression {
            receiver: Box::new(implicit_this(receiver_span)),
            method: "println".to_string(),
            arguments: vec![argument],
            span: s,
        }),
        span: s,
    })
}

pub fn script(statements: Vec<StatementNode>, s: SourceSpan) -> ModuleNode {
    ModuleNode {
        imports: vec![],
        star_imports: vec![],
        classes: vec![],
        statements,
        span: s,
    }
}

// ── fixture trees ───────────────────────────────────────────────────────────

/// Tree for:
/// ```groovy
/// def x = 10
/// println x
/// ```
pub fn tree_def_x_println() -> ModuleNode {
    script(
        vec![
            StatementNode::Declaration(DeclarationStatement {
                id: NodeId(1),
                variable: VariableExpression {
                    name: "x".into(),
                    binding: Some(NodeId(1)),
                    span: span(1, 5, 1, 5),
                },
                type_ref: TypeRef::object(),
                value: Some(int_const(10, span(1, 9, 1, 10))),
                span: span(1, 1, 1, 10),
            }),
            println_call(
                span(2, 1, 2, 7),
                variable("x", Some(NodeId(1)), span(2, 9, 2, 9)),
                span(2, 1, 2, 9),
            ),
        ],
        span(1, 1, 2, 9),
    )
}

/// Tree for:
/// ```groovy
/// for (String item in ['a','b']) {
///   println item
/// }
/// ```
pub fn tree_for_loop_item() -> ModuleNode {
    script(
        vec![StatementNode::ForLoop(ForLoopStatement {
            parameter: ParameterNode {
                id: NodeId(1),
                name: "item".into(),
                type_ref: TypeRef::new("java.lang.String"),
                span: span(1, 6, 1, 16),
            },
            collection: ExpressionNode::List(ListExpression {
                elements: vec![
                    string_const("a", span(1, 22, 1, 24)),
                    string_const("b", span(1, 26, 1, 28)),
                ],
                span: span(1, 21, 1, 29),
            }),
            body: Box::new(StatementNode::Block(BlockStatement {
                statements: vec![println_call(
                    span(2, 3, 2, 9),
                    variable("item", Some(NodeId(1)), span(2, 11, 2, 14)),
                    span(2, 3, 2, 14),
                )],
                span: span(1, 32, 3, 1),
            })),
            span: span(1, 1, 3, 1),
        })],
        span(1, 1, 3, 1),
    )
}

/// Tree for:
/// ```groovy
/// Utils.doSomething()
/// ```
pub fn tree_utils_call() -> ModuleNode {
    let call = ExpressionNode::MethodCall(MethodCallExpression {
        receiver: Box::new(ExpressionNode::ClassRef(ClassRefExpression {
            type_name: "Utils".into(),
            span: span(1, 1, 1, 5),
        })),
        method: "doSomething".into(),
        arguments: vec![],
        span: span(1, 1, 1, 19),
    });
    script(
        vec![StatementNode::Expression(ExpressionStatement {
            expression: call,
            span: span(1, 1, 1, 19),
        })],
        span(1, 1, 1, 19),
    )
}

/// Tree for:
/// ```groovy
/// def x=10
/// def y=x+5
/// println x
/// ```
pub fn tree_three_xs() -> ModuleNode {
    script(
        vec![
            StatementNode::Declaration(DeclarationStatement {
                id: NodeId(1),
                variable: VariableExpression {
                    name: "x".into(),
                    binding: Some(NodeId(1)),
                    span: span(1, 5, 1, 5),
                },
                type_ref: TypeRef::object(),
                value: Some(int_const(10, span(1, 7, 1, 8))),
                span: span(1, 1, 1, 8),
            }),
            StatementNode::Declaration(DeclarationStatement {
                id: NodeId(2),
                variable: VariableExpression {
                    name: "y".into(),
                    binding: Some(NodeId(2)),
                    span: span(2, 5, 2, 5),
                },
                type_ref: TypeRef::object(),
                value: Some(ExpressionNode::Binary(
                    groovy_analyzer::ast::BinaryExpression {
                        operator: "+".into(),
                        left: Box::new(variable("x", Some(NodeId(1)), span(2, 7, 2, 7))),
                        right: Box::new(int_const(5, span(2, 9, 2, 9))),
                        span: span(2, 7, 2, 9),
                    },
                )),
                span: span(2, 1, 2, 9),
            }),
            println_call(
                span(3, 1, 3, 7),
                variable("x", Some(NodeId(1)), span(3, 9, 3, 9)),
                span(3, 1, 3, 9),
            ),
        ],
        span(1, 1, 3, 9),
    )
}
