//! Position-to-node resolution over the program tree.
//!
//! A pre-order walk visits every matchable node and keeps the last one whose
//! span contains the query position. Parents are visited before their
//! children, so the last match is the innermost (and, among equal ranges,
//! the latest-visited) node.

use tracing::warn;

use super::{
    ClassNode, ExpressionNode, FieldNode, MethodNode, ModuleNode, ParameterNode, PropertyNode,
    SourcePosition, SourceSpan, StatementNode, VariableExpression,
};

/// Borrowed view of a matchable tree node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    Class(&'a ClassNode),
    Method(&'a MethodNode),
    Field(&'a FieldNode),
    Property(&'a PropertyNode),
    Parameter(&'a ParameterNode),
    Statement(&'a StatementNode),
    Expression(&'a ExpressionNode),
    /// The declared variable of a local declaration (stored inline in the
    /// statement rather than as an expression node).
    Variable(&'a VariableExpression),
}

impl<'a> NodeRef<'a> {
    pub fn span(&self) -> SourceSpan {
        match self {
            NodeRef::Class(n) => n.span,
            NodeRef::Method(n) => n.span,
            NodeRef::Field(n) => n.span,
            NodeRef::Property(n) => n.span,
            NodeRef::Parameter(n) => n.span,
            NodeRef::Statement(n) => n.span(),
            NodeRef::Expression(n) => n.span(),
            NodeRef::Variable(n) => n.span,
        }
    }

    /// View this node as a variable expression when it is one, regardless of
    /// whether it came from an expression or a declaration target.
    pub fn as_variable(&self) -> Option<&'a VariableExpression> {
        match self {
            NodeRef::Variable(v) => Some(v),
            NodeRef::Expression(ExpressionNode::Variable(v)) => Some(v),
            _ => None,
        }
    }
}

struct Walker<'a> {
    position: SourcePosition,
    best: Option<NodeRef<'a>>,
    /// Set when a child span escapes its parent span; the result is discarded.
    corrupt: bool,
}

/// Find the innermost node containing the 1-based `position`.
///
/// Returns `None` when no node contains the position, or when the tree
/// violates the parent-contains-child range invariant (logged, not fatal).
pub fn node_at_position(module: &ModuleNode, position: SourcePosition) -> Option<NodeRef<'_>> {
    let mut walker = Walker {
        position,
        best: None,
        corrupt: false,
    };

    for class in &module.classes {
        walker.visit_class(class, &module.span);
    }
    for statement in &module.statements {
        walker.visit_statement(statement, &module.span);
    }

    if walker.corrupt {
        warn!(
            "program tree violates range containment at {}:{}; ignoring position query",
            position.line, position.column
        );
        return None;
    }
    walker.best
}

impl<'a> Walker<'a> {
    fn consider(&mut self, node: NodeRef<'a>, parent: &SourceSpan) {
        if !parent.encloses(&node.span()) {
            self.corrupt = true;
        }
        if node.span().contains(self.position) {
            self.best = Some(node);
        }
    }

    fn visit_class(&mut self, class: &'a ClassNode, parent: &SourceSpan) {
        self.consider(NodeRef::Class(class), parent);
        for field in &class.fields {
            self.consider(NodeRef::Field(field), &class.span);
        }
        for property in &class.properties {
            self.consider(NodeRef::Property(property), &class.span);
        }
        for method in &class.methods {
            self.visit_method(method, &class.span);
        }
    }

    fn visit_method(&mut self, method: &'a MethodNode, parent: &SourceSpan) {
        self.consider(NodeRef::Method(method), parent);
        for param in &method.parameters {
            self.consider(NodeRef::Parameter(param), &method.span);
        }
        if let Some(body) = &method.body {
            self.visit_statement(body, &method.span);
        }
    }

    fn visit_statement(&mut self, statement: &'a StatementNode, parent: &SourceSpan) {
        self.consider(NodeRef::Statement(statement), parent);
        let span = statement.span();
        match statement {
            StatementNode::Block(block) => {
                for inner in &block.statements {
                    self.visit_statement(inner, &span);
                }
            }
            StatementNode::Expression(stmt) => {
                self.visit_expression(&stmt.expression, &span);
            }
            StatementNode::Declaration(decl) => {
                // The declared variable participates in position lookup so the
                // cursor on `x` in `def x = 10` resolves to the variable, not
                // the whole statement.
                self.consider(NodeRef::Variable(&decl.variable), &span);
                if let Some(value) = &decl.value {
                    self.visit_expression(value, &span);
                }
            }
            StatementNode::TryCatch(t) => {
                self.visit_statement(&t.try_block, &span);
                for catch in &t.catches {
                    self.consider(NodeRef::Parameter(&catch.parameter), &catch.span);
                    self.visit_statement(&catch.body, &catch.span);
                }
                if let Some(finally) = &t.finally_block {
                    self.visit_statement(finally, &span);
                }
            }
            StatementNode::ForLoop(f) => {
                self.consider(NodeRef::Parameter(&f.parameter), &span);
                self.visit_expression(&f.collection, &span);
                self.visit_statement(&f.body, &span);
            }
        }
    }

    fn visit_expression(&mut self, expression: &'a ExpressionNode, parent: &SourceSpan) {
        self.consider(NodeRef::Expression(expression), parent);
        let span = expression.span();
        match expression {
            ExpressionNode::Variable(_)
            | ExpressionNode::Constant(_)
            | ExpressionNode::ClassRef(_) => {}
            ExpressionNode::Property(p) => {
                self.visit_expression(&p.receiver, &span);
            }
            ExpressionNode::MethodCall(call) => {
                self.visit_expression(&call.receiver, &span);
                for arg in &call.arguments {
                    self.visit_expression(arg, &span);
                }
            }
            ExpressionNode::Binary(b) => {
                self.visit_expression(&b.left, &span);
                self.visit_expression(&b.right, &span);
            }
            ExpressionNode::List(list) => {
                for element in &list.elements {
                    self.visit_expression(element, &span);
                }
            }
            ExpressionNode::Map(map) => {
                for entry in &map.entries {
                    self.visit_expression(&entry.key, &span);
                    self.visit_expression(&entry.value, &span);
                }
            }
            ExpressionNode::ConstructorCall(ctor) => {
                for arg in &ctor.arguments {
                    self.visit_expression(arg, &span);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{
        BlockStatement, ConstantExpression, ConstantValue, DeclarationStatement,
        ExpressionStatement, ForLoopStatement, ListExpression, MethodCallExpression, NodeId,
        TypeRef, VariableExpression,
    };

    fn span(sl: u32, sc: u32, el: u32, ec: u32) -> SourceSpan {
        SourceSpan::new(sl, sc, el, ec)
    }

    fn script(statements: Vec<StatementNode>, span_all: SourceSpan) -> ModuleNode {
        ModuleNode {
            imports: vec![],
            star_imports: vec![],
            classes: vec![],
            statements,
            span: span_all,
        }
    }

    fn decl_x() -> StatementNode {
        StatementNode::Declaration(DeclarationStatement {
            id: NodeId(1),
            variable: VariableExpression {
                name: "x".into(),
                binding: Some(NodeId(1)),
                span: span(1, 5, 1, 5),
            },
            type_ref: TypeRef::object(),
            value: Some(ExpressionNode::Constant(ConstantExpression {
                value: ConstantValue::Int(10),
                span: span(1, 9, 1, 10),
            })),
            span: span(1, 1, 1, 10),
        })
    }

    #[test]
    fn innermost_wins_over_enclosing_statement() {
        let module = script(vec![decl_x()], span(1, 1, 1, 10));

        let node = node_at_position(&module, SourcePosition::new(1, 5)).expect("node");
        let variable = node.as_variable().expect("declared variable");
        assert_eq!(variable.name, "x");

        let node = node_at_position(&module, SourcePosition::new(1, 9)).expect("node");
        assert!(matches!(
            node,
            NodeRef::Expression(ExpressionNode::Constant(_))
        ));

        // Column 2 sits on the `def` keyword: only the statement matches.
        let node = node_at_position(&module, SourcePosition::new(1, 2)).expect("node");
        assert!(matches!(node, NodeRef::Statement(_)));
    }

    #[test]
    fn position_outside_all_nodes_returns_none() {
        let module = script(vec![decl_x()], span(1, 1, 1, 10));
        assert!(node_at_position(&module, SourcePosition::new(5, 1)).is_none());
    }

    #[test]
    fn for_loop_parameter_is_matchable() {
        let body = StatementNode::Block(BlockStatement {
            statements: vec![StatementNode::Expression(ExpressionStatement {
                expression: ExpressionNode::MethodCall(MethodCallExpression {
                    receiver: Box::new(ExpressionNode::Variable(VariableExpression {
                        name: "this".into(),
                        binding: None,
                        span: span(2, 3, 2, 9),
                    })),
                    method: "println".into(),
                    arguments: vec![ExpressionNode::Variable(VariableExpression {
                        name: "item".into(),
                        binding: Some(NodeId(4)),
                        span: span(2, 11, 2, 14),
                    })],
                    span: span(2, 3, 2, 14),
                }),
                span: span(2, 3, 2, 14),
            })],
            span: span(1, 32, 3, 1),
        });
        let module = script(
            vec![StatementNode::ForLoop(ForLoopStatement {
                parameter: ParameterNode {
                    id: NodeId(4),
                    name: "item".into(),
                    type_ref: TypeRef::new("java.lang.String"),
                    span: span(1, 6, 1, 16),
                },
                collection: ExpressionNode::List(ListExpression {
                    elements: vec![],
                    span: span(1, 21, 1, 30),
                }),
                body: Box::new(body),
                span: span(1, 1, 3, 1),
            })],
            span(1, 1, 3, 1),
        );

        let node = node_at_position(&module, SourcePosition::new(1, 8)).expect("node");
        match node {
            NodeRef::Parameter(p) => assert_eq!(p.name, "item"),
            other => panic!("expected parameter, got {other:?}"),
        }

        let node = node_at_position(&module, SourcePosition::new(2, 12)).expect("node");
        match node {
            NodeRef::Expression(ExpressionNode::Variable(v)) => assert_eq!(v.name, "item"),
            other => panic!("expected variable, got {other:?}"),
        }
    }

    #[test]
    fn corrupt_range_invariant_yields_none() {
        // Child span escapes its parent: the walk reports nothing.
        let module = script(
            vec![StatementNode::Expression(ExpressionStatement {
                expression: ExpressionNode::Variable(VariableExpression {
                    name: "x".into(),
                    binding: None,
                    span: span(9, 1, 9, 5),
                }),
                span: span(1, 1, 1, 10),
            })],
            span(1, 1, 1, 10),
        );
        assert!(node_at_position(&module, SourcePosition::new(1, 3)).is_none());
    }
}
