use tower_lsp::lsp_types::Url;

use crate::ast::{
    ClassNode, ExpressionNode, ModuleNode, NodeRef, SourcePosition, SourceSpan, StatementNode,
    node_at_position, simple_name_of,
};
use crate::symbols::SymbolKind;

use super::definition::declaration_spans_by_name;
use super::{NavigationResolver, SourceLocation, dedup};

/// What the cursor's declaration resolves to, and how usages of it are
/// matched while walking the module.
#[derive(Debug, Clone)]
struct ReferenceTarget {
    name: String,
    matcher: Matcher,
    declaration: Option<SourceSpan>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Matcher {
    /// Variable-name equality.
    Variable,
    /// Method-name equality on call sites.
    Method,
    /// Property-name equality on property accesses, plus bare-name uses.
    Member,
    /// Class identity on class references and constructions.
    Class,
}

impl Matcher {
    fn symbol_kinds(self) -> &'static [SymbolKind] {
        match self {
            // Local variables have no workspace presence.
            Matcher::Variable => &[],
            Matcher::Method => &[SymbolKind::Method],
            Matcher::Member => &[SymbolKind::Property, SymbolKind::Field],
            Matcher::Class => &[SymbolKind::Class, SymbolKind::Interface, SymbolKind::Enum],
        }
    }
}

impl NavigationResolver {
    pub(super) async fn references_in_module(
        &self,
        module: &ModuleNode,
        source_id: &Url,
        position: SourcePosition,
        include_declaration: bool,
    ) -> Vec<SourceLocation> {
        let Some(node) = node_at_position(module, position) else {
            return Vec::new();
        };
        let Some(target) = identify_target(node, module) else {
            return Vec::new();
        };

        let mut locations: Vec<SourceLocation> = collect_usages(module, &target)
            .into_iter()
            .map(|span| SourceLocation::new(source_id.clone(), span))
            .collect();

        let kinds = target.matcher.symbol_kinds();
        if !kinds.is_empty() {
            locations.extend(self.query_symbols(&target.name, kinds).await);
        }

        if include_declaration
            && let Some(declaration) = target.declaration
        {
            locations.push(SourceLocation::new(source_id.clone(), declaration));
        }

        dedup(locations)
    }
}

/// Map the node under the cursor to a reference target.
fn identify_target(node: NodeRef<'_>, module: &ModuleNode) -> Option<ReferenceTarget> {
    if let Some(variable) = node.as_variable() {
        let declaration = variable
            .binding
            .and_then(|id| module.declaration(id))
            .map(|decl| decl.target_span())
            .or_else(|| {
                declaration_spans_by_name(module, &variable.name)
                    .into_iter()
                    .next()
            });
        return Some(ReferenceTarget {
            name: variable.name.clone(),
            matcher: Matcher::Variable,
            declaration,
        });
    }

    match node {
        NodeRef::Parameter(param) => Some(ReferenceTarget {
            name: param.name.clone(),
            matcher: Matcher::Variable,
            declaration: Some(param.span),
        }),
        NodeRef::Field(field) => Some(ReferenceTarget {
            name: field.name.clone(),
            matcher: Matcher::Member,
            declaration: Some(field.span),
        }),
        NodeRef::Property(property) => Some(ReferenceTarget {
            name: property.name.clone(),
            matcher: Matcher::Member,
            declaration: Some(property.span),
        }),
        NodeRef::Method(method) => Some(ReferenceTarget {
            name: method.name.clone(),
            matcher: Matcher::Method,
            declaration: Some(method.span),
        }),
        NodeRef::Class(class) => Some(ReferenceTarget {
            name: simple_name_of(&class.name).to_string(),
            matcher: Matcher::Class,
            declaration: Some(class.span),
        }),
        NodeRef::Expression(ExpressionNode::MethodCall(call)) => Some(ReferenceTarget {
            name: call.method.clone(),
            matcher: Matcher::Method,
            declaration: local_method_span(module, &call.method),
        }),
        NodeRef::Expression(ExpressionNode::Property(property)) => Some(ReferenceTarget {
            name: property.property.clone(),
            matcher: Matcher::Member,
            declaration: local_member_span(module, &property.property),
        }),
        NodeRef::Expression(ExpressionNode::ClassRef(class_ref)) => {
            class_target(module, &class_ref.type_name)
        }
        NodeRef::Expression(ExpressionNode::ConstructorCall(ctor)) => {
            class_target(module, &ctor.type_name)
        }
        _ => None,
    }
}

fn class_target(module: &ModuleNode, type_name: &str) -> Option<ReferenceTarget> {
    let simple = simple_name_of(type_name).to_string();
    let declaration = module.find_class(&simple).map(|class| class.span);
    Some(ReferenceTarget {
        name: simple,
        matcher: Matcher::Class,
        declaration,
    })
}

fn local_method_span(module: &ModuleNode, name: &str) -> Option<SourceSpan> {
    module
        .classes
        .iter()
        .flat_map(|class| &class.methods)
        .find(|method| method.name == name)
        .map(|method| method.span)
}

fn local_member_span(module: &ModuleNode, name: &str) -> Option<SourceSpan> {
    module.classes.iter().find_map(|class| {
        class
            .find_property(name)
            .map(|p| p.span)
            .or_else(|| class.find_field(name).map(|f| f.span))
    })
}

/// Walk the module collecting usage sites for the target.
fn collect_usages(module: &ModuleNode, target: &ReferenceTarget) -> Vec<SourceSpan> {
    let mut spans = Vec::new();
    for class in &module.classes {
        collect_in_class(class, target, &mut spans);
    }
    for statement in &module.statements {
        collect_in_statement(statement, target, &mut spans);
    }
    spans
}

fn collect_in_class(class: &ClassNode, target: &ReferenceTarget, spans: &mut Vec<SourceSpan>) {
    if target.matcher == Matcher::Class {
        if let Some(superclass) = &class.superclass
            && superclass.simple_name() == target.name
        {
            spans.push(class.span);
        }
    }
    for method in &class.methods {
        if let Some(body) = &method.body {
            collect_in_statement(body, target, spans);
        }
    }
}

fn collect_in_statement(
    statement: &StatementNode,
    target: &ReferenceTarget,
    spans: &mut Vec<SourceSpan>,
) {
    match statement {
        StatementNode::Block(block) => {
            for inner in &block.statements {
                collect_in_statement(inner, target, spans);
            }
        }
        StatementNode::Expression(stmt) => collect_in_expression(&stmt.expression, target, spans),
        // The declared variable is the declaration, not a usage; only the
        // initializer is walked.
        StatementNode::Declaration(decl) => {
            if let Some(value) = &decl.value {
                collect_in_expression(value, target, spans);
            }
        }
        StatementNode::TryCatch(t) => {
            collect_in_statement(&t.try_block, target, spans);
            for catch in &t.catches {
                collect_in_statement(&catch.body, target, spans);
            }
            if let Some(finally) = &t.finally_block {
                collect_in_statement(finally, target, spans);
            }
        }
        StatementNode::ForLoop(f) => {
            collect_in_expression(&f.collection, target, spans);
            collect_in_statement(&f.body, target, spans);
        }
    }
}

fn collect_in_expression(
    expression: &ExpressionNode,
    target: &ReferenceTarget,
    spans: &mut Vec<SourceSpan>,
) {
    match expression {
        ExpressionNode::Variable(v) => {
            if matches!(target.matcher, Matcher::Variable | Matcher::Member)
                && v.name == target.name
            {
                spans.push(v.span);
            }
        }
        ExpressionNode::Constant(_) => {}
        ExpressionNode::Property(p) => {
            if target.matcher == Matcher::Member && p.property == target.name {
                spans.push(p.span);
            }
            collect_in_expression(&p.receiver, target, spans);
        }
        ExpressionNode::MethodCall(call) => {
            if target.matcher == Matcher::Method && call.method == target.name {
                spans.push(call.span);
            }
            collect_in_expression(&call.receiver, target, spans);
            for arg in &call.arguments {
                collect_in_expression(arg, target, spans);
            }
        }
        ExpressionNode::Binary(b) => {
            collect_in_expression(&b.left, target, spans);
            collect_in_expression(&b.right, target, spans);
        }
        ExpressionNode::List(list) => {
            for element in &list.elements {
                collect_in_expression(element, target, spans);
            }
        }
        ExpressionNode::Map(map) => {
            for entry in &map.entries {
                collect_in_expression(&entry.key, target, spans);
                collect_in_expression(&entry.value, target, spans);
            }
        }
        ExpressionNode::ClassRef(class_ref) => {
            if target.matcher == Matcher::Class
                && simple_name_of(&class_ref.type_name) == target.name
            {
                spans.push(class_ref.span);
            }
        }
        ExpressionNode::ConstructorCall(ctor) => {
            if target.matcher == Matcher::Class && simple_name_of(&ctor.type_name) == target.name {
                spans.push(ctor.span);
            }
            for arg in &ctor.arguments {
                collect_in_expression(arg, target, spans);
            }
        }
    }
}
