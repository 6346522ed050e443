use tower_lsp::lsp_types::Url;

use crate::ast::{
    ExpressionNode, ModuleNode, NodeRef, SourcePosition, SourceSpan, StatementNode,
    VariableExpression, node_at_position, simple_name_of,
};
use crate::inference::infer_type;
use crate::symbols::SymbolKind;

use super::{NavigationResolver, SourceLocation, dedup};

const CLASS_KINDS: &[SymbolKind] = &[SymbolKind::Class, SymbolKind::Interface, SymbolKind::Enum];
const MEMBER_KINDS: &[SymbolKind] = &[SymbolKind::Property, SymbolKind::Field];

impl NavigationResolver {
    pub(super) async fn definition_in_module(
        &self,
        module: &ModuleNode,
        source_id: &Url,
        position: SourcePosition,
    ) -> Vec<SourceLocation> {
        let Some(node) = node_at_position(module, position) else {
            return Vec::new();
        };

        let locations = if let Some(variable) = node.as_variable() {
            self.variable_definition(variable, module, source_id)
        } else {
            match node {
                NodeRef::Expression(ExpressionNode::MethodCall(call)) => {
                    self.method_definition(&call.method, module, source_id, position)
                        .await
                }
                NodeRef::Expression(ExpressionNode::Property(property)) => {
                    self.property_definition(property, module, source_id).await
                }
                NodeRef::Expression(ExpressionNode::ClassRef(class_ref)) => {
                    self.class_definition(&class_ref.type_name, module, source_id)
                        .await
                }
                NodeRef::Expression(ExpressionNode::ConstructorCall(ctor)) => {
                    self.class_definition(&ctor.type_name, module, source_id)
                        .await
                }
                _ => Vec::new(),
            }
        };

        dedup(locations)
    }

    /// A bound variable goes straight to its declaration; an unbound one is
    /// matched by name against every declaration site in the module.
    fn variable_definition(
        &self,
        variable: &VariableExpression,
        module: &ModuleNode,
        source_id: &Url,
    ) -> Vec<SourceLocation> {
        if let Some(id) = variable.binding
            && let Some(declaration) = module.declaration(id)
        {
            return vec![SourceLocation::new(
                source_id.clone(),
                declaration.target_span(),
            )];
        }

        declaration_spans_by_name(module, &variable.name)
            .into_iter()
            .map(|span| SourceLocation::new(source_id.clone(), span))
            .collect()
    }

    async fn method_definition(
        &self,
        name: &str,
        module: &ModuleNode,
        source_id: &Url,
        position: SourcePosition,
    ) -> Vec<SourceLocation> {
        let mut locations = Vec::new();

        // The enclosing class first, then every declared class.
        if let Some(enclosing) = module.enclosing_class(position.line) {
            locations.extend(
                enclosing
                    .methods
                    .iter()
                    .filter(|m| m.name == name)
                    .map(|m| SourceLocation::new(source_id.clone(), m.span)),
            );
        }
        for class in &module.classes {
            locations.extend(
                class
                    .methods
                    .iter()
                    .filter(|m| m.name == name)
                    .map(|m| SourceLocation::new(source_id.clone(), m.span)),
            );
        }

        if locations.is_empty() {
            return self.query_symbols(name, &[SymbolKind::Method]).await;
        }
        locations
    }

    /// Resolve `receiver.property` to the member declaration on the
    /// receiver's class, with the workspace index as fallback.
    async fn property_definition(
        &self,
        property: &crate::ast::PropertyExpression,
        module: &ModuleNode,
        source_id: &Url,
    ) -> Vec<SourceLocation> {
        let receiver_type = infer_type(&property.receiver, module);
        if let Some(class) = module.find_class(receiver_type.simple_name()) {
            if let Some(found) = class.find_property(&property.property) {
                return vec![SourceLocation::new(source_id.clone(), found.span)];
            }
            if let Some(found) = class.find_field(&property.property) {
                return vec![SourceLocation::new(source_id.clone(), found.span)];
            }
        }
        self.query_symbols(&property.property, MEMBER_KINDS).await
    }

    async fn class_definition(
        &self,
        type_name: &str,
        module: &ModuleNode,
        source_id: &Url,
    ) -> Vec<SourceLocation> {
        let simple = simple_name_of(type_name);
        if let Some(class) = module.find_class(simple) {
            return vec![SourceLocation::new(source_id.clone(), class.span)];
        }
        self.query_symbols(simple, CLASS_KINDS).await
    }
}

/// All declaration sites matching `name`: class contents, catch parameters,
/// for-loop parameters, and declaration statements.
pub(super) fn declaration_spans_by_name(module: &ModuleNode, name: &str) -> Vec<SourceSpan> {
    let mut spans = Vec::new();

    for class in &module.classes {
        spans.extend(class.fields.iter().filter(|f| f.name == name).map(|f| f.span));
        spans.extend(
            class
                .properties
                .iter()
                .filter(|p| p.name == name)
                .map(|p| p.span),
        );
        for method in &class.methods {
            spans.extend(
                method
                    .parameters
                    .iter()
                    .filter(|p| p.name == name)
                    .map(|p| p.span),
            );
            if let Some(body) = &method.body {
                collect_statement_declarations(body, name, &mut spans);
            }
        }
    }
    for statement in &module.statements {
        collect_statement_declarations(statement, name, &mut spans);
    }

    spans
}

fn collect_statement_declarations(statement: &StatementNode, name: &str, spans: &mut Vec<SourceSpan>) {
    match statement {
        StatementNode::Declaration(decl) => {
            if decl.variable.name == name {
                spans.push(decl.variable.span);
            }
        }
        StatementNode::Expression(_) => {}
        StatementNode::Block(block) => {
            for inner in &block.statements {
                collect_statement_declarations(inner, name, spans);
            }
        }
        StatementNode::TryCatch(t) => {
            collect_statement_declarations(&t.try_block, name, spans);
            for catch in &t.catches {
                if catch.parameter.name == name {
                    spans.push(catch.parameter.span);
                }
                collect_statement_declarations(&catch.body, name, spans);
            }
            if let Some(finally) = &t.finally_block {
                collect_statement_declarations(finally, name, spans);
            }
        }
        StatementNode::ForLoop(f) => {
            if f.parameter.name == name {
                spans.push(f.parameter.span);
            }
            collect_statement_declarations(&f.body, name, spans);
        }
    }
}
