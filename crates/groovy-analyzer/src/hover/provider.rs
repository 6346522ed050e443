use std::sync::Arc;

use tower_lsp::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Url};

use crate::ast::{
    ClassKind, ClassNode, ExpressionNode, MethodNode, ModuleNode, NodeRef, SourcePosition,
    node_at_position,
};
use crate::compiler::{CompilationEngine, CompilationPhase};
use crate::inference::infer_type;
use crate::text_pos::span_to_range;

/// Provides hover information built from the program tree and the type
/// inference engine.
pub struct HoverProvider {
    engine: Arc<CompilationEngine>,
}

impl HoverProvider {
    pub fn new(engine: Arc<CompilationEngine>) -> Self {
        Self { engine }
    }

    /// Hover for the node at `position`, or `None` when nothing resolvable
    /// is there.
    pub fn provide(&self, uri: &Url, text: &str, position: SourcePosition) -> Option<Hover> {
        let module = self
            .engine
            .compile(uri, text, CompilationPhase::Semantic)
            .module()
            .cloned()?;
        let node = node_at_position(&module, position)?;

        let value = match node {
            NodeRef::Class(class) => Some(class_signature(class)),
            NodeRef::Method(method) => Some(method_signature(method)),
            NodeRef::Field(field) => {
                Some(code_block(&format!("{} {}", field.type_ref.name, field.name)))
            }
            NodeRef::Property(property) => Some(code_block(&format!(
                "{} {}",
                property.type_ref.name, property.name
            ))),
            NodeRef::Parameter(param) => {
                Some(code_block(&format!("{} {}", param.type_ref.name, param.name)))
            }
            NodeRef::Statement(_) => None,
            NodeRef::Variable(variable) => {
                let inferred = infer_variable_type(&module, variable.binding, &variable.name);
                Some(code_block(&format!("{inferred} {}", variable.name)))
            }
            NodeRef::Expression(expression) => expression_hover(&module, expression),
        };

        value.map(|value| Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value,
            }),
            range: Some(span_to_range(node.span())),
        })
    }
}

fn infer_variable_type(
    module: &ModuleNode,
    binding: Option<crate::ast::NodeId>,
    name: &str,
) -> String {
    if let Some(id) = binding
        && let Some(declaration) = module.declaration(id)
    {
        return declaration.declared_type().name.clone();
    }
    // Re-infer through the generic path for unbound names.
    let probe = ExpressionNode::Variable(crate::ast::VariableExpression {
        name: name.to_string(),
        binding,
        span: crate::ast::SourceSpan::new(0, 0, 0, 0),
    });
    infer_type(&probe, module).name
}

fn expression_hover(module: &ModuleNode, expression: &ExpressionNode) -> Option<String> {
    let inferred = infer_type(expression, module);
    let label = match expression {
        ExpressionNode::Variable(v) => format!("{} {}", inferred.name, v.name),
        ExpressionNode::Property(p) => format!("{} {}", inferred.name, p.property),
        ExpressionNode::MethodCall(call) => format!("{} {}(…)", inferred.name, call.method),
        ExpressionNode::ConstructorCall(ctor) => format!("new {}(…)", ctor.type_name),
        ExpressionNode::ClassRef(class_ref) => format!("Class<{}>", class_ref.type_name),
        ExpressionNode::Constant(_)
        | ExpressionNode::Binary(_)
        | ExpressionNode::List(_)
        | ExpressionNode::Map(_) => inferred.name.clone(),
    };
    Some(code_block(&label))
}

fn class_signature(class: &ClassNode) -> String {
    let keyword = match class.kind {
        ClassKind::Class => "class",
        ClassKind::Interface => "interface",
        ClassKind::Enum => "enum",
    };
    let mut signature = format!("{keyword} {}", class.name);
    if let Some(superclass) = &class.superclass
        && superclass.name != "java.lang.Object"
    {
        signature.push_str(&format!(" extends {}", superclass.simple_name()));
    }
    if !class.interfaces.is_empty() {
        let names: Vec<&str> = class.interfaces.iter().map(|i| i.simple_name()).collect();
        signature.push_str(&format!(" implements {}", names.join(", ")));
    }
    code_block(&signature)
}

fn method_signature(method: &MethodNode) -> String {
    let params: Vec<String> = method
        .parameters
        .iter()
        .map(|p| format!("{} {}", p.type_ref.simple_name(), p.name))
        .collect();
    code_block(&format!(
        "{} {}({})",
        method.return_type.simple_name(),
        method.name,
        params.join(", ")
    ))
}

fn code_block(content: &str) -> String {
    format!("```groovy\n{content}\n```")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ParameterNode, NodeId, SourceSpan, TypeRef};

    #[test]
    fn class_signature_renders_hierarchy() {
        let class = ClassNode {
            name: "Worker".into(),
            kind: ClassKind::Class,
            superclass: Some(TypeRef::new("com.example.Base")),
            interfaces: vec![TypeRef::new("java.io.Serializable")],
            annotations: vec![],
            fields: vec![],
            properties: vec![],
            methods: vec![],
            span: SourceSpan::new(1, 1, 9, 1),
        };
        assert_eq!(
            class_signature(&class),
            "```groovy\nclass Worker extends Base implements Serializable\n```"
        );
    }

    #[test]
    fn method_signature_lists_parameters() {
        let method = MethodNode {
            name: "run".into(),
            return_type: TypeRef::new("java.lang.String"),
            parameters: vec![ParameterNode {
                id: NodeId(1),
                name: "input".into(),
                type_ref: TypeRef::new("java.util.List"),
                span: SourceSpan::new(1, 1, 1, 5),
            }],
            annotations: vec![],
            body: None,
            span: SourceSpan::new(1, 1, 3, 1),
        };
        assert_eq!(
            method_signature(&method),
            "```groovy\nString run(List input)\n```"
        );
    }
}
