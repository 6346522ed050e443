//! Expression-level type inference.
//!
//! `infer_type` is total: it always produces a type and falls back to
//! `java.lang.Object` when nothing better is known. It works purely off the
//! program tree — declared types, constant literals, and member lookup on
//! locally declared classes.

use crate::ast::{
    ConstantValue, ExpressionNode, ModuleNode, StatementNode, TypeRef, VariableExpression,
};

const COMPARISON_OPERATORS: &[&str] = &["==", "!=", "<", "<=", ">", ">=", "===", "!=="];

/// Infer the static type of `expression` within `module`.
pub fn infer_type(expression: &ExpressionNode, module: &ModuleNode) -> TypeRef {
    match expression {
        ExpressionNode::Variable(variable) => infer_variable(variable, module),
        ExpressionNode::Constant(constant) => constant_type(&constant.value),
        ExpressionNode::Property(property) => {
            let receiver = infer_type(&property.receiver, module);
            member_type(module, &receiver, &property.property).unwrap_or_else(TypeRef::object)
        }
        ExpressionNode::MethodCall(call) => {
            let receiver = infer_type(&call.receiver, module);
            method_return_type(module, &receiver, &call.method).unwrap_or_else(TypeRef::object)
        }
        ExpressionNode::Binary(binary) => {
            if COMPARISON_OPERATORS.contains(&binary.operator.as_str()) {
                TypeRef::new("boolean")
            } else {
                infer_type(&binary.left, module)
            }
        }
        ExpressionNode::List(_) => TypeRef::new("java.util.List"),
        ExpressionNode::Map(_) => TypeRef::new("java.util.Map"),
        ExpressionNode::ConstructorCall(ctor) => TypeRef::new(ctor.type_name.clone()),
        ExpressionNode::ClassRef(_) => TypeRef::new("java.lang.Class"),
    }
}

fn infer_variable(variable: &VariableExpression, module: &ModuleNode) -> TypeRef {
    if let Some(id) = variable.binding
        && let Some(declaration) = module.declaration(id)
    {
        return declaration.declared_type().clone();
    }

    if variable.name == "this" {
        if let Some(class) = module.enclosing_class(variable.span.start_line) {
            return TypeRef::new(class.name.clone());
        }
        return TypeRef::object();
    }

    scope_declaration_type(module, &variable.name).unwrap_or_else(TypeRef::object)
}

/// Search the module's declarations for a name: each class's contents, then
/// every top-level declaration statement.
fn scope_declaration_type(module: &ModuleNode, name: &str) -> Option<TypeRef> {
    for class in &module.classes {
        if let Some(field) = class.find_field(name) {
            return Some(field.type_ref.clone());
        }
        if let Some(property) = class.find_property(name) {
            return Some(property.type_ref.clone());
        }
        for method in &class.methods {
            if let Some(param) = method.parameters.iter().find(|p| p.name == name) {
                return Some(param.type_ref.clone());
            }
            if let Some(found) = method
                .body
                .as_deref()
                .and_then(|body| declaration_type_in(body, name))
            {
                return Some(found);
            }
        }
    }
    for statement in &module.statements {
        if let Some(found) = declaration_type_in(statement, name) {
            return Some(found);
        }
    }
    None
}

fn declaration_type_in(statement: &StatementNode, name: &str) -> Option<TypeRef> {
    match statement {
        StatementNode::Declaration(decl) if decl.variable.name == name => {
            Some(decl.type_ref.clone())
        }
        StatementNode::Declaration(_) | StatementNode::Expression(_) => None,
        StatementNode::Block(block) => block
            .statements
            .iter()
            .find_map(|s| declaration_type_in(s, name)),
        StatementNode::TryCatch(t) => {
            declaration_type_in(&t.try_block, name)
                .or_else(|| {
                    t.catches.iter().find_map(|catch| {
                        if catch.parameter.name == name {
                            Some(catch.parameter.type_ref.clone())
                        } else {
                            declaration_type_in(&catch.body, name)
                        }
                    })
                })
                .or_else(|| {
                    t.finally_block
                        .as_deref()
                        .and_then(|f| declaration_type_in(f, name))
                })
        }
        StatementNode::ForLoop(f) => {
            if f.parameter.name == name {
                Some(f.parameter.type_ref.clone())
            } else {
                declaration_type_in(&f.body, name)
            }
        }
    }
}

fn constant_type(value: &ConstantValue) -> TypeRef {
    match value {
        ConstantValue::String(_) => TypeRef::new("java.lang.String"),
        ConstantValue::Int(_) => TypeRef::new("int"),
        ConstantValue::Long(_) => TypeRef::new("long"),
        ConstantValue::Float(_) => TypeRef::new("float"),
        ConstantValue::Double(_) => TypeRef::new("double"),
        ConstantValue::Boolean(_) => TypeRef::new("boolean"),
        ConstantValue::Null => TypeRef::object(),
    }
}

/// Property lookup on a receiver type: property, then field, then getter.
fn member_type(module: &ModuleNode, receiver: &TypeRef, name: &str) -> Option<TypeRef> {
    let class = module.find_class(receiver.simple_name())?;
    if let Some(property) = class.find_property(name) {
        return Some(property.type_ref.clone());
    }
    if let Some(field) = class.find_field(name) {
        return Some(field.type_ref.clone());
    }
    class
        .find_method(&getter_name(name))
        .map(|getter| getter.return_type.clone())
}

/// Method lookup on a receiver type, falling back to a synthesized getter.
fn method_return_type(module: &ModuleNode, receiver: &TypeRef, name: &str) -> Option<TypeRef> {
    let class = module.find_class(receiver.simple_name())?;
    if let Some(method) = class.find_method(name) {
        return Some(method.return_type.clone());
    }
    class
        .find_method(&getter_name(name))
        .map(|getter| getter.return_type.clone())
}

fn getter_name(property: &str) -> String {
    let mut chars = property.chars();
    match chars.next() {
        Some(first) => format!("get{}{}", first.to_ascii_uppercase(), chars.as_str()),
        None => "get".to_string(),
    }
}
