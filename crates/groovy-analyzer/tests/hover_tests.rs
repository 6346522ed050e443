mod common;

use std::sync::Arc;

use tower_lsp::lsp_types::{HoverContents, Position};

use groovy_analyzer::hover::HoverProvider;
use groovy_analyzer::text_pos::to_internal;

use common::{
    ScriptedFrontend, ScriptedOutcome, engine_for, tree_def_x_println, tree_for_loop_item, uri,
};

fn markup(hover: tower_lsp::lsp_types::Hover) -> String {
    match hover.contents {
        HoverContents::Markup(content) => content.value,
        other => panic!("expected markup hover, got {other:?}"),
    }
}

#[test]
fn hover_on_variable_shows_declared_type() {
    let source = "def x = 10\nprintln x";
    let frontend = Arc::new(ScriptedFrontend::default());
    frontend.script(source, ScriptedOutcome::Tree(tree_def_x_println()));
    let provider = HoverProvider::new(engine_for(&frontend));

    let hover = provider
        .provide(&uri("script"), source, to_internal(Position::new(1, 8)))
        .expect("hover on `x`");
    let value = markup(hover);
    assert!(value.contains("java.lang.Object x"), "got: {value}");
    assert!(value.starts_with("```groovy"));
}

#[test]
fn hover_on_typed_loop_variable_shows_string() {
    let source = "for (String item in ['a','b']) {\n  println item\n}";
    let frontend = Arc::new(ScriptedFrontend::default());
    frontend.script(source, ScriptedOutcome::Tree(tree_for_loop_item()));
    let provider = HoverProvider::new(engine_for(&frontend));

    let hover = provider
        .provide(&uri("loop"), source, to_internal(Position::new(1, 10)))
        .expect("hover on `item`");
    assert!(markup(hover).contains("java.lang.String item"));
}

#[test]
fn hover_on_constant_shows_primitive_type() {
    let source = "def x = 10\nprintln x";
    let frontend = Arc::new(ScriptedFrontend::default());
    frontend.script(source, ScriptedOutcome::Tree(tree_def_x_println()));
    let provider = HoverProvider::new(engine_for(&frontend));

    // Cursor on the literal `10`.
    let hover = provider
        .provide(&uri("script"), source, to_internal(Position::new(0, 8)))
        .expect("hover on `10`");
    assert!(markup(hover).contains("int"));
}

#[test]
fn hover_outside_any_node_is_none() {
    let source = "def x = 10\nprintln x";
    let frontend = Arc::new(ScriptedFrontend::default());
    frontend.script(source, ScriptedOutcome::Tree(tree_def_x_println()));
    let provider = HoverProvider::new(engine_for(&frontend));

    assert!(
        provider
            .provide(&uri("script"), source, to_internal(Position::new(30, 1)))
            .is_none()
    );
}

#[test]
fn hover_on_unparseable_source_is_none() {
    let frontend = Arc::new(ScriptedFrontend::default());
    let provider = HoverProvider::new(engine_for(&frontend));

    assert!(
        provider
            .provide(&uri("broken"), "def (", to_internal(Position::new(0, 1)))
            .is_none()
    );
}
