//! Go-to-definition and find-references over the program tree.
//!
//! The resolver owns nothing but capabilities: the compilation engine for
//! trees and the symbol index for cross-file lookups. Symbol index failures
//! degrade to local-only results; they never fail a query.

mod definition;
mod references;

use std::collections::HashSet;
use std::sync::Arc;

use tower_lsp::lsp_types::Url;
use tracing::warn;

use crate::ast::{ModuleNode, SourcePosition, SourceSpan};
use crate::compiler::{CompilationEngine, CompilationPhase};
use crate::symbols::{SymbolIndex, SymbolInfo, SymbolKind};

/// A resolved location, positioned with internal 1-based coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub uri: Url,
    pub span: SourceSpan,
}

impl SourceLocation {
    pub fn new(uri: Url, span: SourceSpan) -> Self {
        Self { uri, span }
    }
}

pub struct NavigationResolver {
    engine: Arc<CompilationEngine>,
    symbols: Arc<dyn SymbolIndex>,
}

impl NavigationResolver {
    pub fn new(engine: Arc<CompilationEngine>, symbols: Arc<dyn SymbolIndex>) -> Self {
        Self { engine, symbols }
    }

    /// Definitions of the symbol at `position`, local first, then via the
    /// workspace symbol index.
    pub async fn definition(
        &self,
        source_id: &Url,
        text: &str,
        position: SourcePosition,
    ) -> Vec<SourceLocation> {
        let Some(module) = self.resolve_module(source_id, text) else {
            return Vec::new();
        };
        self.definition_in_module(&module, source_id, position).await
    }

    /// All references to the symbol at `position`.
    pub async fn references(
        &self,
        source_id: &Url,
        text: &str,
        position: SourcePosition,
        include_declaration: bool,
    ) -> Vec<SourceLocation> {
        let Some(module) = self.resolve_module(source_id, text) else {
            return Vec::new();
        };
        self.references_in_module(&module, source_id, position, include_declaration)
            .await
    }

    fn resolve_module(&self, source_id: &Url, text: &str) -> Option<Arc<ModuleNode>> {
        self.engine
            .compile(source_id, text, CompilationPhase::Semantic)
            .module()
            .cloned()
    }

    /// Query the symbol index by name and keep entries of the wanted kinds.
    /// A failing index is logged and contributes nothing.
    async fn query_symbols(&self, name: &str, kinds: &[SymbolKind]) -> Vec<SourceLocation> {
        match self.symbols.search_symbols(name).await {
            Ok(entries) => entries
                .iter()
                .filter(|info| kinds.contains(&info.kind))
                .filter_map(symbol_location)
                .collect(),
            Err(e) => {
                warn!("symbol index lookup for '{name}' failed: {e}");
                Vec::new()
            }
        }
    }
}

/// Convert a symbol index entry to a location. Entries with unusable paths
/// are skipped.
fn symbol_location(info: &SymbolInfo) -> Option<SourceLocation> {
    let uri = if info.path.starts_with('/') {
        Url::from_file_path(&info.path).ok()?
    } else {
        Url::parse("file:///").ok()?.join(&info.path).ok()?
    };
    Some(SourceLocation::new(
        uri,
        SourceSpan::new(info.line, info.column, info.line, info.column),
    ))
}

/// Drop duplicate locations, preserving first-seen order.
fn dedup(locations: Vec<SourceLocation>) -> Vec<SourceLocation> {
    let mut seen = HashSet::new();
    locations
        .into_iter()
        .filter(|location| seen.insert(location.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_location_handles_relative_and_absolute_paths() {
        let relative = SymbolInfo {
            name: "doSomething".into(),
            kind: SymbolKind::Method,
            path: "utils.groovy".into(),
            line: 10,
            column: 5,
        };
        let loc = symbol_location(&relative).expect("relative path resolves");
        assert!(loc.uri.as_str().ends_with("utils.groovy"));
        assert_eq!(loc.span.start_line, 10);
        assert_eq!(loc.span.start_column, 5);

        let absolute = SymbolInfo {
            path: "/ws/lib/utils.groovy".into(),
            ..relative
        };
        let loc = symbol_location(&absolute).expect("absolute path resolves");
        assert_eq!(loc.uri.as_str(), "file:///ws/lib/utils.groovy");
    }

    #[test]
    fn dedup_preserves_first_seen_order() {
        let a = SourceLocation::new(
            Url::parse("file:///a.groovy").unwrap(),
            SourceSpan::new(1, 1, 1, 5),
        );
        let b = SourceLocation::new(
            Url::parse("file:///b.groovy").unwrap(),
            SourceSpan::new(2, 1, 2, 5),
        );
        let out = dedup(vec![a.clone(), b.clone(), a.clone()]);
        assert_eq!(out, vec![a, b]);
    }
}
