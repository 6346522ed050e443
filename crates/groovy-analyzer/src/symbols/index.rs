use async_trait::async_trait;
use dashmap::DashMap;
use tower_lsp::lsp_types::Url;

use crate::ast::{ClassKind, ModuleNode};

use super::{SymbolIndex, SymbolIndexError, SymbolInfo, SymbolKind};

/// In-memory implementation of the workspace symbol index, fed from
/// successfully compiled modules.
#[derive(Debug, Default)]
pub struct InMemorySymbolIndex {
    by_name: DashMap<String, Vec<SymbolInfo>>,
    /// Names contributed per source, so re-indexing a file replaces its
    /// previous entries.
    by_path: DashMap<String, Vec<String>>,
}

impl InMemorySymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the indexed symbols of `source_id` with those of `module`.
    pub fn index_module(&self, source_id: &Url, module: &ModuleNode) {
        let path = source_path(source_id);
        self.remove_source(&path);

        let mut contributed = Vec::new();
        let mut add = |info: SymbolInfo| {
            contributed.push(info.name.clone());
            self.by_name.entry(info.name.clone()).or_default().push(info);
        };

        for class in &module.classes {
            let kind = match class.kind {
                ClassKind::Class => SymbolKind::Class,
                ClassKind::Interface => SymbolKind::Interface,
                ClassKind::Enum => SymbolKind::Enum,
            };
            add(SymbolInfo {
                name: crate::ast::simple_name_of(&class.name).to_string(),
                kind,
                path: path.clone(),
                line: class.span.start_line,
                column: class.span.start_column,
            });
            for method in &class.methods {
                add(SymbolInfo {
                    name: method.name.clone(),
                    kind: SymbolKind::Method,
                    path: path.clone(),
                    line: method.span.start_line,
                    column: method.span.start_column,
                });
            }
            for field in &class.fields {
                add(SymbolInfo {
                    name: field.name.clone(),
                    kind: SymbolKind::Field,
                    path: path.clone(),
                    line: field.span.start_line,
                    column: field.span.start_column,
                });
            }
            for property in &class.properties {
                add(SymbolInfo {
                    name: property.name.clone(),
                    kind: SymbolKind::Property,
                    path: path.clone(),
                    line: property.span.start_line,
                    column: property.span.start_column,
                });
            }
        }

        self.by_path.insert(path, contributed);
    }

    /// Drop everything a source contributed.
    pub fn remove(&self, source_id: &Url) {
        self.remove_source(&source_path(source_id));
    }

    /// Case-insensitive substring search, for `workspace/symbol`.
    /// Returns up to `limit` results.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SymbolInfo> {
        let query_lower = query.to_lowercase();
        let mut results = Vec::new();

        for entry in self.by_name.iter() {
            if entry.key().to_lowercase().contains(&query_lower) {
                for info in entry.value() {
                    results.push(info.clone());
                    if results.len() >= limit {
                        return results;
                    }
                }
            }
        }

        results
    }

    fn remove_source(&self, path: &str) {
        let Some((_, names)) = self.by_path.remove(path) else {
            return;
        };
        for name in names {
            if let Some(mut entries) = self.by_name.get_mut(&name) {
                entries.retain(|info| info.path != path);
                if entries.is_empty() {
                    drop(entries);
                    self.by_name.remove_if(&name, |_, v| v.is_empty());
                }
            }
        }
    }
}

fn source_path(source_id: &Url) -> String {
    source_id
        .to_file_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| source_id.as_str().to_string())
}

#[async_trait]
impl SymbolIndex for InMemorySymbolIndex {
    async fn search_symbols(&self, name: &str) -> Result<Vec<SymbolInfo>, SymbolIndexError> {
        Ok(self
            .by_name
            .get(name)
            .map(|entries| entries.clone())
            .unwrap_or_default())
    }
}
