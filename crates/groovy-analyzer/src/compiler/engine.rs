use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tower_lsp::lsp_types::Url;
use tracing::debug;

use crate::ast::{ModuleNode, simple_name_of};
use crate::diagnostics::DiagnosticKind;

use super::cache::{CacheEntry, CompilationCache, DEFAULT_MAX_ENTRIES, DEFAULT_TTL};
use super::dependency::DependencyGraph;
use super::facade::CompilerFacade;
use super::phase::CompilationPhase;
use super::{CompilerFactory, CompilerMessage, ContentHash};

/// Outcome of a compile request.
#[derive(Debug, Clone)]
pub enum CompilationResult {
    /// Fully usable tree, no findings.
    Success { module: Arc<ModuleNode> },
    /// Tree exists but carries warnings and/or non-fatal errors.
    Partial {
        module: Arc<ModuleNode>,
        issues: Vec<CompilerMessage>,
    },
    /// No usable tree.
    Failure { issues: Vec<CompilerMessage> },
}

impl CompilationResult {
    pub fn module(&self) -> Option<&Arc<ModuleNode>> {
        match self {
            CompilationResult::Success { module } | CompilationResult::Partial { module, .. } => {
                Some(module)
            }
            CompilationResult::Failure { .. } => None,
        }
    }

    pub fn issues(&self) -> &[CompilerMessage] {
        match self {
            CompilationResult::Success { .. } => &[],
            CompilationResult::Partial { issues, .. } | CompilationResult::Failure { issues } => {
                issues
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub max_cache_entries: usize,
    pub cache_ttl: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_cache_entries: DEFAULT_MAX_ENTRIES,
            cache_ttl: DEFAULT_TTL,
        }
    }
}

/// Orchestrates the compiler facade, the compilation cache, and the
/// dependency graph behind a single `compile` entry point.
pub struct CompilationEngine {
    facade: CompilerFacade,
    cache: CompilationCache,
    graph: DependencyGraph,
}

impl CompilationEngine {
    pub fn new(factory: Arc<dyn CompilerFactory>, options: EngineOptions) -> Self {
        Self {
            facade: CompilerFacade::new(factory),
            cache: CompilationCache::new(options.max_cache_entries, options.cache_ttl),
            graph: DependencyGraph::new(),
        }
    }

    /// Compile `text` up to `phase`, consulting the cache first.
    ///
    /// Only error-free trees enter the cache and the dependency graph;
    /// warnings alone do not disqualify a tree but do turn the result into
    /// `Partial` so they reach the diagnostics pipeline.
    pub fn compile(&self, source_id: &Url, text: &str, phase: CompilationPhase) -> CompilationResult {
        let hash = ContentHash::of(text);
        if let Some(entry) = self.cache.get(source_id, hash, phase) {
            debug!("[compile-cache] hit {source_id}");
            if entry.warnings.is_empty() {
                return CompilationResult::Success {
                    module: entry.module,
                };
            }
            return CompilationResult::Partial {
                module: entry.module,
                issues: entry.warnings,
            };
        }

        let output = self.facade.compile_to(text, source_id, phase);
        let effective = phase.coerced_for_tree();

        match output.module {
            Some(module) if output.errors.is_empty() => {
                let module = Arc::new(module);
                let warnings = as_warnings(output.warnings);
                self.cache.put(
                    source_id.clone(),
                    CacheEntry::new(hash, Arc::clone(&module), effective)
                        .with_warnings(warnings.clone()),
                );
                self.graph
                    .update(source_id, extract_dependencies(&module).into_keys());

                if warnings.is_empty() {
                    CompilationResult::Success { module }
                } else {
                    CompilationResult::Partial {
                        module,
                        issues: warnings,
                    }
                }
            }
            Some(module) => {
                let mut issues = output.errors;
                issues.extend(as_warnings(output.warnings));
                CompilationResult::Partial {
                    module: Arc::new(module),
                    issues,
                }
            }
            None => {
                let mut issues = output.errors;
                issues.extend(as_warnings(output.warnings));
                CompilationResult::Failure { issues }
            }
        }
    }

    /// Sources that transitively depend on `source_id`.
    pub fn affected_by(&self, source_id: &Url) -> Vec<Url> {
        self.graph.affected(source_id)
    }

    pub fn invalidate(&self, source_id: &Url) {
        self.cache.invalidate(source_id);
    }

    /// Invalidate a changed source together with everything downstream of it.
    pub fn invalidate_with_dependents(&self, source_id: &Url) {
        self.cache.invalidate(source_id);
        for dependent in self.graph.affected(source_id) {
            debug!("[compile-cache] invalidating dependent {dependent}");
            self.cache.invalidate(&dependent);
        }
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Forget a closed source entirely.
    pub fn remove(&self, source_id: &Url) {
        self.cache.invalidate(source_id);
        self.graph.remove(source_id);
    }

    pub fn configure_cache(&self, max_entries: usize, ttl: Duration) {
        self.cache.configure(max_entries, ttl);
    }

    #[cfg(test)]
    pub(crate) fn cached_len(&self) -> usize {
        self.cache.len()
    }

    #[cfg(test)]
    pub(crate) fn dependencies_of(&self, source_id: &Url) -> std::collections::HashSet<String> {
        self.graph.dependencies_of(source_id)
    }
}

fn as_warnings(warnings: Vec<CompilerMessage>) -> Vec<CompilerMessage> {
    warnings
        .into_iter()
        .map(|mut message| {
            message.kind = DiagnosticKind::Warning;
            message
        })
        .collect()
}

/// Why a module depends on an external name. Kept for logging and for the
/// first-write-wins keying rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DependencyKind {
    Import,
    Extends,
    Implements,
    FieldType,
    MethodType,
    Annotation,
}

/// Collect the external names a module references, keyed first-write-wins.
///
/// Star imports keep their `pkg.*` form; all other names are normalized to
/// simple class names so package-less references still match in the graph.
pub(crate) fn extract_dependencies(module: &ModuleNode) -> HashMap<String, DependencyKind> {
    let mut deps: HashMap<String, DependencyKind> = HashMap::new();
    let mut record = |name: &str, kind: DependencyKind| {
        deps.entry(name.to_string()).or_insert(kind);
    };

    for import in &module.imports {
        record(simple_name_of(&import.class_name), DependencyKind::Import);
    }
    for star in &module.star_imports {
        record(&format!("{}.*", star.package), DependencyKind::Import);
    }

    for class in &module.classes {
        if let Some(superclass) = &class.superclass
            && superclass.name != "java.lang.Object"
        {
            record(superclass.simple_name(), DependencyKind::Extends);
        }
        for interface in &class.interfaces {
            record(interface.simple_name(), DependencyKind::Implements);
        }
        for field in &class.fields {
            if !field.type_ref.is_primitive() {
                record(field.type_ref.simple_name(), DependencyKind::FieldType);
            }
        }
        for property in &class.properties {
            if !property.type_ref.is_primitive() {
                record(property.type_ref.simple_name(), DependencyKind::FieldType);
            }
        }
        for method in &class.methods {
            if !method.return_type.is_primitive() {
                record(method.return_type.simple_name(), DependencyKind::MethodType);
            }
            for param in &method.parameters {
                if !param.type_ref.is_primitive() {
                    record(param.type_ref.simple_name(), DependencyKind::MethodType);
                }
            }
        }
        for annotation in &class.annotations {
            record(simple_name_of(&annotation.type_name), DependencyKind::Annotation);
        }
    }

    deps
}
