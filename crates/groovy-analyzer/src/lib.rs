pub mod ast;
pub mod compiler;
pub mod diagnostics;
pub mod document;
pub mod hover;
pub mod inference;
pub mod navigation;
pub mod server;
pub mod symbols;
pub mod text_pos;

pub use ast::{ModuleNode, NodeRef, SourcePosition, SourceSpan, node_at_position};
pub use compiler::{
    CompilationEngine, CompilationPhase, CompilationResult, Compiler, CompilerConfig,
    CompilerFacade, CompilerFactory, CompilerMessage, ContentHash, EngineOptions, ErrorSink,
    ProcessFrontend,
};
pub use diagnostics::{DiagnosticKind, DiagnosticsPipeline, DiagnosticsPublisher};
pub use document::DocumentStore;
pub use hover::HoverProvider;
pub use inference::infer_type;
pub use navigation::{NavigationResolver, SourceLocation};
pub use server::GroovyLanguageServer;
pub use symbols::{InMemorySymbolIndex, SymbolIndex, SymbolIndexError, SymbolInfo, SymbolKind};
