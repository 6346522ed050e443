use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tower_lsp::Client;
use tower_lsp::lsp_types::{Diagnostic, Url};

use crate::compiler::{
    CompilationEngine, CompilationPhase, CompilerFactory, EngineOptions, ProcessFrontend,
};
use crate::diagnostics::{DiagnosticsPipeline, DiagnosticsPublisher};
use crate::document::DocumentStore;
use crate::hover::HoverProvider;
use crate::navigation::NavigationResolver;
use crate::server::settings::ServerSettings;
use crate::symbols::{InMemorySymbolIndex, SymbolIndex};

/// The groovy-analyzer backend that implements the Language Server Protocol.
pub struct GroovyLanguageServer {
    /// The LSP client handle, used to send notifications (e.g. diagnostics) back.
    pub(crate) client: Client,

    /// Thread-safe store of all open documents.
    pub(crate) documents: Arc<DocumentStore>,

    /// Spawns the external Groovy frontend, one fresh context per compile.
    pub(crate) frontend: Arc<ProcessFrontend>,

    /// Phase-indexed, cached compilation with dependency tracking.
    pub(crate) engine: Arc<CompilationEngine>,

    /// Go-to-definition and find-references.
    pub(crate) navigation: Arc<NavigationResolver>,

    /// Hover built from the tree and type inference.
    pub(crate) hover_provider: Arc<HoverProvider>,

    /// Workspace symbol index fed by successful compiles.
    pub(crate) symbols: Arc<InMemorySymbolIndex>,

    /// Debounced diagnostics computation and publication.
    pub(crate) diagnostics: Arc<DiagnosticsPipeline>,

    /// Runtime server settings updated from LSP configuration.
    pub(crate) settings: Arc<RwLock<ServerSettings>>,
}

/// Publishes diagnostics through the LSP client.
struct ClientPublisher {
    client: Client,
}

#[async_trait]
impl DiagnosticsPublisher for ClientPublisher {
    async fn publish(&self, uri: Url, diagnostics: Vec<Diagnostic>, version: Option<i32>) {
        self.client.publish_diagnostics(uri, diagnostics, version).await;
    }
}

impl GroovyLanguageServer {
    /// Create a new `GroovyLanguageServer` wired to the given LSP client.
    pub fn new(client: Client) -> Self {
        let documents = Arc::new(DocumentStore::new());
        let frontend = Arc::new(ProcessFrontend::default());
        let engine = Arc::new(CompilationEngine::new(
            Arc::clone(&frontend) as Arc<dyn CompilerFactory>,
            EngineOptions::default(),
        ));
        let symbols = Arc::new(InMemorySymbolIndex::new());
        let navigation = Arc::new(NavigationResolver::new(
            Arc::clone(&engine),
            Arc::clone(&symbols) as Arc<dyn SymbolIndex>,
        ));
        let hover_provider = Arc::new(HoverProvider::new(Arc::clone(&engine)));
        let diagnostics = Arc::new(DiagnosticsPipeline::new(
            Arc::clone(&engine),
            Arc::clone(&documents),
            Arc::new(ClientPublisher {
                client: client.clone(),
            }),
        ));
        let settings = Arc::new(RwLock::new(ServerSettings::default()));

        Self {
            client,
            documents,
            frontend,
            engine,
            navigation,
            hover_provider,
            symbols,
            diagnostics,
            settings,
        }
    }

    pub(crate) async fn settings_snapshot(&self) -> ServerSettings {
        self.settings.read().await.clone()
    }

    /// Push new settings into every component that consumes them.
    pub(crate) async fn apply_settings(&self, settings: ServerSettings) {
        self.engine.configure_cache(
            settings.cache.max_entries,
            Duration::from_millis(settings.cache.ttl_ms),
        );
        self.diagnostics
            .set_debounce(Duration::from_millis(settings.diagnostics.debounce_ms));
        self.frontend
            .set_command(settings.frontend.command.clone(), settings.frontend.args.clone());
        self.frontend.set_config(settings.compiler_config());

        *self.settings.write().await = settings;
    }

    /// Compile a document and feed the workspace symbol index from the
    /// resulting tree.
    pub(crate) fn index_document(&self, uri: &Url, text: &str) {
        let result = self.engine.compile(uri, text, CompilationPhase::Semantic);
        if let Some(module) = result.module() {
            self.symbols.index_module(uri, module);
        }
    }
}
