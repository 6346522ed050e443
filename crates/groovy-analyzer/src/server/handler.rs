use tower_lsp::{LanguageServer, jsonrpc::Result, lsp_types::*};
use tracing::{debug, info};

use crate::server::{settings::ServerSettings, state::GroovyLanguageServer};
use crate::symbols;
use crate::text_pos::{to_internal, to_lsp_location};

#[tower_lsp::async_trait]
impl LanguageServer for GroovyLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        info!("Initializing groovy-analyzer...");

        let initial_settings =
            ServerSettings::from_lsp_payload(params.initialization_options.as_ref());
        self.apply_settings(initial_settings).await;

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                references_provider: Some(OneOf::Left(true)),
                workspace_symbol_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "groovy-analyzer".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("groovy-analyzer initialized");
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Shutting down groovy-analyzer");
        self.diagnostics.shutdown();
        Ok(())
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let current = self.settings_snapshot().await;
        let merged = current.merged_with_payload(&params.settings);
        if merged == current {
            return;
        }
        debug!("Applying changed configuration");
        self.apply_settings(merged).await;
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let text = params.text_document.text;
        let version = params.text_document.version;
        debug!("Opened {uri}");

        self.documents.open(uri.clone(), text.clone(), version);
        self.index_document(&uri, &text);
        self.diagnostics.immediate(&uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        // Full-content sync: the last change event carries the whole text.
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        self.documents.update(uri.clone(), change.text, version);

        // The edited file and everything downstream of it are stale now.
        self.engine.invalidate_with_dependents(&uri);

        if self.settings_snapshot().await.diagnostics.on_type {
            self.diagnostics.debounced(&uri);
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        debug!("Saved {uri}");

        if let Some(text) = params.text {
            // `includeText` saves carry no version; keep the last known one.
            let version = self.documents.get(&uri).map(|d| d.version).unwrap_or(0);
            self.documents.update(uri.clone(), text, version);
        }
        if let Some(text) = self.documents.get_content(&uri) {
            self.index_document(&uri, &text);
        }
        if self.settings_snapshot().await.diagnostics.on_save {
            self.diagnostics.immediate(&uri).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        debug!("Closed {uri}");

        self.diagnostics.clear(&uri).await;
        self.documents.close(&uri);
        self.engine.invalidate(&uri);
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let Some(text) = self.documents.get_content(&uri) else {
            return Ok(None);
        };
        let position = to_internal(params.text_document_position_params.position);

        let locations = self.navigation.definition(&uri, &text, position).await;
        if locations.is_empty() {
            return Ok(None);
        }
        Ok(Some(GotoDefinitionResponse::Array(
            locations.iter().map(to_lsp_location).collect(),
        )))
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let uri = params.text_document_position.text_document.uri;
        let Some(text) = self.documents.get_content(&uri) else {
            return Ok(None);
        };
        let position = to_internal(params.text_document_position.position);
        let include_declaration = params.context.include_declaration;

        let locations = self
            .navigation
            .references(&uri, &text, position, include_declaration)
            .await;
        if locations.is_empty() {
            return Ok(None);
        }
        Ok(Some(locations.iter().map(to_lsp_location).collect()))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let Some(text) = self.documents.get_content(&uri) else {
            return Ok(None);
        };
        let position = to_internal(params.text_document_position_params.position);

        Ok(self.hover_provider.provide(&uri, &text, position))
    }

    async fn symbol(
        &self,
        params: WorkspaceSymbolParams,
    ) -> Result<Option<Vec<SymbolInformation>>> {
        let results = self.symbols.search(&params.query, 100);
        if results.is_empty() {
            return Ok(None);
        }

        let infos = results
            .iter()
            .filter_map(|info| {
                let location = crate::navigation::SourceLocation::new(
                    symbol_uri(&info.path)?,
                    crate::ast::SourceSpan::new(info.line, info.column, info.line, info.column),
                );
                #[allow(deprecated)]
                let information = SymbolInformation {
                    name: info.name.clone(),
                    kind: lsp_symbol_kind(info.kind),
                    tags: None,
                    deprecated: None,
                    location: to_lsp_location(&location),
                    container_name: None,
                };
                Some(information)
            })
            .collect();
        Ok(Some(infos))
    }
}

fn symbol_uri(path: &str) -> Option<Url> {
    if path.starts_with('/') {
        Url::from_file_path(path).ok()
    } else {
        Url::parse("file:///").ok()?.join(path).ok()
    }
}

fn lsp_symbol_kind(kind: symbols::SymbolKind) -> SymbolKind {
    match kind {
        symbols::SymbolKind::Class => SymbolKind::CLASS,
        symbols::SymbolKind::Interface => SymbolKind::INTERFACE,
        symbols::SymbolKind::Enum => SymbolKind::ENUM,
        symbols::SymbolKind::Method => SymbolKind::METHOD,
        symbols::SymbolKind::Field => SymbolKind::FIELD,
        symbols::SymbolKind::Property => SymbolKind::PROPERTY,
    }
}
