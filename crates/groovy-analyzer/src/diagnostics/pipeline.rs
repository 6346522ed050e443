use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tower_lsp::lsp_types::{Diagnostic, Url};
use tracing::{debug, warn};

use crate::compiler::{CompilationEngine, CompilationPhase, CompilationResult};
use crate::document::DocumentStore;

use super::to_lsp_diagnostic;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Where finished diagnostics go. The LSP server wraps its client handle;
/// tests record publications.
#[async_trait]
pub trait DiagnosticsPublisher: Send + Sync {
    async fn publish(&self, uri: Url, diagnostics: Vec<Diagnostic>, version: Option<i32>);
}

/// Pending work for one source: a monotonically increasing generation plus
/// the task waiting out the debounce delay. A newer request bumps the
/// generation and aborts the task, so a superseded compile can never
/// publish.
#[derive(Debug, Default)]
struct DebounceToken {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

/// Debounced, cancellable diagnostics computation and publication.
///
/// Every publication carries the full current diagnostic set for the source;
/// a clean compile publishes an empty set, which is what clears previously
/// shown problems in the editor.
pub struct DiagnosticsPipeline {
    engine: Arc<CompilationEngine>,
    documents: Arc<DocumentStore>,
    publisher: Arc<dyn DiagnosticsPublisher>,
    debounce_ms: AtomicU64,
    pending: Arc<DashMap<Url, DebounceToken>>,
    shutting_down: Arc<AtomicBool>,
}

impl DiagnosticsPipeline {
    pub fn new(
        engine: Arc<CompilationEngine>,
        documents: Arc<DocumentStore>,
        publisher: Arc<dyn DiagnosticsPublisher>,
    ) -> Self {
        Self {
            engine,
            documents,
            publisher,
            debounce_ms: AtomicU64::new(DEFAULT_DEBOUNCE.as_millis() as u64),
            pending: Arc::new(DashMap::new()),
            shutting_down: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_debounce(&self, delay: Duration) {
        self.debounce_ms
            .store(delay.as_millis() as u64, Ordering::Relaxed);
    }

    /// Compile now and publish the result.
    pub async fn immediate(&self, uri: &Url) {
        if self.shutting_down.load(Ordering::Relaxed) {
            return;
        }
        let generation = self.supersede(uri);
        compute_and_publish(
            &self.engine,
            &self.documents,
            &self.publisher,
            &self.pending,
            uri.clone(),
            generation,
        )
        .await;
    }

    /// Schedule a compile after the debounce delay. A subsequent call for
    /// the same source supersedes this one.
    pub fn debounced(&self, uri: &Url) {
        if self.shutting_down.load(Ordering::Relaxed) {
            return;
        }
        let delay = Duration::from_millis(self.debounce_ms.load(Ordering::Relaxed));
        let generation = self.supersede(uri);

        let engine = Arc::clone(&self.engine);
        let documents = Arc::clone(&self.documents);
        let publisher = Arc::clone(&self.publisher);
        let pending = Arc::clone(&self.pending);
        let shutting_down = Arc::clone(&self.shutting_down);
        let task_uri = uri.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if shutting_down.load(Ordering::Relaxed) {
                return;
            }
            if !is_latest(&pending, &task_uri, generation) {
                debug!("Skipping superseded diagnostics for {task_uri} (generation={generation})");
                return;
            }
            compute_and_publish(
                &engine,
                &documents,
                &publisher,
                &pending,
                task_uri,
                generation,
            )
            .await;
        });

        if let Some(mut token) = self.pending.get_mut(uri) {
            // A racing supersession may already have moved past us; in that
            // case the freshly spawned task must not linger.
            if token.generation == generation {
                token.task = Some(task);
            } else {
                task.abort();
            }
        }
    }

    /// Publish an empty set and cancel any pending debounce for the source.
    pub async fn clear(&self, uri: &Url) {
        self.supersede(uri);
        self.pending.remove(uri);
        self.publisher.publish(uri.clone(), Vec::new(), None).await;
    }

    /// Cancel every pending token. Subsequent requests are no-ops.
    pub fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::Relaxed);
        for mut entry in self.pending.iter_mut() {
            entry.generation += 1;
            if let Some(task) = entry.task.take() {
                task.abort();
            }
        }
        debug!("Diagnostics pipeline drained");
    }

    /// Bump the source's generation and cancel its in-flight task, returning
    /// the new generation.
    fn supersede(&self, uri: &Url) -> u64 {
        let mut token = self.pending.entry(uri.clone()).or_default();
        token.generation += 1;
        if let Some(task) = token.task.take() {
            task.abort();
        }
        token.generation
    }
}

fn is_latest(pending: &DashMap<Url, DebounceToken>, uri: &Url, generation: u64) -> bool {
    pending
        .get(uri)
        .is_some_and(|token| token.generation == generation)
}

async fn compute_and_publish(
    engine: &CompilationEngine,
    documents: &DocumentStore,
    publisher: &Arc<dyn DiagnosticsPublisher>,
    pending: &DashMap<Url, DebounceToken>,
    uri: Url,
    generation: u64,
) {
    let Some(document) = documents.get(&uri) else {
        warn!("diagnostics requested for unknown document: {uri}");
        return;
    };
    if document.is_blank() {
        return;
    }

    let result = engine.compile(&uri, &document.text, CompilationPhase::Semantic);
    let diagnostics: Vec<Diagnostic> = match &result {
        CompilationResult::Success { .. } => Vec::new(),
        CompilationResult::Partial { issues, .. } | CompilationResult::Failure { issues } => issues
            .iter()
            .map(|message| to_lsp_diagnostic(&document.text, message))
            .collect(),
    };

    // Re-check staleness after the compile so a superseded run never
    // overwrites newer editor state.
    if !is_latest(pending, &uri, generation) {
        debug!("Skipping stale diagnostics for {uri} (generation={generation})");
        return;
    }

    let count = diagnostics.len();
    debug!("Publishing {count} diagnostic(s) for {uri} (v{})", document.version);
    publisher
        .publish(uri, diagnostics, Some(document.version))
        .await;
}
