use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tower_lsp::lsp_types::Url;
use tracing::{debug, warn};

use crate::ast::ModuleNode;
use crate::diagnostics::DiagnosticKind;

use super::phase::CompilationPhase;
use super::{CompilerFactory, CompilerMessage, ErrorSink};

/// Adapts the opaque Groovy compiler to phase-targeted, error-aggregating
/// invocations.
///
/// The facade never lets a compiler failure escape: panics and structured
/// errors alike end up in the returned [`FacadeOutput`]. Every invocation
/// gets a fresh compiler context from the factory, since the frontend's
/// internal state is not safe to reuse.
pub struct CompilerFacade {
    factory: Arc<dyn CompilerFactory>,
}

/// Raw result of one facade invocation.
#[derive(Debug)]
pub struct FacadeOutput {
    pub module: Option<ModuleNode>,
    pub errors: Vec<CompilerMessage>,
    pub warnings: Vec<CompilerMessage>,
}

impl CompilerFacade {
    pub fn new(factory: Arc<dyn CompilerFactory>) -> Self {
        Self { factory }
    }

    /// Compile `text` up to (at least) `phase`.
    ///
    /// Requested phases that cannot produce a usable tree are coerced upward
    /// before invocation. When the compiler fails without reporting any
    /// structured error, a single synthesized syntax diagnostic at (1,1)
    /// stands in.
    pub fn compile_to(
        &self,
        text: &str,
        source_id: &Url,
        phase: CompilationPhase,
    ) -> FacadeOutput {
        let effective = phase.coerced_for_tree();
        if effective != phase {
            debug!(
                "Coercing requested phase {} to {} for {source_id}",
                phase.as_str(),
                effective.as_str()
            );
        }

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let mut sink = ErrorSink::default();
            let module = self
                .factory
                .create()
                .compile(text, source_id, effective, &mut sink);
            (module, sink)
        }));

        match outcome {
            Ok((module, sink)) => {
                let (errors, warnings) = sink.into_parts();
                if module.is_none() && errors.is_empty() {
                    return FacadeOutput {
                        module: None,
                        errors: vec![synthesized_parse_failure()],
                        warnings,
                    };
                }
                FacadeOutput {
                    module,
                    errors,
                    warnings,
                }
            }
            Err(_) => {
                warn!("compiler panicked while compiling {source_id}");
                FacadeOutput {
                    module: None,
                    errors: vec![synthesized_parse_failure()],
                    warnings: Vec::new(),
                }
            }
        }
    }
}

fn synthesized_parse_failure() -> CompilerMessage {
    CompilerMessage::new(DiagnosticKind::Syntax, "Unable to parse source", 1, 1)
}
