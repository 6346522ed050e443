//! Diagnostics: mapping compiler messages to coded, precisely-ranged LSP
//! diagnostics, and the debounced publication pipeline.

mod codes;
mod pipeline;
mod ranges;

pub use codes::diagnostic_code;
pub use pipeline::{DiagnosticsPipeline, DiagnosticsPublisher, DEFAULT_DEBOUNCE};
pub use ranges::diagnostic_range;

use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString};

use crate::compiler::CompilerMessage;

pub const DIAGNOSTIC_SOURCE: &str = "groovy";

/// Broad classification of a compiler finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    #[default]
    Syntax,
    Semantic,
    Type,
    Warning,
}

impl DiagnosticKind {
    pub fn severity(self) -> DiagnosticSeverity {
        match self {
            DiagnosticKind::Warning => DiagnosticSeverity::WARNING,
            _ => DiagnosticSeverity::ERROR,
        }
    }
}

/// Convert one compiler message into its LSP wire form, with a stable code
/// and a range refined against the source text.
pub fn to_lsp_diagnostic(text: &str, message: &CompilerMessage) -> Diagnostic {
    Diagnostic {
        range: diagnostic_range(text, &message.message, message.line, message.column),
        severity: Some(message.kind.severity()),
        code: Some(NumberOrString::String(
            diagnostic_code(message.kind, &message.message).to_string(),
        )),
        code_description: None,
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message: message.message.clone(),
        related_information: None,
        tags: None,
        data: None,
    }
}
