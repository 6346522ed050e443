//! Conversions between the 0-based wire protocol and the 1-based internal
//! coordinate space.

use tower_lsp::lsp_types::{Location, Position, Range};

use crate::ast::{SourcePosition, SourceSpan};
use crate::navigation::SourceLocation;

/// LSP position (0-based) to internal position (1-based).
pub fn to_internal(position: Position) -> SourcePosition {
    SourcePosition::new(position.line + 1, position.character + 1)
}

/// Internal position (1-based) to LSP position (0-based).
pub fn to_external(position: SourcePosition) -> Position {
    Position::new(
        position.line.saturating_sub(1),
        position.column.saturating_sub(1),
    )
}

/// Internal inclusive span to LSP half-open range.
pub fn span_to_range(span: SourceSpan) -> Range {
    Range::new(
        Position::new(
            span.start_line.saturating_sub(1),
            span.start_column.saturating_sub(1),
        ),
        // Inclusive end column N maps to exclusive 0-based end N.
        Position::new(span.end_line.saturating_sub(1), span.end_column),
    )
}

pub fn to_lsp_location(location: &SourceLocation) -> Location {
    Location {
        uri: location.uri.clone(),
        range: span_to_range(location.span),
    }
}
