mod index;
mod types;

pub use index::InMemorySymbolIndex;
pub use types::{SymbolInfo, SymbolKind};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SymbolIndexError {
    #[error("symbol index unavailable: {0}")]
    Unavailable(String),
}

/// Workspace-wide name-to-location lookup.
///
/// The persistent store behind this capability is external; navigation only
/// ever sees this query surface and must tolerate it failing.
#[async_trait]
pub trait SymbolIndex: Send + Sync {
    /// All symbols with exactly the given name.
    async fn search_symbols(&self, name: &str) -> Result<Vec<SymbolInfo>, SymbolIndexError>;
}
