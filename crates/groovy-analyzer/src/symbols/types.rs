use serde::{Deserialize, Serialize};

/// What kind of declaration a symbol entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SymbolKind {
    Class,
    Interface,
    Enum,
    Method,
    Field,
    Property,
}

/// One entry of the workspace symbol index. Positions are 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub name: String,
    pub kind: SymbolKind,
    /// Workspace-relative or absolute path of the declaring source.
    pub path: String,
    pub line: u32,
    pub column: u32,
}
