use serde::{Deserialize, Serialize};

/// Configuration handed to the compiler frontend on every invocation.
///
/// This is a plain value: the facade receives it at construction and each
/// compiler context gets its own copy, so there is no ambient compiler state
/// to leak between compiles. A workspace-aware caller extends `classpath`
/// before constructing the facade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerConfig {
    pub source_encoding: String,
    pub target_jvm: String,
    /// Packages imported into every script, `java.lang`-style.
    pub default_star_imports: Vec<String>,
    pub invoke_dynamic: bool,
    pub groovydoc: bool,
    /// Use the modern (Parrot) parser.
    pub modern_parser: bool,
    #[serde(default)]
    pub classpath: Vec<String>,
    #[serde(default)]
    pub script_base_class: Option<String>,
    pub script_extensions: Vec<String>,
    #[serde(default)]
    pub static_type_checking: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            source_encoding: "UTF-8".to_string(),
            target_jvm: "17".to_string(),
            default_star_imports: [
                "java.lang",
                "java.util",
                "java.io",
                "java.net",
                "groovy.lang",
                "groovy.util",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            invoke_dynamic: true,
            groovydoc: true,
            modern_parser: true,
            classpath: Vec::new(),
            script_base_class: None,
            script_extensions: ["groovy", "gvy", "gy", "gsh"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            static_type_checking: false,
        }
    }
}

impl CompilerConfig {
    /// Copy of this config with additional classpath entries appended.
    pub fn with_classpath(mut self, entries: impl IntoIterator<Item = String>) -> Self {
        self.classpath.extend(entries);
        self
    }
}
