use serde::Deserialize;
use serde_json::Value;

use crate::compiler::CompilerConfig;

pub(crate) const SETTINGS_SECTION_KEY: &str = "groovy-analyzer";

const MIN_DEBOUNCE_MS: u64 = 50;
const MAX_DEBOUNCE_MS: u64 = 5000;
const MIN_CACHE_ENTRIES: usize = 1;
const MAX_CACHE_ENTRIES: usize = 100_000;

/// Runtime server settings updated from LSP configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServerSettings {
    pub cache: CacheSettings,
    pub diagnostics: DiagnosticsSettings,
    pub frontend: FrontendSettings,
    pub compiler: CompilerSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    pub max_entries: usize,
    pub ttl_ms: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            ttl_ms: 1_800_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticsSettings {
    pub on_type: bool,
    pub on_save: bool,
    pub debounce_ms: u64,
}

impl Default for DiagnosticsSettings {
    fn default() -> Self {
        Self {
            on_type: true,
            on_save: true,
            debounce_ms: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrontendSettings {
    pub command: String,
    pub args: Vec<String>,
}

impl Default for FrontendSettings {
    fn default() -> Self {
        Self {
            command: "groovy-frontend".to_string(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompilerSettings {
    pub classpath: Vec<String>,
    pub script_base_class: Option<String>,
    pub script_extensions: Vec<String>,
    pub static_type_checking: bool,
}

impl ServerSettings {
    pub(crate) fn from_lsp_payload(payload: Option<&Value>) -> Self {
        let mut settings = Self::default();
        if let Some(payload) = payload {
            settings = settings.merged_with_payload(payload);
        }
        settings
    }

    /// Merge a configuration payload into a copy of these settings.
    ///
    /// Both the bare shape and the `{"groovy-analyzer": {...}}`-wrapped shape
    /// are accepted, since clients differ in what they send.
    pub(crate) fn merged_with_payload(&self, payload: &Value) -> Self {
        let mut merged = self.clone();
        for candidate in payload_candidates(payload) {
            if let Ok(patch) = serde_json::from_value::<ServerSettingsPatch>(candidate.clone()) {
                merged.apply_patch(patch);
            }
        }
        merged.normalize();
        merged
    }

    /// Build the compiler configuration these settings describe.
    pub(crate) fn compiler_config(&self) -> CompilerConfig {
        let mut config = CompilerConfig::default();
        config.classpath = self.compiler.classpath.clone();
        config.script_base_class = self.compiler.script_base_class.clone();
        if !self.compiler.script_extensions.is_empty() {
            config.script_extensions = self.compiler.script_extensions.clone();
        }
        config.static_type_checking = self.compiler.static_type_checking;
        config
    }

    fn apply_patch(&mut self, patch: ServerSettingsPatch) {
        if let Some(cache) = patch.cache {
            if let Some(max_entries) = cache.max_entries {
                self.cache.max_entries = max_entries;
            }
            if let Some(ttl_ms) = cache.ttl_ms {
                self.cache.ttl_ms = ttl_ms;
            }
        }
        if let Some(diagnostics) = patch.diagnostics {
            if let Some(on_type) = diagnostics.on_type {
                self.diagnostics.on_type = on_type;
            }
            if let Some(on_save) = diagnostics.on_save {
                self.diagnostics.on_save = on_save;
            }
            if let Some(debounce_ms) = diagnostics.debounce_ms {
                self.diagnostics.debounce_ms = debounce_ms;
            }
        }
        if let Some(frontend) = patch.frontend {
            if let Some(command) = frontend.command {
                self.frontend.command = command;
            }
            if let Some(args) = frontend.args {
                self.frontend.args = args;
            }
        }
        if let Some(compiler) = patch.compiler {
            if let Some(classpath) = compiler.classpath {
                self.compiler.classpath = classpath;
            }
            if let Some(script_base_class) = compiler.script_base_class {
                self.compiler.script_base_class = Some(script_base_class);
            }
            if let Some(script_extensions) = compiler.script_extensions {
                self.compiler.script_extensions = script_extensions;
            }
            if let Some(static_type_checking) = compiler.static_type_checking {
                self.compiler.static_type_checking = static_type_checking;
            }
        }
    }

    fn normalize(&mut self) {
        self.diagnostics.debounce_ms = self
            .diagnostics
            .debounce_ms
            .clamp(MIN_DEBOUNCE_MS, MAX_DEBOUNCE_MS);
        self.cache.max_entries = self
            .cache
            .max_entries
            .clamp(MIN_CACHE_ENTRIES, MAX_CACHE_ENTRIES);
        self.frontend.command = self.frontend.command.trim().to_string();
        if self.frontend.command.is_empty() {
            self.frontend.command = FrontendSettings::default().command;
        }
    }
}

fn payload_candidates(payload: &Value) -> Vec<&Value> {
    let mut candidates = vec![payload];
    if let Some(section) = payload.get(SETTINGS_SECTION_KEY) {
        candidates.push(section);
    }
    candidates
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerSettingsPatch {
    cache: Option<CacheSettingsPatch>,
    diagnostics: Option<DiagnosticsSettingsPatch>,
    frontend: Option<FrontendSettingsPatch>,
    compiler: Option<CompilerSettingsPatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheSettingsPatch {
    max_entries: Option<usize>,
    ttl_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiagnosticsSettingsPatch {
    on_type: Option<bool>,
    on_save: Option<bool>,
    debounce_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FrontendSettingsPatch {
    command: Option<String>,
    args: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompilerSettingsPatch {
    classpath: Option<Vec<String>>,
    script_base_class: Option<String>,
    script_extensions: Option<Vec<String>>,
    static_type_checking: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_documented_values() {
        let settings = ServerSettings::default();
        assert_eq!(settings.cache.max_entries, 1000);
        assert_eq!(settings.cache.ttl_ms, 1_800_000);
        assert_eq!(settings.diagnostics.debounce_ms, 300);
        assert!(settings.diagnostics.on_type);
        assert_eq!(settings.frontend.command, "groovy-frontend");
    }

    #[test]
    fn section_wrapped_payload_is_merged() {
        let payload = json!({
            "groovy-analyzer": {
                "diagnostics": { "debounceMs": 150, "onType": false },
                "cache": { "maxEntries": 50 }
            }
        });
        let settings = ServerSettings::from_lsp_payload(Some(&payload));
        assert_eq!(settings.diagnostics.debounce_ms, 150);
        assert!(!settings.diagnostics.on_type);
        assert_eq!(settings.cache.max_entries, 50);
        // Untouched values keep their defaults.
        assert!(settings.diagnostics.on_save);
    }

    #[test]
    fn bare_payload_is_merged_too() {
        let payload = json!({
            "frontend": { "command": "  java-groovy-frontend  " },
            "compiler": { "classpath": ["/srv/libs/a.jar"], "staticTypeChecking": true }
        });
        let settings = ServerSettings::from_lsp_payload(Some(&payload));
        assert_eq!(settings.frontend.command, "java-groovy-frontend");
        assert_eq!(settings.compiler.classpath, ["/srv/libs/a.jar"]);

        let config = settings.compiler_config();
        assert_eq!(config.classpath, ["/srv/libs/a.jar"]);
        assert!(config.static_type_checking);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let payload = json!({
            "diagnostics": { "debounceMs": 1 },
            "cache": { "maxEntries": 0 }
        });
        let settings = ServerSettings::from_lsp_payload(Some(&payload));
        assert_eq!(settings.diagnostics.debounce_ms, MIN_DEBOUNCE_MS);
        assert_eq!(settings.cache.max_entries, MIN_CACHE_ENTRIES);
    }

    #[test]
    fn empty_frontend_command_falls_back() {
        let payload = json!({ "frontend": { "command": "   " } });
        let settings = ServerSettings::from_lsp_payload(Some(&payload));
        assert_eq!(settings.frontend.command, "groovy-frontend");
    }
}
