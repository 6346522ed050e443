use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_lsp::lsp_types::Url;
use tracing::{debug, warn};

use crate::ast::ModuleNode;

use super::config::CompilerConfig;
use super::phase::CompilationPhase;
use super::{Compiler, CompilerFactory, CompilerMessage, ErrorSink};

const DEFAULT_FRONTEND_COMMAND: &str = "groovy-frontend";

/// Factory for subprocess-backed compiler contexts.
///
/// Each [`Compiler`] handed out spawns one fresh `groovy-frontend` process,
/// writes a JSON request on stdin, and reads the annotated program tree plus
/// collected messages as JSON from stdout. The frontend process owns all
/// JVM-side state, so a new invocation never observes a previous compile.
pub struct ProcessFrontend {
    command: RwLock<String>,
    args: RwLock<Vec<String>>,
    config: RwLock<CompilerConfig>,
}

impl Default for ProcessFrontend {
    fn default() -> Self {
        Self::new(CompilerConfig::default())
    }
}

impl ProcessFrontend {
    pub fn new(config: CompilerConfig) -> Self {
        Self {
            command: RwLock::new(DEFAULT_FRONTEND_COMMAND.to_string()),
            args: RwLock::new(Vec::new()),
            config: RwLock::new(config),
        }
    }

    /// Override the frontend executable (e.g. a `java -jar` wrapper script).
    pub fn set_command(&self, command: impl Into<String>, args: Vec<String>) {
        if let Ok(mut guard) = self.command.write() {
            *guard = command.into();
        }
        if let Ok(mut guard) = self.args.write() {
            *guard = args;
        }
    }

    pub fn set_config(&self, config: CompilerConfig) {
        if let Ok(mut guard) = self.config.write() {
            *guard = config;
        }
    }

    pub fn config_snapshot(&self) -> CompilerConfig {
        self.config
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl CompilerFactory for ProcessFrontend {
    fn create(&self) -> Box<dyn Compiler> {
        Box::new(ProcessCompiler {
            command: self
                .command
                .read()
                .map(|g| g.clone())
                .unwrap_or_else(|_| DEFAULT_FRONTEND_COMMAND.to_string()),
            args: self.args.read().map(|g| g.clone()).unwrap_or_default(),
            config: self.config_snapshot(),
        })
    }
}

/// One frontend invocation: a single subprocess, then done.
struct ProcessCompiler {
    command: String,
    args: Vec<String>,
    config: CompilerConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FrontendRequest<'a> {
    text: &'a str,
    source_id: &'a str,
    phase: &'a str,
    config: &'a CompilerConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FrontendResponse {
    #[serde(default)]
    module: Option<ModuleNode>,
    #[serde(default)]
    errors: Vec<CompilerMessage>,
    #[serde(default)]
    warnings: Vec<CompilerMessage>,
}

#[derive(Debug, Error)]
enum FrontendError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("frontend i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("frontend produced invalid output: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("frontend exited with status {0}")]
    Exited(std::process::ExitStatus),
}

impl Compiler for ProcessCompiler {
    fn compile(
        &mut self,
        text: &str,
        source_id: &Url,
        phase: CompilationPhase,
        sink: &mut ErrorSink,
    ) -> Option<ModuleNode> {
        match self.invoke(text, source_id, phase) {
            Ok(response) => {
                for message in response.errors {
                    sink.error(message);
                }
                for message in response.warnings {
                    sink.warning(message);
                }
                response.module
            }
            Err(e) => {
                // Leaving the sink untouched lets the facade synthesize its
                // single (1,1) syntax diagnostic.
                warn!("groovy frontend failed for {source_id}: {e}");
                None
            }
        }
    }
}

impl ProcessCompiler {
    fn invoke(
        &self,
        text: &str,
        source_id: &Url,
        phase: CompilationPhase,
    ) -> Result<FrontendResponse, FrontendError> {
        let request = FrontendRequest {
            text,
            source_id: source_id.as_str(),
            phase: phase.as_str(),
            config: &self.config,
        };
        let payload = serde_json::to_vec(&request)?;

        debug!(
            "Running {} for {source_id} at phase {}",
            self.command,
            phase.as_str()
        );
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| FrontendError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        // Taking stdin closes the pipe once the write finishes, so the
        // frontend sees end-of-input and can respond.
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&payload)?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() && output.stdout.is_empty() {
            return Err(FrontendError::Exited(output.status));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}
