pub mod config;
pub mod demo;
pub mod doctor;
pub mod repl;
pub mod run;

use crmflow_agent::PipelineRuntime;
use crmflow_core::config::{AppConfig, LoadOptions};
use serde_json::json;
use tokio::runtime::Runtime;

use crate::logging::init_logging;

/// Text to print plus the process exit code.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

/// Why a command stopped before producing its normal output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    Config,
    RuntimeInit,
    Pipeline,
    Io,
}

impl FailureKind {
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Config => 2,
            Self::RuntimeInit => 3,
            Self::Pipeline => 4,
            Self::Io => 5,
        }
    }
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = json!({"command": command, "status": "ok", "message": message.into()});
        Self { exit_code: 0, output: payload.to_string() }
    }

    /// JSON error envelope: `{command, status: "error", error_class, message}`.
    pub fn failure(
        command: &str,
        kind: FailureKind,
        error_class: &str,
        message: impl Into<String>,
    ) -> Self {
        let payload = json!({
            "command": command,
            "status": "error",
            "error_class": error_class,
            "message": message.into(),
        });
        Self { exit_code: kind.exit_code(), output: payload.to_string() }
    }
}

fn load_config(command: &str, options: &LoadOptions) -> Result<AppConfig, CommandResult> {
    AppConfig::load(options.clone()).map_err(|error| {
        CommandResult::failure(
            command,
            FailureKind::Config,
            "config_validation",
            format!("configuration issue: {error}"),
        )
    })
}

fn build_runtime(command: &str) -> Result<Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            FailureKind::RuntimeInit,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
        )
    })
}

/// Config, logging, pipeline and async runtime for the long-running commands.
fn prepare(
    command: &str,
    options: &LoadOptions,
) -> Result<(PipelineRuntime, Runtime), CommandResult> {
    let config = load_config(command, options)?;
    init_logging(&config.logging);

    let pipeline = PipelineRuntime::from_config(&config).map_err(|error| {
        CommandResult::failure(
            command,
            FailureKind::Pipeline,
            error.error_class(),
            error.to_string(),
        )
    })?;
    let runtime = build_runtime(command)?;
    Ok((pipeline, runtime))
}
