use crmflow_agent::run_pipeline;
use crmflow_core::config::LoadOptions;
use crmflow_core::domain::pipeline::{PipelineResult, PipelineStatus};
use tracing::info;

use crate::commands::{build_runtime, load_config, CommandResult, FailureKind};
use crate::logging::init_logging;

/// Runs one request through the pipeline and prints the result as JSON.
pub fn run(options: &LoadOptions, request: &str) -> CommandResult {
    let config = match load_config("run", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    init_logging(&config.logging);

    let runtime = match build_runtime("run") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(run_pipeline(&config, request));
    let exit_code = exit_code(&result);
    info!(
        event_name = "cli.run.finished",
        correlation_id = %result.correlation_id,
        exit_code,
        "request processed"
    );
    match serde_json::to_string_pretty(&result) {
        Ok(output) => CommandResult { exit_code, output },
        Err(error) => CommandResult::failure(
            "run",
            FailureKind::Pipeline,
            "serialization",
            format!("failed to serialize pipeline result: {error}"),
        ),
    }
}

pub fn exit_code(result: &PipelineResult) -> u8 {
    match (result.overall_status, result.succeeded) {
        (PipelineStatus::Completed, true) => 0,
        (PipelineStatus::Completed, false) => 1,
        (PipelineStatus::Failed, _) => 4,
    }
}
