use crmflow_core::config::LoadOptions;
use serde::Serialize;

use crate::commands::{prepare, CommandResult, FailureKind};

pub const SCENARIOS: [&str; 4] = [
    "Create a new contact with email john.doe@example.com, name John Doe, and company ABC Corp",
    "Update contact ID 12345 with phone number +1-555-0123",
    "Create a deal called 'Q4 Enterprise Sale' worth $50000 in prospecting stage",
    "Update deal 67890 to closed won stage with amount $75000",
];

#[derive(Debug, Serialize)]
struct ScenarioReport {
    scenario: &'static str,
    result: &'static str,
    correlation_id: String,
}

#[derive(Debug, Serialize)]
struct DemoReport {
    command: &'static str,
    status: &'static str,
    passed: usize,
    total: usize,
    scenarios: Vec<ScenarioReport>,
}

/// Runs the canonical scenarios one after another against the configured backends.
pub fn run(options: &LoadOptions) -> CommandResult {
    let (pipeline, runtime) = match prepare("demo", options) {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let mut lines = Vec::new();
    let mut scenarios = Vec::new();
    for scenario in SCENARIOS {
        lines.push(format!("🧪 Testing scenario: {scenario}"));
        let result = runtime.block_on(pipeline.run_pipeline(scenario));
        let verdict = if result.succeeded { "SUCCESS" } else { "FAILED" };
        lines.push(format!("Result: {verdict}"));
        scenarios.push(ScenarioReport {
            scenario,
            result: verdict,
            correlation_id: result.correlation_id,
        });
    }

    let passed = scenarios.iter().filter(|report| report.result == "SUCCESS").count();
    let total = scenarios.len();
    let report = DemoReport {
        command: "demo",
        status: if passed == total { "pass" } else { "fail" },
        passed,
        total,
        scenarios,
    };
    let exit_code = if passed == total { 0 } else { 1 };

    match serde_json::to_string(&report) {
        Ok(json) => {
            lines.push(json);
            CommandResult { exit_code, output: lines.join("\n") }
        }
        Err(error) => CommandResult::failure(
            "demo",
            FailureKind::Pipeline,
            "serialization",
            error.to_string(),
        ),
    }
}
