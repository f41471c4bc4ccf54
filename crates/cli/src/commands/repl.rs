use std::io::{self, BufRead, Write};

use crmflow_agent::PipelineRuntime;
use crmflow_core::config::LoadOptions;
use crmflow_core::domain::notification::NotificationStatus;
use crmflow_core::domain::pipeline::{PipelineResult, PipelineStatus};

use crate::commands::{prepare, CommandResult, FailureKind};

const EXIT_WORDS: [&str; 3] = ["quit", "exit", "q"];
const RULE: &str = "==================================================";

pub fn run(options: &LoadOptions) -> CommandResult {
    let (pipeline, runtime) = match prepare("repl", options) {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    match run_session(&pipeline, &runtime, stdin.lock(), stdout.lock()) {
        Ok(processed) => {
            CommandResult::success("repl", format!("session ended after {processed} request(s)"))
        }
        Err(error) => CommandResult::failure("repl", FailureKind::Io, "io", error.to_string()),
    }
}

/// Reads requests line by line until an exit word or end of input. Returns the
/// number of requests that went through the pipeline.
pub fn run_session<R, W>(
    pipeline: &PipelineRuntime,
    runtime: &tokio::runtime::Runtime,
    input: R,
    mut output: W,
) -> io::Result<usize>
where
    R: BufRead,
    W: Write,
{
    writeln!(output, "🤖 CRM Automation System Started")?;
    writeln!(output, "{RULE}")?;

    let mut processed = 0;
    let mut lines = input.lines();
    loop {
        write!(output, "\nEnter your CRM request (or 'quit' to exit): ")?;
        output.flush()?;

        let Some(line) = lines.next() else {
            writeln!(output)?;
            break;
        };
        let request = line?;
        let request = request.trim();

        if EXIT_WORDS.contains(&request.to_lowercase().as_str()) {
            writeln!(output, "👋 Goodbye!")?;
            break;
        }
        if request.is_empty() {
            writeln!(output, "Please enter a valid request.")?;
            continue;
        }

        writeln!(output, "\n🔄 Processing: {request}")?;
        let result = runtime.block_on(pipeline.run_pipeline(request));
        processed += 1;
        writeln!(output, "\n{RULE}\n📊 WORKFLOW RESULTS\n{RULE}")?;
        writeln!(output, "{}", render_summary(&result))?;
    }

    Ok(processed)
}

pub fn render_summary(result: &PipelineResult) -> String {
    if result.overall_status == PipelineStatus::Failed {
        return format!(
            "❌ Status: FAILED\nError: {}",
            result.error.as_deref().unwrap_or("Unknown error")
        );
    }

    let mut lines = Vec::new();
    let status = if result.succeeded { "SUCCESS" } else { "PARTIAL" };
    lines.push(format!("✅ Status: {status}"));

    if let Some(descriptor) = &result.descriptor {
        lines.push(format!("📋 Task: {}", descriptor.operation_kind.title()));
    }

    if let Some(operation) = &result.operation_result {
        if operation.is_success() {
            lines.push("🎯 CRM: Operation completed successfully".to_string());
            if let (Some(label), Some(record_id)) =
                (operation.operation_kind.record_label(), operation.record_id.as_deref())
            {
                lines.push(format!("   └─ {label}: {record_id}"));
            }
        } else {
            let error = operation.error_detail.as_deref().unwrap_or("Operation failed");
            lines.push(format!("❌ CRM: {error}"));
        }
    }

    if let Some(notification) = &result.notification_outcome {
        match notification.outcome {
            NotificationStatus::Sent => {
                lines.push("📧 Email: Notification sent successfully".to_string());
            }
            NotificationStatus::Skipped => {
                lines.push("📧 Email: Notification skipped".to_string());
            }
            NotificationStatus::Failed => {
                let error = notification.error_detail.as_deref().unwrap_or("Failed to send");
                lines.push(format!("❌ Email: {error}"));
            }
        }
    }

    lines.join("\n")
}
