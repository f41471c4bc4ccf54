use std::process::ExitCode;

fn main() -> ExitCode {
    crmflow_cli::run()
}
