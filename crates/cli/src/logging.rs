use crmflow_core::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Output goes to stderr so command output on
/// stdout stays machine-readable. `RUST_LOG` takes precedence over the config level.
///
/// Returns `false` when a subscriber was already installed, which makes a
/// second call a no-op. Any other install failure is reported on stderr.
pub fn init_logging(config: &LoggingConfig) -> bool {
    if tracing::dispatcher::has_been_set() {
        return false;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.trim().to_ascii_lowercase()));
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    match installed {
        Ok(()) => true,
        Err(error) => {
            eprintln!("crmflow: could not install log subscriber: {error}");
            false
        }
    }
}
