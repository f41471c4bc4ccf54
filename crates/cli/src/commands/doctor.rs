use crmflow_core::config::{AppConfig, LlmProvider, LoadOptions};
use secrecy::ExposeSecret;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Skipped,
    Warn,
    Fail,
}

impl CheckStatus {
    fn marker(self) -> &'static str {
        match self {
            Self::Pass => "ok",
            Self::Skipped => "skip",
            Self::Warn => "warn",
            Self::Fail => "fail",
        }
    }
}

#[derive(Debug, Serialize)]
struct Check {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl Check {
    fn new(name: &'static str, status: CheckStatus, details: impl Into<String>) -> Self {
        Self { name, status, details: details.into() }
    }
}

#[derive(Debug, Serialize)]
struct Report {
    overall_status: CheckStatus,
    summary: &'static str,
    checks: Vec<Check>,
}

type Probe = fn(&AppConfig) -> Check;

const LOOPBACK_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "[::1]"];

const PROBES: [(&str, Probe); 4] = [
    ("llm_readiness", check_llm),
    ("crm_credentials", check_crm),
    ("email_sender", check_email),
    ("transport_security", check_transport),
];

/// Returns whether the setup is usable (no failing check) and the rendered report.
pub fn run(options: &LoadOptions, json_output: bool) -> (bool, String) {
    let report = build_report(options);
    let healthy = report.overall_status != CheckStatus::Fail;

    let output = if json_output {
        serde_json::to_string_pretty(&report)
            .unwrap_or_else(|error| format!("doctor: could not serialize report: {error}"))
    } else {
        render_human(&report)
    };
    (healthy, output)
}

fn build_report(options: &LoadOptions) -> Report {
    let checks = match AppConfig::load(options.clone()) {
        Ok(config) => std::iter::once(Check::new(
            "config_validation",
            CheckStatus::Pass,
            "configuration loaded and validated",
        ))
        .chain(PROBES.iter().map(|(_, probe)| probe(&config)))
        .collect::<Vec<_>>(),
        Err(error) => std::iter::once(Check::new(
            "config_validation",
            CheckStatus::Fail,
            error.to_string(),
        ))
        .chain(PROBES.iter().map(|(name, _)| {
            Check::new(*name, CheckStatus::Skipped, "skipped because configuration did not load")
        }))
        .collect(),
    };

    let overall_status =
        checks.iter().map(|check| check.status).max().unwrap_or(CheckStatus::Pass);
    let summary = match overall_status {
        CheckStatus::Fail => "doctor: one or more readiness checks failed",
        CheckStatus::Warn => "doctor: ready, with warnings",
        CheckStatus::Pass | CheckStatus::Skipped => "doctor: all readiness checks passed",
    };

    Report { overall_status, summary, checks }
}

fn check_llm(config: &AppConfig) -> Check {
    let details = match config.llm.provider {
        LlmProvider::OpenAi => {
            format!("openai model `{}` with api key configured", config.llm.model)
        }
        LlmProvider::Ollama => {
            format!("ollama model `{}` at `{}`", config.llm.model, config.llm.effective_base_url())
        }
    };
    Check::new("llm_readiness", CheckStatus::Pass, details)
}

fn check_crm(config: &AppConfig) -> Check {
    // Private-app tokens are issued with a `pat-` prefix.
    if config.crm.access_token.expose_secret().trim().starts_with("pat-") {
        Check::new(
            "crm_credentials",
            CheckStatus::Pass,
            format!("hubspot private app token configured for `{}`", config.crm.base_url),
        )
    } else {
        Check::new(
            "crm_credentials",
            CheckStatus::Warn,
            "access token does not look like a HubSpot private app token (pat-*)",
        )
    }
}

fn check_email(config: &AppConfig) -> Check {
    Check::new(
        "email_sender",
        CheckStatus::Pass,
        format!(
            "sending as `{} <{}>`, default recipient `{}`",
            config.email.from_name, config.email.from_email, config.email.default_recipient
        ),
    )
}

/// Credentials travel in headers or form bodies, so remote endpoints should use TLS.
fn check_transport(config: &AppConfig) -> Check {
    let llm_url = config.llm.effective_base_url();
    let plaintext: Vec<&str> = [
        ("llm.base_url", llm_url.as_str()),
        ("crm.base_url", config.crm.base_url.as_str()),
        ("email.base_url", config.email.base_url.as_str()),
    ]
    .into_iter()
    .filter(|(_, url)| is_remote_plaintext(url))
    .map(|(key, _)| key)
    .collect();

    if plaintext.is_empty() {
        Check::new("transport_security", CheckStatus::Pass, "remote endpoints use https")
    } else {
        Check::new(
            "transport_security",
            CheckStatus::Warn,
            format!("plain http to a remote host: {}", plaintext.join(", ")),
        )
    }
}

fn is_remote_plaintext(url: &str) -> bool {
    let Some(rest) = url.trim().strip_prefix("http://") else {
        return false;
    };
    let authority = rest.split('/').next().unwrap_or_default();
    !LOOPBACK_HOSTS.iter().any(|host| {
        authority == *host || authority.strip_prefix(host).is_some_and(|port| port.starts_with(':'))
    })
}

fn render_human(report: &Report) -> String {
    std::iter::once(report.summary.to_string())
        .chain(report.checks.iter().map(|check| {
            format!("- [{}] {}: {}", check.status.marker(), check.name, check.details)
        }))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use crmflow_core::config::AppConfig;

    use super::{check_crm, check_transport, is_remote_plaintext, CheckStatus};

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("sk-test".to_string().into());
        config.crm.access_token = "pat-na1-test".to_string().into();
        config.email.api_key = "ee-test".to_string().into();
        config.email.from_email = "crm@example.com".to_string();
        config
    }

    #[test]
    fn legacy_api_keys_only_warn() {
        let mut config = valid_config();
        assert_eq!(check_crm(&config).status, CheckStatus::Pass);

        config.crm.access_token = "0f1e2d3c-legacy".to_string().into();
        assert_eq!(check_crm(&config).status, CheckStatus::Warn);
    }

    #[test]
    fn plaintext_remote_endpoints_are_flagged() {
        assert!(is_remote_plaintext("http://crm.internal.example:8080/v3"));
        assert!(!is_remote_plaintext("http://localhost:11434"));
        assert!(!is_remote_plaintext("http://127.0.0.1:9000"));
        assert!(!is_remote_plaintext("https://api.hubapi.com"));

        let mut config = valid_config();
        assert_eq!(check_transport(&config).status, CheckStatus::Pass);

        config.email.base_url = "http://mail.example.com/v2".to_string();
        let check = check_transport(&config);
        assert_eq!(check.status, CheckStatus::Warn);
        assert!(check.details.contains("email.base_url"));
    }

    #[test]
    fn failing_check_dominates_overall_status() {
        let statuses =
            [CheckStatus::Pass, CheckStatus::Skipped, CheckStatus::Fail, CheckStatus::Warn];
        assert_eq!(statuses.into_iter().max(), Some(CheckStatus::Fail));
    }
}
