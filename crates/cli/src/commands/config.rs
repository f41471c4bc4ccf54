use crmflow_core::config::{AppConfig, LoadOptions, SETTINGS};
use secrecy::{ExposeSecret, SecretString};

/// Renders the effective configuration with the layer each value came from.
pub fn run(options: &LoadOptions) -> String {
    let (config, provenance) = match AppConfig::load_traced(options.clone()) {
        Ok(loaded) => loaded,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let mut lines =
        vec!["effective config (source precedence: override > env > file > default):".to_string()];
    for setting in &SETTINGS {
        let value = display_value(&config, setting.key).unwrap_or_else(|| "<unset>".to_string());
        let source = provenance.source(setting.key);
        lines.push(format!("- {} = {value} (source: {source})", setting.key));
    }
    lines.join("\n")
}

/// Human-readable value for one dotted key; secrets come back already redacted.
fn display_value(config: &AppConfig, key: &str) -> Option<String> {
    let value = match key {
        "llm.provider" => config.llm.provider.as_str().to_string(),
        "llm.model" => config.llm.model.clone(),
        "llm.base_url" => config.llm.effective_base_url(),
        "llm.api_key" => return config.llm.api_key.as_ref().map(redact),
        "llm.temperature" => config.llm.temperature.to_string(),
        "llm.timeout_secs" => return config.llm.timeout_secs.map(|secs| secs.to_string()),
        "crm.base_url" => config.crm.base_url.clone(),
        "crm.access_token" => redact(&config.crm.access_token),
        "crm.timeout_secs" => return config.crm.timeout_secs.map(|secs| secs.to_string()),
        "email.base_url" => config.email.base_url.clone(),
        "email.api_key" => redact(&config.email.api_key),
        "email.from_email" => config.email.from_email.clone(),
        "email.from_name" => config.email.from_name.clone(),
        "email.default_recipient" => config.email.default_recipient.clone(),
        "email.timeout_secs" => return config.email.timeout_secs.map(|secs| secs.to_string()),
        "logging.level" => config.logging.level.clone(),
        "logging.format" => config.logging.format.as_str().to_string(),
        _ => return None,
    };
    Some(value)
}

/// Keeps a vendor prefix such as `pat-` or `sk-` and hides the rest.
fn redact(secret: &SecretString) -> String {
    let trimmed = secret.expose_secret().trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    match trimmed.split_once('-') {
        Some((prefix, _)) if prefix.len() <= 4 => format!("{prefix}-***"),
        _ => "<redacted>".to_string(),
    }
}
