//! Layered configuration.
//!
//! Values are resolved in four layers, later layers winning: built-in
//! defaults, `crmflow.toml`, `CRMFLOW_*` environment variables, and
//! programmatic [`ConfigOverrides`]. Every recognised key is listed once in
//! [`SETTINGS`]; the loader records which layer supplied each one.

use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "crmflow.toml";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

const MAX_TIMEOUT_SECS: u64 = 300;

/// A dotted file key and the environment variables that set it, highest
/// priority first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Setting {
    pub key: &'static str,
    pub env_vars: &'static [&'static str],
}

impl Setting {
    const fn new(key: &'static str, env_vars: &'static [&'static str]) -> Self {
        Self { key, env_vars }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self.key, "llm.api_key" | "crm.access_token" | "email.api_key")
    }

    fn env_value(&self) -> Option<(&'static str, String)> {
        self.env_vars.iter().find_map(|var| read_env(var).map(|value| (*var, value)))
    }
}

pub const SETTINGS: [Setting; 17] = [
    Setting::new("llm.provider", &["CRMFLOW_LLM_PROVIDER"]),
    Setting::new("llm.model", &["CRMFLOW_LLM_MODEL"]),
    Setting::new("llm.base_url", &["CRMFLOW_LLM_BASE_URL"]),
    Setting::new("llm.api_key", &["CRMFLOW_LLM_API_KEY"]),
    Setting::new("llm.temperature", &["CRMFLOW_LLM_TEMPERATURE"]),
    Setting::new("llm.timeout_secs", &["CRMFLOW_LLM_TIMEOUT_SECS"]),
    Setting::new("crm.base_url", &["CRMFLOW_CRM_BASE_URL"]),
    Setting::new("crm.access_token", &["CRMFLOW_CRM_ACCESS_TOKEN"]),
    Setting::new("crm.timeout_secs", &["CRMFLOW_CRM_TIMEOUT_SECS"]),
    Setting::new("email.base_url", &["CRMFLOW_EMAIL_BASE_URL"]),
    Setting::new("email.api_key", &["CRMFLOW_EMAIL_API_KEY"]),
    Setting::new("email.from_email", &["CRMFLOW_EMAIL_FROM_EMAIL"]),
    Setting::new("email.from_name", &["CRMFLOW_EMAIL_FROM_NAME"]),
    Setting::new("email.default_recipient", &["CRMFLOW_EMAIL_DEFAULT_RECIPIENT"]),
    Setting::new("email.timeout_secs", &["CRMFLOW_EMAIL_TIMEOUT_SECS"]),
    Setting::new("logging.level", &["CRMFLOW_LOGGING_LEVEL", "CRMFLOW_LOG_LEVEL"]),
    Setting::new("logging.format", &["CRMFLOW_LOGGING_FORMAT", "CRMFLOW_LOG_FORMAT"]),
];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub crm: CrmConfig,
    pub email: EmailConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: Option<u64>,
}

impl LlmConfig {
    /// Base URL of the OpenAI-compatible API, with provider defaults applied.
    pub fn effective_base_url(&self) -> String {
        let Some(base_url) = self.base_url.as_deref() else {
            return DEFAULT_OPENAI_BASE_URL.to_string();
        };
        let trimmed = base_url.trim_end_matches('/');
        match self.provider {
            LlmProvider::Ollama if !trimmed.ends_with("/v1") => format!("{trimmed}/v1"),
            _ => trimmed.to_string(),
        }
    }
}

/// HubSpot private-app connection.
#[derive(Clone, Debug)]
pub struct CrmConfig {
    pub base_url: String,
    pub access_token: SecretString,
    pub timeout_secs: Option<u64>,
}

/// Elastic Email sender settings.
#[derive(Clone, Debug)]
pub struct EmailConfig {
    pub base_url: String,
    pub api_key: SecretString,
    pub from_email: String,
    pub from_name: String,
    pub default_recipient: String,
    pub timeout_secs: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Ollama,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected openai|ollama)"
            ))),
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

/// Values supplied by the caller, applied after the environment.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_api_key: Option<String>,
    pub crm_base_url: Option<String>,
    pub crm_access_token: Option<String>,
    pub email_base_url: Option<String>,
    pub email_api_key: Option<String>,
    pub email_from_email: Option<String>,
    pub email_default_recipient: Option<String>,
}

impl ConfigOverrides {
    fn into_entries(self) -> Vec<(&'static str, String)> {
        [
            ("logging.level", self.log_level),
            ("llm.provider", self.llm_provider.map(|provider| provider.as_str().to_string())),
            ("llm.model", self.llm_model),
            ("llm.base_url", self.llm_base_url),
            ("llm.api_key", self.llm_api_key),
            ("crm.base_url", self.crm_base_url),
            ("crm.access_token", self.crm_access_token),
            ("email.base_url", self.email_base_url),
            ("email.api_key", self.email_api_key),
            ("email.from_email", self.email_from_email),
            ("email.default_recipient", self.email_default_recipient),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key, value)))
        .collect()
    }
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    /// Fail when the config file is absent instead of falling back to defaults.
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

/// Layer that supplied a setting's effective value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueSource {
    Default,
    File(PathBuf),
    Env(&'static str),
    Override,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::File(path) => write!(f, "file ({})", path.display()),
            Self::Env(var) => write!(f, "env ({var})"),
            Self::Override => f.write_str("override"),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Provenance(BTreeMap<&'static str, ValueSource>);

impl Provenance {
    pub fn source(&self, key: &str) -> ValueSource {
        self.0.get(key).cloned().unwrap_or(ValueSource::Default)
    }

    fn record(&mut self, key: &'static str, source: ValueSource) {
        self.0.insert(key, source);
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid value for `{key}`: `{value}`")]
    InvalidValue { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                provider: LlmProvider::OpenAi,
                api_key: None,
                base_url: None,
                model: "gpt-4o-mini".to_string(),
                temperature: 0.1,
                timeout_secs: None,
            },
            crm: CrmConfig {
                base_url: "https://api.hubapi.com".to_string(),
                access_token: String::new().into(),
                timeout_secs: None,
            },
            email: EmailConfig {
                base_url: "https://api.elasticemail.com/v2".to_string(),
                api_key: String::new().into(),
                from_email: String::new(),
                from_name: "CRM Automation System".to_string(),
                default_recipient: "admin@company.com".to_string(),
                timeout_secs: None,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        Self::load_traced(options).map(|(config, _)| config)
    }

    /// Loads and validates, also reporting which layer set each key.
    pub fn load_traced(options: LoadOptions) -> Result<(Self, Provenance), ConfigError> {
        let mut config = Self::default();
        let mut provenance = Provenance::default();

        match resolve_config_path(options.config_path.as_deref()) {
            Some(path) => {
                for (key, value) in read_file_values(&path)? {
                    config.set(key, &value)?;
                    provenance.record(key, ValueSource::File(path.clone()));
                }
            }
            None if options.require_file => {
                let expected =
                    options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
                return Err(ConfigError::MissingConfigFile(expected));
            }
            None => {}
        }

        for setting in &SETTINGS {
            if let Some((var, value)) = setting.env_value() {
                config.set(setting.key, &value).map_err(|error| match error {
                    ConfigError::InvalidValue { value, .. } => {
                        ConfigError::InvalidValue { key: var.to_string(), value }
                    }
                    other => other,
                })?;
                provenance.record(setting.key, ValueSource::Env(var));
            }
        }

        for (key, value) in options.overrides.into_entries() {
            config.set(key, &value)?;
            provenance.record(key, ValueSource::Override);
        }

        config.validate()?;
        Ok((config, provenance))
    }

    fn set(&mut self, key: &str, raw: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue { key: key.to_string(), value: raw.to_string() };
        let text = raw.to_string();

        match key {
            "llm.provider" => self.llm.provider = raw.parse().map_err(|_| invalid())?,
            "llm.model" => self.llm.model = text,
            "llm.base_url" => self.llm.base_url = Some(text),
            "llm.api_key" => self.llm.api_key = Some(text.into()),
            "llm.temperature" => self.llm.temperature = raw.trim().parse().map_err(|_| invalid())?,
            "llm.timeout_secs" => {
                self.llm.timeout_secs = Some(raw.trim().parse().map_err(|_| invalid())?)
            }
            "crm.base_url" => self.crm.base_url = text,
            "crm.access_token" => self.crm.access_token = text.into(),
            "crm.timeout_secs" => {
                self.crm.timeout_secs = Some(raw.trim().parse().map_err(|_| invalid())?)
            }
            "email.base_url" => self.email.base_url = text,
            "email.api_key" => self.email.api_key = text.into(),
            "email.from_email" => self.email.from_email = text,
            "email.from_name" => self.email.from_name = text,
            "email.default_recipient" => self.email.default_recipient = text,
            "email.timeout_secs" => {
                self.email.timeout_secs = Some(raw.trim().parse().map_err(|_| invalid())?)
            }
            "logging.level" => self.logging.level = text,
            "logging.format" => self.logging.format = raw.parse().map_err(|_| invalid())?,
            other => return Err(ConfigError::Validation(format!("unknown setting `{other}`"))),
        }
        Ok(())
    }

    /// Checks every section and reports all problems at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();
        self.llm.check(&mut problems);
        self.crm.check(&mut problems);
        self.email.check(&mut problems);
        self.logging.check(&mut problems);

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(problems.join("; ")))
        }
    }
}

impl LlmConfig {
    fn check(&self, problems: &mut Vec<String>) {
        check_timeout(problems, "llm.timeout_secs", self.timeout_secs);
        if !(0.0..=2.0).contains(&self.temperature) {
            problems.push("llm.temperature must be in range 0.0..=2.0".to_string());
        }
        if self.model.trim().is_empty() {
            problems.push("llm.model must not be empty".to_string());
        }

        match self.provider {
            LlmProvider::OpenAi if self.api_key.as_ref().map_or(true, is_blank_secret) => {
                problems.push("llm.api_key is required for the openai provider".to_string());
            }
            LlmProvider::Ollama if self.base_url.as_deref().map_or(true, is_blank) => {
                problems.push("llm.base_url is required for the ollama provider".to_string());
            }
            _ => {}
        }

        if let Some(base_url) = &self.base_url {
            check_http_url(problems, "llm.base_url", base_url);
        }
    }
}

impl CrmConfig {
    fn check(&self, problems: &mut Vec<String>) {
        check_http_url(problems, "crm.base_url", &self.base_url);
        check_timeout(problems, "crm.timeout_secs", self.timeout_secs);
        if is_blank_secret(&self.access_token) {
            problems.push(
                "crm.access_token is required (create a HubSpot private app and copy its token)"
                    .to_string(),
            );
        }
    }
}

impl EmailConfig {
    fn check(&self, problems: &mut Vec<String>) {
        check_http_url(problems, "email.base_url", &self.base_url);
        check_timeout(problems, "email.timeout_secs", self.timeout_secs);
        if is_blank_secret(&self.api_key) {
            problems.push("email.api_key is required (Elastic Email > Settings > API)".to_string());
        }
        check_address(problems, "email.from_email", &self.from_email);
        check_address(problems, "email.default_recipient", &self.default_recipient);
    }
}

impl LoggingConfig {
    fn check(&self, problems: &mut Vec<String>) {
        let level = self.level.trim().to_ascii_lowercase();
        if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
            problems.push("logging.level must be one of trace|debug|info|warn|error".to_string());
        }
    }
}

fn check_timeout(problems: &mut Vec<String>, key: &str, timeout_secs: Option<u64>) {
    if matches!(timeout_secs, Some(value) if value == 0 || value > MAX_TIMEOUT_SECS) {
        problems.push(format!("{key} must be in range 1..={MAX_TIMEOUT_SECS}"));
    }
}

fn check_http_url(problems: &mut Vec<String>, key: &str, url: &str) {
    let url = url.trim();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        problems.push(format!("{key} must start with http:// or https://"));
    }
}

fn check_address(problems: &mut Vec<String>, key: &str, address: &str) {
    let address = address.trim();
    let well_formed = address
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !well_formed {
        problems.push(format!("{key} must be an email address (got `{address}`)"));
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn is_blank_secret(secret: &SecretString) -> bool {
    is_blank(secret.expose_secret())
}

/// The explicit path when it exists, otherwise the first default location found.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then(|| path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), Path::new("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

/// Reads the recognised keys present in a TOML file, after `${VAR}` expansion.
fn read_file_values(path: &Path) -> Result<Vec<(&'static str, String)>, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    let document = interpolate_env_vars(&raw)?
        .parse::<toml::Table>()
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })?;

    let values = SETTINGS
        .iter()
        .filter_map(|setting| {
            let (section, field) = setting.key.split_once('.')?;
            let value = document.get(section)?.get(field)?;
            let text = match value {
                toml::Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            Some((setting.key, text))
        })
        .collect();
    Ok(values)
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        let end = tail.find('}').ok_or(ConfigError::UnterminatedInterpolation)?;
        let var = &tail[..end];
        let value = env::var(var)
            .map_err(|_| ConfigError::MissingEnvInterpolation { var: var.to_string() })?;
        output.push_str(&value);
        rest = &tail[end + 1..];
    }

    output.push_str(rest);
    Ok(output)
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !is_blank(value))
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{
        interpolate_env_vars, AppConfig, ConfigError, ConfigOverrides, LlmProvider, LoadOptions,
        LogFormat, ValueSource, SETTINGS,
    };

    const CREDENTIALS: [(&str, &str); 4] = [
        ("CRMFLOW_LLM_API_KEY", "sk-test"),
        ("CRMFLOW_CRM_ACCESS_TOKEN", "pat-test"),
        ("CRMFLOW_EMAIL_API_KEY", "ee-test"),
        ("CRMFLOW_EMAIL_FROM_EMAIL", "crm@example.com"),
    ];

    /// Runs `test` with every `CRMFLOW_*` variable cleared except `vars`.
    fn with_env(vars: &[(&str, &str)], test: impl FnOnce()) {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        let lock = ENV_LOCK.get_or_init(|| Mutex::new(()));
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let managed: Vec<&str> = SETTINGS
            .iter()
            .flat_map(|setting| setting.env_vars.iter().copied())
            .chain(vars.iter().map(|(key, _)| *key))
            .collect();
        let saved: Vec<(&str, Option<String>)> =
            managed.iter().map(|key| (*key, env::var(key).ok())).collect();

        for key in &managed {
            env::remove_var(key);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(test));

        for (key, value) in saved {
            match value {
                Some(value) => env::set_var(key, value),
                None => env::remove_var(key),
            }
        }
        if let Err(panic) = outcome {
            std::panic::resume_unwind(panic);
        }
    }

    type EnvPair = (&'static str, &'static str);

    fn credentials_and(extra: &[EnvPair]) -> Vec<EnvPair> {
        CREDENTIALS.iter().chain(extra).copied().collect()
    }

    fn write_config(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("crmflow.toml");
        fs::write(&path, body).expect("config file should be writable");
        path
    }

    fn load_from(path: PathBuf) -> Result<AppConfig, ConfigError> {
        AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
    }

    #[test]
    fn file_values_expand_environment_references() {
        let vars = [("TEST_HUBSPOT_TOKEN", "pat-from-env"), ("TEST_ELASTIC_KEY", "ee-from-env")];
        with_env(&vars, || {
            let dir = TempDir::new().expect("tempdir");
            let path = write_config(
                &dir,
                r#"
[llm]
api_key = "sk-file"
temperature = 0.4

[crm]
access_token = "${TEST_HUBSPOT_TOKEN}"
timeout_secs = 20

[email]
api_key = "${TEST_ELASTIC_KEY}"
from_email = "crm@example.com"
"#,
            );

            let config = load_from(path).expect("config should load");
            assert_eq!(config.crm.access_token.expose_secret(), "pat-from-env");
            assert_eq!(config.email.api_key.expose_secret(), "ee-from-env");
            assert_eq!(config.crm.timeout_secs, Some(20));
            assert!((config.llm.temperature - 0.4).abs() < f32::EPSILON);
        });
    }

    #[test]
    fn missing_interpolation_variable_is_named() {
        with_env(&[], || {
            let dir = TempDir::new().expect("tempdir");
            let path = write_config(&dir, "[crm]\naccess_token = \"${CRMFLOW_TEST_UNSET}\"\n");

            match load_from(path) {
                Err(ConfigError::MissingEnvInterpolation { var }) => {
                    assert_eq!(var, "CRMFLOW_TEST_UNSET")
                }
                other => panic!("expected interpolation failure, got {other:?}"),
            }
        });
    }

    #[test]
    fn unterminated_reference_is_rejected() {
        assert!(matches!(
            interpolate_env_vars("token = \"${NEVER_CLOSED\""),
            Err(ConfigError::UnterminatedInterpolation)
        ));
        assert_eq!(interpolate_env_vars("plain $ text").expect("no references"), "plain $ text");
    }

    #[test]
    fn required_file_must_exist() {
        with_env(&CREDENTIALS, || {
            let dir = TempDir::new().expect("tempdir");
            let result = AppConfig::load(LoadOptions {
                config_path: Some(dir.path().join("absent.toml")),
                require_file: true,
                ..LoadOptions::default()
            });
            assert!(matches!(result, Err(ConfigError::MissingConfigFile(_))));
        });
    }

    #[test]
    fn layers_apply_in_precedence_order_and_are_traced() {
        let vars = credentials_and(&[
            ("CRMFLOW_LLM_MODEL", "gpt-from-env"),
            ("CRMFLOW_CRM_BASE_URL", "https://crm.from-env.test"),
        ]);
        with_env(&vars, || {
            let dir = TempDir::new().expect("tempdir");
            let path = write_config(
                &dir,
                r#"
[llm]
model = "gpt-from-file"

[crm]
base_url = "https://crm.from-file.test"

[email]
default_recipient = "ops@from-file.test"
"#,
            );

            let (config, provenance) = AppConfig::load_traced(LoadOptions {
                config_path: Some(path.clone()),
                overrides: ConfigOverrides {
                    crm_base_url: Some("https://crm.from-override.test".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .expect("config should load");

            assert_eq!(config.crm.base_url, "https://crm.from-override.test");
            assert_eq!(config.llm.model, "gpt-from-env");
            assert_eq!(config.email.default_recipient, "ops@from-file.test");
            assert_eq!(config.logging.level, "debug");

            assert_eq!(provenance.source("crm.base_url"), ValueSource::Override);
            assert_eq!(provenance.source("llm.model"), ValueSource::Env("CRMFLOW_LLM_MODEL"));
            assert_eq!(provenance.source("email.default_recipient"), ValueSource::File(path));
            assert_eq!(provenance.source("email.from_name"), ValueSource::Default);
        });
    }

    #[test]
    fn logging_aliases_apply_when_primary_name_is_unset() {
        let vars = credentials_and(&[
            ("CRMFLOW_LOG_LEVEL", "warn"),
            ("CRMFLOW_LOGGING_FORMAT", "pretty"),
            ("CRMFLOW_LOG_FORMAT", "json"),
        ]);
        with_env(&vars, || {
            let config = AppConfig::load(LoadOptions::default()).expect("config should load");
            assert_eq!(config.logging.level, "warn");
            assert_eq!(config.logging.format, LogFormat::Pretty);
        });
    }

    #[test]
    fn validation_reports_every_problem() {
        let vars = [
            ("CRMFLOW_LLM_API_KEY", "sk-test"),
            ("CRMFLOW_EMAIL_API_KEY", "ee-test"),
            ("CRMFLOW_EMAIL_FROM_EMAIL", "crm@example.com"),
            ("CRMFLOW_EMAIL_DEFAULT_RECIPIENT", "not-an-address"),
        ];
        with_env(&vars, || {
            match AppConfig::load(LoadOptions::default()) {
                Err(ConfigError::Validation(message)) => {
                    assert!(message.contains("crm.access_token is required"), "{message}");
                    assert!(message.contains("email.default_recipient"), "{message}");
                }
                other => panic!("expected validation failure, got {other:?}"),
            }
        });
    }

    #[test]
    fn ollama_requires_base_url_but_not_api_key() {
        let vars = [
            ("CRMFLOW_LLM_PROVIDER", "ollama"),
            ("CRMFLOW_CRM_ACCESS_TOKEN", "pat-test"),
            ("CRMFLOW_EMAIL_API_KEY", "ee-test"),
            ("CRMFLOW_EMAIL_FROM_EMAIL", "crm@example.com"),
        ];
        with_env(&vars, || {
            let missing_url = AppConfig::load(LoadOptions::default());
            assert!(matches!(
                missing_url,
                Err(ConfigError::Validation(ref message)) if message.contains("llm.base_url")
            ));

            let config = AppConfig::load(LoadOptions {
                overrides: ConfigOverrides {
                    llm_base_url: Some("http://localhost:11434/".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .expect("config should load");
            assert_eq!(config.llm.provider, LlmProvider::Ollama);
            assert_eq!(config.llm.effective_base_url(), "http://localhost:11434/v1");
        });
    }

    #[test]
    fn malformed_env_value_names_the_variable() {
        with_env(&credentials_and(&[("CRMFLOW_CRM_TIMEOUT_SECS", "soon")]), || {
            match AppConfig::load(LoadOptions::default()) {
                Err(ConfigError::InvalidValue { key, value }) => {
                    assert_eq!(key, "CRMFLOW_CRM_TIMEOUT_SECS");
                    assert_eq!(value, "soon");
                }
                other => panic!("expected invalid value, got {other:?}"),
            }
        });
    }

    #[test]
    fn debug_output_hides_secrets() {
        let vars = [
            ("CRMFLOW_LLM_API_KEY", "sk-secret-value"),
            ("CRMFLOW_CRM_ACCESS_TOKEN", "pat-secret-value"),
            ("CRMFLOW_EMAIL_API_KEY", "ee-secret-value"),
            ("CRMFLOW_EMAIL_FROM_EMAIL", "crm@example.com"),
        ];
        with_env(&vars, || {
            let config = AppConfig::load(LoadOptions::default()).expect("config should load");
            let debug = format!("{config:?}");

            assert!(!debug.contains("sk-secret-value"));
            assert!(!debug.contains("pat-secret-value"));
            assert!(!debug.contains("ee-secret-value"));
            assert_eq!(config.logging.format, LogFormat::Compact);
        });
    }
}
