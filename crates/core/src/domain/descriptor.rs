use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Parameter keys understood by the executor.
pub mod keys {
    pub const EMAIL: &str = "email";
    pub const FIRSTNAME: &str = "firstname";
    pub const LASTNAME: &str = "lastname";
    pub const COMPANY: &str = "company";
    pub const PHONE: &str = "phone";
    pub const DEAL_NAME: &str = "deal_name";
    pub const DEAL_AMOUNT: &str = "deal_amount";
    pub const DEAL_STAGE: &str = "deal_stage";
    pub const PIPELINE: &str = "pipeline";
    pub const CONTACT_ID: &str = "contact_id";
    pub const DEAL_ID: &str = "deal_id";

    pub const ALL: [&str; 11] = [
        EMAIL,
        FIRSTNAME,
        LASTNAME,
        COMPANY,
        PHONE,
        DEAL_NAME,
        DEAL_AMOUNT,
        DEAL_STAGE,
        PIPELINE,
        CONTACT_ID,
        DEAL_ID,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    CreateContact,
    UpdateContact,
    CreateDeal,
    UpdateDeal,
    Unknown,
}

impl OperationKind {
    /// Lenient parse; anything unrecognized becomes `Unknown`.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "create_contact" => Self::CreateContact,
            "update_contact" => Self::UpdateContact,
            "create_deal" => Self::CreateDeal,
            "update_deal" => Self::UpdateDeal,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateContact => "create_contact",
            Self::UpdateContact => "update_contact",
            Self::CreateDeal => "create_deal",
            Self::UpdateDeal => "update_deal",
            Self::Unknown => "unknown",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::CreateContact => "Create Contact",
            Self::UpdateContact => "Update Contact",
            Self::CreateDeal => "Create Deal",
            Self::UpdateDeal => "Update Deal",
            Self::Unknown => "Unknown",
        }
    }

    /// Identifier parameter an update needs before it may reach the backend.
    pub fn required_identifier(&self) -> Option<&'static str> {
        match self {
            Self::UpdateContact => Some(keys::CONTACT_ID),
            Self::UpdateDeal => Some(keys::DEAL_ID),
            _ => None,
        }
    }

    pub fn record_label(&self) -> Option<&'static str> {
        match self {
            Self::CreateContact | Self::UpdateContact => Some("Contact ID"),
            Self::CreateDeal | Self::UpdateDeal => Some("Deal ID"),
            Self::Unknown => None,
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSystem {
    Hubspot,
    None,
}

impl TargetSystem {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hubspot" => Self::Hubspot,
            _ => Self::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hubspot => "hubspot",
            Self::None => "none",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Text(String),
    Amount(Decimal),
}

impl ParameterValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            Self::Amount(_) => None,
        }
    }

    pub fn as_amount(&self) -> Option<Decimal> {
        match self {
            Self::Amount(value) => Some(*value),
            Self::Text(_) => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(value) if value.trim().is_empty())
    }
}

impl std::fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(value) => f.write_str(value),
            Self::Amount(value) => write!(f, "{}", value.normalize()),
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Decimal> for ParameterValue {
    fn from(value: Decimal) -> Self {
        Self::Amount(value)
    }
}

/// Sparse parameter map. A key that is absent means "leave this field alone".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(BTreeMap<String, ParameterValue>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the value unless it is blank text.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParameterValue>) {
        let value = value.into();
        if value.is_blank() {
            return;
        }
        self.0.insert(key.into(), value);
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParameterValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTarget {
    pub recipient: Option<String>,
    pub subject_hint: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    pub operation_kind: OperationKind,
    pub target_system: TargetSystem,
    pub parameters: Parameters,
    pub notify: bool,
    pub notification_target: NotificationTarget,
}

impl OperationDescriptor {
    /// Builds a descriptor, forcing `target_system` to `none` for unknown operations.
    pub fn new(
        operation_kind: OperationKind,
        target_system: TargetSystem,
        parameters: Parameters,
        notify: bool,
        notification_target: NotificationTarget,
    ) -> Self {
        let target_system = match operation_kind {
            OperationKind::Unknown => TargetSystem::None,
            _ => target_system,
        };
        Self { operation_kind, target_system, parameters, notify, notification_target }
    }

    /// Descriptor used when interpretation could not run at all.
    pub fn unresolved() -> Self {
        Self::new(
            OperationKind::Unknown,
            TargetSystem::None,
            Parameters::new(),
            false,
            NotificationTarget::default(),
        )
    }

    pub fn is_resolved(&self) -> bool {
        self.operation_kind != OperationKind::Unknown
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.operation_kind == OperationKind::Unknown && self.target_system != TargetSystem::None
        {
            return Err(DomainError::InvariantViolation(format!(
                "unknown operation must not target `{}`",
                self.target_system.as_str()
            )));
        }
        Ok(())
    }
}
