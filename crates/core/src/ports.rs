//! Narrow interfaces to the external collaborators the pipeline talks to.
//!
//! The executor only sees [`CrmBackend`] and the notifier only sees
//! [`MessageBackend`]; HTTP adapters live in their own crates.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// CRM property names mapped to their string values, in stable order.
pub type PropertySet = BTreeMap<String, String>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BackendError {
    /// Non-2xx response; the body is kept verbatim.
    #[error("{body}")]
    Rejected { status: u16, body: String },
    /// 2xx response whose payload reports a failure.
    #[error("{0}")]
    Reported(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("could not decode backend response: {0}")]
    Decode(String),
    /// Refused before sending: the id cannot name a single record.
    #[error("invalid record id `{0}`")]
    InvalidRecordId(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct BackendRecord {
    pub id: Option<String>,
    pub payload: Value,
}

#[async_trait]
pub trait CrmBackend: Send + Sync {
    async fn create_contact(&self, properties: &PropertySet) -> Result<BackendRecord, BackendError>;
    async fn update_contact(
        &self,
        contact_id: &str,
        properties: &PropertySet,
    ) -> Result<BackendRecord, BackendError>;
    async fn create_deal(&self, properties: &PropertySet) -> Result<BackendRecord, BackendError>;
    async fn update_deal(
        &self,
        deal_id: &str,
        properties: &PropertySet,
    ) -> Result<BackendRecord, BackendError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundMessage {
    pub recipient: String,
    pub subject: String,
    pub body_html: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub message_id: Option<String>,
}

#[async_trait]
pub trait MessageBackend: Send + Sync {
    async fn send_message(&self, message: &OutboundMessage)
        -> Result<DeliveryReceipt, BackendError>;
}
