use std::time::Duration;

use async_trait::async_trait;
use crmflow_core::config::EmailConfig;
use crmflow_core::ports::{BackendError, DeliveryReceipt, MessageBackend, OutboundMessage};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    success: bool,
    error: Option<String>,
    data: Option<SendData>,
}

#[derive(Debug, Deserialize)]
struct SendData {
    messageid: Option<String>,
}

/// Elastic Email v2 transactional send API.
#[derive(Clone)]
pub struct ElasticEmailClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
    from_email: String,
    from_name: String,
}

impl ElasticEmailClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: SecretString,
        from_email: impl Into<String>,
        from_name: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            from_email: from_email.into(),
            from_name: from_name.into(),
        }
    }

    pub fn from_config(config: &EmailConfig) -> Result<Self, BackendError> {
        let mut builder = Client::builder();
        if let Some(timeout_secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }
        let client = builder.build().map_err(|error| BackendError::Transport(error.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            from_email: config.from_email.clone(),
            from_name: config.from_name.clone(),
        })
    }
}

#[async_trait]
impl MessageBackend for ElasticEmailClient {
    async fn send_message(
        &self,
        message: &OutboundMessage,
    ) -> Result<DeliveryReceipt, BackendError> {
        let url = format!("{}/email/send", self.base_url);
        debug!(
            event_name = "email.elastic.request",
            recipient = %message.recipient,
            subject = %message.subject,
            "sending elastic email request"
        );

        let response = self
            .client
            .post(&url)
            .form(&[
                ("apikey", self.api_key.expose_secret()),
                ("from", self.from_email.as_str()),
                ("fromName", self.from_name.as_str()),
                ("to", message.recipient.as_str()),
                ("subject", message.subject.as_str()),
                ("bodyHtml", message.body_html.as_str()),
                ("isTransactional", "true"),
            ])
            .send()
            .await
            .map_err(|error| BackendError::Transport(error.to_string()))?;

        let status = response.status();
        let body =
            response.text().await.map_err(|error| BackendError::Transport(error.to_string()))?;

        if !status.is_success() {
            warn!(
                event_name = "email.elastic.rejected",
                status = status.as_u16(),
                "elastic email rejected request"
            );
            return Err(BackendError::Rejected { status: status.as_u16(), body });
        }

        let parsed: SendResponse =
            serde_json::from_str(&body).map_err(|error| BackendError::Decode(error.to_string()))?;
        if !parsed.success {
            return Err(BackendError::Reported(
                parsed.error.unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        Ok(DeliveryReceipt { message_id: parsed.data.and_then(|data| data.messageid) })
    }
}
