use std::time::Duration;

use async_trait::async_trait;
use crmflow_core::config::CrmConfig;
use crmflow_core::ports::{BackendError, BackendRecord, CrmBackend, PropertySet};
use reqwest::{Client, Method, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

const OBJECTS_PATH: [&str; 3] = ["crm", "v3", "objects"];
const CONTACTS: &str = "contacts";
const DEALS: &str = "deals";

#[derive(Serialize)]
struct PropertiesBody<'a> {
    properties: &'a PropertySet,
}

/// HubSpot CRM v3 objects API authenticated with a private-app access token.
#[derive(Clone)]
pub struct HubSpotClient {
    client: Client,
    base_url: String,
    access_token: SecretString,
}

impl HubSpotClient {
    pub fn new(base_url: impl Into<String>, access_token: SecretString) -> Self {
        Self::with_client(Client::new(), base_url, access_token)
    }

    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        access_token: SecretString,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url, access_token }
    }

    pub fn from_config(config: &CrmConfig) -> Result<Self, BackendError> {
        let mut builder = Client::builder();
        if let Some(timeout_secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }
        let client = builder.build().map_err(|error| BackendError::Transport(error.to_string()))?;
        Ok(Self::with_client(client, config.base_url.clone(), config.access_token.clone()))
    }

    /// `{base}/crm/v3/objects/{object}[/{record_id}]`. The record id is
    /// percent-encoded into exactly one path segment.
    fn object_url(&self, object: &str, record_id: Option<&str>) -> Result<Url, BackendError> {
        if let Some(id) = record_id {
            if matches!(id.trim(), "" | "." | "..") {
                return Err(BackendError::InvalidRecordId(id.to_string()));
            }
        }

        let invalid_base =
            || BackendError::Transport(format!("invalid crm base url `{}`", self.base_url));
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid_base())?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| invalid_base())?;
            segments.pop_if_empty().extend(OBJECTS_PATH).push(object);
            if let Some(id) = record_id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    async fn write_object(
        &self,
        method: Method,
        object: &str,
        record_id: Option<&str>,
        properties: &PropertySet,
    ) -> Result<BackendRecord, BackendError> {
        let url = self.object_url(object, record_id)?;
        debug!(
            event_name = "crm.hubspot.request",
            method = %method,
            url = %url,
            property_count = properties.len(),
            "sending hubspot request"
        );

        let response = self
            .client
            .request(method, url.clone())
            .bearer_auth(self.access_token.expose_secret())
            .json(&PropertiesBody { properties })
            .send()
            .await
            .map_err(|error| BackendError::Transport(error.to_string()))?;

        let status = response.status();
        let body =
            response.text().await.map_err(|error| BackendError::Transport(error.to_string()))?;

        if !status.is_success() {
            warn!(
                event_name = "crm.hubspot.rejected",
                status = status.as_u16(),
                url = %url,
                "hubspot rejected request"
            );
            return Err(BackendError::Rejected { status: status.as_u16(), body });
        }

        let payload: Value =
            serde_json::from_str(&body).map_err(|error| BackendError::Decode(error.to_string()))?;
        let id = match payload.get("id") {
            Some(Value::String(id)) => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        };
        Ok(BackendRecord { id, payload })
    }
}

#[async_trait]
impl CrmBackend for HubSpotClient {
    async fn create_contact(
        &self,
        properties: &PropertySet,
    ) -> Result<BackendRecord, BackendError> {
        self.write_object(Method::POST, CONTACTS, None, properties).await
    }

    async fn update_contact(
        &self,
        contact_id: &str,
        properties: &PropertySet,
    ) -> Result<BackendRecord, BackendError> {
        self.write_object(Method::PATCH, CONTACTS, Some(contact_id), properties).await
    }

    async fn create_deal(&self, properties: &PropertySet) -> Result<BackendRecord, BackendError> {
        self.write_object(Method::POST, DEALS, None, properties).await
    }

    async fn update_deal(
        &self,
        deal_id: &str,
        properties: &PropertySet,
    ) -> Result<BackendRecord, BackendError> {
        self.write_object(Method::PATCH, DEALS, Some(deal_id), properties).await
    }
}
