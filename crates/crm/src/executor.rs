use std::sync::Arc;

use crmflow_core::domain::descriptor::{
    keys, OperationDescriptor, OperationKind, Parameters, TargetSystem,
};
use crmflow_core::domain::operation::{FailureClass, OperationResult};
use crmflow_core::ports::{BackendError, BackendRecord, CrmBackend, PropertySet};
use thiserror::Error;
use tracing::{info, warn};

pub const CONTACT_PROPERTIES: [(&str, &str); 5] = [
    (keys::EMAIL, "email"),
    (keys::FIRSTNAME, "firstname"),
    (keys::LASTNAME, "lastname"),
    (keys::COMPANY, "company"),
    (keys::PHONE, "phone"),
];

pub const DEAL_PROPERTIES: [(&str, &str); 4] = [
    (keys::DEAL_NAME, "dealname"),
    (keys::DEAL_AMOUNT, "amount"),
    (keys::DEAL_STAGE, "dealstage"),
    (keys::PIPELINE, "pipeline"),
];

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("{operation} requires `{identifier}`")]
    MissingIdentifier { operation: OperationKind, identifier: &'static str },
    #[error("{operation} requires a numeric `{identifier}`, got `{value}`")]
    InvalidIdentifier { operation: OperationKind, identifier: &'static str, value: String },
    #[error("unsupported operation `{operation}` for target system `{target}`")]
    Unsupported { operation: OperationKind, target: &'static str },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ExecutionError {
    pub fn failure_class(&self) -> FailureClass {
        match self {
            Self::MissingIdentifier { .. } | Self::InvalidIdentifier { .. } => {
                FailureClass::Validation
            }
            Self::Unsupported { .. } => FailureClass::Unsupported,
            Self::Backend(_) => FailureClass::Backend,
        }
    }
}

/// Performs one descriptor against the CRM backend.
///
/// Unknown operations, foreign target systems and updates without a numeric
/// record identifier are rejected before any backend call is made.
#[derive(Clone)]
pub struct OperationExecutor {
    backend: Arc<dyn CrmBackend>,
}

impl OperationExecutor {
    pub fn new(backend: Arc<dyn CrmBackend>) -> Self {
        Self { backend }
    }

    pub async fn execute(&self, descriptor: &OperationDescriptor) -> OperationResult {
        let operation = descriptor.operation_kind;
        match self.perform(descriptor).await {
            Ok((record_id, record)) => {
                info!(
                    event_name = "crm.operation.completed",
                    operation = %operation,
                    record_id = record_id.as_deref().unwrap_or("-"),
                    "crm operation completed"
                );
                OperationResult::success(operation, record_id, Some(record.payload))
            }
            Err(error) => {
                let failure_class = error.failure_class();
                warn!(
                    event_name = "crm.operation.failed",
                    operation = %operation,
                    failure_class = ?failure_class,
                    error = %error,
                    "crm operation failed"
                );
                OperationResult::failure(operation, failure_class, error.to_string())
            }
        }
    }

    async fn perform(
        &self,
        descriptor: &OperationDescriptor,
    ) -> Result<(Option<String>, BackendRecord), ExecutionError> {
        let operation = descriptor.operation_kind;
        let unsupported =
            ExecutionError::Unsupported { operation, target: descriptor.target_system.as_str() };
        if descriptor.target_system != TargetSystem::Hubspot {
            return Err(unsupported);
        }

        let parameters = &descriptor.parameters;
        match operation {
            OperationKind::CreateContact => {
                let properties = property_set(parameters, &CONTACT_PROPERTIES);
                let record = self.backend.create_contact(&properties).await?;
                Ok((record.id.clone(), record))
            }
            OperationKind::UpdateContact => {
                let contact_id = required_identifier(parameters, operation, keys::CONTACT_ID)?;
                let properties = property_set(parameters, &CONTACT_PROPERTIES);
                let record = self.backend.update_contact(&contact_id, &properties).await?;
                Ok((Some(contact_id), record))
            }
            OperationKind::CreateDeal => {
                let properties = property_set(parameters, &DEAL_PROPERTIES);
                let record = self.backend.create_deal(&properties).await?;
                Ok((record.id.clone(), record))
            }
            OperationKind::UpdateDeal => {
                let deal_id = required_identifier(parameters, operation, keys::DEAL_ID)?;
                let properties = property_set(parameters, &DEAL_PROPERTIES);
                let record = self.backend.update_deal(&deal_id, &properties).await?;
                Ok((Some(deal_id), record))
            }
            OperationKind::Unknown => Err(unsupported),
        }
    }
}

fn required_identifier(
    parameters: &Parameters,
    operation: OperationKind,
    key: &'static str,
) -> Result<String, ExecutionError> {
    let value = parameters
        .get(key)
        .map(|value| value.to_string())
        .ok_or(ExecutionError::MissingIdentifier { operation, identifier: key })?;

    // CRM object ids are numeric.
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ExecutionError::InvalidIdentifier { operation, identifier: key, value });
    }
    Ok(trimmed.to_string())
}

/// Maps present parameters onto CRM property names; absent keys are left out.
pub fn property_set(parameters: &Parameters, mapping: &[(&str, &str)]) -> PropertySet {
    mapping
        .iter()
        .filter_map(|(key, property)| {
            parameters.get(key).map(|value| (property.to_string(), value.to_string()))
        })
        .collect()
}
