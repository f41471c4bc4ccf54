use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::descriptor::OperationKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationOutcome {
    Success,
    Failure,
}

/// Why an operation failed. Validation and unsupported failures never reach the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    Validation,
    Unsupported,
    Backend,
}

impl FailureClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Unsupported => "unsupported",
            Self::Backend => "backend",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub outcome: OperationOutcome,
    pub operation_kind: OperationKind,
    pub record_id: Option<String>,
    pub error_detail: Option<String>,
    pub failure_class: Option<FailureClass>,
    pub raw_payload: Option<Value>,
}

impl OperationResult {
    pub fn success(
        operation_kind: OperationKind,
        record_id: Option<String>,
        raw_payload: Option<Value>,
    ) -> Self {
        Self {
            outcome: OperationOutcome::Success,
            operation_kind,
            record_id,
            error_detail: None,
            failure_class: None,
            raw_payload,
        }
    }

    pub fn failure(
        operation_kind: OperationKind,
        failure_class: FailureClass,
        error_detail: impl Into<String>,
    ) -> Self {
        Self {
            outcome: OperationOutcome::Failure,
            operation_kind,
            record_id: None,
            error_detail: Some(error_detail.into()),
            failure_class: Some(failure_class),
            raw_payload: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == OperationOutcome::Success
    }
}
