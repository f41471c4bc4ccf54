use serde::{Deserialize, Serialize};

use crate::domain::descriptor::OperationDescriptor;
use crate::domain::notification::NotificationOutcome;
use crate::domain::operation::OperationResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Completed,
    Failed,
}

/// How the descriptor was obtained from the completion output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpretationSource {
    Structured,
    KeywordFallback,
    Degraded,
}

impl InterpretationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::KeywordFallback => "keyword_fallback",
            Self::Degraded => "degraded",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub overall_status: PipelineStatus,
    pub correlation_id: String,
    pub request: String,
    pub interpretation: Option<InterpretationSource>,
    pub descriptor: Option<OperationDescriptor>,
    pub operation_result: Option<OperationResult>,
    pub notification_outcome: Option<NotificationOutcome>,
    pub succeeded: bool,
    pub error: Option<String>,
}

impl PipelineResult {
    pub fn completed(
        correlation_id: impl Into<String>,
        request: impl Into<String>,
        interpretation: InterpretationSource,
        descriptor: OperationDescriptor,
        operation_result: OperationResult,
        notification_outcome: NotificationOutcome,
    ) -> Self {
        let succeeded = operation_result.is_success();
        Self {
            overall_status: PipelineStatus::Completed,
            correlation_id: correlation_id.into(),
            request: request.into(),
            interpretation: Some(interpretation),
            descriptor: Some(descriptor),
            operation_result: Some(operation_result),
            notification_outcome: Some(notification_outcome),
            succeeded,
            error: None,
        }
    }

    /// Top-level failure: no per-stage detail is reported.
    pub fn failed(
        correlation_id: impl Into<String>,
        request: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            overall_status: PipelineStatus::Failed,
            correlation_id: correlation_id.into(),
            request: request.into(),
            interpretation: None,
            descriptor: None,
            operation_result: None,
            notification_outcome: None,
            succeeded: false,
            error: Some(error.into()),
        }
    }
}
