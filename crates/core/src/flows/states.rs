use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Interpreting,
    Executing,
    NotifyDecision,
    Notifying,
    Done,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interpreting => "interpreting",
            Self::Executing => "executing",
            Self::NotifyDecision => "notify_decision",
            Self::Notifying => "notifying",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineEvent {
    Interpreted,
    Executed,
    NotificationRequested,
    NotificationSkipped,
    Notified,
    Faulted,
}

impl PipelineEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interpreted => "interpreted",
            Self::Executed => "executed",
            Self::NotificationRequested => "notification_requested",
            Self::NotificationSkipped => "notification_skipped",
            Self::Notified => "notified",
            Self::Faulted => "faulted",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: PipelineState,
    pub to: PipelineState,
    pub event: PipelineEvent,
}
