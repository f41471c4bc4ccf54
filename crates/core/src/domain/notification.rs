use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Sent,
    Skipped,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOutcome {
    pub outcome: NotificationStatus,
    pub message_id: Option<String>,
    pub recipient: Option<String>,
    pub error_detail: Option<String>,
}

impl NotificationOutcome {
    pub fn sent(recipient: impl Into<String>, message_id: Option<String>) -> Self {
        Self {
            outcome: NotificationStatus::Sent,
            message_id,
            recipient: Some(recipient.into()),
            error_detail: None,
        }
    }

    pub fn skipped() -> Self {
        Self {
            outcome: NotificationStatus::Skipped,
            message_id: None,
            recipient: None,
            error_detail: None,
        }
    }

    pub fn failed(recipient: impl Into<String>, error_detail: impl Into<String>) -> Self {
        Self {
            outcome: NotificationStatus::Failed,
            message_id: None,
            recipient: Some(recipient.into()),
            error_detail: Some(error_detail.into()),
        }
    }
}
