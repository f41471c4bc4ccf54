//! Stage trail for pipeline runs.
//!
//! Each stage of a run (interpretation, execution, notification) and every
//! state-machine transition records one [`AuditEvent`] carrying the run's
//! correlation id. Sinks decide where the trail goes: the tracing subscriber in
//! production, memory in tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStage {
    Flow,
    Interpretation,
    Execution,
    Notification,
}

impl AuditStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flow => "flow",
            Self::Interpretation => "interpretation",
            Self::Execution => "execution",
            Self::Notification => "notification",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    /// The step was refused, e.g. an illegal state transition.
    Rejected,
    /// The step ran but its business result is a failure.
    Failed,
}

impl AuditOutcome {
    pub fn from_success(succeeded: bool) -> Self {
        if succeeded {
            Self::Success
        } else {
            Self::Failed
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AuditEvent {
    pub event_id: Uuid,
    pub correlation_id: String,
    pub stage: AuditStage,
    pub event_type: &'static str,
    pub outcome: AuditOutcome,
    pub fields: BTreeMap<&'static str, String>,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        correlation_id: impl Into<String>,
        stage: AuditStage,
        event_type: &'static str,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            correlation_id: correlation_id.into(),
            stage,
            event_type,
            outcome,
            fields: BTreeMap::new(),
            occurred_at: Utc::now(),
        }
    }

    pub fn field(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.fields.insert(key, value.into());
        self
    }

    /// Adds the field only when a value is present.
    pub fn field_opt(self, key: &'static str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.field(key, value),
            None => self,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Writes each event through `tracing`; failures and rejections at warn level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        let fields = event
            .fields
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(" ");

        if event.outcome == AuditOutcome::Success {
            tracing::info!(
                event_name = event.event_type,
                correlation_id = %event.correlation_id,
                stage = event.stage.as_str(),
                fields = %fields,
                "audit"
            );
        } else {
            tracing::warn!(
                event_name = event.event_type,
                correlation_id = %event.correlation_id,
                stage = event.stage.as_str(),
                outcome = ?event.outcome,
                fields = %fields,
                "audit"
            );
        }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl InMemoryAuditSink {
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Event types in recording order.
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events().iter().map(|event| event.event_type).collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event);
    }
}
