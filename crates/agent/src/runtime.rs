use std::sync::Arc;

use crmflow_core::audit::{AuditEvent, AuditOutcome, AuditSink, AuditStage, TracingAuditSink};
use crmflow_core::config::AppConfig;
use crmflow_core::domain::notification::{NotificationOutcome, NotificationStatus};
use crmflow_core::domain::pipeline::PipelineResult;
use crmflow_core::domain::request::Request;
use crmflow_core::errors::PipelineError;
use crmflow_core::flows::{FlowEngine, FlowRun, PipelineEvent};
use crmflow_core::ports::{CrmBackend, MessageBackend};
use crmflow_crm::{HubSpotClient, OperationExecutor};
use crmflow_email::{ElasticEmailClient, Notifier};
use tracing::{info, warn};
use uuid::Uuid;

use crate::interpreter::Interpreter;
use crate::llm::{LlmClient, OpenAiCompatibleClient};

/// Interpret, execute, then optionally notify: one request per call.
#[derive(Clone)]
pub struct PipelineRuntime {
    interpreter: Interpreter,
    executor: OperationExecutor,
    notifier: Notifier,
    flow: FlowEngine,
    audit: Arc<dyn AuditSink>,
}

impl PipelineRuntime {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        crm: Arc<dyn CrmBackend>,
        messages: Arc<dyn MessageBackend>,
        default_recipient: impl Into<String>,
    ) -> Self {
        Self {
            interpreter: Interpreter::new(llm),
            executor: OperationExecutor::new(crm),
            notifier: Notifier::new(messages, default_recipient),
            flow: FlowEngine::new(),
            audit: Arc::new(TracingAuditSink),
        }
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        config.validate()?;

        let llm = OpenAiCompatibleClient::from_config(&config.llm)
            .map_err(|error| PipelineError::Integration(format!("llm client: {error}")))?;
        let crm = HubSpotClient::from_config(&config.crm)
            .map_err(|error| PipelineError::Integration(format!("crm client: {error}")))?;
        let messages = ElasticEmailClient::from_config(&config.email)
            .map_err(|error| PipelineError::Integration(format!("email client: {error}")))?;

        Ok(Self::new(
            Arc::new(llm),
            Arc::new(crm),
            Arc::new(messages),
            config.email.default_recipient.clone(),
        ))
    }

    pub async fn run_pipeline(&self, request_text: &str) -> PipelineResult {
        let correlation_id = Uuid::new_v4().to_string();
        let mut run = self.flow.start(&correlation_id, self.audit.as_ref());

        let outcome = self.drive(&mut run, request_text).await;
        match outcome {
            Ok(result) => result,
            Err(error) => {
                if let Err(transition_error) = run.fault() {
                    warn!(
                        event_name = "pipeline.fault_unrecorded",
                        correlation_id = %correlation_id,
                        error = %transition_error,
                        "could not move pipeline to failed"
                    );
                }
                warn!(
                    event_name = "pipeline.failed",
                    correlation_id = %correlation_id,
                    error_class = error.error_class(),
                    error = %error,
                    "pipeline failed"
                );
                PipelineResult::failed(correlation_id.as_str(), request_text, error.to_string())
            }
        }
    }

    async fn drive(
        &self,
        run: &mut FlowRun<'_>,
        request_text: &str,
    ) -> Result<PipelineResult, PipelineError> {
        let correlation_id = run.correlation_id().to_string();
        info!(
            event_name = "pipeline.started",
            correlation_id = %correlation_id,
            "pipeline started"
        );
        let request = Request::new(request_text)?;

        let interpretation = self.interpreter.interpret(&request).await;
        interpretation.descriptor.validate()?;
        self.audit.record(
            AuditEvent::new(
                correlation_id.as_str(),
                AuditStage::Interpretation,
                "interpretation.completed",
                AuditOutcome::Success,
            )
            .field("operation", interpretation.descriptor.operation_kind.as_str())
            .field("source", interpretation.source.as_str()),
        );
        run.advance(PipelineEvent::Interpreted)?;

        let descriptor = interpretation.descriptor;
        let operation_result = self.executor.execute(&descriptor).await;
        self.audit.record(
            AuditEvent::new(
                correlation_id.as_str(),
                AuditStage::Execution,
                "execution.completed",
                AuditOutcome::from_success(operation_result.is_success()),
            )
            .field("operation", descriptor.operation_kind.as_str())
            .field_opt("record_id", operation_result.record_id.clone())
            .field_opt("failure_class", operation_result.failure_class.map(|class| class.as_str())),
        );
        run.advance(PipelineEvent::Executed)?;

        let notification = if descriptor.notify {
            run.advance(PipelineEvent::NotificationRequested)?;
            let outcome = self
                .notifier
                .notify(&operation_result, request.as_str(), &descriptor.notification_target)
                .await;
            self.audit.record(
                AuditEvent::new(
                    correlation_id.as_str(),
                    AuditStage::Notification,
                    "notification.completed",
                    AuditOutcome::from_success(outcome.outcome == NotificationStatus::Sent),
                )
                .field_opt("recipient", outcome.recipient.clone()),
            );
            run.advance(PipelineEvent::Notified)?;
            outcome
        } else {
            run.advance(PipelineEvent::NotificationSkipped)?;
            NotificationOutcome::skipped()
        };

        let result = PipelineResult::completed(
            correlation_id.as_str(),
            request.as_str(),
            interpretation.source,
            descriptor,
            operation_result,
            notification,
        );
        info!(
            event_name = "pipeline.completed",
            correlation_id = %correlation_id,
            succeeded = result.succeeded,
            "pipeline completed"
        );
        Ok(result)
    }
}

/// Builds a runtime from `config` and processes one request.
///
/// Configuration and client setup problems are reported as a failed result.
pub async fn run_pipeline(config: &AppConfig, request_text: &str) -> PipelineResult {
    match PipelineRuntime::from_config(config) {
        Ok(runtime) => runtime.run_pipeline(request_text).await,
        Err(error) => {
            let correlation_id = Uuid::new_v4().to_string();
            warn!(
                event_name = "pipeline.setup_failed",
                correlation_id = %correlation_id,
                error_class = error.error_class(),
                error = %error,
                "pipeline setup failed"
            );
            PipelineResult::failed(correlation_id, request_text, error.to_string())
        }
    }
}
