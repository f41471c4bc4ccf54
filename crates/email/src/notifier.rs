use std::sync::Arc;

use crmflow_core::domain::descriptor::NotificationTarget;
use crmflow_core::domain::notification::NotificationOutcome;
use crmflow_core::domain::operation::OperationResult;
use crmflow_core::ports::{BackendError, MessageBackend, OutboundMessage};
use tracing::{info, warn};

/// Renders an operation outcome into an email and hands it to the message backend.
#[derive(Clone)]
pub struct Notifier {
    backend: Arc<dyn MessageBackend>,
    default_recipient: String,
}

impl Notifier {
    pub fn new(backend: Arc<dyn MessageBackend>, default_recipient: impl Into<String>) -> Self {
        Self { backend, default_recipient: default_recipient.into() }
    }

    pub fn default_recipient(&self) -> &str {
        &self.default_recipient
    }

    pub async fn notify(
        &self,
        result: &OperationResult,
        original_request: &str,
        target: &NotificationTarget,
    ) -> NotificationOutcome {
        let message = compose(result, original_request, target, &self.default_recipient);
        let recipient = message.recipient.clone();

        match self.backend.send_message(&message).await {
            Ok(receipt) => {
                info!(
                    event_name = "email.notification.sent",
                    recipient = %recipient,
                    message_id = receipt.message_id.as_deref().unwrap_or("-"),
                    "notification sent"
                );
                NotificationOutcome::sent(recipient, receipt.message_id)
            }
            Err(error) => {
                let detail = delivery_error_detail(&error);
                warn!(
                    event_name = "email.notification.failed",
                    recipient = %recipient,
                    error = %detail,
                    "notification failed"
                );
                NotificationOutcome::failed(recipient, detail)
            }
        }
    }
}

fn delivery_error_detail(error: &BackendError) -> String {
    match error {
        BackendError::Rejected { status, body } => format!("HTTP {status}: {body}"),
        other => other.to_string(),
    }
}

pub fn compose(
    result: &OperationResult,
    original_request: &str,
    target: &NotificationTarget,
    default_recipient: &str,
) -> OutboundMessage {
    let recipient = target
        .recipient
        .as_deref()
        .map(str::trim)
        .filter(|recipient| !recipient.is_empty())
        .unwrap_or(default_recipient)
        .to_string();

    OutboundMessage {
        recipient,
        subject: subject(result, target.subject_hint.as_deref()),
        body_html: body_html(result, original_request),
    }
}

pub fn subject(result: &OperationResult, subject_hint: Option<&str>) -> String {
    let title = result.operation_kind.title();
    if !result.is_success() {
        return format!("❌ CRM Operation Failed: {title}");
    }
    match subject_hint.map(str::trim).filter(|hint| !hint.is_empty()) {
        Some(hint) => hint.to_string(),
        None => format!("✅ CRM Operation Successful: {title}"),
    }
}

pub fn body_html(result: &OperationResult, original_request: &str) -> String {
    let title = result.operation_kind.title();

    if result.is_success() {
        let mut details = String::new();
        if let (Some(label), Some(record_id)) =
            (result.operation_kind.record_label(), result.record_id.as_deref())
        {
            details.push_str(&format!("<li><strong>{label}:</strong> {record_id}</li>"));
        }
        return format!(
            "<html>\n<body>\n\
             <h2>CRM Operation Completed Successfully</h2>\n\
             <p><strong>Original Request:</strong> {original_request}</p>\n\
             <p><strong>Operation:</strong> {title}</p>\n\
             <p><strong>Status:</strong> ✅ Success</p>\n\
             <h3>Operation Details:</h3>\n\
             <ul>{details}</ul>\n\
             <p><em>This is an automated notification from the CRM Automation System.</em></p>\n\
             </body>\n</html>\n"
        );
    }

    let error = result.error_detail.as_deref().unwrap_or("Unknown error");
    format!(
        "<html>\n<body>\n\
         <h2>CRM Operation Failed</h2>\n\
         <p><strong>Original Request:</strong> {original_request}</p>\n\
         <p><strong>Operation:</strong> {title}</p>\n\
         <p><strong>Status:</strong> ❌ Failed</p>\n\
         <p><strong>Error:</strong> {error}</p>\n\
         <p><em>Please check the system logs for more details.</em></p>\n\
         </body>\n</html>\n"
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use crmflow_core::domain::descriptor::{NotificationTarget, OperationKind};
    use crmflow_core::domain::notification::NotificationStatus;
    use crmflow_core::domain::operation::{FailureClass, OperationResult};
    use crmflow_core::ports::{BackendError, DeliveryReceipt, MessageBackend, OutboundMessage};
    use tokio::sync::Mutex;

    use super::{body_html, compose, subject, Notifier};

    #[derive(Default)]
    struct RecordingBackend {
        sent: Mutex<Vec<OutboundMessage>>,
        failure: Option<BackendError>,
    }

    #[async_trait]
    impl MessageBackend for RecordingBackend {
        async fn send_message(
            &self,
            message: &OutboundMessage,
        ) -> Result<DeliveryReceipt, BackendError> {
            self.sent.lock().await.push(message.clone());
            match &self.failure {
                Some(error) => Err(error.clone()),
                None => Ok(DeliveryReceipt { message_id: Some("msg-1".to_string()) }),
            }
        }
    }

    fn created_contact() -> OperationResult {
        OperationResult::success(OperationKind::CreateContact, Some("12345".to_string()), None)
    }

    #[test]
    fn success_subject_uses_title_or_hint() {
        assert_eq!(
            subject(&created_contact(), None),
            "✅ CRM Operation Successful: Create Contact"
        );
        assert_eq!(subject(&created_contact(), Some("New lead added")), "New lead added");
    }

    #[test]
    fn failure_subject_ignores_hint() {
        let failed = OperationResult::failure(
            OperationKind::UpdateDeal,
            FailureClass::Validation,
            "update_deal requires `deal_id`",
        );
        assert_eq!(subject(&failed, Some("Deal closed")), "❌ CRM Operation Failed: Update Deal");
    }

    #[test]
    fn success_body_lists_request_and_record() {
        let body = body_html(&created_contact(), "Create a contact for John Doe");
        assert!(body.contains("<strong>Original Request:</strong> Create a contact for John Doe"));
        assert!(body.contains("<strong>Operation:</strong> Create Contact"));
        assert!(body.contains("<li><strong>Contact ID:</strong> 12345</li>"));
    }

    #[test]
    fn failure_body_embeds_error_detail_verbatim() {
        let raw = r#"{"status":"error","message":"Property values were not valid"}"#;
        let failed =
            OperationResult::failure(OperationKind::CreateContact, FailureClass::Backend, raw);
        let body = body_html(&failed, "add contact");
        assert!(body.contains(raw));
        assert!(body.contains("CRM Operation Failed"));
    }

    #[test]
    fn recipient_falls_back_to_default() {
        let message =
            compose(&created_contact(), "req", &NotificationTarget::default(), "admin@company.com");
        assert_eq!(message.recipient, "admin@company.com");

        let target =
            NotificationTarget { recipient: Some("sales@acme.io".to_string()), subject_hint: None };
        let message = compose(&created_contact(), "req", &target, "admin@company.com");
        assert_eq!(message.recipient, "sales@acme.io");
    }

    #[tokio::test]
    async fn notify_sends_exactly_one_message() {
        let backend = Arc::new(RecordingBackend::default());
        let notifier = Notifier::new(backend.clone(), "admin@company.com");

        let outcome =
            notifier.notify(&created_contact(), "req", &NotificationTarget::default()).await;

        assert_eq!(outcome.outcome, NotificationStatus::Sent);
        assert_eq!(outcome.message_id.as_deref(), Some("msg-1"));
        assert_eq!(outcome.recipient.as_deref(), Some("admin@company.com"));
        assert_eq!(backend.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn delivery_failure_is_reported_not_retried() {
        let backend = Arc::new(RecordingBackend {
            sent: Mutex::new(Vec::new()),
            failure: Some(BackendError::Rejected { status: 500, body: "boom".to_string() }),
        });
        let notifier = Notifier::new(backend.clone(), "admin@company.com");

        let outcome =
            notifier.notify(&created_contact(), "req", &NotificationTarget::default()).await;

        assert_eq!(outcome.outcome, NotificationStatus::Failed);
        assert_eq!(outcome.error_detail.as_deref(), Some("HTTP 500: boom"));
        assert_eq!(backend.sent.lock().await.len(), 1);
    }
}
