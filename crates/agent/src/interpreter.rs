use std::sync::Arc;

use crmflow_core::domain::descriptor::{
    keys, NotificationTarget, OperationDescriptor, OperationKind, ParameterValue, Parameters,
    TargetSystem,
};
use crmflow_core::domain::pipeline::InterpretationSource;
use crmflow_core::domain::request::Request;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::llm::LlmClient;

const INSTRUCTION: &str = r#"You are a CRM automation orchestrator. Decide which CRM operation the user query asks for.

User Query: {request}

Answer with a single JSON object of this shape:
{
    "task_type": "create_contact|update_contact|create_deal|update_deal",
    "agent": "hubspot",
    "parameters": {
        "email": "email_if_provided",
        "firstname": "first_name_if_provided",
        "lastname": "last_name_if_provided",
        "company": "company_if_provided",
        "phone": "phone_if_provided",
        "deal_name": "deal_name_if_provided",
        "deal_amount": "amount_if_provided",
        "deal_stage": "stage_if_provided",
        "pipeline": "pipeline_if_provided",
        "contact_id": "contact_id_if_updating",
        "deal_id": "deal_id_if_updating"
    },
    "send_notification": true,
    "notification_details": {
        "recipient": "recipient_if_provided",
        "subject": "subject_if_provided"
    }
}

Only include parameters that are mentioned in or can be inferred from the query."#;

const PLACEHOLDER_SUFFIXES: [&str; 2] = ["_if_provided", "_if_updating"];
const PLACEHOLDER_VALUES: [&str; 5] = ["null", "none", "n/a", "unknown", "not provided"];

pub fn build_prompt(request: &Request) -> String {
    INSTRUCTION.replace("{request}", request.as_str())
}

/// Result of scanning a completion for its JSON answer.
#[derive(Clone, Debug, PartialEq)]
pub enum CompletionPayload {
    WellFormed(Map<String, Value>),
    Malformed,
}

/// Returns the first well-formed JSON object embedded in `text`.
pub fn inspect_completion(text: &str) -> CompletionPayload {
    for (offset, _) in text.match_indices('{') {
        let mut stream = serde_json::Deserializer::from_str(&text[offset..]).into_iter::<Value>();
        if let Some(Ok(Value::Object(object))) = stream.next() {
            return CompletionPayload::WellFormed(object);
        }
    }
    CompletionPayload::Malformed
}

/// A bare mention of a deal is too vague to act on and stays `Unknown`, so
/// the executor refuses it without touching the CRM.
pub fn classify_keywords(text: &str) -> OperationKind {
    let lowered = text.to_lowercase();
    let mentions_contact = lowered.contains("contact");
    let mentions_deal = lowered.contains("deal");

    if mentions_contact && lowered.contains("create") {
        OperationKind::CreateContact
    } else if mentions_contact && lowered.contains("update") {
        OperationKind::UpdateContact
    } else if mentions_deal && lowered.contains("update") {
        OperationKind::UpdateDeal
    } else {
        OperationKind::Unknown
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Interpretation {
    pub descriptor: OperationDescriptor,
    pub source: InterpretationSource,
}

/// Turns a request into an operation descriptor. Never fails: completion
/// errors degrade to an unresolved descriptor.
#[derive(Clone)]
pub struct Interpreter {
    llm: Arc<dyn LlmClient>,
}

impl Interpreter {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn interpret(&self, request: &Request) -> Interpretation {
        let completion = match self.llm.complete(&build_prompt(request)).await {
            Ok(completion) => completion,
            Err(error) => {
                warn!(
                    event_name = "interpreter.degraded",
                    error = %error,
                    "completion failed; request left unresolved"
                );
                return Interpretation {
                    descriptor: OperationDescriptor::unresolved(),
                    source: InterpretationSource::Degraded,
                };
            }
        };

        let interpretation = match inspect_completion(&completion) {
            CompletionPayload::WellFormed(object) => Interpretation {
                descriptor: descriptor_from_object(&object),
                source: InterpretationSource::Structured,
            },
            CompletionPayload::Malformed => Interpretation {
                descriptor: OperationDescriptor::new(
                    classify_keywords(&completion),
                    TargetSystem::Hubspot,
                    Parameters::new(),
                    true,
                    NotificationTarget::default(),
                ),
                source: InterpretationSource::KeywordFallback,
            },
        };

        info!(
            event_name = "interpreter.completed",
            operation = %interpretation.descriptor.operation_kind,
            source = ?interpretation.source,
            parameter_count = interpretation.descriptor.parameters.len(),
            "request interpreted"
        );
        interpretation
    }
}

pub fn descriptor_from_object(object: &Map<String, Value>) -> OperationDescriptor {
    let operation_kind = object
        .get("task_type")
        .and_then(Value::as_str)
        .map_or(OperationKind::Unknown, OperationKind::parse);
    // The CRM is implied when the answer does not name one.
    let target_system = object
        .get("agent")
        .and_then(Value::as_str)
        .map_or(TargetSystem::Hubspot, TargetSystem::parse);
    let notify = object.get("send_notification").and_then(Value::as_bool).unwrap_or(true);

    let notification_target = object
        .get("notification_details")
        .and_then(Value::as_object)
        .map(|details| NotificationTarget {
            recipient: details.get("recipient").and_then(meaningful_text),
            subject_hint: details.get("subject").and_then(meaningful_text),
        })
        .unwrap_or_default();

    let parameters = object
        .get("parameters")
        .and_then(Value::as_object)
        .map(normalize_parameters)
        .unwrap_or_default();

    OperationDescriptor::new(operation_kind, target_system, parameters, notify, notification_target)
}

fn normalize_parameters(raw: &Map<String, Value>) -> Parameters {
    let mut parameters = Parameters::new();
    for key in keys::ALL {
        let Some(value) = raw.get(key) else {
            continue;
        };
        let normalized = match key {
            keys::DEAL_AMOUNT => parse_amount(value).map(ParameterValue::Amount),
            keys::DEAL_STAGE => {
                meaningful_text(value).map(|stage| ParameterValue::Text(normalize_stage(&stage)))
            }
            _ => meaningful_text(value).map(ParameterValue::Text),
        };
        if let Some(normalized) = normalized {
            parameters.insert(key, normalized);
        }
    }
    parameters
}

/// Text or numeric JSON value as trimmed text, or `None` for blanks and placeholders.
fn meaningful_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    if text.is_empty() || is_placeholder(&text) {
        return None;
    }
    Some(text)
}

fn is_placeholder(text: &str) -> bool {
    let lowered = text.to_ascii_lowercase();
    PLACEHOLDER_VALUES.contains(&lowered.as_str())
        || PLACEHOLDER_SUFFIXES.iter().any(|suffix| lowered.ends_with(suffix))
}

fn parse_amount(value: &Value) -> Option<Decimal> {
    let text = meaningful_text(value)?;
    let cleaned: String = text
        .chars()
        .filter(|character| !matches!(character, '$' | '€' | '£' | ',' | ' ' | '_'))
        .collect();
    let cleaned = cleaned.trim_end_matches("USD").trim_end_matches("usd");
    cleaned.parse::<Decimal>().ok().or_else(|| Decimal::from_scientific(cleaned).ok())
}

fn normalize_stage(stage: &str) -> String {
    stage.trim().to_lowercase().replace([' ', '-'], "_")
}
