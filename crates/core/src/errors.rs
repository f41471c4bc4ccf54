use thiserror::Error;

use crate::config::ConfigError;
use crate::flows::FlowTransitionError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("request text is empty")]
    EmptyRequest,
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

/// Faults that abort a pipeline run with `overall_status = failed`.
///
/// Business failures inside a stage (backend rejections, missing identifiers,
/// degraded interpretation) are never represented here; they travel inside the
/// stage results instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Flow(#[from] FlowTransitionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("integration setup failure: {0}")]
    Integration(String),
}

impl PipelineError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::EmptyRequest) => "empty_request",
            Self::Domain(DomainError::InvariantViolation(_)) => "invariant_violation",
            Self::Flow(_) => "state_transition",
            Self::Config(_) => "config_validation",
            Self::Integration(_) => "integration_setup",
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ConfigError;
    use crate::errors::{DomainError, PipelineError};
    use crate::flows::{FlowTransitionError, PipelineEvent, PipelineState};

    #[test]
    fn domain_errors_are_classified() {
        let error = PipelineError::from(DomainError::EmptyRequest);
        assert_eq!(error.error_class(), "empty_request");
        assert_eq!(error.to_string(), "request text is empty");
    }

    #[test]
    fn configuration_errors_keep_their_message() {
        let error =
            PipelineError::from(ConfigError::Validation("crm.access_token is required".to_owned()));
        assert_eq!(error.error_class(), "config_validation");
        assert!(error.to_string().contains("crm.access_token"));
    }

    #[test]
    fn transition_errors_map_to_state_transition_class() {
        let error = PipelineError::from(FlowTransitionError::InvalidTransition {
            state: PipelineState::Done,
            event: PipelineEvent::Interpreted,
        });
        assert_eq!(error.error_class(), "state_transition");
    }
}
