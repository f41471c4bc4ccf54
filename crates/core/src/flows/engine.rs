use thiserror::Error;

use crate::audit::{AuditEvent, AuditOutcome, AuditSink, AuditStage};
use crate::flows::states::{PipelineEvent, PipelineState, TransitionOutcome};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("invalid pipeline transition from {} on {}", state.as_str(), event.as_str())]
    InvalidTransition { state: PipelineState, event: PipelineEvent },
}

/// Transition table of the pipeline state machine.
///
/// ```text
/// interpreting -> executing -> notify_decision -> notifying -> done
///                                              \-> done (skip)
/// any live state --faulted--> failed
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct FlowEngine;

impl FlowEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn initial_state(&self) -> PipelineState {
        PipelineState::Interpreting
    }

    pub fn apply(
        &self,
        current: &PipelineState,
        event: &PipelineEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        use PipelineEvent as E;
        use PipelineState as S;

        let to = match (*current, *event) {
            (S::Interpreting, E::Interpreted) => S::Executing,
            (S::Executing, E::Executed) => S::NotifyDecision,
            (S::NotifyDecision, E::NotificationRequested) => S::Notifying,
            (S::NotifyDecision, E::NotificationSkipped) | (S::Notifying, E::Notified) => S::Done,
            (state, E::Faulted) if !state.is_terminal() => S::Failed,
            (state, event) => return Err(FlowTransitionError::InvalidTransition { state, event }),
        };
        Ok(TransitionOutcome { from: *current, to, event: *event })
    }

    /// Starts tracking one run from the initial state.
    pub fn start<'a>(&self, correlation_id: &'a str, sink: &'a dyn AuditSink) -> FlowRun<'a> {
        FlowRun { engine: *self, state: self.initial_state(), correlation_id, sink }
    }
}

/// State of a single run. Every attempted transition is recorded to the sink,
/// rejected ones included.
pub struct FlowRun<'a> {
    engine: FlowEngine,
    state: PipelineState,
    correlation_id: &'a str,
    sink: &'a dyn AuditSink,
}

impl FlowRun<'_> {
    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn correlation_id(&self) -> &str {
        self.correlation_id
    }

    pub fn advance(&mut self, event: PipelineEvent) -> Result<PipelineState, FlowTransitionError> {
        match self.engine.apply(&self.state, &event) {
            Ok(outcome) => {
                self.sink.record(
                    AuditEvent::new(
                        self.correlation_id,
                        AuditStage::Flow,
                        "flow.transition_applied",
                        AuditOutcome::Success,
                    )
                    .field("from", outcome.from.as_str())
                    .field("to", outcome.to.as_str())
                    .field("event", outcome.event.as_str()),
                );
                self.state = outcome.to;
                Ok(self.state)
            }
            Err(error) => {
                self.sink.record(
                    AuditEvent::new(
                        self.correlation_id,
                        AuditStage::Flow,
                        "flow.transition_rejected",
                        AuditOutcome::Rejected,
                    )
                    .field("state", self.state.as_str())
                    .field("event", event.as_str()),
                );
                Err(error)
            }
        }
    }

    /// Moves a live run to `failed`; a finished run is left as is.
    pub fn fault(&mut self) -> Result<(), FlowTransitionError> {
        if self.state.is_terminal() {
            return Ok(());
        }
        self.advance(PipelineEvent::Faulted).map(|_| ())
    }
}
