//! Domain model, configuration and pipeline state machine shared by every crmflow crate.

pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod ports;

pub use audit::{
    AuditEvent, AuditOutcome, AuditSink, AuditStage, InMemoryAuditSink, TracingAuditSink,
};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, Provenance, ValueSource};
pub use domain::descriptor::{
    keys, NotificationTarget, OperationDescriptor, OperationKind, ParameterValue, Parameters,
    TargetSystem,
};
pub use domain::notification::{NotificationOutcome, NotificationStatus};
pub use domain::operation::{FailureClass, OperationOutcome, OperationResult};
pub use domain::pipeline::{InterpretationSource, PipelineResult, PipelineStatus};
pub use domain::request::Request;
pub use errors::{DomainError, PipelineError};
pub use flows::{FlowEngine, FlowRun, FlowTransitionError, PipelineEvent, PipelineState};
pub use ports::{
    BackendError, BackendRecord, CrmBackend, DeliveryReceipt, MessageBackend, OutboundMessage,
    PropertySet,
};
