pub mod engine;
pub mod states;

pub use engine::{FlowEngine, FlowRun, FlowTransitionError};
pub use states::{PipelineEvent, PipelineState, TransitionOutcome};
