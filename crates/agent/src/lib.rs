//! Pipeline runtime: natural-language interpretation and stage orchestration.
//!
//! A request moves through three stages:
//! 1. **Interpretation** (`interpreter`) - completion text → `OperationDescriptor`
//! 2. **Execution** - descriptor → `OperationResult` via the CRM backend
//! 3. **Notification** - result → `NotificationOutcome` via the message backend
//!
//! `PipelineRuntime` wires the stages together and walks the `FlowEngine`
//! state machine, so every run ends in `Done` or `Failed`.
//!
//! The completion service only translates text. It never talks to the CRM;
//! what gets written is decided by the executor from the typed descriptor.

pub mod interpreter;
pub mod llm;
pub mod runtime;

pub use interpreter::{CompletionPayload, Interpretation, Interpreter};
pub use llm::{LlmClient, OpenAiCompatibleClient};
pub use runtime::{run_pipeline, PipelineRuntime};
