//! CRM side of the pipeline: descriptor execution and the HubSpot adapter.

pub mod executor;
pub mod hubspot;

pub use executor::{ExecutionError, OperationExecutor};
pub use hubspot::HubSpotClient;
