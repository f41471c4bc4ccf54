//! Outcome notifications: message rendering and the Elastic Email adapter.

pub mod elastic;
pub mod notifier;

pub use elastic::ElasticEmailClient;
pub use notifier::Notifier;
