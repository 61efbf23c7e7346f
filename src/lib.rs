// Infrastructure (shared components)
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// External collaborators
pub mod policy;
pub mod registry;

// Domain
pub mod catalog;
pub mod template;

pub use catalog::{get_card, get_cards, CardType, FlowPipeline};
pub use error::{FlowError, Result};
pub use template::{resolve_template, RenderMode, RenderOutput, Segment};
