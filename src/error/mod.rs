use thiserror::Error;

use crate::policy::BackendError;
use crate::registry::RegistryError;

/// Errors raised while resolving options for, transforming, or submitting a flow card.
///
/// Template resolution has no counterpart here: missing paths and failed device
/// lookups degrade to empty or raw values instead of failing.
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Unknown {card_type} card: {title}")]
    UnknownCard { card_type: String, title: String },

    #[error("Card '{0}' has no submit action")]
    NotSubmittable(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Failed to load options for '{param}' on card '{card}': {source}")]
    OptionFetch {
        card: String,
        param: String,
        #[source]
        source: CollaboratorError,
    },

    #[error("Could not resolve client '{client}': {reason}")]
    ClientResolution { client: String, reason: String },

    #[error("Policy backend rejected rule: {0}")]
    Dispatch(#[from] BackendError),
}

/// Failure reported by one of the external collaborators.
#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl FlowError {
    /// Short stage label used for metrics and log fields.
    pub fn stage(&self) -> &'static str {
        match self {
            FlowError::Config(_) => "config",
            FlowError::UnknownCard { .. } | FlowError::NotSubmittable(_) => "lookup",
            FlowError::Validation(_) => "validation",
            FlowError::OptionFetch { .. } => "options",
            FlowError::ClientResolution { .. } => "client",
            FlowError::Dispatch(_) => "dispatch",
        }
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;
