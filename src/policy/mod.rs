//! Policy backend collaborator.
//!
//! The backend accepts fully formed rule payloads for each action family and
//! persists them. A rule is addressed by its position within its family, so
//! an update names the family and the index of the rule it replaces.
//!
//! Use `create_policy_backend()` to build the implementation named in
//! configuration.

mod memory;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PolicySettings;

pub use memory::{JournalEntry, MemoryPolicyBackend};

/// A rule payload as sent to the backend: a JSON object with PascalCase keys.
pub type RulePayload = serde_json::Map<String, serde_json::Value>;

/// Errors that can occur during policy backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Backend is temporarily unavailable
    #[error("Policy backend unavailable: {0}")]
    Unavailable(String),

    /// Update addressed a rule that does not exist
    #[error("No {family} rule at index {index} (have {len})")]
    IndexOutOfRange {
        family: RuleFamily,
        index: usize,
        len: usize,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Action family a rule belongs to. Each family is stored separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleFamily {
    Block,
    Forward,
    Groups,
    Tags,
}

impl RuleFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleFamily::Block => "block",
            RuleFamily::Forward => "forward",
            RuleFamily::Groups => "groups",
            RuleFamily::Tags => "tags",
        }
    }
}

impl fmt::Display for RuleFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a dispatch created a new rule or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleOperation {
    Created,
    Updated,
}

impl RuleOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleOperation::Created => "create",
            RuleOperation::Updated => "update",
        }
    }
}

/// Result of a successful create or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleReceipt {
    pub family: RuleFamily,
    /// Position of the rule within its family after the call
    pub index: usize,
    pub operation: RuleOperation,
}

/// A configured site-to-site VPN peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteVpn {
    #[serde(rename = "Address")]
    pub address: String,
}

/// The subset of backend configuration the flow cards read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(rename = "SiteVPNs", default)]
    pub site_vpns: Vec<SiteVpn>,
}

/// Policy backend operations consumed by flow-card submission.
///
/// Implementations perform no retries on behalf of the caller; a failed call
/// is reported once and the caller decides what to do.
#[async_trait]
pub trait PolicyBackend: Send + Sync {
    /// Append a new rule to `family`.
    async fn create(
        &self,
        family: RuleFamily,
        payload: RulePayload,
    ) -> Result<RuleReceipt, BackendError>;

    /// Replace the rule at `index` within `family`.
    async fn update_at(
        &self,
        family: RuleFamily,
        index: usize,
        payload: RulePayload,
    ) -> Result<RuleReceipt, BackendError>;

    /// Fetch backend configuration.
    async fn config(&self) -> Result<PolicyConfig, BackendError>;
}

/// Create a policy backend based on configuration.
///
/// Only the `"memory"` backend exists; other names fall back to it.
pub fn create_policy_backend(settings: &PolicySettings) -> Arc<dyn PolicyBackend> {
    if settings.backend != "memory" {
        tracing::warn!(
            backend = %settings.backend,
            "Unknown policy backend, falling back to memory"
        );
    }

    let config = PolicyConfig {
        site_vpns: settings
            .site_vpns
            .iter()
            .map(|address| SiteVpn {
                address: address.clone(),
            })
            .collect(),
    };

    tracing::info!(
        backend = "memory",
        site_vpns = config.site_vpns.len(),
        "Creating memory policy backend"
    );
    Arc::new(MemoryPolicyBackend::with_config(config))
}
