//! In-memory policy backend.
//!
//! Rules are kept per family in insertion order and are lost on restart.
//! Every accepted call is appended to a journal so callers can see exactly
//! which operations reached the backend.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;

use super::{
    BackendError, PolicyBackend, PolicyConfig, RuleFamily, RuleOperation, RulePayload, RuleReceipt,
};

/// One call that reached the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    pub family: RuleFamily,
    pub operation: RuleOperation,
    pub index: usize,
    pub payload: RulePayload,
}

/// In-memory policy backend.
pub struct MemoryPolicyBackend {
    rules: DashMap<RuleFamily, Vec<RulePayload>>,
    config: PolicyConfig,
    journal: Mutex<Vec<JournalEntry>>,
    /// When set, every call fails as if the backend were unreachable
    offline: AtomicBool,
}

impl Default for MemoryPolicyBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPolicyBackend {
    pub fn new() -> Self {
        Self::with_config(PolicyConfig::default())
    }

    pub fn with_config(config: PolicyConfig) -> Self {
        Self {
            rules: DashMap::new(),
            config,
            journal: Mutex::new(Vec::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// Simulate the backend becoming unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    /// Rules currently stored for a family.
    pub fn rules(&self, family: RuleFamily) -> Vec<RulePayload> {
        self.rules
            .get(&family)
            .map(|rules| rules.clone())
            .unwrap_or_default()
    }

    /// All calls accepted so far, oldest first.
    pub async fn journal(&self) -> Vec<JournalEntry> {
        self.journal.lock().await.clone()
    }

    fn ensure_online(&self) -> Result<(), BackendError> {
        if self.offline.load(Ordering::Relaxed) {
            return Err(BackendError::Unavailable(
                "policy backend is offline".to_string(),
            ));
        }
        Ok(())
    }

    async fn record(&self, receipt: &RuleReceipt, payload: RulePayload) {
        self.journal.lock().await.push(JournalEntry {
            family: receipt.family,
            operation: receipt.operation,
            index: receipt.index,
            payload,
        });
    }
}

#[async_trait]
impl PolicyBackend for MemoryPolicyBackend {
    async fn create(
        &self,
        family: RuleFamily,
        payload: RulePayload,
    ) -> Result<RuleReceipt, BackendError> {
        self.ensure_online()?;

        let index = {
            let mut rules = self.rules.entry(family).or_default();
            rules.push(payload.clone());
            rules.len() - 1
        };

        let receipt = RuleReceipt {
            family,
            index,
            operation: RuleOperation::Created,
        };
        self.record(&receipt, payload).await;

        tracing::debug!(family = %family, index = index, "Rule created");
        Ok(receipt)
    }

    async fn update_at(
        &self,
        family: RuleFamily,
        index: usize,
        payload: RulePayload,
    ) -> Result<RuleReceipt, BackendError> {
        self.ensure_online()?;

        {
            let mut rules = self.rules.entry(family).or_default();
            let len = rules.len();
            match rules.get_mut(index) {
                Some(rule) => *rule = payload.clone(),
                None => {
                    return Err(BackendError::IndexOutOfRange { family, index, len });
                }
            }
        }

        let receipt = RuleReceipt {
            family,
            index,
            operation: RuleOperation::Updated,
        };
        self.record(&receipt, payload).await;

        tracing::debug!(family = %family, index = index, "Rule updated");
        Ok(receipt)
    }

    async fn config(&self) -> Result<PolicyConfig, BackendError> {
        self.ensure_online()?;
        Ok(self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(client: &str) -> RulePayload {
        json!({ "Protocol": "tcp", "Client": client })
            .as_object()
            .cloned()
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_appends_per_family() {
        let backend = MemoryPolicyBackend::new();

        let first = backend.create(RuleFamily::Block, payload("a")).await.unwrap();
        let second = backend.create(RuleFamily::Block, payload("b")).await.unwrap();
        let other = backend.create(RuleFamily::Forward, payload("c")).await.unwrap();

        assert_eq!(first.index, 0);
        assert_eq!(second.index, 1);
        assert_eq!(other.index, 0);
        assert_eq!(backend.rules(RuleFamily::Block).len(), 2);
    }

    #[tokio::test]
    async fn test_update_replaces_rule() {
        let backend = MemoryPolicyBackend::new();
        backend.create(RuleFamily::Tags, payload("a")).await.unwrap();

        let receipt = backend
            .update_at(RuleFamily::Tags, 0, payload("z"))
            .await
            .unwrap();

        assert_eq!(receipt.operation, RuleOperation::Updated);
        assert_eq!(backend.rules(RuleFamily::Tags)[0]["Client"], "z");
    }

    #[tokio::test]
    async fn test_update_out_of_range() {
        let backend = MemoryPolicyBackend::new();

        let err = backend
            .update_at(RuleFamily::Groups, 3, payload("a"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BackendError::IndexOutOfRange { index: 3, len: 0, .. }
        ));
        assert!(backend.journal().await.is_empty());
    }

    #[tokio::test]
    async fn test_offline_rejects_without_journaling() {
        let backend = MemoryPolicyBackend::new();
        backend.set_offline(true);

        assert!(backend.create(RuleFamily::Block, payload("a")).await.is_err());
        assert!(backend.config().await.is_err());
        assert!(backend.journal().await.is_empty());
    }
}
