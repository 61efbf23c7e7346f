//! In-memory device registry using DashMap.
//!
//! Devices are keyed by lowercase MAC. IP lookups scan for a matching
//! `RecentIP`, which is fine for the handful of devices on a home network.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::RwLock;

use super::{DeviceReference, DeviceRegistry, LookupKind, RegistryError};

/// In-memory device registry.
pub struct MemoryDeviceRegistry {
    /// Devices keyed by lowercase MAC
    devices: DashMap<String, DeviceReference>,
    groups: RwLock<Vec<String>>,
    tags: RwLock<Vec<String>>,
    /// When set, listing calls fail as if the registry were unreachable
    offline: AtomicBool,
}

impl Default for MemoryDeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDeviceRegistry {
    pub fn new() -> Self {
        Self::with_catalog(Vec::new(), Vec::new())
    }

    /// Create a registry that already knows the given groups and tags.
    pub fn with_catalog(groups: Vec<String>, tags: Vec<String>) -> Self {
        Self {
            devices: DashMap::new(),
            groups: RwLock::new(groups),
            tags: RwLock::new(tags),
            offline: AtomicBool::new(false),
        }
    }

    /// Insert or replace a device record.
    pub fn insert_device(&self, device: DeviceReference) {
        tracing::debug!(mac = %device.mac, name = %device.name, "Registering device");
        self.devices.insert(device.mac.to_lowercase(), device);
    }

    pub fn remove_device(&self, mac: &str) -> Option<DeviceReference> {
        self.devices.remove(&mac.to_lowercase()).map(|(_, device)| device)
    }

    pub async fn add_group(&self, name: impl Into<String>) {
        let name = name.into();
        let mut groups = self.groups.write().await;
        if !groups.contains(&name) {
            groups.push(name);
        }
    }

    pub async fn add_tag(&self, name: impl Into<String>) {
        let name = name.into();
        let mut tags = self.tags.write().await;
        if !tags.contains(&name) {
            tags.push(name);
        }
    }

    /// Simulate the registry becoming unreachable for list operations.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    fn ensure_online(&self) -> Result<(), RegistryError> {
        if self.offline.load(Ordering::Relaxed) {
            return Err(RegistryError::Unavailable(
                "device registry is offline".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceRegistry for MemoryDeviceRegistry {
    fn lookup_device(&self, value: &str, kind: LookupKind) -> Option<DeviceReference> {
        if value.is_empty() {
            return None;
        }

        let found = match kind {
            LookupKind::Mac => self.devices.get(&value.to_lowercase()).map(|d| d.clone()),
            LookupKind::Ip | LookupKind::RecentIp => self
                .devices
                .iter()
                .find(|entry| entry.value().recent_ip == value)
                .map(|entry| entry.value().clone()),
        };

        if found.is_none() {
            tracing::debug!(value = %value, kind = %kind, "Device lookup missed");
        }

        found
    }

    async fn list_groups(&self) -> Result<Vec<String>, RegistryError> {
        self.ensure_online()?;
        Ok(self.groups.read().await.clone())
    }

    async fn list_tags(&self) -> Result<Vec<String>, RegistryError> {
        self.ensure_online()?;
        Ok(self.tags.read().await.clone())
    }
}
