//! Device registry collaborator.
//!
//! The registry owns device records. Template rendering borrows a device per
//! lookup to resolve `#Device*` tags, and the flow pipeline asks it for groups
//! and tags when populating choices or resolving a client identifier.
//!
//! Use `create_device_registry()` to build the implementation named in
//! configuration.

mod memory;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::DeviceSettings;

pub use memory::MemoryDeviceRegistry;

/// Errors that can occur while talking to the device registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Registry is temporarily unavailable
    #[error("Device registry unavailable: {0}")]
    Unavailable(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// How a raw identifier should be matched against device records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    /// Hardware address (`aa:bb:cc:dd:ee:ff`)
    Mac,
    /// Dotted address
    Ip,
    /// Anything else, matched against the most recently seen IP
    RecentIp,
}

impl LookupKind {
    /// Infer the lookup kind from the shape of a value.
    ///
    /// A colon means MAC, a dot means IP, everything else falls back to the
    /// recent-IP key. This is a heuristic and does not validate the value.
    pub fn infer(value: &str) -> Self {
        if value.contains(':') {
            LookupKind::Mac
        } else if value.contains('.') {
            LookupKind::Ip
        } else {
            LookupKind::RecentIp
        }
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKind::Mac => write!(f, "MAC"),
            LookupKind::Ip => write!(f, "IP"),
            LookupKind::RecentIp => write!(f, "RecentIP"),
        }
    }
}

/// Display style attached to a device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceStyle {
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
}

/// A device as known to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceReference {
    #[serde(rename = "MAC")]
    pub mac: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "RecentIP", default)]
    pub recent_ip: String,
    #[serde(rename = "Style", default)]
    pub style: DeviceStyle,
}

impl DeviceReference {
    pub fn new(mac: impl Into<String>, name: impl Into<String>, recent_ip: impl Into<String>) -> Self {
        Self {
            mac: mac.into(),
            name: name.into(),
            recent_ip: recent_ip.into(),
            style: DeviceStyle::default(),
        }
    }

    pub fn with_style(mut self, icon: impl Into<String>, color: impl Into<String>) -> Self {
        self.style = DeviceStyle {
            icon: icon.into(),
            color: color.into(),
        };
        self
    }
}

/// Device registry capabilities consumed by templates and flow cards.
///
/// `lookup_device` is synchronous so template rendering never suspends.
/// Listing groups and tags may require I/O and is async.
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Find a device by identifier. A miss is `None`, never an error.
    fn lookup_device(&self, value: &str, kind: LookupKind) -> Option<DeviceReference>;

    /// List device group names.
    async fn list_groups(&self) -> Result<Vec<String>, RegistryError>;

    /// List device tag names.
    async fn list_tags(&self) -> Result<Vec<String>, RegistryError>;
}

/// Create a device registry based on configuration.
///
/// Only the `"memory"` backend exists; other names fall back to it.
pub fn create_device_registry(settings: &DeviceSettings) -> Arc<dyn DeviceRegistry> {
    if settings.backend != "memory" {
        tracing::warn!(
            backend = %settings.backend,
            "Unknown device registry backend, falling back to memory"
        );
    }

    tracing::info!(
        backend = "memory",
        groups = settings.groups.len(),
        tags = settings.tags.len(),
        "Creating memory device registry"
    );
    Arc::new(MemoryDeviceRegistry::with_catalog(
        settings.groups.clone(),
        settings.tags.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_lookup_kind() {
        assert_eq!(LookupKind::infer("aa:bb:cc:dd:ee:ff"), LookupKind::Mac);
        assert_eq!(LookupKind::infer("192.168.1.5"), LookupKind::Ip);
        assert_eq!(LookupKind::infer("laptop"), LookupKind::RecentIp);
        // colon wins over dot
        assert_eq!(LookupKind::infer("fe80::1.2"), LookupKind::Mac);
    }

    #[test]
    fn test_device_reference_wire_names() {
        let device = DeviceReference::new("aa:bb:cc:dd:ee:ff", "Laptop", "192.168.1.5")
            .with_style("Laptop", "blue");
        let value = serde_json::to_value(&device).unwrap();

        assert_eq!(value["MAC"], "aa:bb:cc:dd:ee:ff");
        assert_eq!(value["RecentIP"], "192.168.1.5");
        assert_eq!(value["Style"]["Icon"], "Laptop");
    }

    #[tokio::test]
    async fn test_factory_falls_back_to_memory() {
        let settings = DeviceSettings {
            backend: "ldap".to_string(),
            ..DeviceSettings::default()
        };
        let registry = create_device_registry(&settings);

        assert_eq!(registry.list_groups().await.unwrap(), vec!["wan", "dns", "lan"]);
    }
}
