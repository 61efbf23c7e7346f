//! Client identifier resolution.
//!
//! Action cards take a free-text client ("192.168.2.0/24", a MAC, a group or
//! tag name) and submit a canonical reference instead.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FlowError, Result};
use crate::registry::{DeviceRegistry, LookupKind};

/// Canonical client reference sent to the policy backend. Exactly one field
/// is set for a resolved client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRef {
    #[serde(rename = "Identity", default)]
    pub identity: String,
    #[serde(rename = "SrcIP", default)]
    pub src_ip: String,
    #[serde(rename = "Group", default)]
    pub group: String,
    #[serde(rename = "Tag", default)]
    pub tag: String,
}

impl ClientRef {
    pub fn is_empty(&self) -> bool {
        self.identity.is_empty()
            && self.src_ip.is_empty()
            && self.group.is_empty()
            && self.tag.is_empty()
    }
}

fn failure(client: &str, reason: impl Into<String>) -> FlowError {
    FlowError::ClientResolution {
        client: client.to_string(),
        reason: reason.into(),
    }
}

/// `a.b.c.d` or `a.b.c.d/n` with n <= 32.
pub fn is_ipv4_or_cidr(value: &str) -> bool {
    let (addr, prefix) = match value.split_once('/') {
        Some((addr, prefix)) => (addr, Some(prefix)),
        None => (value, None),
    };

    let prefix_ok = match prefix {
        Some(p) => p.parse::<u8>().is_ok_and(|n| n <= 32),
        None => true,
    };

    prefix_ok && addr.parse::<Ipv4Addr>().is_ok()
}

/// Six colon-separated hex octets.
pub fn is_mac(value: &str) -> bool {
    let octets: Vec<&str> = value.split(':').collect();
    octets.len() == 6
        && octets
            .iter()
            .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Resolve a free-text client identifier.
///
/// Order: IPv4 / CIDR, MAC (must be a known device), group name, tag name.
/// Anything else, including an empty value, is a resolution failure.
pub async fn parse_client(registry: &dyn DeviceRegistry, raw: &str) -> Result<ClientRef> {
    let client = raw.trim();
    if client.is_empty() {
        return Err(failure(raw, "client is empty"));
    }

    if is_ipv4_or_cidr(client) {
        return Ok(ClientRef {
            src_ip: client.to_string(),
            ..ClientRef::default()
        });
    }

    if is_mac(client) {
        return match registry.lookup_device(client, LookupKind::Mac) {
            Some(device) => Ok(ClientRef {
                identity: device.mac,
                ..ClientRef::default()
            }),
            None => Err(failure(client, "no device with this MAC")),
        };
    }

    let groups = registry
        .list_groups()
        .await
        .map_err(|e| failure(client, e.to_string()))?;
    if groups.iter().any(|g| g == client) {
        return Ok(ClientRef {
            group: client.to_string(),
            ..ClientRef::default()
        });
    }

    let tags = registry
        .list_tags()
        .await
        .map_err(|e| failure(client, e.to_string()))?;
    if tags.iter().any(|t| t == client) {
        return Ok(ClientRef {
            tag: client.to_string(),
            ..ClientRef::default()
        });
    }

    Err(failure(client, "not an address, known device, group or tag"))
}

/// Resolve the `Client` value of a card instance.
///
/// Strings are parsed; an object already in canonical form passes through.
pub async fn resolve_client_value(registry: &dyn DeviceRegistry, value: &Value) -> Result<ClientRef> {
    match value {
        Value::String(raw) => parse_client(registry, raw).await,
        Value::Object(_) => {
            let client: ClientRef = serde_json::from_value(value.clone())
                .map_err(|e| failure(&value.to_string(), e.to_string()))?;
            if client.is_empty() {
                return Err(failure(&value.to_string(), "client is empty"));
            }
            Ok(client)
        }
        Value::Null => Err(failure("", "client is missing")),
        other => Err(failure(&other.to_string(), "client must be a string")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{DeviceReference, MemoryDeviceRegistry};
    use serde_json::json;

    fn registry() -> MemoryDeviceRegistry {
        let registry = MemoryDeviceRegistry::with_catalog(
            vec!["lan".to_string(), "guests".to_string()],
            vec!["kids".to_string()],
        );
        registry.insert_device(DeviceReference::new(
            "aa:bb:cc:dd:ee:ff",
            "Laptop",
            "192.168.2.10",
        ));
        registry
    }

    #[test]
    fn test_address_shapes() {
        assert!(is_ipv4_or_cidr("0.0.0.0"));
        assert!(is_ipv4_or_cidr("192.168.2.0/24"));
        assert!(!is_ipv4_or_cidr("192.168.2.0/33"));
        assert!(!is_ipv4_or_cidr("192.168.2"));
        assert!(is_mac("AA:bb:cc:dd:ee:ff"));
        assert!(!is_mac("aa:bb:cc:dd:ee"));
    }

    #[tokio::test]
    async fn test_parse_cidr() {
        let client = parse_client(&registry(), "192.168.2.0/24").await.unwrap();
        assert_eq!(client.src_ip, "192.168.2.0/24");
        assert!(client.group.is_empty());
    }

    #[tokio::test]
    async fn test_parse_known_mac() {
        let client = parse_client(&registry(), "AA:BB:CC:DD:EE:FF").await.unwrap();
        assert_eq!(client.identity, "aa:bb:cc:dd:ee:ff");
    }

    #[tokio::test]
    async fn test_parse_unknown_mac_fails() {
        let result = parse_client(&registry(), "11:22:33:44:55:66").await;
        assert!(matches!(result, Err(FlowError::ClientResolution { .. })));
    }

    #[tokio::test]
    async fn test_parse_group_then_tag() {
        let registry = registry();
        assert_eq!(parse_client(&registry, "guests").await.unwrap().group, "guests");
        assert_eq!(parse_client(&registry, "kids").await.unwrap().tag, "kids");
        assert!(parse_client(&registry, "nobody").await.is_err());
        assert!(parse_client(&registry, "  ").await.is_err());
    }

    #[tokio::test]
    async fn test_registry_outage_is_resolution_failure() {
        let registry = registry();
        registry.set_offline(true);

        // addresses need no registry listing
        assert!(parse_client(&registry, "10.0.0.1").await.is_ok());
        assert!(matches!(
            parse_client(&registry, "lan").await,
            Err(FlowError::ClientResolution { .. })
        ));
    }

    #[tokio::test]
    async fn test_canonical_object_passes_through() {
        let registry = registry();
        let client = resolve_client_value(&registry, &json!({ "Group": "lan" }))
            .await
            .unwrap();
        assert_eq!(client.group, "lan");

        assert!(resolve_client_value(&registry, &json!({})).await.is_err());
        assert!(resolve_client_value(&registry, &json!(42)).await.is_err());
    }
}
