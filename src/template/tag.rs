//! Tag transforms applied to resolved placeholder values.
//!
//! Tags starting with `Device` trigger a registry lookup on the raw value.
//! In text mode every tag degrades to a string; in element mode the known
//! tags map to a structured segment.

use crate::registry::{DeviceReference, DeviceRegistry, LookupKind};

use super::types::{DeviceField, DeviceView, RenderMode, Segment};

/// Look up the device a raw value refers to, when the tag asks for one.
/// An unresolved placeholder yields an empty value and never names a device.
fn device_for(registry: &dyn DeviceRegistry, tag: &str, value: &str) -> Option<DeviceReference> {
    if !tag.starts_with("Device") || value.is_empty() {
        return None;
    }
    let kind = LookupKind::infer(value);
    let device = registry.lookup_device(value, kind);
    if device.is_none() {
        tracing::debug!(value = %value, kind = %kind, "No device for tagged value");
    }
    device
}

fn fallback(tag: &str, value: &str) -> String {
    format!("{}#{}", value, tag)
}

/// Plain-text rendering of a tagged value.
///
/// Matching is by substring and ordered: `Interface` first, then `IP`, then
/// `Device`. Unknown tags render as `value#tag`.
pub fn tag_text(registry: &dyn DeviceRegistry, tag: &str, value: &str) -> String {
    let device = device_for(registry, tag, value);

    if tag.contains("Interface") {
        value.to_string()
    } else if tag.contains("IP") {
        match device {
            Some(device) if !device.recent_ip.is_empty() => device.recent_ip,
            _ => value.to_string(),
        }
    } else if tag.contains("Device") {
        match device {
            Some(device) if !device.name.is_empty() => device.name,
            _ => value.to_string(),
        }
    } else {
        fallback(tag, value)
    }
}

/// Fields shown for each structured device tag.
fn device_fields(tag: &str) -> Option<Vec<DeviceField>> {
    let fields = match tag {
        "Device" => vec![DeviceField::Style, DeviceField::Name],
        "DeviceIcon" => vec![DeviceField::Style],
        "DeviceName" => vec![DeviceField::Name],
        "DeviceIP" => vec![DeviceField::RecentIp],
        "DeviceMAC" => vec![DeviceField::Mac],
        _ => return None,
    };
    Some(fields)
}

/// Structured rendering of a tagged value. Tags are matched exactly.
pub fn tag_segment(registry: &dyn DeviceRegistry, tag: &str, value: &str) -> Segment {
    if tag == "Interface" {
        return Segment::Interface {
            name: value.to_string(),
        };
    }

    match device_fields(tag) {
        Some(fields) => Segment::Device(DeviceView {
            raw: value.to_string(),
            device: device_for(registry, tag, value),
            fields,
        }),
        None => Segment::text(fallback(tag, value)),
    }
}

/// Apply a tag in the given mode.
pub fn apply_tag(registry: &dyn DeviceRegistry, tag: &str, value: &str, mode: RenderMode) -> Segment {
    match mode {
        RenderMode::Text => Segment::text(tag_text(registry, tag, value)),
        RenderMode::Elements => tag_segment(registry, tag, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MemoryDeviceRegistry;

    const MAC: &str = "aa:bb:cc:dd:ee:ff";

    fn registry() -> MemoryDeviceRegistry {
        let registry = MemoryDeviceRegistry::new();
        registry.insert_device(
            DeviceReference::new(MAC, "Laptop", "192.168.1.5").with_style("Laptop", "blue"),
        );
        registry
    }

    #[test]
    fn test_text_device_tags() {
        let registry = registry();

        assert_eq!(tag_text(&registry, "Device", MAC), "Laptop");
        assert_eq!(tag_text(&registry, "DeviceName", MAC), "Laptop");
        assert_eq!(tag_text(&registry, "DeviceIP", MAC), "192.168.1.5");
        // DeviceMAC has no dedicated text form; it degrades through `Device`
        assert_eq!(tag_text(&registry, "DeviceMAC", MAC), "Laptop");
        assert_eq!(tag_text(&registry, "DeviceIP", "192.168.1.5"), "192.168.1.5");
    }

    #[test]
    fn test_text_unknown_device_keeps_raw() {
        let registry = registry();

        assert_eq!(tag_text(&registry, "Device", "11:22:33:44:55:66"), "11:22:33:44:55:66");
        assert_eq!(tag_text(&registry, "DeviceIP", "10.0.0.9"), "10.0.0.9");
    }

    #[test]
    fn test_text_non_device_tags() {
        let registry = registry();

        assert_eq!(tag_text(&registry, "Interface", "wlan0"), "wlan0");
        // IP-ish tags without the Device prefix never look anything up
        assert_eq!(tag_text(&registry, "SrcIP", MAC), MAC);
        assert_eq!(tag_text(&registry, "Port", "443"), "443#Port");
    }

    #[test]
    fn test_segment_device_views() {
        let registry = registry();

        let Segment::Device(view) = tag_segment(&registry, "Device", MAC) else {
            panic!("expected device segment");
        };
        assert_eq!(view.fields, vec![DeviceField::Style, DeviceField::Name]);
        assert_eq!(view.device.as_ref().map(|d| d.name.as_str()), Some("Laptop"));

        let Segment::Device(view) = tag_segment(&registry, "DeviceMAC", "192.168.1.5") else {
            panic!("expected device segment");
        };
        assert_eq!(view.fields, vec![DeviceField::Mac]);
        assert_eq!(view.text(), MAC);
    }

    #[test]
    fn test_segment_missing_device_is_not_an_error() {
        let registry = registry();

        let Segment::Device(view) = tag_segment(&registry, "DeviceName", "ghost") else {
            panic!("expected device segment");
        };
        assert!(view.device.is_none());
        assert_eq!(view.text(), "ghost");
    }

    #[test]
    fn test_empty_value_never_names_a_device() {
        let registry = registry();
        registry.insert_device(DeviceReference::new("11:22:33:44:55:66", "Printer", ""));

        assert_eq!(tag_text(&registry, "Device", ""), "");
        assert_eq!(tag_text(&registry, "DeviceIP", ""), "");

        let Segment::Device(view) = tag_segment(&registry, "DeviceName", "") else {
            panic!("expected device segment");
        };
        assert!(view.device.is_none());
        assert_eq!(view.text(), "");
    }

    #[test]
    fn test_segment_interface_and_unknown() {
        let registry = registry();

        assert_eq!(
            tag_segment(&registry, "Interface", "wlan0"),
            Segment::Interface {
                name: "wlan0".to_string()
            }
        );
        assert_eq!(tag_segment(&registry, "Port", "443"), Segment::text("443#Port"));
        // structured mode matches exactly, so substring families fall back
        assert_eq!(tag_segment(&registry, "SrcIP", "1.2.3.4"), Segment::text("1.2.3.4#SrcIP"));
    }

    #[test]
    fn test_apply_tag_mode() {
        let registry = registry();

        assert_eq!(
            apply_tag(&registry, "Device", MAC, RenderMode::Text),
            Segment::text("Laptop")
        );
        assert!(matches!(
            apply_tag(&registry, "Device", MAC, RenderMode::Elements),
            Segment::Device(_)
        ));
    }
}
