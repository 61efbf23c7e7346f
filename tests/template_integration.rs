//! Template rendering integration tests

use std::sync::Arc;

use serde_json::{json, Value};

use policy_flows::catalog::FlowPipeline;
use policy_flows::policy::MemoryPolicyBackend;
use policy_flows::registry::{DeviceReference, MemoryDeviceRegistry};
use policy_flows::template::{DeviceField, RenderMode, RenderOutput, Segment};

const LAPTOP_MAC: &str = "aa:bb:cc:dd:ee:ff";

fn create_test_pipeline() -> FlowPipeline {
    let registry = Arc::new(MemoryDeviceRegistry::new());
    registry.insert_device(
        DeviceReference::new(LAPTOP_MAC, "Laptop", "192.168.1.5").with_style("Laptop", "blue"),
    );
    FlowPipeline::new(registry, Arc::new(MemoryPolicyBackend::new()))
}

fn text(pipeline: &FlowPipeline, template: &str, event: &Value) -> String {
    pipeline
        .render(template, Some(event), RenderMode::Text)
        .to_string()
}

fn elements(pipeline: &FlowPipeline, template: &str, event: &Value) -> Vec<Segment> {
    match pipeline.render(template, Some(event), RenderMode::Elements) {
        RenderOutput::Elements(segments) => segments,
        other => panic!("expected elements, got {:?}", other),
    }
}

// =============================================================================
// Text Mode Tests
// =============================================================================

mod text_tests {
    use super::*;

    #[test]
    fn test_template_without_placeholders_is_unchanged() {
        let pipeline = create_test_pipeline();
        let event = json!({ "a": 1 });

        assert_eq!(text(&pipeline, "plain {text} here", &event), "plain {text} here");
    }

    #[test]
    fn test_nested_path() {
        let pipeline = create_test_pipeline();
        let event = json!({ "Info": { "Port": 22, "Proto": "tcp" } });

        assert_eq!(
            text(&pipeline, "port {{Info.Port}}/{{Info.Proto}}", &event),
            "port 22/tcp"
        );
    }

    #[test]
    fn test_missing_path_renders_empty() {
        let pipeline = create_test_pipeline();
        let event = json!({ "a": { "b": null } });

        assert_eq!(text(&pipeline, "[{{a.b.c}}][{{x}}]", &event), "[][]");
    }

    #[test]
    fn test_escaped_placeholder_renders_nothing() {
        let pipeline = create_test_pipeline();
        let event = json!({ "__meta": "secret", "name": "x" });

        assert_eq!(text(&pipeline, "a{{__meta}}b{{name}}", &event), "abx");
    }

    #[test]
    fn test_device_tags_degrade_to_text() {
        let pipeline = create_test_pipeline();
        let event = json!({ "Info": { "MAC": LAPTOP_MAC } });

        assert_eq!(
            text(
                &pipeline,
                "Device {{Info.MAC#Device}} connected from {{Info.MAC#DeviceIP}}",
                &event
            ),
            "Device Laptop connected from 192.168.1.5"
        );
    }

    #[test]
    fn test_unknown_device_keeps_raw_value() {
        let pipeline = create_test_pipeline();
        let event = json!({ "MAC": "11:22:33:44:55:66" });

        assert_eq!(
            text(&pipeline, "{{MAC#DeviceName}}", &event),
            "11:22:33:44:55:66"
        );
    }

    #[test]
    fn test_missing_path_with_device_tag_is_empty() {
        // a device that has never been seen on the network has no RecentIP
        let registry = Arc::new(MemoryDeviceRegistry::new());
        registry.insert_device(DeviceReference::new("11:22:33:44:55:66", "OfflinePrinter", ""));
        let pipeline = FlowPipeline::new(registry, Arc::new(MemoryPolicyBackend::new()));

        assert_eq!(text(&pipeline, "by [{{Missing#Device}}]", &json!({})), "by []");
        assert_eq!(
            elements(&pipeline, "by [{{Missing#DeviceName}}]", &json!({}))
                .iter()
                .map(|s| s.to_string())
                .collect::<String>(),
            "by []"
        );
    }

    #[test]
    fn test_unknown_tag_is_appended() {
        let pipeline = create_test_pipeline();
        let event = json!({ "Port": 53 });

        assert_eq!(text(&pipeline, "{{Port#Service}}", &event), "53#Service");
    }

    #[test]
    fn test_no_event_returns_template() {
        let pipeline = create_test_pipeline();

        let output = pipeline.render("hi {{name}}", None, RenderMode::Text);
        assert_eq!(output, RenderOutput::Text("hi {{name}}".to_string()));
    }
}

// =============================================================================
// Element Mode Tests
// =============================================================================

mod element_tests {
    use super::*;

    #[test]
    fn test_device_segment_is_structured() {
        let pipeline = create_test_pipeline();
        let event = json!({ "Info": { "MAC": LAPTOP_MAC, "Iface": "wg0" } });

        let segments = elements(
            &pipeline,
            "{{Info.MAC#Device}} on {{Info.Iface#Interface}}",
            &event,
        );

        assert_eq!(segments.len(), 3);
        match &segments[0] {
            Segment::Device(view) => {
                assert_eq!(view.raw, LAPTOP_MAC);
                assert_eq!(view.fields, vec![DeviceField::Style, DeviceField::Name]);
                assert_eq!(view.device.as_ref().map(|d| d.name.as_str()), Some("Laptop"));
            }
            other => panic!("expected device segment, got {:?}", other),
        }
        assert_eq!(segments[1], Segment::text(" on "));
        assert_eq!(
            segments[2],
            Segment::Interface {
                name: "wg0".to_string()
            }
        );
    }

    #[test]
    fn test_empty_text_segments_dropped() {
        let pipeline = create_test_pipeline();
        let event = json!({ "name": "x" });

        let segments = elements(&pipeline, "{{missing}}{{name}}", &event);
        assert_eq!(segments, vec![Segment::text("x")]);
    }

    #[test]
    fn test_repeated_segments_keep_positions() {
        let pipeline = create_test_pipeline();
        let event = json!({ "v": "a" });

        let output = pipeline.render("{{v}}-{{v}}", Some(&event), RenderMode::Elements);
        let keys: Vec<usize> = output.keyed().map(|(key, _)| key).collect();

        assert_eq!(keys, vec![0, 1, 2]);
        assert_eq!(output.to_string(), "a-a");
    }

    #[test]
    fn test_serialized_segments() {
        let pipeline = create_test_pipeline();
        let event = json!({ "i": "eth0" });

        let output = pipeline.render("via {{i#Interface}}", Some(&event), RenderMode::Elements);
        let value = serde_json::to_value(&output).unwrap();

        assert_eq!(
            value,
            json!([
                { "kind": "text", "text": "via " },
                { "kind": "interface", "name": "eth0" }
            ])
        );
    }
}
