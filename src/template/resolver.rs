//! Template resolution against event records.

use serde_json::Value;

use crate::metrics::TemplateMetrics;
use crate::registry::DeviceRegistry;

use super::lexer::{tokenize, Placeholder, Token};
use super::tag::apply_tag;
use super::types::{RenderMode, RenderOutput, Segment};

/// Truthiness used while walking a path: null, false, zero and empty
/// strings end the walk.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn child<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        // Arrays and objects use their JSON representation
        _ => value.to_string(),
    }
}

/// Resolve a dotted path inside an event. Any absent or falsy level yields
/// an empty string.
pub fn lookup_path(event: &Value, path: &str) -> String {
    let mut current = event;
    for level in path.split('.') {
        match child(current, level) {
            Some(next) if is_truthy(next) => current = next,
            _ => return String::new(),
        }
    }
    stringify(current)
}

fn resolve_placeholder(
    registry: &dyn DeviceRegistry,
    placeholder: &Placeholder<'_>,
    event: &Value,
    mode: RenderMode,
) -> Segment {
    let value = lookup_path(event, placeholder.path);
    if value.is_empty() {
        TemplateMetrics::record_miss();
        tracing::debug!(path = %placeholder.path, "Template path did not resolve");
    }

    match placeholder.tag {
        Some(tag) => apply_tag(registry, tag, &value, mode),
        None => Segment::text(value),
    }
}

fn is_empty_text(segment: &Segment) -> bool {
    matches!(segment, Segment::Text { text } if text.is_empty())
}

/// Render `template` against `event`.
///
/// Without an event, or for an empty template, the template comes back
/// unchanged in the requested representation. In element mode an empty
/// template is zero segments, since empty text never becomes a segment.
/// Malformed placeholders stay literal, escaped (`__`) placeholders render
/// as nothing, and unresolved paths render as empty strings.
pub fn resolve_template(
    registry: &dyn DeviceRegistry,
    template: &str,
    event: Option<&Value>,
    mode: RenderMode,
) -> RenderOutput {
    TemplateMetrics::record_render(mode);

    let Some(event) = event.filter(|_| !template.is_empty()) else {
        return match mode {
            RenderMode::Text => RenderOutput::Text(template.to_string()),
            RenderMode::Elements if template.is_empty() => RenderOutput::Elements(Vec::new()),
            RenderMode::Elements => RenderOutput::Elements(vec![Segment::text(template)]),
        };
    };

    let mut segments = Vec::new();
    for token in tokenize(template) {
        match token {
            Token::Literal(text) => segments.push(Segment::text(text)),
            Token::Placeholder(placeholder) if placeholder.is_escaped() => {}
            Token::Placeholder(placeholder) => {
                segments.push(resolve_placeholder(registry, &placeholder, event, mode));
            }
        }
    }

    match mode {
        RenderMode::Text => RenderOutput::Text(segments.iter().map(|s| s.to_string()).collect()),
        RenderMode::Elements => {
            segments.retain(|segment| !is_empty_text(segment));
            RenderOutput::Elements(segments)
        }
    }
}

/// Render to a single string.
pub fn render_text(registry: &dyn DeviceRegistry, template: &str, event: &Value) -> String {
    resolve_template(registry, template, Some(event), RenderMode::Text).to_string()
}

/// Render to ordered segments.
pub fn render_elements(registry: &dyn DeviceRegistry, template: &str, event: &Value) -> Vec<Segment> {
    match resolve_template(registry, template, Some(event), RenderMode::Elements) {
        RenderOutput::Elements(segments) => segments,
        RenderOutput::Text(text) => vec![Segment::text(text)],
    }
}
