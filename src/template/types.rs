//! Rendered output types

use std::fmt;

use serde::Serialize;

use crate::registry::DeviceReference;

/// Output representation requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// One joined string; structured tags degrade to plain text
    #[default]
    Text,
    /// Ordered segments; tags keep their structured views
    Elements,
}

impl RenderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Text => "text",
            RenderMode::Elements => "elements",
        }
    }
}

/// Device attribute a tagged segment asks the renderer to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeviceField {
    Style,
    Name,
    RecentIp,
    Mac,
}

/// Structured view of a device selected by a `#Device*` tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceView {
    /// Value the placeholder resolved to before the lookup
    pub raw: String,
    /// `None` when the registry has no matching device
    pub device: Option<DeviceReference>,
    pub fields: Vec<DeviceField>,
}

impl DeviceView {
    /// Plain-text form: the selected fields of the device, or the raw value
    /// when the device is unknown or every selected field is empty.
    pub fn text(&self) -> String {
        let Some(device) = &self.device else {
            return self.raw.clone();
        };

        let parts: Vec<&str> = self
            .fields
            .iter()
            .map(|field| match field {
                DeviceField::Style => device.style.icon.as_str(),
                DeviceField::Name => device.name.as_str(),
                DeviceField::RecentIp => device.recent_ip.as_str(),
                DeviceField::Mac => device.mac.as_str(),
            })
            .filter(|part| !part.is_empty())
            .collect();

        if parts.is_empty() {
            self.raw.clone()
        } else {
            parts.join(" ")
        }
    }
}

/// One renderable piece of a template. The position of a segment within
/// `RenderOutput::Elements` is its identity; equal segments never collapse.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Segment {
    Text { text: String },
    Interface { name: String },
    Device(DeviceView),
}

impl Segment {
    pub fn text(text: impl Into<String>) -> Self {
        Segment::Text { text: text.into() }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Text { text } => f.write_str(text),
            Segment::Interface { name } => f.write_str(name),
            Segment::Device(view) => f.write_str(&view.text()),
        }
    }
}

/// Result of rendering a template.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RenderOutput {
    Text(String),
    Elements(Vec<Segment>),
}

impl RenderOutput {
    /// The joined text when rendered in text mode.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RenderOutput::Text(text) => Some(text),
            RenderOutput::Elements(_) => None,
        }
    }

    /// The segments when rendered in element mode.
    pub fn segments(&self) -> Option<&[Segment]> {
        match self {
            RenderOutput::Text(_) => None,
            RenderOutput::Elements(segments) => Some(segments),
        }
    }

    /// Segments paired with their position key.
    pub fn keyed(&self) -> impl Iterator<Item = (usize, &Segment)> {
        self.segments().unwrap_or_default().iter().enumerate()
    }
}

impl fmt::Display for RenderOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderOutput::Text(text) => f.write_str(text),
            RenderOutput::Elements(segments) => {
                for segment in segments {
                    write!(f, "{}", segment)?;
                }
                Ok(())
            }
        }
    }
}
