//! Event message templates.
//!
//! This module provides:
//! - A lexer for `{{path.to.field#Tag}}` placeholders
//! - Dotted-path resolution against an event record (`serde_json::Value`)
//! - Tag transforms that turn MACs and IPs into device references
//!
//! # Example
//!
//! ```ignore
//! let registry = MemoryDeviceRegistry::new();
//! registry.insert_device(DeviceReference::new("aa:bb:cc:dd:ee:ff", "Laptop", "192.168.1.5"));
//!
//! let event = json!({ "Device": "aa:bb:cc:dd:ee:ff", "SrcIP": "192.168.1.5" });
//! let text = render_text(
//!     &registry,
//!     "Device {{Device#Device}} connected from {{SrcIP#DeviceIP}}",
//!     &event,
//! );
//! assert_eq!(text, "Device Laptop connected from 192.168.1.5");
//! ```

mod lexer;
mod resolver;
mod tag;
mod types;

pub use lexer::{tokenize, Placeholder, Token};
pub use resolver::{lookup_path, render_elements, render_text, resolve_template};
pub use tag::{apply_tag, tag_segment, tag_text};
pub use types::{DeviceField, DeviceView, RenderMode, RenderOutput, Segment};
