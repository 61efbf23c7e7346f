//! Card, parameter and flow instance types

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FlowError, Result};
use crate::policy::RuleFamily;

use super::schedule::parse_time;

/// Whether a card starts a flow or acts on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Trigger,
    Action,
}

impl CardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardType::Trigger => "trigger",
            CardType::Action => "action",
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    List,
}

/// Validation pattern attached to a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParamFormat {
    /// `HH:MM`, 24-hour clock
    TimeOfDay,
}

impl ParamFormat {
    pub fn check(&self, value: &str) -> bool {
        match self {
            ParamFormat::TimeOfDay => parse_time(value).is_some(),
        }
    }
}

/// One field of a card's parameter schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ParamFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
}

impl ParamSpec {
    pub fn string(name: &'static str) -> Self {
        Self {
            name,
            param_type: ParamType::String,
            format: None,
            description: None,
            hidden: false,
        }
    }

    pub fn list(name: &'static str) -> Self {
        Self {
            name,
            param_type: ParamType::List,
            format: None,
            description: None,
            hidden: false,
        }
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    pub fn format(mut self, format: ParamFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Check a value against the declared type and format.
    ///
    /// List parameters also accept a comma-separated string.
    pub fn validate(&self, value: &Value) -> Result<()> {
        let type_ok = match self.param_type {
            ParamType::String => value.is_string(),
            ParamType::List => value.is_array() || value.is_string(),
        };
        if !type_ok {
            return Err(FlowError::Validation(format!(
                "{} must be a {}",
                self.name,
                match self.param_type {
                    ParamType::String => "string",
                    ParamType::List => "list",
                }
            )));
        }

        if let (Some(format), Some(text)) = (self.format, value.as_str()) {
            if !format.check(text) {
                return Err(FlowError::Validation(format!(
                    "{} has invalid format '{}', expected HH:MM",
                    self.name, text
                )));
            }
        }

        Ok(())
    }
}

/// A selectable choice for a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamOption {
    pub label: String,
    pub value: String,
}

impl ParamOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// Option whose label and value are the same string.
    pub fn same(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

/// Where the choices for a parameter come from.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionSource {
    /// Free-text entry
    None,
    /// Fixed list known without I/O
    Static(Vec<ParamOption>),
    /// Device groups from the registry
    Groups,
    /// Device tags from the registry
    Tags,
    /// One `siteN` entry per configured site VPN
    SiteVpns,
}

/// Behaviour shared by the cards of one kind. Dispatch happens on this tag,
/// so each capability (options, pre-submit, submit) is a plain match arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    Always,
    Schedule,
    IncomingRequest,
    Block,
    Forward,
    SiteVpnForward,
    SetGroups,
    SetTags,
}

impl CardKind {
    /// Backend family the card submits to; triggers have none.
    pub fn family(&self) -> Option<RuleFamily> {
        match self {
            CardKind::Always | CardKind::Schedule | CardKind::IncomingRequest => None,
            CardKind::Block => Some(RuleFamily::Block),
            CardKind::Forward | CardKind::SiteVpnForward => Some(RuleFamily::Forward),
            CardKind::SetGroups => Some(RuleFamily::Groups),
            CardKind::SetTags => Some(RuleFamily::Tags),
        }
    }

    /// Whether a failed client resolution still lets the rule through.
    pub fn tolerates_client_failure(&self) -> bool {
        matches!(self, CardKind::SetTags)
    }
}

/// A trigger or action available for building flows.
#[derive(Debug, Clone, Serialize)]
pub struct Card {
    pub title: &'static str,
    #[serde(rename = "cardType")]
    pub card_type: CardType,
    pub description: &'static str,
    /// Display color hint
    pub color: &'static str,
    pub icon: &'static str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    pub params: Vec<ParamSpec>,
    #[serde(rename = "values")]
    pub default_values: Map<String, Value>,
    #[serde(skip)]
    pub kind: CardKind,
}

impl Card {
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Parameters a user fills in.
    pub fn visible_params(&self) -> impl Iterator<Item = &ParamSpec> {
        self.params.iter().filter(|p| !p.hidden)
    }

    /// A new instance of this card carrying its default values.
    pub fn instantiate(&self) -> FlowInstance {
        FlowInstance {
            card_type: self.card_type,
            title: self.title.to_string(),
            values: self.default_values.clone(),
            index: None,
        }
    }

    /// Defaults overlaid with the instance's values. Neither side is modified.
    pub fn effective_values(&self, instance: &FlowInstance) -> Map<String, Value> {
        let mut values = self.default_values.clone();
        for (key, value) in &instance.values {
            values.insert(key.clone(), value.clone());
        }
        values
    }
}

/// A card bound to concrete values, optionally addressing a stored rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowInstance {
    #[serde(rename = "cardType")]
    pub card_type: CardType,
    pub title: String,
    #[serde(default)]
    pub values: Map<String, Value>,
    /// Present when editing an existing rule; selects update over create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl FlowInstance {
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }
}

/// A trigger and an action saved together as one named rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub title: String,
    #[serde(default)]
    pub disabled: bool,
    pub trigger: FlowInstance,
    pub action: FlowInstance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}
