//! Control descriptors attached to `Message` envelopes.
//!
//! A message may offer the user a set of controls: plain buttons, and groups
//! that open a menu of further controls. Groups may nest to any depth here;
//! renderers impose their own limit.
//!
//! ```json
//! [{"type": "button", "label": "Red Cross", "value": "red-cross"},
//!  {"type": "group", "label": "More", "controls": [...]}]
//! ```

use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::error::DecodeError;

pub const WEBVIEW_ACTION_PREFIX: &str = "Webview::";

const CONTROLS_KEY: &str = "controls";

/// Payload a button sends back as a `Command` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ControlValue {
    Text(String),
    Number(Number),
}

impl ControlValue {
    /// `null`, booleans, arrays and objects carry no usable value.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Number(n) => Some(Self::Number(n.clone())),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }
}

impl From<&str> for ControlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ControlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ControlValue {
    fn from(value: i64) -> Self {
        Self::Number(Number::from(value))
    }
}

/// Local effects a button can request instead of sending a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalEffectKind {
    /// Open the argument URL in an in-app web view.
    Webview,
}

impl LocalEffectKind {
    pub const ALL: [Self; 1] = [Self::Webview];

    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Webview => WEBVIEW_ACTION_PREFIX,
        }
    }
}

/// A recognised local action. The argument is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEffect {
    kind: LocalEffectKind,
    argument: String,
}

impl LocalEffect {
    /// `None` when `argument` is empty: `Webview::` alone names nothing.
    pub fn new(kind: LocalEffectKind, argument: impl Into<String>) -> Option<Self> {
        let argument = argument.into();
        (!argument.is_empty()).then_some(Self { kind, argument })
    }

    pub fn kind(&self) -> LocalEffectKind {
        self.kind
    }

    pub fn argument(&self) -> &str {
        &self.argument
    }
}

/// An `action` string with no recognised local prefix, kept verbatim.
///
/// Only [`ButtonAction::parse`] builds one, so it never holds text that
/// would parse as a [`LocalEffect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrecognizedAction(String);

impl UnrecognizedAction {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A button's `action` string, classified once at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    Local(LocalEffect),
    Unrecognized(UnrecognizedAction),
}

impl ButtonAction {
    pub fn parse(raw: &str) -> Self {
        for kind in LocalEffectKind::ALL {
            let effect = raw
                .strip_prefix(kind.prefix())
                .and_then(|argument| LocalEffect::new(kind, argument));
            if let Some(effect) = effect {
                return Self::Local(effect);
            }
        }
        Self::Unrecognized(UnrecognizedAction(raw.to_string()))
    }

    pub fn to_wire(&self) -> String {
        match self {
            Self::Local(effect) => format!("{}{}", effect.kind.prefix(), effect.argument),
            Self::Unrecognized(raw) => raw.0.clone(),
        }
    }
}

impl From<LocalEffect> for ButtonAction {
    fn from(effect: LocalEffect) -> Self {
        Self::Local(effect)
    }
}

impl Serialize for ButtonAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire())
    }
}

/// What pressing a button means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonEffect {
    Local(LocalEffect),
    Command(ControlValue),
    Inert,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Arc<ControlValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Arc<ButtonAction>>,
}

impl Button {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: None,
            action: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<ControlValue>) -> Self {
        self.value = Some(Arc::new(value.into()));
        self
    }

    pub fn with_action(mut self, action: &str) -> Self {
        self.action = Some(Arc::new(ButtonAction::parse(action)));
        self
    }

    /// A recognised local action wins over a value; an unrecognised action
    /// falls through to the value. An empty text value sends nothing.
    pub fn effect(&self) -> ButtonEffect {
        if let Some(ButtonAction::Local(effect)) = self.action.as_deref() {
            return ButtonEffect::Local(effect.clone());
        }
        match self.value.as_deref() {
            Some(value) if !value.is_empty() => ButtonEffect::Command(value.clone()),
            _ => ButtonEffect::Inert,
        }
    }

    /// Identity comparison: labels must match and `value`/`action` must be
    /// the very same shared payloads (or both absent). Two buttons parsed
    /// separately from identical JSON are equal under `==` but not identical.
    pub fn is_identical(&self, other: &Self) -> bool {
        fn same<T>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
            match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                _ => false,
            }
        }
        self.label == other.label
            && same(&self.value, &other.value)
            && same(&self.action, &other.action)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlGroup {
    pub label: String,
    #[serde(rename = "controls")]
    pub subcontrols: Vec<Control>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Control {
    Button(Button),
    Group(ControlGroup),
}

impl Control {
    pub fn label(&self) -> &str {
        match self {
            Self::Button(button) => &button.label,
            Self::Group(group) => &group.label,
        }
    }

    /// Parse a `controls` array. Unknown `type` values fall back to a button.
    pub fn parse_list(value: &Value) -> Result<Vec<Self>, DecodeError> {
        let items = value
            .as_array()
            .ok_or_else(|| DecodeError::wrong_type(CONTROLS_KEY, "an array"))?;
        items
            .iter()
            .map(|item| {
                let object = item
                    .as_object()
                    .ok_or_else(|| DecodeError::wrong_type(CONTROLS_KEY, "an array of objects"))?;
                Self::parse(object)
            })
            .collect()
    }

    fn parse(object: &Map<String, Value>) -> Result<Self, DecodeError> {
        let label = object
            .get("label")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        if object.get("type").and_then(Value::as_str) == Some("group") {
            let subcontrols = match object.get(CONTROLS_KEY) {
                Some(Value::Null) | None => Vec::new(),
                Some(list) => Self::parse_list(list)?,
            };
            return Ok(Self::Group(ControlGroup { label, subcontrols }));
        }

        let value = object
            .get("value")
            .and_then(ControlValue::from_json)
            .map(Arc::new);
        let action = object
            .get("action")
            .and_then(Value::as_str)
            .map(|raw| Arc::new(ButtonAction::parse(raw)));
        Ok(Self::Button(Button {
            label,
            value,
            action,
        }))
    }
}
