//! Slack attachment records as sent to `chat.postMessage` / `chat.update`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sidebar color of an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Color {
    /// Green, used for finished tasks.
    Good,
    /// Yellow, used while a task is running.
    #[default]
    Warning,
    /// Red, used for failed tasks.
    Danger,
    /// Any other value, usually a `#rrggbb` hex string.
    Custom(String),
}

impl Color {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Danger => "danger",
            Self::Custom(s) => s.as_str(),
        }
    }
}

impl From<String> for Color {
    fn from(s: String) -> Self {
        match s.as_str() {
            "good" => Self::Good,
            "warning" => Self::Warning,
            "danger" => Self::Danger,
            _ => Self::Custom(s),
        }
    }
}

impl From<&str> for Color {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        match color {
            Color::Custom(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cell of an attachment's field table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Render side by side with neighbouring short fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<bool>,
}

impl Field {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_short(mut self, short: bool) -> Self {
        self.short = Some(short);
        self
    }
}

/// Legacy interactive message button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub text: String,
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Action {
    /// A `button` action posting `value` back to the app's callback.
    pub fn button(name: impl Into<String>, text: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            action_type: "button".to_string(),
            value: Some(value.into()),
            style: None,
            url: None,
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }
}

/// A single attachment of a chat message.
///
/// The primary attachment of a [`Message`](crate::Message) uses the typed
/// fields; supplementary attachments may additionally carry arbitrary keys
/// through `extra`, which is flattened into the JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<Action>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Attachment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_color(mut self, color: impl Into<Color>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set an arbitrary Slack attachment key (e.g. `footer`, `ts`, `mrkdwn_in`).
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}
