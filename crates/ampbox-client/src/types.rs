//! Wire types for the Ampbox session service.

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Bundle used when the caller does not pick one.
pub const DEFAULT_BUNDLE: &str = "foundation:default";

/// A remote sandbox session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub bundle: String,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle status reported by the service.
///
/// Statuses this client does not know about are kept verbatim in
/// [`SessionStatus::Unknown`] so they can still be displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SessionStatus {
    Pending,
    Starting,
    Running,
    Paused,
    Completed,
    Failed,
    Unknown(String),
}

impl SessionStatus {
    /// Wire representation of the status.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Unknown(s) => s,
        }
    }
}

impl From<String> for SessionStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => Self::Pending,
            "starting" => Self::Starting,
            "running" => Self::Running,
            "paused" => Self::Paused,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Unknown(s),
        }
    }
}

impl From<SessionStatus> for String {
    fn from(status: SessionStatus) -> Self {
        match status {
            SessionStatus::Unknown(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a create-session request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    /// Initial prompt for the session.
    pub prompt: String,
    /// Bundle to run the session with.
    pub bundle: String,
    /// Local path of the codebase the session operates on.
    pub codebase_path: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SessionList {
    #[serde(default)]
    pub sessions: Vec<Session>,
}

/// A single event emitted by a running session.
///
/// The payload is kept as loose JSON: the service adds fields over time and
/// the CLI only reads a handful of them. Use [`SessionEvent::kind`] for a
/// typed view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub data: Value,
}

/// Typed view over the event types the CLI renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind<'a> {
    /// `session:ready`
    Ready,
    /// `prompt:submit`
    PromptSubmit { prompt: Cow<'a, str> },
    /// `content:block:text`
    Text { text: Cow<'a, str> },
    /// `tool:call`
    ToolCall { tool_name: Cow<'a, str> },
    /// `tool:result`
    ToolResult {
        tool_name: Cow<'a, str>,
        success: bool,
        error: Cow<'a, str>,
    },
    /// `session:completed`
    Completed,
    /// `session:failed`
    Failed { error: Cow<'a, str> },
    /// Anything else.
    Other(&'a str),
}

impl EventKind<'_> {
    /// Whether the session has ended and the stream should stop.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed { .. })
    }
}

impl SessionEvent {
    pub fn new(event_type: impl Into<String>, data: Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
        }
    }

    /// Interpret the event, filling in defaults for missing fields.
    pub fn kind(&self) -> EventKind<'_> {
        match self.event_type.as_str() {
            "session:ready" => EventKind::Ready,
            "prompt:submit" => EventKind::PromptSubmit {
                prompt: self.field("prompt", ""),
            },
            "content:block:text" => EventKind::Text {
                text: self.field("text", ""),
            },
            "tool:call" => EventKind::ToolCall {
                tool_name: self.field("tool_name", "unknown"),
            },
            "tool:result" => EventKind::ToolResult {
                tool_name: self.field("tool_name", "unknown"),
                success: self
                    .data
                    .get("success")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                error: self.field("error", "Unknown error"),
            },
            "session:completed" => EventKind::Completed,
            "session:failed" => EventKind::Failed {
                error: self.field("error", "Unknown error"),
            },
            other => EventKind::Other(other),
        }
    }

    /// Read a data field as text. Non-string values are rendered as JSON.
    fn field<'a>(&'a self, key: &str, default: &'a str) -> Cow<'a, str> {
        match self.data.get(key) {
            Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
            None | Some(Value::Null) => Cow::Borrowed(default),
            Some(other) => Cow::Owned(other.to_string()),
        }
    }
}
