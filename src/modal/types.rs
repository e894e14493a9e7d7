//! Core modal types
//!
//! Identifiers, routing intents and lifecycle notifications shared by the
//! router, the listener registry and the transition sequencer.

use serde::{Deserialize, Serialize, Serializer};
use std::time::Duration;

/// Class marking the single visible dialog.
pub const ACTIVE_CLASS: &str = "modal--active";

/// Attribute declaring a dialog container and its name.
pub const DIALOG_ATTR: &str = "data-modal";

/// Attribute declaring a trigger and the dialog it opens.
pub const OPEN_ATTR: &str = "data-open-modal";

/// Attribute declaring a close trigger inside a dialog.
pub const CLOSE_ATTR: &str = "data-close-modal";

/// Tags paused when a dialog closes with `stopPlay` set.
pub const MEDIA_TAGS: [&str; 2] = ["video", "audio"];

/// Name of a markup-declared dialog
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DialogId(pub String);

impl DialogId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Selector handed to the focus collaborator for this dialog.
    pub fn selector(&self) -> String {
        format!("[{}=\"{}\"]", DIALOG_ATTR, self.0)
    }
}

impl From<&str> for DialogId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DialogId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for DialogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a routed interaction asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    Open,
    Close,
}

/// A raw document event decoded into a typed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    pub kind: IntentKind,
    pub target: DialogId,
}

impl Intent {
    pub fn open(target: impl Into<DialogId>) -> Self {
        Self {
            kind: IntentKind::Open,
            target: target.into(),
        }
    }

    pub fn close(target: impl Into<DialogId>) -> Self {
        Self {
            kind: IntentKind::Close,
            target: target.into(),
        }
    }
}

/// Outcome of feeding one document event through the routers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatch {
    /// Whether any router suppressed the event's default action
    pub default_prevented: bool,
    /// Intents decoded from the event, in bubbling order
    pub intents: Vec<Intent>,
}

/// Tracked lifecycle phase of a dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    /// Not visible and nothing scheduled
    Closed,
    /// Activation is scheduled but has not fired yet
    Opening,
    /// Visible, listeners attached
    Open,
}

/// Lifecycle notification emitted by the manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModalEvent {
    /// Virtual time at which the change happened
    #[serde(rename = "at_ms", serialize_with = "serialize_millis")]
    pub at: Duration,
    pub dialog: DialogId,
    #[serde(flatten)]
    pub kind: ModalEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModalEventKind {
    /// Activation scheduled
    OpenRequested {
        #[serde(rename = "delay_ms", serialize_with = "serialize_millis")]
        delay: Duration,
    },
    /// A pending activation was dropped before it fired
    OpenCancelled,
    /// Dialog became visible
    Opened,
    /// Dialog was hidden
    Closed {
        /// Whether a scroll re-enable was scheduled
        restore_scrolling: bool,
    },
}

fn serialize_millis<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialog_selector() {
        let id = DialogId::new("contact");
        assert_eq!(id.selector(), "[data-modal=\"contact\"]");
        assert_eq!(id.to_string(), "contact");
    }

    #[test]
    fn test_event_serialization() {
        let event = ModalEvent {
            at: Duration::from_millis(300),
            dialog: DialogId::from("contact"),
            kind: ModalEventKind::OpenRequested {
                delay: Duration::from_millis(300),
            },
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["at_ms"], 300);
        assert_eq!(value["dialog"], "contact");
        assert_eq!(value["type"], "open_requested");
        assert_eq!(value["delay_ms"], 300);
    }
}
