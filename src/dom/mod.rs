//! Document primitives the modal engine drives.
//!
//! The engine never owns markup. It asks a [`Document`] to find dialogs,
//! toggle classes, walk ancestors and pause media, and it receives raw
//! [`DomEvent`]s from the host.

pub mod markup;

pub use markup::MarkupDocument;

use crate::modal::DialogId;

/// Handle to an element inside a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Raw document-level input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomEvent {
    /// Click on an element (bubbles to its ancestors and the document)
    Click { target: NodeId },
    /// Key pressed with the document focused; `key` is the DOM key name
    KeyDown { key: String },
}

impl DomEvent {
    pub fn click(target: NodeId) -> Self {
        Self::Click { target }
    }

    pub fn key(key: impl Into<String>) -> Self {
        Self::KeyDown { key: key.into() }
    }
}

/// Markup loading errors
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    #[error("Dialog '{0}' is declared more than once")]
    DuplicateDialog(DialogId),

    #[error("Failed to read markup: {0}")]
    Io(#[from] std::io::Error),
}

/// Query and mutation primitives over a document tree
pub trait Document {
    /// Whether any element declares a trigger
    fn has_triggers(&self) -> bool;

    /// Dialog container declared with the given name
    fn find_dialog(&self, dialog: &DialogId) -> Option<NodeId>;

    /// First element carrying `class`, in document order
    fn find_by_class(&self, class: &str) -> Option<NodeId>;

    fn attr(&self, node: NodeId, name: &str) -> Option<&str>;

    fn has_class(&self, node: NodeId, class: &str) -> bool;

    fn add_class(&mut self, node: NodeId, class: &str);

    fn remove_class(&mut self, node: NodeId, class: &str);

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Pause every media element below `root`, returning how many were playing
    fn pause_media(&mut self, root: NodeId) -> usize;

    /// `node` or its nearest ancestor carrying `attr`, with the attribute value
    fn closest_with_attr(&self, node: NodeId, attr: &str) -> Option<(NodeId, String)> {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if let Some(value) = self.attr(current, attr) {
                return Some((current, value.to_string()));
            }
            cursor = self.parent(current);
        }
        None
    }

    /// Whether `node` is `ancestor` or lies below it
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }
}
