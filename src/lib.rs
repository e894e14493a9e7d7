//! Single-active modal dialog orchestration.
//!
//! A [`ModalManager`] keeps at most one markup-declared dialog visible,
//! sequences open and close transitions around configurable delays, and
//! coordinates page scroll suppression and focus containment with dialog
//! visibility.

pub mod collaborators;
pub mod config;
pub mod dom;
pub mod modal;
pub mod runtime;

pub use collaborators::{FocusLock, FocusTrap, PageScroll, ScrollLock};
pub use config::{Bucket, ConfigError, ResolvedConfig, Settings};
pub use dom::{Document, DomEvent, MarkupDocument, NodeId};
pub use modal::{DialogId, ModalEvent, ModalManager};
pub use runtime::{Command, ModalRuntime};
