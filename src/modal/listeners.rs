//! Listener registry scoped to the open dialog.
//!
//! The document click router lives for the whole session (when the document
//! has triggers). The dialog click router and the Escape keydown router exist
//! only while a dialog is open; they are attached together and detached
//! together.

use super::types::DialogId;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listeners {
    document_click: bool,
    document_keydown: bool,
    dialog_click: Option<DialogId>,
}

impl Listeners {
    /// Registry for a fresh session. The click router is only installed when
    /// something in the document can open a dialog.
    pub fn new(has_triggers: bool) -> Self {
        if !has_triggers {
            debug!("No triggers in document, click router not installed");
        }

        Self {
            document_click: has_triggers,
            document_keydown: false,
            dialog_click: None,
        }
    }

    /// Attach the dialog click router and the keydown router for `dialog`.
    pub fn attach(&mut self, dialog: &DialogId) {
        if let Some(current) = &self.dialog_click {
            warn!(attached = %current, requested = %dialog, "Dialog listeners already attached");
            return;
        }

        self.dialog_click = Some(dialog.clone());
        self.document_keydown = true;
        debug!(dialog = %dialog, "Dialog listeners attached");
    }

    /// Detach the routers attached for `dialog`.
    pub fn detach(&mut self, dialog: &DialogId) {
        match &self.dialog_click {
            Some(current) if current == dialog => {
                self.dialog_click = None;
                self.document_keydown = false;
                debug!(dialog = %dialog, "Dialog listeners detached");
            }
            Some(current) => {
                warn!(attached = %current, requested = %dialog, "Detach for a dialog that does not own the listeners");
            }
            None => {
                warn!(dialog = %dialog, "Detach with no dialog listeners attached");
            }
        }
    }

    pub fn document_click(&self) -> bool {
        self.document_click
    }

    pub fn document_keydown(&self) -> bool {
        self.document_keydown
    }

    /// Dialog whose click router is attached
    pub fn dialog_click(&self) -> Option<&DialogId> {
        self.dialog_click.as_ref()
    }

    /// Number of listeners that exist only while a dialog is open
    pub fn transient_count(&self) -> usize {
        usize::from(self.document_keydown) + usize::from(self.dialog_click.is_some())
    }
}
