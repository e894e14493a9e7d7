//! Decodes raw document events into open/close intents.
//!
//! Routing only reads the document; it never changes state. The manager
//! dispatches the returned intents afterwards.

use super::listeners::Listeners;
use super::types::{Dispatch, Intent, ACTIVE_CLASS, CLOSE_ATTR, DIALOG_ATTR, OPEN_ATTR};
use crate::dom::{Document, DomEvent, NodeId};
use tracing::debug;

/// Route `event` through every attached listener, in bubbling order
pub fn route<D: Document>(event: &DomEvent, document: &D, listeners: &Listeners) -> Dispatch {
    let mut dispatch = Dispatch::default();

    match event {
        DomEvent::Click { target } => {
            if listeners.dialog_click().is_some() {
                route_dialog_click(*target, document, listeners, &mut dispatch);
            }
            if listeners.document_click() {
                route_document_click(*target, document, &mut dispatch);
            }
        }
        DomEvent::KeyDown { key } => {
            if listeners.document_keydown() {
                route_keydown(key, document, &mut dispatch);
            }
        }
    }

    dispatch
}

/// `Escape`, plus the legacy `Esc` some engines still report
pub fn is_escape(key: &str) -> bool {
    key == "Escape" || key == "Esc"
}

fn route_dialog_click<D: Document>(
    target: NodeId,
    document: &D,
    listeners: &Listeners,
    dispatch: &mut Dispatch,
) {
    let Some(node) = listeners
        .dialog_click()
        .and_then(|dialog| document.find_dialog(dialog))
    else {
        return;
    };
    if !document.contains(node, target) {
        return;
    }
    if document.closest_with_attr(target, CLOSE_ATTR).is_none() {
        return;
    }

    if let Some((_, name)) = document.closest_with_attr(target, DIALOG_ATTR) {
        debug!(dialog = %name, "Close trigger clicked");
        dispatch.intents.push(Intent::close(name));
    }
}

fn route_document_click<D: Document>(target: NodeId, document: &D, dispatch: &mut Dispatch) {
    let Some((_, name)) = document.closest_with_attr(target, OPEN_ATTR) else {
        return;
    };

    dispatch.default_prevented = true;
    if name.is_empty() {
        debug!("Trigger clicked without a dialog name");
    } else {
        debug!(dialog = %name, "Open trigger clicked");
    }
    dispatch.intents.push(Intent::open(name));
}

fn route_keydown<D: Document>(key: &str, document: &D, dispatch: &mut Dispatch) {
    if !is_escape(key) {
        return;
    }

    dispatch.default_prevented = true;
    let active = document
        .find_by_class(ACTIVE_CLASS)
        .and_then(|node| document.attr(node, DIALOG_ATTR));

    match active {
        Some(name) => {
            debug!(dialog = %name, "Escape pressed");
            dispatch.intents.push(Intent::close(name));
        }
        None => debug!("Escape pressed with no active dialog"),
    }
}
