//! Modal manager: the single-active-dialog state machine.
//!
//! The manager is responsible for:
//! - Keeping at most one dialog visible
//! - Sequencing open and close transitions around their delays
//! - Resolving each dialog's configuration when it opens
//! - Attaching and detaching the listeners scoped to the open dialog
//! - Driving the scroll and focus collaborators

use super::listeners::Listeners;
use super::router;
use super::scheduler::{Scheduler, TaskId};
use super::types::*;
use crate::collaborators::{FocusLock, ScrollLock};
use crate::config::{ResolvedConfig, Settings};
use crate::dom::{Document, DomEvent, NodeId};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Delayed work owned by the manager
#[derive(Debug, Clone, PartialEq, Eq)]
enum Task {
    /// Make a dialog visible once its open delay elapsed
    Activate(DialogId),
    /// Give page scrolling back after a dialog closed
    EnableScrolling(DialogId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Opening(TaskId),
    Open,
}

/// The dialog that is open or about to open, with the configuration it was
/// opened with
#[derive(Debug, Clone)]
struct CurrentDialog {
    id: DialogId,
    node: NodeId,
    config: ResolvedConfig,
    phase: Phase,
}

/// Orchestrates dialog visibility over a document
pub struct ModalManager<D, S, F> {
    document: D,
    settings: Settings,
    scroll: S,
    focus: F,

    /// Routers currently listening
    listeners: Listeners,

    /// Pending activations and scroll restores
    scheduler: Scheduler<Task>,

    /// Open or opening dialog
    current: Option<CurrentDialog>,

    /// Last dialog a trigger asked for, the default target of `open(None)`
    last_requested: Option<DialogId>,

    /// Lifecycle notifications
    event_sender: Option<mpsc::UnboundedSender<ModalEvent>>,
}

impl<D, S, F> ModalManager<D, S, F>
where
    D: Document,
    S: ScrollLock,
    F: FocusLock,
{
    /// Create a manager over `document`
    pub fn new(document: D, settings: Settings, scroll: S, focus: F) -> Self {
        let listeners = Listeners::new(document.has_triggers());

        Self {
            document,
            settings,
            scroll,
            focus,
            listeners,
            scheduler: Scheduler::new(),
            current: None,
            last_requested: None,
            event_sender: None,
        }
    }

    /// Set the sender for lifecycle notifications
    pub fn set_event_sender(&mut self, sender: mpsc::UnboundedSender<ModalEvent>) {
        self.event_sender = Some(sender);
    }

    /// Open a dialog, or the last dialog a trigger requested when `name` is `None`.
    ///
    /// Does nothing when the dialog does not exist or is already visible. Any
    /// visible dialog is closed first without giving scrolling back, and any
    /// pending activation is cancelled.
    pub fn open(&mut self, name: Option<&DialogId>) {
        let Some(id) = name.cloned().or_else(|| self.last_requested.clone()) else {
            debug!("Open ignored: no dialog requested");
            return;
        };
        let Some(node) = self.document.find_dialog(&id) else {
            debug!(dialog = %id, "Open ignored: no such dialog");
            return;
        };
        if self.document.has_class(node, ACTIVE_CLASS) {
            debug!(dialog = %id, "Open ignored: already open");
            return;
        }

        let visible = match self.current.as_ref() {
            Some(current) => Some((current.id.clone(), current.phase)),
            None => self.untracked_active().map(|open_id| (open_id, Phase::Open)),
        };
        match visible {
            Some((open_id, Phase::Open)) => {
                if self.active_config().lock_focus {
                    self.focus.unlock(&open_id.selector());
                }
                debug!(from = %open_id, to = %id, "Switching dialogs");
                self.close(Some(&open_id), Some(false));
            }
            Some((pending_id, Phase::Opening(task))) => {
                self.cancel_opening(&pending_id, task);
            }
            None => {}
        }

        let config = self
            .settings
            .resolve(id.as_str())
            .unwrap_or_else(|| self.active_config().clone());
        let delay = config.open_timeout;
        let task = self.scheduler.schedule(delay, Task::Activate(id.clone()));

        let delay_ms = delay.as_millis() as u64;
        debug!(dialog = %id, delay_ms, "Open scheduled");
        self.current = Some(CurrentDialog {
            id: id.clone(),
            node,
            config,
            phase: Phase::Opening(task),
        });
        self.emit(id, ModalEventKind::OpenRequested { delay });
    }

    /// Close a dialog, or the current one when `name` is `None`.
    ///
    /// `enable_scrolling` defaults to the current configuration's flag. Closing
    /// a dialog whose activation is still pending cancels the activation.
    pub fn close(&mut self, name: Option<&DialogId>, enable_scrolling: Option<bool>) {
        let Some(id) = name
            .cloned()
            .or_else(|| self.current.as_ref().map(|current| current.id.clone()))
        else {
            debug!("Close ignored: no dialog tracked");
            return;
        };
        let Some(node) = self.document.find_dialog(&id) else {
            debug!(dialog = %id, "Close ignored: no such dialog");
            return;
        };

        if !self.document.has_class(node, ACTIVE_CLASS) {
            let pending = match &self.current {
                Some(current) if current.id == id => match current.phase {
                    Phase::Opening(task) => Some(task),
                    Phase::Open => None,
                },
                _ => None,
            };
            match pending {
                Some(task) => self.cancel_opening(&id, task),
                None => debug!(dialog = %id, "Close ignored: not open"),
            }
            return;
        }

        let config = self.active_config().clone();
        let enable_scrolling = enable_scrolling.unwrap_or(config.enable_scrolling);

        self.document.remove_class(node, ACTIVE_CLASS);
        self.listeners.detach(&id);

        if config.stop_play {
            let paused = self.document.pause_media(node);
            if paused > 0 {
                debug!(dialog = %id, paused, "Media paused");
            }
        }

        if config.lock_focus {
            self.focus.unlock(&id.selector());
        }

        if enable_scrolling {
            self.scheduler.schedule(
                config.enable_scroll_timeout,
                Task::EnableScrolling(id.clone()),
            );
        }

        if let Some(callback) = &config.close_callback {
            callback();
        }

        self.current = None;
        info!(dialog = %id, "Dialog closed");
        self.emit(
            id,
            ModalEventKind::Closed {
                restore_scrolling: enable_scrolling,
            },
        );
    }

    /// Route a raw document event and dispatch the intents it produced
    pub fn handle_event(&mut self, event: &DomEvent) -> Dispatch {
        let dispatch = router::route(event, &self.document, &self.listeners);

        for intent in &dispatch.intents {
            match intent.kind {
                IntentKind::Open if intent.target.as_str().is_empty() => {
                    self.last_requested = None;
                }
                IntentKind::Open => {
                    self.last_requested = Some(intent.target.clone());
                    self.open(Some(&intent.target));
                }
                IntentKind::Close => self.close(Some(&intent.target), None),
            }
        }

        dispatch
    }

    /// Move virtual time forward by `by`, running every task that falls due
    pub fn advance(&mut self, by: Duration) {
        let until = self.scheduler.now().saturating_add(by);
        self.advance_to(until);
    }

    /// Move virtual time to `until`, running every task due at or before it
    pub fn advance_to(&mut self, until: Duration) {
        while let Some((task_id, task)) = self.scheduler.pop_due(until) {
            match task {
                Task::Activate(id) => self.activate(&id, task_id),
                Task::EnableScrolling(id) => {
                    debug!(dialog = %id, "Restoring page scrolling");
                    self.scroll.enable_scrolling();
                }
            }
        }
        self.scheduler.set_now(until);
    }

    /// Run every pending task, however far in the future
    pub fn settle(&mut self) {
        while let Some(deadline) = self.scheduler.next_deadline() {
            self.advance_to(deadline);
        }
    }

    /// Deadline of the next pending task
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Whether any delayed work is outstanding
    pub fn has_pending(&self) -> bool {
        !self.scheduler.is_empty()
    }

    /// The visible dialog
    pub fn active_dialog(&self) -> Option<&DialogId> {
        self.current
            .as_ref()
            .filter(|current| current.phase == Phase::Open)
            .map(|current| &current.id)
    }

    pub fn is_open(&self, dialog: &DialogId) -> bool {
        self.state_of(dialog) == DialogState::Open
    }

    pub fn state_of(&self, dialog: &DialogId) -> DialogState {
        match &self.current {
            Some(current) if current.id == *dialog => match current.phase {
                Phase::Opening(_) => DialogState::Opening,
                Phase::Open => DialogState::Open,
            },
            _ => DialogState::Closed,
        }
    }

    /// Configuration governing the current dialog, or the defaults
    pub fn active_config(&self) -> &ResolvedConfig {
        self.current
            .as_ref()
            .map(|current| &current.config)
            .unwrap_or_else(|| self.settings.defaults())
    }

    pub fn last_requested(&self) -> Option<&DialogId> {
        self.last_requested.as_ref()
    }

    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    pub fn scroll(&self) -> &S {
        &self.scroll
    }

    pub fn focus(&self) -> &F {
        &self.focus
    }

    /// Delayed half of `open`
    fn activate(&mut self, id: &DialogId, task: TaskId) {
        let Some(current) = self.current.as_mut() else {
            debug!(dialog = %id, "Stale activation dropped");
            return;
        };
        if current.id != *id || current.phase != Phase::Opening(task) {
            debug!(dialog = %id, "Stale activation dropped");
            return;
        }

        current.phase = Phase::Open;
        let node = current.node;
        let config = current.config.clone();

        self.document.add_class(node, ACTIVE_CLASS);
        self.listeners.attach(id);

        if let Some(callback) = &config.open_callback {
            callback();
        }

        if config.disable_scrolling {
            let dropped = self
                .scheduler
                .cancel_where(|task| matches!(task, Task::EnableScrolling(_)));
            if dropped > 0 {
                debug!(dialog = %id, dropped, "Pending scroll restore cancelled");
            }
            self.scroll.disable_scrolling();
        }

        if config.lock_focus {
            self.focus.lock(&id.selector());
        }

        info!(dialog = %id, "Dialog opened");
        self.emit(id.clone(), ModalEventKind::Opened);
    }

    /// Dialog the markup shipped already active, outside any tracked open
    fn untracked_active(&self) -> Option<DialogId> {
        let node = self.document.find_by_class(ACTIVE_CLASS)?;
        self.document.attr(node, DIALOG_ATTR).map(DialogId::from)
    }

    fn cancel_opening(&mut self, id: &DialogId, task: TaskId) {
        self.scheduler.cancel(task);
        self.current = None;
        debug!(dialog = %id, "Pending open cancelled");
        self.emit(id.clone(), ModalEventKind::OpenCancelled);
    }

    /// Send a notification if an event sender is configured
    fn emit(&self, dialog: DialogId, kind: ModalEventKind) {
        if let Some(sender) = &self.event_sender {
            let _ = sender.send(ModalEvent {
                at: self.scheduler.now(),
                dialog,
                kind,
            });
        }
    }
}
