//! Real-time event loop for a modal manager.
//!
//! Commands arrive over an unbounded channel. Between commands the loop
//! sleeps until the manager's next deadline, so delayed transitions fire on
//! the wall clock (or on tokio's paused clock under test).

use crate::collaborators::{FocusLock, ScrollLock};
use crate::dom::{Document, DomEvent};
use crate::modal::{DialogId, ModalManager};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Input accepted by the runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Raw document event routed through the attached listeners
    Dom(DomEvent),
    /// Programmatic open
    Open(Option<DialogId>),
    /// Programmatic close
    Close {
        dialog: Option<DialogId>,
        enable_scrolling: Option<bool>,
    },
}

enum Wake {
    Command(Command),
    Deadline,
    Closed,
}

/// Drives a [`ModalManager`] from a command channel and the clock
pub struct ModalRuntime<D, S, F> {
    manager: ModalManager<D, S, F>,
    receiver: mpsc::UnboundedReceiver<Command>,
    started: Instant,
}

impl<D, S, F> ModalRuntime<D, S, F>
where
    D: Document,
    S: ScrollLock,
    F: FocusLock,
{
    /// Wrap a manager. Virtual time zero is now.
    pub fn new(manager: ModalManager<D, S, F>) -> (Self, mpsc::UnboundedSender<Command>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let runtime = Self {
            manager,
            receiver,
            started: Instant::now(),
        };
        (runtime, sender)
    }

    /// Run until every sender is dropped and all pending transitions fired,
    /// then hand the manager back.
    pub async fn run(mut self) -> ModalManager<D, S, F> {
        loop {
            let deadline = self.next_wakeup();

            let wake = match deadline {
                Some(deadline) => tokio::select! {
                    command = self.receiver.recv() => command.map_or(Wake::Closed, Wake::Command),
                    _ = sleep_until(deadline) => Wake::Deadline,
                },
                None => self
                    .receiver
                    .recv()
                    .await
                    .map_or(Wake::Closed, Wake::Command),
            };

            self.sync_clock();
            match wake {
                Wake::Command(command) => self.apply(command),
                Wake::Deadline => {}
                Wake::Closed => break,
            }
        }

        debug!("Command channel closed, settling pending transitions");
        while let Some(deadline) = self.next_wakeup() {
            sleep_until(deadline).await;
            self.sync_clock();
        }

        self.manager
    }

    /// Wall-clock instant of the next deadline. Deadlines past what the
    /// clock can represent never fire.
    fn next_wakeup(&self) -> Option<Instant> {
        self.manager
            .next_deadline()
            .and_then(|at| self.started.checked_add(at))
    }

    fn sync_clock(&mut self) {
        self.manager.advance_to(self.started.elapsed());
    }

    fn apply(&mut self, command: Command) {
        command.apply(&mut self.manager);
    }
}

impl Command {
    /// Feed this command to a manager at its current virtual time
    pub fn apply<D, S, F>(self, manager: &mut ModalManager<D, S, F>)
    where
        D: Document,
        S: ScrollLock,
        F: FocusLock,
    {
        match self {
            Command::Dom(event) => {
                manager.handle_event(&event);
            }
            Command::Open(dialog) => manager.open(dialog.as_ref()),
            Command::Close {
                dialog,
                enable_scrolling,
            } => manager.close(dialog.as_ref(), enable_scrolling),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{FocusTrap, PageScroll, ScrollChange};
    use crate::config::Settings;
    use crate::dom::MarkupDocument;
    use std::time::Duration;

    const PAGE: &str = r#"
        <a id="open" data-open-modal="contact">Contact</a>
        <div data-modal="contact"><button id="close" data-close-modal>x</button></div>
    "#;

    const SETTINGS: &str = r#"{
        "default": {
            "preventDefault": true,
            "openTimeout": 300,
            "enableScrollTimeout": 300,
            "enableScrolling": true,
            "disableScrolling": true,
            "stopPlay": false,
            "lockFocus": true
        },
        "contact": { "openTimeout": 150 }
    }"#;

    fn manager() -> ModalManager<MarkupDocument, PageScroll, FocusTrap> {
        let document = MarkupDocument::parse(PAGE).unwrap();
        let settings = Settings::from_json(SETTINGS).unwrap();
        ModalManager::new(document, settings, PageScroll::new(), FocusTrap::new())
    }

    #[tokio::test(start_paused = true)]
    async fn test_transitions_follow_the_clock() {
        let (runtime, sender) = ModalRuntime::new(manager());
        let open = runtime.manager.document().element_by_id("open").unwrap();

        let driver = async move {
            sender.send(Command::Dom(DomEvent::click(open))).unwrap();
            tokio::time::sleep(Duration::from_millis(200)).await;
            sender.send(Command::Dom(DomEvent::key("Escape"))).unwrap();
        };

        let (manager, ()) = tokio::join!(runtime.run(), driver);

        assert!(manager.active_dialog().is_none());
        assert!(!manager.scroll().is_locked());
        assert_eq!(
            manager.scroll().history(),
            &[ScrollChange::Locked, ScrollChange::Unlocked]
        );
        assert!(manager.now() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_escape_before_activation_is_ignored() {
        let (runtime, sender) = ModalRuntime::new(manager());

        let driver = async move {
            sender
                .send(Command::Open(Some(DialogId::from("contact"))))
                .unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
            sender.send(Command::Dom(DomEvent::key("Escape"))).unwrap();
        };

        let (manager, ()) = tokio::join!(runtime.run(), driver);

        assert_eq!(manager.active_dialog(), Some(&DialogId::from("contact")));
        assert_eq!(manager.focus().active(), Some("[data-modal=\"contact\"]"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_programmatic_close() {
        let (runtime, sender) = ModalRuntime::new(manager());

        let driver = async move {
            sender.send(Command::Open(Some(DialogId::from("contact")))).unwrap();
            tokio::time::sleep(Duration::from_millis(400)).await;
            sender
                .send(Command::Close {
                    dialog: None,
                    enable_scrolling: Some(false),
                })
                .unwrap();
        };

        let (manager, ()) = tokio::join!(runtime.run(), driver);

        assert!(manager.active_dialog().is_none());
        assert!(manager.scroll().is_locked());
        assert!(!manager.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_deadline_does_not_block_shutdown() {
        let document = MarkupDocument::parse(PAGE).unwrap();
        let settings = Settings::from_json(
            &SETTINGS.replace(r#""openTimeout": 150"#, r#""openTimeout": 1e300"#),
        )
        .unwrap();
        let manager = ModalManager::new(document, settings, PageScroll::new(), FocusTrap::new());
        let (runtime, sender) = ModalRuntime::new(manager);

        let driver = async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            sender.send(Command::Open(Some(DialogId::from("contact")))).unwrap();
        };

        let (manager, ()) = tokio::join!(runtime.run(), driver);

        assert_eq!(manager.next_deadline(), Some(Duration::MAX));
        assert_eq!(manager.state_of(&DialogId::from("contact")), crate::modal::DialogState::Opening);
        assert!(manager.active_dialog().is_none());
    }
}
