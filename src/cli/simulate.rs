use anyhow::{anyhow, Context, Result};
use clap::Args;
use serde::Deserialize;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use modals::{
    Command, DialogId, DomEvent, FocusTrap, MarkupDocument, ModalEvent, ModalManager,
    ModalRuntime, PageScroll, Settings,
};

type Manager = ModalManager<MarkupDocument, PageScroll, FocusTrap>;

/// Replay a scripted sequence of clicks, keys and programmatic calls
#[derive(Debug, Args)]
pub struct SimulateCommand {
    /// Markup declaring dialogs and triggers
    #[arg(short = 'm', long = "markup")]
    pub markup: PathBuf,

    /// Settings file. Falls back to $MODALS_SETTINGS, ./modals.json, then the user config dir
    #[arg(short = 's', long = "settings")]
    pub settings: Option<PathBuf>,

    /// Replay on the wall clock instead of virtual time
    #[arg(long)]
    pub realtime: bool,

    /// JSON array of steps. If not provided, will read from stdin
    pub script: Option<PathBuf>,
}

/// One scripted input, applied at `at` milliseconds
#[derive(Debug, Deserialize)]
struct Step {
    #[serde(default)]
    at: u64,
    #[serde(flatten)]
    action: Action,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
enum Action {
    /// Click the element with this id attribute
    Click(String),
    Key(String),
    Open(Option<String>),
    Close(CloseStep),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CloseStep {
    dialog: Option<String>,
    enable_scrolling: Option<bool>,
}

impl Step {
    fn into_command(self, document: &MarkupDocument) -> Result<(Duration, Command)> {
        let command = match self.action {
            Action::Click(id) => {
                let target = document
                    .element_by_id(&id)
                    .ok_or_else(|| anyhow!("Step at {}ms clicks unknown element #{}", self.at, id))?;
                Command::Dom(DomEvent::click(target))
            }
            Action::Key(key) => Command::Dom(DomEvent::key(key)),
            Action::Open(dialog) => Command::Open(dialog.map(DialogId::from)),
            Action::Close(step) => Command::Close {
                dialog: step.dialog.map(DialogId::from),
                enable_scrolling: step.enable_scrolling,
            },
        };
        Ok((Duration::from_millis(self.at), command))
    }
}

impl SimulateCommand {
    pub async fn execute(&self) -> Result<()> {
        debug!("Executing simulate command");

        let document = MarkupDocument::load(&self.markup)
            .await
            .with_context(|| format!("Failed to load markup: {}", self.markup.display()))?;

        let settings = match &self.settings {
            Some(path) => Settings::load(path)
                .await
                .with_context(|| format!("Failed to load settings: {}", path.display()))?,
            None => Settings::discover()
                .await
                .context("Failed to discover settings; pass --settings")?,
        };

        let commands = parse_script(&self.read_script()?, &document)?;
        info!(
            "Replaying {} steps over {} dialogs",
            commands.len(),
            document.dialog_names().len()
        );

        let (sender, mut events) = mpsc::unbounded_channel();
        let mut manager = ModalManager::new(document, settings, PageScroll::new(), FocusTrap::new());
        manager.set_event_sender(sender);

        let manager = if self.realtime {
            replay_realtime(manager, commands).await
        } else {
            replay_virtual(manager, commands)
        };

        while let Ok(event) = events.try_recv() {
            println!("{}", render_event(&event)?);
        }
        println!("{}", render_summary(&manager));

        Ok(())
    }

    fn read_script(&self) -> Result<String> {
        match &self.script {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read script: {}", path.display())),
            None => {
                debug!("Reading script from stdin");
                let mut buffer = String::new();
                io::stdin()
                    .read_to_string(&mut buffer)
                    .map_err(|e| anyhow!("Failed to read from stdin: {}", e))?;
                Ok(buffer)
            }
        }
    }
}

/// Parse a script and order its steps by time. Steps sharing a time keep
/// their script order.
fn parse_script(content: &str, document: &MarkupDocument) -> Result<Vec<(Duration, Command)>> {
    let steps: Vec<Step> = serde_json::from_str(content).context("Failed to parse script")?;
    let mut commands = steps
        .into_iter()
        .map(|step| step.into_command(document))
        .collect::<Result<Vec<_>>>()?;
    commands.sort_by_key(|(at, _)| *at);
    Ok(commands)
}

fn replay_virtual(mut manager: Manager, commands: Vec<(Duration, Command)>) -> Manager {
    for (at, command) in commands {
        manager.advance_to(at);
        command.apply(&mut manager);
    }
    manager.settle();
    manager
}

async fn replay_realtime(manager: Manager, commands: Vec<(Duration, Command)>) -> Manager {
    let (runtime, sender) = ModalRuntime::new(manager);
    let started = Instant::now();

    let feeder = async move {
        for (at, command) in commands {
            let Some(when) = started.checked_add(at) else {
                break;
            };
            sleep_until(when).await;
            if sender.send(command).is_err() {
                break;
            }
        }
    };

    let (manager, ()) = tokio::join!(runtime.run(), feeder);
    manager
}

fn render_event(event: &ModalEvent) -> Result<String> {
    serde_json::to_string(event).context("Failed to serialize event")
}

fn render_summary(manager: &Manager) -> serde_json::Value {
    serde_json::json!({
        "type": "summary",
        "at_ms": manager.now().as_millis() as u64,
        "active": manager.active_dialog(),
        "scroll_locked": manager.scroll().is_locked(),
        "focus": manager.focus().active(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use modals::collaborators::ScrollChange;

    const PAGE: &str = r#"
        <a id="open-contact" data-open-modal="contact">Contact</a>
        <a id="open-video" data-open-modal="video">Video</a>
        <div data-modal="contact"><button id="close-contact" data-close-modal>x</button></div>
        <div data-modal="video"><video autoplay></video></div>
    "#;

    const SETTINGS: &str = r#"{
        "default": {
            "preventDefault": true,
            "openTimeout": 300,
            "enableScrollTimeout": 300,
            "enableScrolling": true,
            "disableScrolling": true,
            "stopPlay": true,
            "lockFocus": true
        },
        "video": { "openTimeout": 0 }
    }"#;

    fn manager() -> (Manager, mpsc::UnboundedReceiver<ModalEvent>) {
        let document = MarkupDocument::parse(PAGE).unwrap();
        let settings = Settings::from_json(SETTINGS).unwrap();
        let (sender, events) = mpsc::unbounded_channel();
        let mut manager = ModalManager::new(document, settings, PageScroll::new(), FocusTrap::new());
        manager.set_event_sender(sender);
        (manager, events)
    }

    #[test]
    fn test_parse_script_orders_steps() {
        let (manager, _) = manager();
        let script = r#"[
            { "at": 500, "key": "Escape" },
            { "click": "open-contact" },
            { "at": 500, "close": {} },
            { "at": 900, "open": "video" },
            { "at": 1200, "close": { "dialog": "video", "enableScrolling": false } }
        ]"#;

        let commands = parse_script(script, manager.document()).unwrap();
        let times: Vec<u64> = commands.iter().map(|(at, _)| at.as_millis() as u64).collect();
        assert_eq!(times, vec![0, 500, 500, 900, 1200]);

        assert_eq!(commands[1].1, Command::Dom(DomEvent::key("Escape")));
        assert_eq!(
            commands[2].1,
            Command::Close {
                dialog: None,
                enable_scrolling: None
            }
        );
        assert_eq!(
            commands[4].1,
            Command::Close {
                dialog: Some(DialogId::from("video")),
                enable_scrolling: Some(false)
            }
        );
    }

    #[test]
    fn test_parse_script_rejects_unknown_element() {
        let (manager, _) = manager();
        let err = parse_script(r#"[{ "click": "nope" }]"#, manager.document()).unwrap_err();
        assert!(err.to_string().contains("#nope"));
    }

    #[test]
    fn test_parse_script_rejects_unknown_action() {
        let (manager, _) = manager();
        assert!(parse_script(r#"[{ "at": 1, "hover": "x" }]"#, manager.document()).is_err());
    }

    #[test]
    fn test_replay_virtual() {
        let (manager, mut events) = manager();
        let script = r#"[
            { "click": "open-contact" },
            { "at": 400, "click": "open-video" },
            { "at": 800, "key": "Escape" }
        ]"#;
        let commands = parse_script(script, manager.document()).unwrap();

        let manager = replay_virtual(manager, commands);

        assert!(manager.active_dialog().is_none());
        assert!(!manager.scroll().is_locked());
        assert_eq!(manager.now(), Duration::from_millis(1100));

        let mut rendered = Vec::new();
        while let Ok(event) = events.try_recv() {
            rendered.push(render_event(&event).unwrap());
        }
        assert!(rendered.first().unwrap().contains("\"open_requested\""));
        assert!(rendered.last().unwrap().contains("\"closed\""));

        let summary = render_summary(&manager);
        assert_eq!(summary["active"], serde_json::Value::Null);
        assert_eq!(summary["scroll_locked"], false);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_realtime_matches_virtual() {
        let script = r#"[
            { "click": "open-contact" },
            { "at": 350, "click": "close-contact" }
        ]"#;

        let (manager, _) = manager();
        let commands = parse_script(script, manager.document()).unwrap();
        let manager = replay_realtime(manager, commands).await;

        assert!(manager.active_dialog().is_none());
        assert_eq!(
            manager.scroll().history(),
            &[ScrollChange::Locked, ScrollChange::Unlocked]
        );
        assert_eq!(manager.focus().active(), None);
    }
}
