//! Configuration buckets and their resolution over the default bucket.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::rc::Rc;
use std::time::Duration;
use tracing::debug;

/// Zero-argument hook run after a transition's primary effect
pub type Callback = Rc<dyn Fn()>;

/// One named set of overrides. Every field is optional; absent fields fall
/// back to the default bucket.
#[derive(Clone, Default)]
pub struct Bucket {
    pub prevent_default: Option<bool>,
    pub open_timeout: Option<Duration>,
    pub enable_scroll_timeout: Option<Duration>,
    pub enable_scrolling: Option<bool>,
    pub disable_scrolling: Option<bool>,
    pub stop_play: Option<bool>,
    pub lock_focus: Option<bool>,
    pub open_callback: Option<Callback>,
    pub close_callback: Option<Callback>,
}

impl Bucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a bucket from JSON, dropping fields whose type does not match.
    pub fn from_value(name: &str, value: &Value) -> Self {
        let Some(fields) = value.as_object() else {
            debug!(bucket = name, "Bucket is not an object, every field falls back");
            return Self::default();
        };

        let flag = |key: &str| {
            let field = fields.get(key)?;
            let parsed = field.as_bool();
            if parsed.is_none() {
                debug!(bucket = name, field = key, "Ignoring non-boolean override");
            }
            parsed
        };
        let millis = |key: &str| {
            let field = fields.get(key)?;
            let parsed = field.as_f64().map(duration_from_millis);
            if parsed.is_none() {
                debug!(bucket = name, field = key, "Ignoring non-numeric override");
            }
            parsed
        };

        Self {
            prevent_default: flag("preventDefault"),
            open_timeout: millis("openTimeout"),
            enable_scroll_timeout: millis("enableScrollTimeout"),
            enable_scrolling: flag("enableScrolling"),
            disable_scrolling: flag("disableScrolling"),
            stop_play: flag("stopPlay"),
            lock_focus: flag("lockFocus"),
            open_callback: None,
            close_callback: None,
        }
    }

    pub fn with_prevent_default(mut self, value: bool) -> Self {
        self.prevent_default = Some(value);
        self
    }

    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = Some(timeout);
        self
    }

    pub fn with_enable_scroll_timeout(mut self, timeout: Duration) -> Self {
        self.enable_scroll_timeout = Some(timeout);
        self
    }

    pub fn with_enable_scrolling(mut self, value: bool) -> Self {
        self.enable_scrolling = Some(value);
        self
    }

    pub fn with_disable_scrolling(mut self, value: bool) -> Self {
        self.disable_scrolling = Some(value);
        self
    }

    pub fn with_stop_play(mut self, value: bool) -> Self {
        self.stop_play = Some(value);
        self
    }

    pub fn with_lock_focus(mut self, value: bool) -> Self {
        self.lock_focus = Some(value);
        self
    }

    pub fn with_open_callback(mut self, callback: impl Fn() + 'static) -> Self {
        self.open_callback = Some(Rc::new(callback));
        self
    }

    pub fn with_close_callback(mut self, callback: impl Fn() + 'static) -> Self {
        self.close_callback = Some(Rc::new(callback));
        self
    }

    /// Overlay this bucket on an already resolved configuration
    pub fn resolve_over(&self, base: &ResolvedConfig) -> ResolvedConfig {
        ResolvedConfig {
            prevent_default: self.prevent_default.unwrap_or(base.prevent_default),
            open_timeout: self.open_timeout.unwrap_or(base.open_timeout),
            enable_scroll_timeout: self
                .enable_scroll_timeout
                .unwrap_or(base.enable_scroll_timeout),
            enable_scrolling: self.enable_scrolling.unwrap_or(base.enable_scrolling),
            disable_scrolling: self.disable_scrolling.unwrap_or(base.disable_scrolling),
            stop_play: self.stop_play.unwrap_or(base.stop_play),
            lock_focus: self.lock_focus.unwrap_or(base.lock_focus),
            open_callback: self
                .open_callback
                .clone()
                .or_else(|| base.open_callback.clone()),
            close_callback: self
                .close_callback
                .clone()
                .or_else(|| base.close_callback.clone()),
        }
    }

    /// Name of the first required field this bucket leaves unset
    pub(crate) fn first_missing_field(&self) -> Option<&'static str> {
        let present = [
            ("preventDefault", self.prevent_default.is_some()),
            ("openTimeout", self.open_timeout.is_some()),
            ("enableScrollTimeout", self.enable_scroll_timeout.is_some()),
            ("enableScrolling", self.enable_scrolling.is_some()),
            ("disableScrolling", self.disable_scrolling.is_some()),
            ("stopPlay", self.stop_play.is_some()),
            ("lockFocus", self.lock_focus.is_some()),
        ];
        present
            .iter()
            .find(|(_, is_set)| !is_set)
            .map(|(field, _)| *field)
    }
}

impl std::fmt::Debug for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bucket")
            .field("prevent_default", &self.prevent_default)
            .field("open_timeout", &self.open_timeout)
            .field("enable_scroll_timeout", &self.enable_scroll_timeout)
            .field("enable_scrolling", &self.enable_scrolling)
            .field("disable_scrolling", &self.disable_scrolling)
            .field("stop_play", &self.stop_play)
            .field("lock_focus", &self.lock_focus)
            .field("open_callback", &self.open_callback.is_some())
            .field("close_callback", &self.close_callback.is_some())
            .finish()
    }
}

/// Fully populated parameters governing one dialog's transitions
#[derive(Clone)]
pub struct ResolvedConfig {
    /// Carried for hosts; the engine itself does not consume it
    pub prevent_default: bool,
    pub open_timeout: Duration,
    pub enable_scroll_timeout: Duration,
    pub enable_scrolling: bool,
    pub disable_scrolling: bool,
    pub stop_play: bool,
    pub lock_focus: bool,
    pub open_callback: Option<Callback>,
    pub close_callback: Option<Callback>,
}

impl ResolvedConfig {
    /// Compare every non-callback field
    pub fn same_parameters(&self, other: &Self) -> bool {
        self.prevent_default == other.prevent_default
            && self.open_timeout == other.open_timeout
            && self.enable_scroll_timeout == other.enable_scroll_timeout
            && self.enable_scrolling == other.enable_scrolling
            && self.disable_scrolling == other.disable_scrolling
            && self.stop_play == other.stop_play
            && self.lock_focus == other.lock_focus
    }
}

impl std::fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("prevent_default", &self.prevent_default)
            .field("open_timeout", &self.open_timeout)
            .field("enable_scroll_timeout", &self.enable_scroll_timeout)
            .field("enable_scrolling", &self.enable_scrolling)
            .field("disable_scrolling", &self.disable_scrolling)
            .field("stop_play", &self.stop_play)
            .field("lock_focus", &self.lock_focus)
            .field("open_callback", &self.open_callback.is_some())
            .field("close_callback", &self.close_callback.is_some())
            .finish()
    }
}

/// On-disk shape of a bucket, used for schema generation
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BucketSpec {
    /// Reserved hook for suppressing default trigger behavior
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prevent_default: Option<bool>,

    /// Milliseconds between an open request and the dialog becoming visible
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_timeout: Option<u64>,

    /// Milliseconds between closing and page scrolling coming back
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_scroll_timeout: Option<u64>,

    /// Re-enable page scrolling when the dialog closes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_scrolling: Option<bool>,

    /// Disable page scrolling when the dialog opens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_scrolling: Option<bool>,

    /// Pause video and audio inside the dialog when it closes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_play: Option<bool>,

    /// Confine keyboard focus to the dialog while it is open
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_focus: Option<bool>,
}

fn duration_from_millis(millis: f64) -> Duration {
    if millis.is_finite() && millis > 0.0 {
        Duration::try_from_secs_f64(millis / 1000.0).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}
