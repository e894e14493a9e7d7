//! Page-wide collaborators toggled alongside dialog visibility.
//!
//! Only the transition sequencer calls into these. Both operations of each
//! trait must be idempotent.

use tracing::debug;

/// Suppresses background page scrolling while a dialog is visible
pub trait ScrollLock {
    fn disable_scrolling(&mut self);
    fn enable_scrolling(&mut self);
}

/// Keeps keyboard focus inside the dialog matched by a selector
pub trait FocusLock {
    fn lock(&mut self, selector: &str);
    fn unlock(&mut self, selector: &str);
}

/// Observable scroll state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollChange {
    Locked,
    Unlocked,
}

/// Scroll lock that records the page's scroll state and its transitions
#[derive(Debug, Clone, Default)]
pub struct PageScroll {
    locked: bool,
    history: Vec<ScrollChange>,
}

impl PageScroll {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Actual state changes, repeated calls excluded
    pub fn history(&self) -> &[ScrollChange] {
        &self.history
    }
}

impl ScrollLock for PageScroll {
    fn disable_scrolling(&mut self) {
        if !self.locked {
            self.locked = true;
            self.history.push(ScrollChange::Locked);
            debug!("Page scrolling disabled");
        }
    }

    fn enable_scrolling(&mut self) {
        if self.locked {
            self.locked = false;
            self.history.push(ScrollChange::Unlocked);
            debug!("Page scrolling enabled");
        }
    }
}

/// Focus lock that remembers which selector currently holds focus
#[derive(Debug, Clone, Default)]
pub struct FocusTrap {
    active: Option<String>,
    locks: usize,
}

impl FocusTrap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selector focus is confined to, if any
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Number of times a trap was actually engaged
    pub fn lock_count(&self) -> usize {
        self.locks
    }
}

impl FocusLock for FocusTrap {
    fn lock(&mut self, selector: &str) {
        if self.active.as_deref() == Some(selector) {
            return;
        }
        self.active = Some(selector.to_string());
        self.locks += 1;
        debug!(selector, "Focus locked");
    }

    fn unlock(&mut self, selector: &str) {
        if self.active.as_deref() == Some(selector) {
            self.active = None;
            debug!(selector, "Focus released");
        }
    }
}
