//! Modal dialog orchestration
//!
//! Keeps at most one markup-declared dialog visible, sequences open and close
//! transitions around configurable delays, and routes document clicks and the
//! Escape key into open/close requests.

pub mod listeners;
pub mod manager;
pub mod router;
pub mod scheduler;
pub mod types;

pub use listeners::Listeners;
pub use manager::ModalManager;
pub use scheduler::{Scheduler, TaskId};
pub use types::*;
