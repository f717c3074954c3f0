//! Hotkey binding model
//!
//! Keymaps, actions, grab lists and modes. Built once from the config file,
//! then read by the dispatcher.

mod action;
mod grab;
mod mode;
pub mod table;
mod types;

pub use action::Action;
pub use mode::{Mode, ModeRegistry};
pub use types::{Group, Keycode, Keysym, Level, Modifiers};
