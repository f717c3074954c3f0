//! Collaborator interfaces for the binding model and dispatcher
//!
//! The model and dispatcher never talk to the X server directly. They see:
//! - a [`KeyboardLayout`] answering which keysyms live where,
//! - a [`KeyGrabber`] that registers key grabs on the root window,
//! - an [`EventSource`] yielding decoded [`InputEvent`]s.
//!
//! The X11/XKB implementation lives in [`super::x11_backend`]; tests use
//! in-memory fakes.

use std::os::unix::io::RawFd;

use anyhow::Result;

use crate::keymap::{Group, Keycode, Keysym, Level, Modifiers};
use crate::keysym;

/// Read-only view of the keyboard layout loaded from the server
pub trait KeyboardLayout {
    /// Number of groups the key defines, as reported (may exceed the modeled range)
    fn num_groups_for_key(&self, keycode: Keycode) -> usize;

    /// Number of shift levels the key has in `group`
    fn num_levels_for_key(&self, keycode: Keycode, group: Group) -> usize;

    /// Symbol produced by the key at `group`/`level`, if any
    fn symbol_for_level(&self, keycode: Keycode, group: Group, level: Level) -> Option<Keysym>;

    /// Resolve a keysym name as written in the config file (case-insensitive)
    fn resolve_name(&self, name: &str) -> Option<Keysym> {
        keysym::from_name(name)
    }
}

/// Key grab registration on the root window
pub trait KeyGrabber {
    fn grab_key(&mut self, keycode: Keycode, modifiers: Modifiers) -> Result<()>;

    /// Release every grab this client holds
    fn ungrab_all(&mut self) -> Result<()>;

    /// Push buffered requests to the server
    fn flush(&mut self) -> Result<()>;
}

/// An input notification, already decoded from the wire format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// A grabbed key was pressed; `state` is the raw modifier/button state
    KeyPress { keycode: Keycode, state: u16 },
    /// The effective keyboard group changed (or was re-announced)
    GroupChanged(u8),
    /// The keyboard mapping changed on the server
    MappingChanged,
}

/// Non-blocking source of input events backed by a pollable descriptor
pub trait EventSource {
    /// Descriptor that becomes readable when events may be pending
    fn raw_fd(&self) -> RawFd;

    /// Next pending event, or `None` once the queue is drained.
    /// Events with no meaning to the dispatcher are skipped.
    fn next_event(&self) -> Result<Option<InputEvent>>;
}
