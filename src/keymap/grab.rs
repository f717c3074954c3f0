//! Grab lists: the (keycode, modifiers) pairs the X server must intercept
//!
//! Key grabs carry no notion of keyboard group, so each group keeps its own
//! list. When the group changes, everything is ungrabbed and the new group's
//! list is grabbed instead.

use super::types::{Keycode, Modifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GrabEntry {
    pub keycode: Keycode,
    pub modifiers: Modifiers,
}

/// Append-only, insertion-ordered; duplicates are kept
#[derive(Debug, Clone, Default)]
pub struct GrabList {
    entries: Vec<GrabEntry>,
}

impl GrabList {
    pub fn push(&mut self, keycode: Keycode, modifiers: Modifiers) {
        self.entries.push(GrabEntry { keycode, modifiers });
    }

    pub fn entries(&self) -> &[GrabEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

}
