//! Actions and the per-key action registry

use super::types::{Keysym, Modifiers};

/// A modifier mask bound to an ordered list of shell commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    modifiers: Modifiers,
    commands: Vec<String>,
}

impl Action {
    /// `commands` is never empty; the parser rejects empty command blocks
    pub fn new(modifiers: Modifiers, commands: Vec<String>) -> Self {
        debug_assert!(!commands.is_empty());
        Self {
            modifiers,
            commands,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Same commands under a different mask (used by shift-level inference)
    pub fn with_modifiers(&self, modifiers: Modifiers) -> Self {
        Self {
            modifiers,
            commands: self.commands.clone(),
        }
    }
}

/// One (group, keycode, level) slot of a keymap
#[derive(Debug, Clone, Default)]
pub struct Key {
    pub symbol: Keysym,
    actions: Vec<Action>,
}

impl Key {
    /// Append an action. Masks are not deduplicated; the first registered
    /// action for a mask is the one dispatch finds.
    pub fn register(&mut self, action: Action) {
        self.actions.push(action);
    }

    /// First action whose mask equals `modifiers` exactly
    pub fn find(&self, modifiers: Modifiers) -> Option<&Action> {
        self.actions.iter().find(|action| action.modifiers == modifiers)
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }
}
