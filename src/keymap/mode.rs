//! Modes and the mode registry
//!
//! A mode is a complete, independently switchable set of bindings: its own
//! keymap plus one grab list per keyboard group. Modes are built while the
//! config is loaded and are read-only afterwards, except for the tracked
//! current group.

use anyhow::{Result, bail};
use tracing::{debug, info};

use super::action::Action;
use super::grab::GrabList;
use super::table::Keymap;
use super::types::{Group, Keycode, Keysym, Level, Modifiers};
use crate::constants::model::MAX_GROUPS;
use crate::input::backend::KeyboardLayout;

#[derive(Debug, Clone)]
pub struct Mode {
    name: String,
    keymap: Keymap,
    grabs: [GrabList; MAX_GROUPS],
    current_group: Group,
}

impl Mode {
    /// Create an empty mode whose keymap mirrors the current layout
    pub fn new(name: impl Into<String>, layout: &dyn KeyboardLayout) -> Self {
        Self {
            name: name.into(),
            keymap: Keymap::from_layout(layout),
            grabs: Default::default(),
            current_group: Group::FIRST,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn grabs(&self, group: Group) -> &GrabList {
        &self.grabs[group.index()]
    }

    pub fn current_group(&self) -> Group {
        self.current_group
    }

    pub fn set_current_group(&mut self, group: Group) {
        self.current_group = group;
    }

    /// Grab list of the group currently in effect
    pub fn active_grabs(&self) -> &GrabList {
        self.grabs(self.current_group)
    }

    /// Register `action` on every slot where `symbol` appears.
    ///
    /// A symbol found on the shifted level gets the shift bit added to its
    /// mask, and any mask carrying shift is stored on the shifted level, since
    /// that is the level a shifted key press looks up. Each registration also
    /// appends a grab to the matching group's list. Returns how many slots
    /// received the action.
    pub fn add_hotkey(&mut self, symbol: Keysym, action: &Action) -> usize {
        let mut registered = 0;
        let mut promoted: Option<(Group, Keycode)> = None;

        for slot in self.keymap.find_symbol(symbol) {
            // The shifted slot of a key already promoted from its base level
            if promoted == Some((slot.group, slot.keycode)) {
                continue;
            }

            let mut modifiers = action.modifiers();
            if slot.level != Level::Base {
                modifiers |= Modifiers::SHIFT;
            }

            let level = if modifiers.contains(Modifiers::SHIFT) {
                Level::Shifted
            } else {
                slot.level
            };
            if slot.level == Level::Base && level == Level::Shifted {
                promoted = Some((slot.group, slot.keycode));
            }

            self.keymap
                .key_mut(slot.group, slot.keycode, level)
                .register(action.with_modifiers(modifiers));
            self.grabs[slot.group.index()].push(slot.keycode, modifiers);

            debug!(
                mode = %self.name,
                group = %slot.group,
                keycode = slot.keycode,
                level = ?level,
                modifiers = ?modifiers,
                "Registered binding"
            );
            registered += 1;
        }

        registered
    }
}

/// Ordered collection of modes plus the index of the active one
#[derive(Debug, Default)]
pub struct ModeRegistry {
    modes: Vec<Mode>,
    current: usize,
}

impl ModeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new mode, building its keymap from `layout`.
    /// Names are not required to be unique.
    pub fn register(&mut self, name: &str, layout: &dyn KeyboardLayout) -> &mut Mode {
        info!(mode = %name, index = self.modes.len(), "Registering mode");
        self.modes.push(Mode::new(name, layout));
        let last = self.modes.len() - 1;
        &mut self.modes[last]
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Mode> {
        self.modes.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mode> {
        self.modes.iter()
    }

    /// Index of the first mode called `name`
    pub fn position(&self, name: &str) -> Option<usize> {
        self.modes.iter().position(|mode| mode.name == name)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&Mode> {
        self.modes.get(self.current)
    }

    pub fn current_mut(&mut self) -> Option<&mut Mode> {
        self.modes.get_mut(self.current)
    }

    /// Make the mode at `index` the active one
    pub fn switch_mode(&mut self, index: usize) -> Result<()> {
        if index >= self.modes.len() {
            bail!(
                "No mode at index {} ({} modes registered)",
                index,
                self.modes.len()
            );
        }

        self.current = index;
        Ok(())
    }
}
