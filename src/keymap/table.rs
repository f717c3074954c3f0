//! Keymap: a dense (group, keycode, level) table of keys
//!
//! Stored flat; the slot of a triple is computed rather than chased through
//! nested allocations.

use tracing::debug;

use super::action::Key;
use super::types::{Group, Keycode, Keysym, Level};
use crate::constants::model::{MAX_GROUPS, MAX_KEYCODES, MAX_LEVELS};
use crate::input::backend::KeyboardLayout;

/// Position of a key slot in the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    pub group: Group,
    pub keycode: Keycode,
    pub level: Level,
}

#[derive(Debug, Clone)]
pub struct Keymap {
    keys: Vec<Key>,
}

impl Default for Keymap {
    fn default() -> Self {
        Self {
            keys: vec![Key::default(); MAX_GROUPS * MAX_KEYCODES * MAX_LEVELS],
        }
    }
}

fn index(group: Group, keycode: Keycode, level: Level) -> usize {
    (group.index() * MAX_KEYCODES + keycode as usize) * MAX_LEVELS + level.index()
}

impl Keymap {
    /// Populate the symbols of every slot from the layout.
    ///
    /// The group count reported for a key is reduced modulo the modeled group
    /// range (so a key reporting exactly four groups contributes none), and
    /// the level count is capped at two.
    pub fn from_layout(layout: &dyn KeyboardLayout) -> Self {
        let mut keymap = Self::default();
        let mut populated = 0usize;

        for keycode in 0..=u8::MAX {
            let groups = layout.num_groups_for_key(keycode) % MAX_GROUPS;

            for group in Group::all().take(groups) {
                let levels = layout.num_levels_for_key(keycode, group).min(MAX_LEVELS);

                for level in Level::ALL.into_iter().take(levels) {
                    if let Some(symbol) = layout.symbol_for_level(keycode, group, level) {
                        keymap.key_mut(group, keycode, level).symbol = symbol;
                        populated += 1;
                    }
                }
            }
        }

        debug!(populated_slots = populated, "Keymap built from layout");
        keymap
    }

    pub fn key(&self, group: Group, keycode: Keycode, level: Level) -> &Key {
        &self.keys[index(group, keycode, level)]
    }

    pub fn key_mut(&mut self, group: Group, keycode: Keycode, level: Level) -> &mut Key {
        &mut self.keys[index(group, keycode, level)]
    }

    /// Every slot holding `symbol`, ordered by group, then keycode, then level
    pub fn find_symbol(&self, symbol: Keysym) -> Vec<Slot> {
        if symbol.is_none() {
            return Vec::new();
        }

        let mut slots = Vec::new();
        for group in Group::all() {
            for keycode in 0..=u8::MAX {
                for level in Level::ALL {
                    if self.key(group, keycode, level).symbol == symbol {
                        slots.push(Slot {
                            group,
                            keycode,
                            level,
                        });
                    }
                }
            }
        }
        slots
    }

    /// Iterate over all slots that have at least one action
    pub fn bound_slots(&self) -> impl Iterator<Item = (Slot, &Key)> {
        Group::all().flat_map(move |group| {
            (0..=u8::MAX).flat_map(move |keycode| {
                Level::ALL.into_iter().filter_map(move |level| {
                    let key = self.key(group, keycode, level);
                    (!key.actions().is_empty()).then_some((
                        Slot {
                            group,
                            keycode,
                            level,
                        },
                        key,
                    ))
                })
            })
        })
    }
}
