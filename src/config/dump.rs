//! Serializable snapshot of the loaded binding model (for `--dump`)

use serde::Serialize;

use crate::keymap::{Group, ModeRegistry};
use crate::keysym;

#[derive(Debug, Serialize)]
pub struct RegistryDump {
    pub modes: Vec<ModeDump>,
}

#[derive(Debug, Serialize)]
pub struct ModeDump {
    pub name: String,
    pub bindings: Vec<BindingDump>,
    /// Grab count per group, indexed by group
    pub grabs: Vec<usize>,
}

#[derive(Debug, Serialize)]
pub struct BindingDump {
    pub group: usize,
    pub keycode: u8,
    pub level: usize,
    /// Keysym name when known, hex value otherwise
    pub keysym: String,
    pub modifiers: String,
    pub commands: Vec<String>,
}

impl RegistryDump {
    pub fn new(registry: &ModeRegistry) -> Self {
        let modes = registry
            .iter()
            .map(|mode| {
                let mut bindings = Vec::new();
                for (slot, key) in mode.keymap().bound_slots() {
                    let keysym = keysym::to_name(key.symbol).unwrap_or_else(|| key.symbol.to_string());
                    for action in key.actions() {
                        bindings.push(BindingDump {
                            group: slot.group.index(),
                            keycode: slot.keycode,
                            level: slot.level.index(),
                            keysym: keysym.clone(),
                            modifiers: action.modifiers().to_string(),
                            commands: action.commands().to_vec(),
                        });
                    }
                }

                ModeDump {
                    name: mode.name().to_string(),
                    bindings,
                    grabs: Group::all().map(|group| mode.grabs(group).len()).collect(),
                }
            })
            .collect();

        Self { modes }
    }
}
