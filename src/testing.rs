//! In-memory collaborators for unit tests

use std::collections::HashMap;

use anyhow::Result;

use crate::daemon::spawn::CommandSpawner;
use crate::input::backend::{KeyGrabber, KeyboardLayout};
use crate::keymap::{Group, Keycode, Keysym, Level, Modifiers};

/// Layout described key by key: `groups[group][level]` is the raw keysym, 0 for none
#[derive(Debug, Default)]
pub struct FakeLayout {
    keys: HashMap<Keycode, Vec<Vec<u32>>>,
}

impl FakeLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, keycode: Keycode, groups: &[&[u32]]) -> Self {
        self.keys
            .insert(keycode, groups.iter().map(|levels| levels.to_vec()).collect());
        self
    }
}

impl KeyboardLayout for FakeLayout {
    fn num_groups_for_key(&self, keycode: Keycode) -> usize {
        self.keys.get(&keycode).map_or(0, Vec::len)
    }

    fn num_levels_for_key(&self, keycode: Keycode, group: Group) -> usize {
        self.keys
            .get(&keycode)
            .and_then(|groups| groups.get(group.index()))
            .map_or(0, Vec::len)
    }

    fn symbol_for_level(&self, keycode: Keycode, group: Group, level: Level) -> Option<Keysym> {
        self.keys
            .get(&keycode)
            .and_then(|groups| groups.get(group.index()))
            .and_then(|levels| levels.get(level.index()))
            .filter(|&&sym| sym != 0)
            .map(|&sym| Keysym(sym))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabCall {
    Grab(Keycode, Modifiers),
    UngrabAll,
    Flush,
}

/// Records every grab request in order
#[derive(Debug, Default)]
pub struct RecordingGrabber {
    pub calls: Vec<GrabCall>,
}

impl KeyGrabber for RecordingGrabber {
    fn grab_key(&mut self, keycode: Keycode, modifiers: Modifiers) -> Result<()> {
        self.calls.push(GrabCall::Grab(keycode, modifiers));
        Ok(())
    }

    fn ungrab_all(&mut self) -> Result<()> {
        self.calls.push(GrabCall::UngrabAll);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.calls.push(GrabCall::Flush);
        Ok(())
    }
}

/// Records spawned commands instead of running them
#[derive(Debug, Default)]
pub struct RecordingSpawner {
    pub spawned: Vec<String>,
    pub reaps: usize,
    /// Commands that fail to spawn
    pub failing: Vec<String>,
}

impl CommandSpawner for RecordingSpawner {
    fn spawn(&mut self, command: &str) -> Result<()> {
        if self.failing.iter().any(|c| c == command) {
            anyhow::bail!("spawn refused: {}", command);
        }
        self.spawned.push(command.to_string());
        Ok(())
    }

    fn reap(&mut self) {
        self.reaps += 1;
    }
}
