//! Input event dispatch
//!
//! Turns key presses into command executions and keeps the grabbed key set in
//! step with the active keyboard group. Events are handled one at a time, in
//! delivery order; the only state written here is the active mode's current
//! group (and the active mode itself when an external caller switches it).

use anyhow::Result;
use tracing::{debug, error, info, warn};

use super::spawn::CommandSpawner;
use crate::input::backend::{InputEvent, KeyGrabber};
use crate::keymap::{Group, Keycode, Level, ModeRegistry, Modifiers};

pub struct DispatchEngine<G, S> {
    modes: ModeRegistry,
    grabber: G,
    spawner: S,
}

impl<G: KeyGrabber, S: CommandSpawner> DispatchEngine<G, S> {
    pub fn new(modes: ModeRegistry, grabber: G, spawner: S) -> Self {
        Self {
            modes,
            grabber,
            spawner,
        }
    }

    pub fn modes(&self) -> &ModeRegistry {
        &self.modes
    }

    pub fn grabber(&self) -> &G {
        &self.grabber
    }

    pub fn spawner(&self) -> &S {
        &self.spawner
    }

    /// Set the group in effect before anything is grabbed
    pub fn set_initial_group(&mut self, group: Group) {
        if let Some(mode) = self.modes.current_mut() {
            mode.set_current_group(group);
        }
    }

    /// Grab every key of the active mode's current group
    pub fn grab_current(&mut self) -> Result<()> {
        let Some(mode) = self.modes.current() else {
            return Ok(());
        };

        let grabs = mode.active_grabs();
        if grabs.is_empty() {
            debug!(mode = %mode.name(), group = %mode.current_group(), "No keys bound in this group");
        }
        for entry in grabs.entries() {
            self.grabber.grab_key(entry.keycode, entry.modifiers)?;
        }
        self.grabber.flush()?;

        info!(
            mode = %mode.name(),
            group = %mode.current_group(),
            grabs = grabs.len(),
            "Grabbed keys"
        );
        Ok(())
    }

    /// Release every grab (used on shutdown)
    pub fn release(&mut self) -> Result<()> {
        self.grabber.ungrab_all()?;
        self.grabber.flush()
    }

    /// Collect finished child processes
    pub fn reap(&mut self) {
        self.spawner.reap();
    }

    pub fn handle_event(&mut self, event: InputEvent) -> Result<()> {
        match event {
            InputEvent::KeyPress { keycode, state } => {
                self.handle_key_press(keycode, state);
                Ok(())
            }
            InputEvent::GroupChanged(group) => self.handle_group_change(group),
            InputEvent::MappingChanged => {
                warn!("Keyboard mapping changed - bindings may not match until restart");
                Ok(())
            }
        }
    }

    /// Run the first action on the pressed key whose mask equals the
    /// relevant modifier state exactly. Anything else is a silent no-op.
    #[tracing::instrument(skip(self), level = "debug")]
    fn handle_key_press(&mut self, keycode: Keycode, state: u16) {
        let Some(mode) = self.modes.current() else {
            return;
        };

        let modifiers = Modifiers::from_event_state(state);
        let level = Level::from_modifiers(modifiers);
        let key = mode.keymap().key(mode.current_group(), keycode, level);

        let Some(action) = key.find(modifiers) else {
            debug!(modifiers = ?modifiers, "KeyPress didn't match any binding");
            return;
        };

        info!(
            keycode = keycode,
            modifiers = %modifiers,
            commands = action.commands().len(),
            "Hotkey pressed, running commands"
        );

        for command in action.commands() {
            if let Err(e) = self.spawner.spawn(command) {
                error!(error = %e, command = %command, "Failed to run command");
            }
        }
    }

    /// Swap grab lists when the effective group changes
    fn handle_group_change(&mut self, group: u8) -> Result<()> {
        let Some(group) = Group::new(group) else {
            warn!(group = group, "Ignoring notification for unsupported group");
            return Ok(());
        };

        let Some(mode) = self.modes.current_mut() else {
            return Ok(());
        };

        if mode.current_group() == group {
            return Ok(());
        }

        info!(from = %mode.current_group(), to = %group, "Keyboard group changed");
        self.grabber.ungrab_all()?;
        mode.set_current_group(group);
        self.grab_current()
    }

    /// Activate another mode. The current group carries over.
    pub fn switch_mode(&mut self, index: usize) -> Result<()> {
        let group = self
            .modes
            .current()
            .map_or(Group::FIRST, |mode| mode.current_group());

        self.modes.switch_mode(index)?;
        self.grabber.ungrab_all()?;
        if let Some(mode) = self.modes.current_mut() {
            mode.set_current_group(group);
            info!(mode = %mode.name(), index = index, "Switched mode");
        }
        self.grab_current()
    }
}
