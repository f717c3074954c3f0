//! Fire-and-forget command execution
//!
//! Commands run through `sh -c` as detached children: own process group,
//! no inherited stdio. The daemon never waits on them. Finished children are
//! collected by a non-blocking [`CommandSpawner::reap`] that the event loop
//! calls once per iteration.

use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::constants::process::{SHELL, SHELL_COMMAND_FLAG};

pub trait CommandSpawner {
    /// Start `command` and return without waiting for it
    fn spawn(&mut self, command: &str) -> Result<()>;

    /// Collect children that have exited. Never blocks.
    fn reap(&mut self);
}

/// Spawns shell commands and keeps their handles until they exit
#[derive(Debug, Default)]
pub struct ProcessSupervisor {
    children: Vec<Child>,
}

impl ProcessSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Children spawned but not yet reaped
    pub fn pending(&self) -> usize {
        self.children.len()
    }
}

impl CommandSpawner for ProcessSupervisor {
    fn spawn(&mut self, command: &str) -> Result<()> {
        let child = Command::new(SHELL)
            .arg(SHELL_COMMAND_FLAG)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0)
            .spawn()
            .with_context(|| format!("Failed to spawn command: {}", command))?;

        debug!(pid = child.id(), command = %command, "Spawned command");
        self.children.push(child);
        Ok(())
    }

    fn reap(&mut self) {
        self.children.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                debug!(pid = child.id(), status = %status, "Command exited");
                false
            }
            Ok(None) => true,
            Err(e) => {
                warn!(pid = child.id(), error = %e, "Failed to poll child, dropping it");
                false
            }
        });
    }
}
