//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the daemon, providing a single source of truth for constant values.

/// Dimensions of the binding model
pub mod model {
    /// Number of keyboard groups (layouts) XKB can have active
    pub const MAX_GROUPS: usize = 4;

    /// Number of keycodes addressable by the core protocol
    pub const MAX_KEYCODES: usize = 256;

    /// Only the unshifted and shifted levels are modeled
    pub const MAX_LEVELS: usize = 2;
}

/// Modifier bits as they appear in core protocol key events
pub mod modifiers {
    pub const SHIFT: u16 = 1 << 0;
    pub const LOCK: u16 = 1 << 1;
    pub const CONTROL: u16 = 1 << 2;
    pub const MOD1: u16 = 1 << 3;
    pub const MOD2: u16 = 1 << 4;
    pub const MOD3: u16 = 1 << 5;
    pub const MOD4: u16 = 1 << 6;
    pub const MOD5: u16 = 1 << 7;

    /// Bits of a key event state that take part in binding lookup.
    /// Pointer buttons (bits 8-12) and the XKB group (bits 13-14) are dropped.
    pub const RELEVANT_BITS: u16 = 0x00FF;
}

/// Configuration grammar limits
pub mod grammar {
    /// Longest mode name in bytes
    pub const MAX_NAME_LEN: usize = 39;

    /// Longest modifier or key name in bytes
    pub const MAX_KEY_LEN: usize = 39;

    /// Longest flag (without the leading `--`) in bytes
    pub const MAX_FLAG_LEN: usize = 39;

    /// Longest single command line in bytes
    pub const MAX_COMMAND_LEN: usize = 255;

    /// Most `+`-separated parts allowed in one key combination
    pub const MAX_COMBO_PARTS: usize = 8;
}

/// Configuration file discovery
pub mod config {
    /// Directory under the XDG config home
    pub const APP_DIR: &str = "xhd";

    /// Config file name inside [`APP_DIR`]
    pub const FILENAME: &str = "config";
}

/// Event loop timing
pub mod event_loop {
    /// Upper bound on how long the loop sleeps waiting for X events.
    /// Bounds the latency of child reaping and shutdown checks.
    pub const POLL_TIMEOUT_MS: i32 = 250;
}

/// Child process spawning
pub mod process {
    /// Shell used to run binding commands
    pub const SHELL: &str = "/bin/sh";

    /// Flag passing the command string to [`SHELL`]
    pub const SHELL_COMMAND_FLAG: &str = "-c";
}
