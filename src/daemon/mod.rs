//! Hotkey daemon - dispatches grabbed key presses to shell commands

mod dispatcher;
mod main_loop;
pub mod spawn;

pub use dispatcher::DispatchEngine;
pub use main_loop::{run, shutdown_flag};
pub use spawn::ProcessSupervisor;
