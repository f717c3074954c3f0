//! Configuration management
//!
//! Parses the hotkey config file and turns it into the binding model.
//! Parsing is purely syntactic; key names are resolved against the live
//! keyboard layout when the parsed file is loaded.

pub mod dump;
mod error;
mod lexer;
pub mod loader;
pub mod parser;
pub mod paths;

pub use dump::RegistryDump;
pub use loader::{LoadReport, load_file};
pub use paths::config_path;
