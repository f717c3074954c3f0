//! Builds the mode registry from a parsed config file
//!
//! Loading is all-or-nothing with respect to syntax: the file is parsed
//! completely before the first mode is registered, so a grammar error leaves
//! nothing behind. Key names that don't resolve are the exception; those
//! bindings are skipped with a warning and the rest of the file still loads.

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::parser::{self, ConfigFile, HotkeyEntry};
use crate::input::backend::KeyboardLayout;
use crate::keymap::{Action, Mode, ModeRegistry};

/// Why a binding did not make it into the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The key name is not a known keysym
    UnknownKeysym,
    /// The keysym exists but no key on the current layout produces it
    NotOnLayout,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnknownKeysym => write!(f, "unknown key name"),
            SkipReason::NotOnLayout => write!(f, "key not present on the current layout"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedBinding {
    pub mode: String,
    pub key: String,
    pub line: u32,
    pub reason: SkipReason,
}

/// Summary of a load, for logging and `--check`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub modes: usize,
    /// Hotkey entries that registered at least once
    pub bindings: usize,
    /// Key slots written, counting each group and level separately
    pub registrations: usize,
    pub skipped: Vec<SkippedBinding>,
}

/// Register every mode of `config` into a fresh registry
pub fn load(config: &ConfigFile, layout: &dyn KeyboardLayout) -> (ModeRegistry, LoadReport) {
    let mut registry = ModeRegistry::new();
    let mut report = LoadReport::default();

    for entry in &config.modes {
        let mode = registry.register(&entry.name, layout);
        report.modes += 1;

        for hotkey in &entry.hotkeys {
            match add_hotkey(mode, hotkey, layout) {
                Ok(count) => {
                    report.bindings += 1;
                    report.registrations += count;
                }
                Err(reason) => {
                    warn!(
                        mode = %entry.name,
                        key = %hotkey.key,
                        line = hotkey.line,
                        reason = %reason,
                        "Skipping binding"
                    );
                    report.skipped.push(SkippedBinding {
                        mode: entry.name.clone(),
                        key: hotkey.key.clone(),
                        line: hotkey.line,
                        reason,
                    });
                }
            }
        }
    }

    info!(
        modes = report.modes,
        bindings = report.bindings,
        registrations = report.registrations,
        skipped = report.skipped.len(),
        "Config loaded"
    );
    (registry, report)
}

fn add_hotkey(
    mode: &mut Mode,
    hotkey: &HotkeyEntry,
    layout: &dyn KeyboardLayout,
) -> Result<usize, SkipReason> {
    let symbol = layout
        .resolve_name(&hotkey.key)
        .ok_or(SkipReason::UnknownKeysym)?;

    if !hotkey.flags.is_empty() {
        debug!(key = %hotkey.key, flags = ?hotkey.flags, "Ignoring hotkey flags");
    }

    let action = Action::new(hotkey.modifiers, hotkey.commands.clone());

    match mode.add_hotkey(symbol, &action) {
        0 => Err(SkipReason::NotOnLayout),
        count => Ok(count),
    }
}

/// Read, parse and load the config file at `path`
pub fn load_file(path: &Path, layout: &dyn KeyboardLayout) -> Result<(ModeRegistry, LoadReport)> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config = parser::parse(&source)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    Ok(load(&config, layout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::{Group, Level, Modifiers};
    use crate::testing::FakeLayout;
    use std::io::Write;

    fn layout() -> FakeLayout {
        FakeLayout::new()
            .key(38, &[&[0x61, 0x41]])
            .key(10, &[&[0x31, 0x21], &[0x26, 0x31]])
    }

    #[test]
    fn test_ctrl_a_roundtrip() {
        let config = parser::parse("default { ctrl+a { echo hi } }").unwrap();
        let (registry, report) = load(&config, &layout());

        assert_eq!(registry.len(), 1);
        let mode = registry.get(0).unwrap();
        assert_eq!(mode.name(), "default");

        let key = mode.keymap().key(Group::FIRST, 38, Level::Base);
        assert_eq!(key.actions().len(), 1);
        assert_eq!(key.actions()[0].modifiers(), Modifiers::CONTROL);
        assert_eq!(key.actions()[0].commands(), ["echo hi"]);

        let grabs = mode.grabs(Group::FIRST);
        assert_eq!(grabs.len(), 1);
        assert_eq!(grabs.entries()[0].keycode, 38);
        assert_eq!(grabs.entries()[0].modifiers, Modifiers::CONTROL);

        assert_eq!(report.bindings, 1);
        assert_eq!(report.registrations, 1);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_unknown_keysym_skipped_rest_loaded() {
        let source = "m {\n  mod4+bogus { false }\n  mod4+a { true }\n}\n";
        let config = parser::parse(source).unwrap();
        let (registry, report) = load(&config, &layout());

        assert_eq!(report.bindings, 1);
        assert_eq!(
            report.skipped,
            vec![SkippedBinding {
                mode: "m".to_string(),
                key: "bogus".to_string(),
                line: 2,
                reason: SkipReason::UnknownKeysym,
            }]
        );
        assert_eq!(registry.get(0).unwrap().grabs(Group::FIRST).len(), 1);
    }

    #[test]
    fn test_symbol_missing_from_layout_reported() {
        let config = parser::parse("m { F1 { true } }").unwrap();
        let (_, report) = load(&config, &layout());

        assert_eq!(report.bindings, 0);
        assert_eq!(report.skipped[0].reason, SkipReason::NotOnLayout);
    }

    #[test]
    fn test_non_latin_key_in_second_group() {
        // keycode 38: a/A in group 0, Cyrillic_ef/Cyrillic_EF in group 1
        let layout = FakeLayout::new().key(38, &[&[0x61, 0x41], &[0x6c6, 0x6e6]]);
        let source = "m {\n  mod4+Cyrillic_ef { one }\n  mod4+U+0444 { two }\n}\n";
        let (registry, report) = load(&parser::parse(source).unwrap(), &layout);

        assert!(report.skipped.is_empty());
        assert_eq!(report.bindings, 2);

        let mode = registry.get(0).unwrap();
        let second = Group::new(1).unwrap();
        let key = mode.keymap().key(second, 38, Level::Base);
        assert_eq!(key.actions().len(), 2);
        assert_eq!(key.actions()[0].commands(), ["one"]);
        assert_eq!(key.actions()[1].commands(), ["two"]);

        assert!(mode.grabs(Group::FIRST).is_empty());
        assert_eq!(mode.grabs(second).len(), 2);
    }

    #[test]
    fn test_each_mode_gets_its_own_keymap() {
        let config = parser::parse("a { ctrl+a { one } }\nb { ctrl+a { two } }").unwrap();
        let (registry, _) = load(&config, &layout());

        let commands = |index: usize| {
            let mode = registry.get(index).unwrap();
            let key = mode.keymap().key(Group::FIRST, 38, Level::Base);
            key.actions()[0].commands().to_vec()
        };
        assert_eq!(commands(0), vec!["one"]);
        assert_eq!(commands(1), vec!["two"]);
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"default {\n  shift+exclam { echo bang }\n}\n")
            .unwrap();

        let (registry, report) = load_file(file.path(), &layout()).unwrap();
        assert_eq!(report.registrations, 1);
        let key = registry
            .get(0)
            .unwrap()
            .keymap()
            .key(Group::FIRST, 10, Level::Shifted);
        assert_eq!(key.actions()[0].modifiers(), Modifiers::SHIFT);
    }

    #[test]
    fn test_load_file_parse_error_registers_nothing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"good { a { true } }\nbad {\n  ctrl+a {\n    echo hi\n")
            .unwrap();

        let err = load_file(file.path(), &layout()).unwrap_err();
        let parse_error = err.downcast_ref::<crate::config::error::ParseError>().unwrap();
        assert_eq!(parse_error.line, 5);
    }

    #[test]
    fn test_load_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_file(&dir.path().join("nope"), &layout()).is_err());
    }
}
