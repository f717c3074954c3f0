//! Config file discovery

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::constants::config::{APP_DIR, FILENAME};

/// Resolve the config file to read.
///
/// An explicit path wins. Otherwise `$XDG_CONFIG_HOME/xhd/config`, falling
/// back to `$HOME/.config/xhd/config`.
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let mut path = dirs::config_dir()
        .context("Unable to locate a config directory (neither XDG_CONFIG_HOME nor HOME is set)")?;
    path.push(APP_DIR);
    path.push(FILENAME);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let path = config_path(Some(Path::new("/tmp/custom"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/custom"));
    }

    #[test]
    fn test_default_path_layout() {
        if let Ok(path) = config_path(None) {
            assert!(path.ends_with("xhd/config"));
        }
    }
}
