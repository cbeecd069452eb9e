// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware configuration path resolution.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use folio_core::config::CONFIG_FILE;

/// Where the configuration file lives: `--config` if given, otherwise
/// `<config dir>/folio/config.json`.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => config_dir().join(CONFIG_FILE),
    }
}

/// The application config directory. Not created; a missing config file
/// simply means defaults.
pub fn config_dir() -> PathBuf {
    config_dir_from(std::env::var_os("XDG_CONFIG_HOME"), std::env::var_os("HOME"))
}

fn config_dir_from(xdg: Option<OsString>, home: Option<OsString>) -> PathBuf {
    // XDG first, then ~/.config
    if let Some(xdg) = xdg.filter(|value| !value.is_empty()) {
        return PathBuf::from(xdg).join("folio");
    }
    if let Some(home) = home.filter(|value| !value.is_empty()) {
        return PathBuf::from(home).join(".config").join("folio");
    }
    // Last resort
    PathBuf::from(".folio")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let path = Path::new("/etc/folio.json");
        assert_eq!(config_path(Some(path)), path);
    }

    #[test]
    fn xdg_takes_precedence_over_home() {
        let dir = config_dir_from(Some("/xdg".into()), Some("/home/sam".into()));
        assert_eq!(dir, PathBuf::from("/xdg/folio"));
    }

    #[test]
    fn falls_back_to_dot_config() {
        assert_eq!(
            config_dir_from(Some("".into()), Some("/home/sam".into())),
            PathBuf::from("/home/sam/.config/folio")
        );
        assert_eq!(config_dir_from(None, None), PathBuf::from(".folio"));
    }
}
