//! # Configuration Module
//!
//! Persistent defaults for the command line, stored as JSON in the
//! platform configuration directory:
//!
//! - Linux: `~/.config/music-cli/config.json`
//! - macOS: `~/Library/Application Support/music-cli/config.json`
//! - Windows: `%APPDATA%\music-cli\config.json`
//!
//! `MUSIC_CLI_CONFIG` points at a different file. Every key is optional:
//!
//! ```json
//! { "path": "/home/me/Music", "pathToVLC": "vlc", "sortType": "m", "persist": false }
//! ```

use anyhow::{anyhow, Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::request::SortType;

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV: &str = "MUSIC_CLI_CONFIG";

const APP_DIR: &str = "music-cli";
const CONFIG_FILE: &str = "config.json";

/// Returns the configuration file path.
///
/// # Errors
///
/// Fails when no override is set and the platform has no configuration
/// directory.
pub fn get_config_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }

    let config_dir = dirs::config_dir().ok_or_else(|| {
        anyhow!(
            "Could not determine system configuration directory. Set {CONFIG_ENV} to a config file path."
        )
    })?;

    Ok(config_dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Default music directory: `~/Music`.
pub fn default_music_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join("Music"))
        .unwrap_or_else(|| PathBuf::from("Music"))
}

/// User defaults injected into every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root of the music library.
    #[serde(rename = "path")]
    pub music_path: PathBuf,
    /// Player executable.
    #[serde(rename = "pathToVLC")]
    pub vlc_path: String,
    /// Timestamp used by recency sorts.
    #[serde(rename = "sortType")]
    pub sort_type: SortType,
    /// Wait for the player instead of detaching from it.
    pub persist: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            music_path: default_music_path(),
            vlc_path: "vlc".to_string(),
            sort_type: SortType::default(),
            persist: false,
        }
    }
}

impl Settings {
    /// Load from the default location (see [`get_config_path`]).
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_path()?)
    }

    /// Load from `path`. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Unreadable or malformed files are errors naming the file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read configuration file {}", path.display())
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.music_path.ends_with("Music"));
        assert_eq!(settings.vlc_path, "vlc");
        assert_eq!(settings.sort_type, SortType::Modification);
        assert!(!settings.persist);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "path": "/srv/music", "sortType": "a" }"#).unwrap();

        let settings = Settings::load_from(&path).unwrap();

        assert_eq!(settings.music_path, PathBuf::from("/srv/music"));
        assert_eq!(settings.sort_type, SortType::Access);
        assert_eq!(settings.vlc_path, "vlc");
    }

    #[test]
    fn test_full_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "path": "/m", "pathToVLC": "/usr/bin/cvlc", "sortType": "c", "persist": true }"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();

        assert_eq!(settings.vlc_path, "/usr/bin/cvlc");
        assert_eq!(settings.sort_type, SortType::Creation);
        assert!(settings.persist);
    }

    #[test]
    fn test_malformed_file_names_location() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "sortType": "sideways" }"#).unwrap();

        let err = Settings::load_from(&path).unwrap_err();

        assert!(err.to_string().contains(&path.display().to_string()));
    }

    #[test]
    fn test_config_path_ends_with_file_name() {
        let path = get_config_path().expect("config path");
        assert!(path.to_string_lossy().ends_with("config.json") || env::var_os(CONFIG_ENV).is_some());
    }
}
