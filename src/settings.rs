//! Code for loading program settings.
use crate::log::DEFAULT_LOG_LEVEL;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The settings file name, looked up in the run (or runs) directory.
pub const SETTINGS_FILE_NAME: &str = "viz_settings.toml";

/// Default log level for program
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Program settings from config file
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// The default program log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Read settings from the settings file in the given directory.
    ///
    /// If the file is not present, default values for settings will be used.
    pub fn load_from_dir(dir: &Path) -> Result<Settings> {
        let file_path = dir.join(SETTINGS_FILE_NAME);
        if !file_path.is_file() {
            return Ok(Settings::default());
        }

        let contents = fs::read_to_string(&file_path)
            .with_context(|| format!("could not read {}", file_path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("could not parse {}", file_path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_settings_load_from_dir_no_file() {
        let dir = tempdir().unwrap(); // NB: no settings file
        assert_eq!(
            Settings::load_from_dir(dir.path()).unwrap(),
            Settings::default()
        );
    }

    #[test]
    fn test_settings_load_from_dir() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);

        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "log_level = \"warn\"").unwrap();
        }

        assert_eq!(
            Settings::load_from_dir(dir.path()).unwrap(),
            Settings {
                log_level: "warn".to_string(),
            }
        );
    }

    #[test]
    fn test_settings_invalid_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(SETTINGS_FILE_NAME);

        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "log_level = 42").unwrap();
        }

        assert!(Settings::load_from_dir(dir.path()).is_err());
    }
}
