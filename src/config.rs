use std::{fs::read_to_string, path::{Path, PathBuf}};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Global configuration values
///
/// Countdown's configuration is stored in a TOML file in the current user's
/// config directory, which is `~/.config/countdown/config.toml` by default.
/// The file is optional; every field has a default.
///
/// ## File Format
///
/// The configuration file is written as a TOML file.
/// See the documentation for each field to learn how they are serialized.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Config {
    /// Timeclock file to append timer events to
    ///
    /// Used when neither `-f` nor `COUNTDOWN_LOG_PATH` is given.
    /// Serialized as a path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file_path: Option<PathBuf>,
    /// Tag for activities started without `-t`
    ///
    /// Default is "Unset".
    #[serde(default = "default_tag")]
    pub default_tag: String,
}

impl Config {
    /// Reads a TOML config file
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if path.exists() {
            let config_str = read_to_string(path)
                .with_context(|| format!("Unable to read config file {}", path.display()))?;

            toml::from_str(&config_str)
                .map(Some)
                .with_context(|| "Failed to parse config from TOML")
        } else {
            Ok(None)
        }
    }

    /// Reads the config file at `path`, or at the default location if `path` is `None`
    ///
    /// Falls back to the default config when the file doesn't exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Ok(path) => path,
                Err(e) => {
                    warn!("{:#}, using default config", e);
                    return Ok(Self::default());
                }
            },
        };

        debug!("Loading config from {}", path.display());

        Ok(Self::load(&path)?.unwrap_or_default())
    }

    /// Decide where the timeclock lives
    ///
    /// `flag` is the path given on the command line (or through the
    /// environment), and wins over the config file.
    pub fn resolve_log_path(&self, flag: Option<PathBuf>) -> Result<PathBuf> {
        flag.filter(|path| !path.as_os_str().is_empty())
            .or_else(|| self.log_file_path.clone())
            .ok_or_else(|| {
                anyhow!("No file argument given, set COUNTDOWN_LOG_PATH env variable or provide a file as -f argument.")
            })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file_path: None,
            default_tag: default_tag(),
        }
    }
}

/// Get the default location of the config file
pub fn default_config_path() -> Result<PathBuf> {
    let conf_path = ProjectDirs::from("dev", "Cosmicrose", "Countdown")
        .with_context(|| "Unable to determine XDG directories")?
        .config_dir()
        .join("config.toml");

    Ok(conf_path)
}

fn default_tag() -> String {
    "Unset".to_string()
}
