//! Defaults remembered between runs.
//!
//! Stored as JSON in `<config dir>/pt-p710bt.json`.

use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Error;

const CONFIG_FILE: &str = "pt-p710bt.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_bt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bt_channel: Option<u8>,
}

impl Defaults {
    /// Location of the defaults file, if the platform has a config dir.
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_FILE))
    }

    /// Load the stored defaults.
    ///
    /// A missing or unreadable file yields empty defaults.
    pub fn load() -> Self {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                debug!("no defaults at {}: {}", path.display(), err);
                return Self::default();
            }
        };
        match serde_json::from_str(&text) {
            Ok(defaults) => defaults,
            Err(err) => {
                debug!("ignoring unreadable defaults {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), Error> {
        let path = Self::path().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "no config directory")
        })?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Error> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_json::to_string(self)?)?;
        debug!("saved defaults to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("pt-label-{}-{}", name, std::process::id()))
            .join(CONFIG_FILE)
    }

    #[test]
    fn save_then_load() {
        let path = scratch("save");
        let defaults = Defaults {
            default_bt: Some("EC:79:49:63:2A:80".to_string()),
            bt_channel: Some(1),
        };
        defaults.save_to(&path).unwrap();
        assert_eq!(Defaults::load_from(&path), defaults);
        fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn missing_file_is_empty() {
        let path = scratch("missing");
        assert_eq!(Defaults::load_from(&path), Defaults::default());
    }

    #[test]
    fn garbage_is_empty() {
        let path = scratch("garbage");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();
        assert_eq!(Defaults::load_from(&path), Defaults::default());
        fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn reads_files_without_channel() {
        let path = scratch("legacy");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"default_bt": "EC:79:49:63:2A:80"}"#).unwrap();
        let defaults = Defaults::load_from(&path);
        assert_eq!(defaults.default_bt.as_deref(), Some("EC:79:49:63:2A:80"));
        assert_eq!(defaults.bt_channel, None);
        fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
