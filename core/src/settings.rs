use crate::prelude::{MonitorError, MonitorResult};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "config.json";

/// Application settings. Unknown keys are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_loaded_file: Option<PathBuf>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// JSON-backed settings file remembering the last loaded layout.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `config.json` in the current working directory.
    pub fn in_working_dir() -> MonitorResult<Self> {
        let cwd = std::env::current_dir().map_err(|e| MonitorError::Settings {
            path: PathBuf::from(SETTINGS_FILE),
            reason: e.to_string(),
        })?;
        Ok(Self::new(cwd.join(SETTINGS_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable files read as empty settings.
    pub fn read(&self) -> Settings {
        if !self.path.exists() {
            return Settings::default();
        }
        match fs::read_to_string(&self.path)
            .map_err(|e| e.to_string())
            .and_then(|contents| serde_json::from_str(&contents).map_err(|e| e.to_string()))
        {
            Ok(settings) => settings,
            Err(reason) => {
                warn!("ignoring settings {}: {}", self.path.display(), reason);
                Settings::default()
            }
        }
    }

    pub fn write(&self, settings: &Settings) -> MonitorResult<()> {
        let fail = |reason: String| MonitorError::Settings {
            path: self.path.clone(),
            reason,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| fail(e.to_string()))?;
            }
        }
        let json = serde_json::to_string_pretty(settings).map_err(|e| fail(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| fail(e.to_string()))
    }

    pub fn update_last_loaded_file(&self, layout: impl Into<PathBuf>) -> MonitorResult<()> {
        let mut settings = self.read();
        settings.last_loaded_file = Some(layout.into());
        self.write(&settings)
    }

    pub fn clear_last_loaded_file(&self) -> MonitorResult<()> {
        let mut settings = self.read();
        settings.last_loaded_file = None;
        self.write(&settings)
    }

    pub fn last_loaded_file(&self) -> Option<PathBuf> {
        self.read().last_loaded_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join(SETTINGS_FILE));
        assert_eq!(store.read(), Settings::default());
        assert_eq!(store.last_loaded_file(), None);
    }

    #[test]
    fn last_loaded_file_round_trips_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("nested").join(SETTINGS_FILE));
        store.update_last_loaded_file("layouts/raid.json").unwrap();
        assert_eq!(
            store.last_loaded_file(),
            Some(PathBuf::from("layouts/raid.json"))
        );
        store.clear_last_loaded_file().unwrap();
        assert_eq!(store.last_loaded_file(), None);
    }

    #[test]
    fn unknown_keys_survive_updates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, r#"{"theme": "dark"}"#).unwrap();
        let store = SettingsStore::new(&path);
        store.update_last_loaded_file("a.json").unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["theme"], "dark");
        assert_eq!(raw["last_loaded_file"], "a.json");
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "{{{").unwrap();
        assert_eq!(SettingsStore::new(&path).read(), Settings::default());
    }
}
