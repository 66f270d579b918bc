use anyhow::Context;
use log::{info, warn};
use pixelcore::settings::SettingsStore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Runtime options for a watch session.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WatchConfig {
    pub interval_ms: u64,
    /// Stop after this many ticks; run until Ctrl+C when unset.
    pub ticks: Option<u32>,
    pub workers: usize,
    pub queue: usize,
    pub sounds_dir: Option<PathBuf>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_ms: 50,
            ticks: None,
            workers: 2,
            queue: 16,
            sounds_dir: None,
        }
    }
}

impl WatchConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading watch config {}", path_ref.display()))?;
        let config: WatchConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing watch config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(
        interval_ms: u64,
        ticks: Option<u32>,
        workers: usize,
        sounds_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            interval_ms,
            ticks,
            workers,
            sounds_dir,
            ..Default::default()
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

/// Picks the layout to monitor: the explicit path, else the last loaded one.
///
/// A remembered layout that no longer exists is forgotten.
pub fn resolve_layout(explicit: Option<PathBuf>, settings: &SettingsStore) -> Option<PathBuf> {
    if explicit.is_some() {
        return explicit;
    }
    let remembered = settings.last_loaded_file()?;
    if remembered.exists() {
        info!("using last loaded layout {}", remembered.display());
        return Some(remembered);
    }
    warn!(
        "last loaded layout {} is gone, forgetting it",
        remembered.display()
    );
    if let Err(err) = settings.clear_last_loaded_file() {
        warn!("{}", err);
    }
    None
}
