//! Engine settings, persisted as `<data dir>/engine.json`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const SETTINGS_FILE: &str = "engine.json";
/// Floor for the background snapshot interval.
pub const MIN_INTERVAL_MS: u64 = 100;

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct EngineSettings {
    /// Display name of this engine instance.
    #[serde(default)]
    pub name: String,
    /// Snapshot options. `None` keeps the engine purely in memory.
    #[serde(default)]
    pub persistence: Option<PersistenceSettings>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self { name: String::new(), persistence: Some(PersistenceSettings::default()) }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct PersistenceSettings {
    /// Take periodic snapshots in the background and a final one on shutdown.
    #[serde(default)]
    pub enabled: bool,
    /// Interval in milliseconds between background snapshots
    #[serde(default = "PersistenceSettings::default_interval_ms")]
    pub interval_ms: u64,
    /// Snapshot file name, relative to the data directory.
    #[serde(default = "PersistenceSettings::default_snapshot_file")]
    pub snapshot_file: String,
}

impl PersistenceSettings {
    fn default_interval_ms() -> u64 { 5_000 }
    fn default_snapshot_file() -> String { "snapshot.bin".to_string() }

    /// Background snapshot period, never below `MIN_INTERVAL_MS`.
    pub fn interval(&self) -> Duration { Duration::from_millis(self.interval_ms.max(MIN_INTERVAL_MS)) }
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self { enabled: false, interval_ms: Self::default_interval_ms(), snapshot_file: Self::default_snapshot_file() }
    }
}

impl EngineSettings {
    /// Read `engine.json` from `dir`. A missing or malformed file yields defaults.
    pub fn load_or_default(dir: &Path, name: &str) -> Self {
        let path = dir.join(SETTINGS_FILE);
        let mut settings = EngineSettings { name: name.to_string(), ..Default::default() };
        if let Ok(bytes) = std::fs::read(&path) {
            match serde_json::from_slice::<EngineSettings>(&bytes) {
                Ok(s) => {
                    settings = s;
                    if settings.name.is_empty() { settings.name = name.to_string(); }
                    if let Some(p) = settings.persistence.as_mut() {
                        if p.interval_ms < MIN_INTERVAL_MS {
                            warn!(target: "tierguard::settings", "interval_ms {} in '{}' raised to {}", p.interval_ms, path.display(), MIN_INTERVAL_MS);
                            p.interval_ms = MIN_INTERVAL_MS;
                        }
                    }
                }
                Err(e) => warn!(target: "tierguard::settings", "ignoring malformed '{}': {}", path.display(), e),
            }
        }
        settings
    }

    pub fn save(&self, dir: &Path) -> anyhow::Result<()> {
        std::fs::create_dir_all(dir)?;
        let bytes = serde_json::to_vec_pretty(self)?;
        std::fs::write(dir.join(SETTINGS_FILE), bytes)?;
        Ok(())
    }

    /// Snapshot location when persistence is enabled.
    pub fn snapshot_path(&self, dir: &Path) -> Option<PathBuf> {
        self.persistence.as_ref().filter(|p| p.enabled).map(|p| dir.join(&p.snapshot_file))
    }
}
