use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::snapshot::{read_snapshot, write_snapshot};
use super::{TableStore, Tables, WriteBatch};
use crate::settings::{EngineSettings, MIN_INTERVAL_MS};

/// In-memory table store. Clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    /// Guard to ensure we only spawn one persistence thread
    persist_started: Arc<Mutex<bool>>,
    /// Serializes snapshot writers sharing the temp file next to the snapshot
    snapshot_writer: Arc<Mutex<()>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_tables(tables: Tables) -> Self {
        Self { tables: Arc::new(RwLock::new(tables)), ..Self::default() }
    }

    /// Open the store for a data directory: load the snapshot named by the
    /// settings (if persistence is enabled and the file exists) and start the
    /// background snapshot loop.
    pub fn open(dir: &Path, settings: &EngineSettings) -> anyhow::Result<Self> {
        let Some(path) = settings.snapshot_path(dir) else {
            debug!(target: "tierguard::storage", "persistence disabled for '{}'", settings.name);
            return Ok(Self::new());
        };
        let store = match read_snapshot(&path)? {
            Some(tables) => {
                info!(
                    target: "tierguard::storage",
                    "loaded snapshot '{}': entities={} records={} events={}",
                    path.display(), tables.entity_count(), tables.record_count(), tables.event_count()
                );
                Self::with_tables(tables)
            }
            None => Self::new(),
        };
        let interval = settings.persistence.as_ref().map(|p| p.interval()).unwrap_or(Duration::from_millis(MIN_INTERVAL_MS));
        store.ensure_persistence_loop(path, interval);
        Ok(store)
    }

    /// Copy of the committed tables.
    pub fn tables(&self) -> Tables { self.tables.read().clone() }

    pub fn save_snapshot(&self, path: &Path) -> anyhow::Result<()> {
        // Copy under the writer lock so a later snapshot never loses to an older one
        let _writer = self.snapshot_writer.lock();
        let tables = self.tables();
        write_snapshot(path, &tables)?;
        debug!(target: "tierguard::storage", "snapshot written to '{}'", path.display());
        Ok(())
    }

    fn ensure_persistence_loop(&self, path: PathBuf, interval: Duration) {
        let mut started = self.persist_started.lock();
        if *started { return; }
        *started = true;
        drop(started);
        let weak: Weak<RwLock<Tables>> = Arc::downgrade(&self.tables);
        let writer = Arc::clone(&self.snapshot_writer);
        std::thread::spawn(move || loop {
            std::thread::sleep(interval);
            // Stop once every handle to the store is gone
            let Some(tables) = weak.upgrade() else { break; };
            let _writer = writer.lock();
            let copy = tables.read().clone();
            drop(tables);
            if let Err(e) = write_snapshot(&path, &copy) {
                warn!(target: "tierguard::storage", "background snapshot to '{}' failed: {:#}", path.display(), e);
            }
        });
    }
}

impl TableStore for MemoryStore {
    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R { f(&self.tables.read()) }

    fn commit(&self, batch: WriteBatch) {
        if batch.is_empty() { return; }
        self.tables.write().apply(batch);
    }
}
