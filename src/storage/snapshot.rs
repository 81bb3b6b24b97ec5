use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use super::Tables;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> { version: u32, created_ms: i64, tables: &'a Tables }

#[derive(Deserialize)]
struct Snapshot { version: u32, #[allow(dead_code)] created_ms: i64, tables: Tables }

/// Write `tables` to `path` through a temp file so a crash never leaves a torn snapshot.
/// The temp file name is fixed per path; writers to one path must not overlap.
pub fn write_snapshot(path: &Path, tables: &Tables) -> anyhow::Result<()> {
    let created_ms = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as i64).unwrap_or(0);
    let bytes = bincode::serialize(&SnapshotRef { version: SNAPSHOT_VERSION, created_ms, tables })?;
    if let Some(parent) = path.parent() { std::fs::create_dir_all(parent).ok(); }
    let tmp = path.with_extension("bin.tmp");
    std::fs::write(&tmp, bytes).with_context(|| format!("writing {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("renaming into {}", path.display()))?;
    Ok(())
}

/// Load a snapshot. `Ok(None)` when the file does not exist.
pub fn read_snapshot(path: &Path) -> anyhow::Result<Option<Tables>> {
    if !path.exists() { return Ok(None); }
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let snap: Snapshot = bincode::deserialize(&bytes).with_context(|| format!("decoding {}", path.display()))?;
    if snap.version != SNAPSHOT_VERSION {
        bail!("unsupported snapshot version {} in {}", snap.version, path.display());
    }
    Ok(Some(snap.tables))
}
