use std::io::IsTerminal;
use std::path::PathBuf;
#[cfg(debug_assertions)]
use std::time::Duration;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use tierguard::cli::Console;
use tierguard::settings::EngineSettings;
use tierguard::{ActorId, Engine, MemoryStore, SystemClock};

fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    #[cfg(debug_assertions)]
    tierguard::storage::spawn_deadlock_watchdog(Duration::from_secs(1));

    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let data_dir = PathBuf::from(std::env::var("TIERGUARD_DATA_DIR").unwrap_or_else(|_| "data".to_string()));
    let actor = ActorId::new(std::env::var("TIERGUARD_ACTOR").unwrap_or_else(|_| "operator".to_string()));

    let settings = EngineSettings::load_or_default(&data_dir, "tierguard");
    let snapshot_path = settings.snapshot_path(&data_dir);
    info!(
        target: "tierguard",
        "tierguard starting: RUST_LOG='{}', data_dir='{}', persistence={}",
        rust_log,
        data_dir.display(),
        snapshot_path.is_some()
    );

    let store = MemoryStore::open(&data_dir, &settings)
        .with_context(|| format!("opening store in '{}'", data_dir.display()))?;
    let engine = Engine::new(store, SystemClock);
    let mut console = Console::new(engine, actor, snapshot_path.clone());

    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        console.run_interactive()?;
    } else {
        let mut stdout = std::io::stdout().lock();
        console.run_script(stdin.lock(), &mut stdout)?;
    }

    if let Some(path) = snapshot_path {
        console.engine().store().save_snapshot(&path)?;
        info!(target: "tierguard", "snapshot saved to '{}'", path.display());
    }
    Ok(())
}
