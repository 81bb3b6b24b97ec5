use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};
use tracing::error;

use crate::ident::Handle;
use crate::model::Scope;

/// Unit of mutual exclusion for mutating operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LockKey {
    /// Registration of an entity handle.
    Entity(Handle),
    /// Every record-scoped mutation: vault, access matrix and ledger rows of one scope.
    Scope(Scope),
}

/// Single-writer-per-key locks. A slot lives only while some operation holds
/// or waits on it, so the map is bounded by the number of operations in flight.
#[derive(Default)]
pub struct ScopeLocks {
    slots: Mutex<HashMap<LockKey, Arc<Mutex<()>>>>,
}

/// Held for the whole validate-stage-commit cycle of one operation. Dropping
/// the last guard of a key removes its slot.
pub struct ScopeGuard<'a> {
    locks: &'a ScopeLocks,
    key: LockKey,
    held: Option<ArcMutexGuard<RawMutex, ()>>,
}

impl ScopeLocks {
    pub fn new() -> Self { Self::default() }

    pub fn acquire(&self, key: LockKey) -> ScopeGuard<'_> {
        // Clone under the map lock so the release path can count waiters
        let slot = {
            let mut slots = self.slots.lock();
            slots.entry(key.clone()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
        };
        ScopeGuard { locks: self, key, held: Some(slot.lock_arc()) }
    }

    /// Slots currently allocated.
    pub(crate) fn len(&self) -> usize { self.slots.lock().len() }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        let Some(held) = self.held.take() else { return; };
        drop(held);
        let mut slots = self.locks.slots.lock();
        // Strong count 1: only the map refers to the slot, nobody holds or waits on it
        if slots.get(&self.key).map(|slot| Arc::strong_count(slot) == 1).unwrap_or(false) {
            slots.remove(&self.key);
        }
    }
}

/// Poll parking_lot's deadlock detector every `interval` and report any cycle
/// through `tracing`. Debug builds of the binary and the concurrency tests run it.
pub fn spawn_deadlock_watchdog(interval: Duration) -> thread::JoinHandle<()> {
    thread::spawn(move || loop {
        thread::sleep(interval);
        let deadlocks = parking_lot::deadlock::check_deadlock();
        if deadlocks.is_empty() { continue; }
        error!(target: "tierguard::storage", "detected {} deadlock(s)", deadlocks.len());
        for (i, threads) in deadlocks.iter().enumerate() {
            for t in threads {
                error!(target: "tierguard::storage", "deadlock #{} thread {:?}\n{:?}", i, t.thread_id(), t.backtrace());
            }
        }
    })
}

/// Deadlock cycles detected since the last check; zero when none.
pub fn deadlock_count() -> usize { parking_lot::deadlock::check_deadlock().len() }
