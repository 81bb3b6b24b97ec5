//!
//! tierguard storage module
//! ------------------------
//! The engine keeps five logical tables: entity registry, record vault,
//! access control matrix, activity ledger and the per-scope sequence
//! counters. Components never own state themselves; they read through a
//! `TableView` and stage writes on a `Txn`, and the engine hands each
//! operation's `WriteBatch` to a `TableStore` in one piece.
//!
//! Key responsibilities:
//! - The `TableStore` seam, so the tables can live somewhere other than memory.
//! - All-or-nothing application of an operation's writes.
//! - Snapshot persistence of the whole table set.
//! - Per-scope single-writer locks for concurrent hosts.

mod tables;
mod memory;
mod locks;
pub mod snapshot;

pub use tables::{Mutation, TableView, Tables, Txn, WriteBatch};
pub use memory::MemoryStore;
pub use locks::{deadlock_count, spawn_deadlock_watchdog, LockKey, ScopeGuard, ScopeLocks};

/// Transactional home of the tables.
///
/// `read` runs against the latest committed state. `commit` must make every
/// mutation of the batch visible at once; readers never observe half a batch.
pub trait TableStore: Send + Sync {
    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R;
    fn commit(&self, batch: WriteBatch);
}
