//! Public surface of the authorization engine.
//!
//! Every mutating operation follows the same cycle:
//! 1. take the single-writer lock of its scope,
//! 2. open a `Txn` over committed state at the clock's current time,
//! 3. validate and stage the state change plus its ledger event,
//! 4. hand the batch to the store, or drop it untouched on rejection.
//!
//! Queries skip the lock and read the latest committed state.

use tracing::debug;

use crate::access;
use crate::authz;
use crate::clock::{Clock, SystemClock};
use crate::error::EngineResult;
use crate::ident::{ActorId, Handle, Title};
use crate::ledger;
use crate::model::{AccessGrant, ActivityEvent, Entity, Record, RecordContent, Scope, Tier};
use crate::registry;
use crate::storage::{LockKey, MemoryStore, ScopeLocks, TableStore, Txn, WriteBatch};
use crate::vault;

pub struct Engine<S = MemoryStore, C = SystemClock> {
    store: S,
    clock: C,
    locks: ScopeLocks,
}

impl Engine<MemoryStore, SystemClock> {
    pub fn in_memory() -> Self { Self::new(MemoryStore::new(), SystemClock) }
}

impl<S: TableStore, C: Clock> Engine<S, C> {
    pub fn new(store: S, clock: C) -> Self { Self { store, clock, locks: ScopeLocks::new() } }

    pub fn store(&self) -> &S { &self.store }
    pub fn clock(&self) -> &C { &self.clock }

    fn mutate<R>(&self, key: LockKey, op: &'static str, f: impl FnOnce(&mut Txn<'_>) -> EngineResult<R>) -> EngineResult<R> {
        let _guard = self.locks.acquire(key);
        let now = self.clock.now();
        let staged: EngineResult<(R, WriteBatch)> = self.store.read(|tables| {
            let mut txn = Txn::new(tables, now);
            let out = f(&mut txn)?;
            Ok((out, txn.into_batch()))
        });
        match staged {
            Ok((out, batch)) => {
                debug!(target: "tierguard::engine", op, writes = batch.len(), at = %now, "commit");
                self.store.commit(batch);
                Ok(out)
            }
            Err(e) => {
                debug_assert!(!e.is_reserved(), "{op} produced reserved error kind {e:?}");
                debug!(target: "tierguard::engine", op, code = e.code_str(), read_path = e.is_read_path(), "rejected");
                Err(e)
            }
        }
    }

    // ----- entity registry -----

    pub fn register_entity(&self, handle: &Handle, title: Title, caller: &ActorId) -> EngineResult<()> {
        self.mutate(LockKey::Entity(handle.clone()), "register_entity", |txn| {
            registry::register_entity(txn, handle, title, caller)
        })
    }

    pub fn get_entity(&self, handle: &Handle) -> Option<Entity> {
        self.store.read(|t| registry::get_entity(t, handle))
    }

    // ----- record vault -----

    pub fn deposit_record(&self, entity: &Handle, record: &Handle, content: RecordContent, caller: &ActorId) -> EngineResult<()> {
        let scope = Scope::new(entity.clone(), record.clone());
        self.mutate(LockKey::Scope(scope.clone()), "deposit_record", |txn| {
            vault::deposit_record(txn, &scope, content, caller)
        })
    }

    /// Returns the iteration the revision produced.
    pub fn revise_record(&self, entity: &Handle, record: &Handle, content: RecordContent, caller: &ActorId) -> EngineResult<u64> {
        let scope = Scope::new(entity.clone(), record.clone());
        self.mutate(LockKey::Scope(scope.clone()), "revise_record", |txn| {
            vault::revise_record(txn, &scope, content, caller)
        })
    }

    pub fn purge_record(&self, entity: &Handle, record: &Handle, caller: &ActorId) -> EngineResult<()> {
        let scope = Scope::new(entity.clone(), record.clone());
        self.mutate(LockKey::Scope(scope.clone()), "purge_record", |txn| vault::purge_record(txn, &scope, caller))
    }

    pub fn get_record(&self, entity: &Handle, record: &Handle) -> Option<Record> {
        let scope = Scope::new(entity.clone(), record.clone());
        self.store.read(|t| vault::get_record(t, &scope))
    }

    /// Records of one entity, ordered by handle.
    pub fn records(&self, entity: &Handle) -> Vec<Record> { self.store.read(|t| vault::records(t, entity)) }

    // ----- access control matrix -----

    /// `tier` is the raw level (0-4); only 1..=3 can be stored.
    pub fn allocate_access(&self, entity: &Handle, record: &Handle, actor: &ActorId, tier: u8, caller: &ActorId) -> EngineResult<()> {
        let scope = Scope::new(entity.clone(), record.clone());
        self.mutate(LockKey::Scope(scope.clone()), "allocate_access", |txn| {
            access::allocate_access(txn, &scope, actor, tier, caller)
        })
    }

    pub fn revoke_access(&self, entity: &Handle, record: &Handle, actor: &ActorId, caller: &ActorId) -> EngineResult<()> {
        let scope = Scope::new(entity.clone(), record.clone());
        self.mutate(LockKey::Scope(scope.clone()), "revoke_access", |txn| {
            access::revoke_access(txn, &scope, actor, caller)
        })
    }

    pub fn get_tier(&self, entity: &Handle, record: &Handle, actor: &ActorId) -> Tier {
        let scope = Scope::new(entity.clone(), record.clone());
        self.store.read(|t| access::get_tier(t, &scope, actor))
    }

    pub fn has_tier(&self, entity: &Handle, record: &Handle, actor: &ActorId, minimum: Tier) -> bool {
        let scope = Scope::new(entity.clone(), record.clone());
        self.store.read(|t| authz::has_tier(t, &scope, actor, minimum))
    }

    /// Stored explicit grants of a record. Controllers never appear.
    pub fn grants(&self, entity: &Handle, record: &Handle) -> Vec<AccessGrant> {
        let scope = Scope::new(entity.clone(), record.clone());
        self.store.read(|t| access::grants(t, &scope))
    }

    // ----- activity ledger -----

    pub fn retrieve_record(&self, entity: &Handle, record: &Handle, caller: &ActorId) -> EngineResult<()> {
        let scope = Scope::new(entity.clone(), record.clone());
        self.mutate(LockKey::Scope(scope.clone()), "retrieve_record", |txn| {
            ledger::retrieve_record(txn, &scope, caller).map(|_| ())
        })
    }

    pub fn get_event(&self, entity: &Handle, record: &Handle, sequence: u64) -> Option<ActivityEvent> {
        let scope = Scope::new(entity.clone(), record.clone());
        self.store.read(|t| ledger::get_event(t, &scope, sequence))
    }

    /// Ledger of one scope, oldest first.
    pub fn history(&self, entity: &Handle, record: &Handle) -> Vec<ActivityEvent> {
        let scope = Scope::new(entity.clone(), record.clone());
        self.store.read(|t| ledger::history(t, &scope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn rejected_operations_leave_no_lock_slots_behind() {
        let engine = Engine::new(MemoryStore::new(), ManualClock::new(1));
        let nobody = ActorId::from("nobody");
        let ghost = Handle::new("ghost").unwrap();
        for i in 0..10_000 {
            let record = Handle::new(format!("r{i}")).unwrap();
            assert!(engine.retrieve_record(&ghost, &record, &nobody).is_err());
            assert!(engine.revoke_access(&ghost, &record, &nobody, &nobody).is_err());
        }
        assert_eq!(engine.locks.len(), 0);
        assert_eq!(engine.store().tables().event_count(), 0);
    }

    #[test]
    fn successful_operations_release_their_slots_too() {
        let engine = Engine::new(MemoryStore::new(), ManualClock::new(1));
        let ceo = ActorId::from("ceo");
        let acme = Handle::new("acme").unwrap();
        engine.register_entity(&acme, Title::new("Acme").unwrap(), &ceo).unwrap();
        assert_eq!(engine.locks.len(), 0);
        assert_eq!(engine.get_tier(&acme, &Handle::new("plan").unwrap(), &ceo), Tier::Principal);
    }
}
