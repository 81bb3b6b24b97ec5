use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ident::{ActorId, Handle};
use crate::model::{AccessGrant, ActivityEvent, Entity, LogicalTime, Record, Scope};

/// Read access to the logical tables. Implemented by committed state and by
/// an open transaction (which overlays its staged writes).
pub trait TableView {
    fn entity(&self, handle: &Handle) -> Option<&Entity>;
    fn record(&self, scope: &Scope) -> Option<&Record>;
    fn grant(&self, scope: &Scope, actor: &ActorId) -> Option<&AccessGrant>;
    fn event(&self, scope: &Scope, sequence: u64) -> Option<&ActivityEvent>;
    /// Sequence the next ledger event of `scope` will receive; 1 for a fresh scope.
    fn next_sequence(&self, scope: &Scope) -> u64;
}

/// Committed state: entity registry, record vault, access matrix, activity
/// ledger and the per-scope sequence counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tables {
    entities: BTreeMap<Handle, Entity>,
    records: BTreeMap<Handle, BTreeMap<Handle, Record>>,
    grants: BTreeMap<Scope, BTreeMap<ActorId, AccessGrant>>,
    events: BTreeMap<Scope, BTreeMap<u64, ActivityEvent>>,
    sequences: BTreeMap<Scope, u64>,
}

impl Tables {
    pub fn new() -> Self { Self::default() }

    pub fn entity_count(&self) -> usize { self.entities.len() }
    pub fn record_count(&self) -> usize { self.records.values().map(|m| m.len()).sum() }
    pub fn grant_count(&self) -> usize { self.grants.values().map(|m| m.len()).sum() }
    pub fn event_count(&self) -> usize { self.events.values().map(|m| m.len()).sum() }

    /// Records of one entity namespace, ordered by record handle.
    pub fn records_in(&self, entity: &Handle) -> impl Iterator<Item = &Record> + '_ {
        self.records.get(entity).into_iter().flat_map(|m| m.values())
    }

    /// Stored grants of one scope, ordered by actor.
    pub fn grants_in(&self, scope: &Scope) -> impl Iterator<Item = &AccessGrant> + '_ {
        self.grants.get(scope).into_iter().flat_map(|m| m.values())
    }

    /// Ledger events of one scope in sequence order.
    pub fn events_in(&self, scope: &Scope) -> impl Iterator<Item = &ActivityEvent> + '_ {
        self.events.get(scope).into_iter().flat_map(|m| m.values())
    }

    pub(crate) fn apply(&mut self, batch: WriteBatch) {
        for m in batch.0 {
            match m {
                Mutation::PutEntity(e) => { self.entities.insert(e.handle.clone(), e); }
                Mutation::PutRecord(r) => {
                    self.records.entry(r.entity.clone()).or_default().insert(r.handle.clone(), r);
                }
                Mutation::PutGrant(g) => {
                    let scope = Scope::new(g.entity.clone(), g.record.clone());
                    self.grants.entry(scope).or_default().insert(g.actor.clone(), g);
                }
                Mutation::DeleteGrant { scope, actor } => {
                    if let Some(rows) = self.grants.get_mut(&scope) {
                        rows.remove(&actor);
                        if rows.is_empty() { self.grants.remove(&scope); }
                    }
                }
                Mutation::PutEvent(ev) => {
                    let scope = Scope::new(ev.entity.clone(), ev.record.clone());
                    self.events.entry(scope).or_default().insert(ev.sequence, ev);
                }
                Mutation::SetSequence { scope, next } => { self.sequences.insert(scope, next); }
            }
        }
    }
}

impl TableView for Tables {
    fn entity(&self, handle: &Handle) -> Option<&Entity> { self.entities.get(handle) }

    fn record(&self, scope: &Scope) -> Option<&Record> {
        self.records.get(&scope.entity).and_then(|m| m.get(&scope.record))
    }

    fn grant(&self, scope: &Scope, actor: &ActorId) -> Option<&AccessGrant> {
        self.grants.get(scope).and_then(|m| m.get(actor))
    }

    fn event(&self, scope: &Scope, sequence: u64) -> Option<&ActivityEvent> {
        self.events.get(scope).and_then(|m| m.get(&sequence))
    }

    fn next_sequence(&self, scope: &Scope) -> u64 { self.sequences.get(scope).copied().unwrap_or(1) }
}

/// One staged row change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    PutEntity(Entity),
    PutRecord(Record),
    PutGrant(AccessGrant),
    DeleteGrant { scope: Scope, actor: ActorId },
    PutEvent(ActivityEvent),
    SetSequence { scope: Scope, next: u64 },
}

/// Mutations of one operation. A store applies a batch entirely or not at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch(Vec<Mutation>);

impl WriteBatch {
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

/// An operation in flight: reads see committed state plus whatever the
/// operation has staged so far; nothing becomes visible until the engine
/// hands the batch to the store.
pub struct Txn<'a> {
    base: &'a Tables,
    now: LogicalTime,
    staged: Vec<Mutation>,
}

impl<'a> Txn<'a> {
    pub fn new(base: &'a Tables, now: LogicalTime) -> Self {
        Self { base, now, staged: Vec::new() }
    }

    /// Logical time of the operation; every row it writes carries this value.
    pub fn now(&self) -> LogicalTime { self.now }

    pub fn put_entity(&mut self, entity: Entity) { self.staged.push(Mutation::PutEntity(entity)); }
    pub fn put_record(&mut self, record: Record) { self.staged.push(Mutation::PutRecord(record)); }
    pub fn put_grant(&mut self, grant: AccessGrant) { self.staged.push(Mutation::PutGrant(grant)); }
    pub fn delete_grant(&mut self, scope: Scope, actor: ActorId) {
        self.staged.push(Mutation::DeleteGrant { scope, actor });
    }
    pub fn put_event(&mut self, event: ActivityEvent) { self.staged.push(Mutation::PutEvent(event)); }
    pub fn set_next_sequence(&mut self, scope: Scope, next: u64) {
        self.staged.push(Mutation::SetSequence { scope, next });
    }

    pub fn into_batch(self) -> WriteBatch { WriteBatch(self.staged) }
}

impl TableView for Txn<'_> {
    fn entity(&self, handle: &Handle) -> Option<&Entity> {
        for m in self.staged.iter().rev() {
            if let Mutation::PutEntity(e) = m {
                if &e.handle == handle { return Some(e); }
            }
        }
        self.base.entity(handle)
    }

    fn record(&self, scope: &Scope) -> Option<&Record> {
        for m in self.staged.iter().rev() {
            if let Mutation::PutRecord(r) = m {
                if r.entity == scope.entity && r.handle == scope.record { return Some(r); }
            }
        }
        self.base.record(scope)
    }

    fn grant(&self, scope: &Scope, actor: &ActorId) -> Option<&AccessGrant> {
        for m in self.staged.iter().rev() {
            match m {
                Mutation::PutGrant(g) if g.entity == scope.entity && g.record == scope.record && &g.actor == actor => {
                    return Some(g);
                }
                Mutation::DeleteGrant { scope: s, actor: a } if s == scope && a == actor => return None,
                _ => {}
            }
        }
        self.base.grant(scope, actor)
    }

    fn event(&self, scope: &Scope, sequence: u64) -> Option<&ActivityEvent> {
        for m in self.staged.iter().rev() {
            if let Mutation::PutEvent(ev) = m {
                if ev.sequence == sequence && ev.entity == scope.entity && ev.record == scope.record {
                    return Some(ev);
                }
            }
        }
        self.base.event(scope, sequence)
    }

    fn next_sequence(&self, scope: &Scope) -> u64 {
        for m in self.staged.iter().rev() {
            if let Mutation::SetSequence { scope: s, next } = m {
                if s == scope { return *next; }
            }
        }
        self.base.next_sequence(scope)
    }
}
