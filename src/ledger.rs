//! Activity ledger: append-only, gapless audit trail per (entity, record) scope.
//!
//! `append` is crate-private. Every mutating operation calls it on the same
//! `Txn` that carries its state change, so the event and the change reach the
//! store in one batch or not at all.

use tracing::debug;

use crate::authz;
use crate::error::{EngineError, EngineResult};
use crate::ident::{ActorId, Memo};
use crate::model::{ActivityEvent, OperationKind, Scope, Tier};
use crate::storage::{TableView, Tables, Txn};

/// Stage the next event of `scope` and advance its counter. Returns the
/// sequence the event was stored under.
pub(crate) fn append(txn: &mut Txn<'_>, scope: &Scope, actor: &ActorId, operation: OperationKind, memo: Memo) -> u64 {
    let sequence = txn.next_sequence(scope);
    let event = ActivityEvent {
        entity: scope.entity.clone(),
        record: scope.record.clone(),
        sequence,
        actor: actor.clone(),
        operation,
        occurred_at: txn.now(),
        memo,
    };
    txn.put_event(event);
    txn.set_next_sequence(scope.clone(), sequence + 1);
    debug!(target: "tierguard::ledger", scope = %scope, sequence, operation = %operation, actor = %actor, "event appended");
    sequence
}

/// Record read intent. Returns no content; the only effect is a `RETRIEVE`
/// event. Read-path failures are `AccessDenied`, not `Unauthorized`.
pub fn retrieve_record(txn: &mut Txn<'_>, scope: &Scope, caller: &ActorId) -> EngineResult<u64> {
    if !authz::has_tier(&*txn, scope, caller, Tier::Reader) {
        return Err(EngineError::AccessDenied);
    }
    if txn.record(scope).is_none() {
        return Err(EngineError::RecordMissing);
    }
    Ok(append(txn, scope, caller, OperationKind::Retrieve, Memo::truncated("record retrieved")))
}

pub fn get_event(view: &impl TableView, scope: &Scope, sequence: u64) -> Option<ActivityEvent> {
    view.event(scope, sequence).cloned()
}

/// All events of `scope`, oldest first.
pub fn history(tables: &Tables, scope: &Scope) -> Vec<ActivityEvent> { tables.events_in(scope).cloned().collect() }
