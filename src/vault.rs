//! Record vault: versioned record metadata inside an entity's namespace.
//!
//! Record handles are unique per entity only; the same handle under two
//! entities names two unrelated records.

use tracing::debug;

use crate::authz;
use crate::error::{EngineError, EngineResult};
use crate::ident::{ActorId, Handle, Memo};
use crate::ledger;
use crate::model::{OperationKind, Record, RecordContent, Scope, Tier};
use crate::storage::{TableView, Tables, Txn};

/// Create a record. Only the entity's controller may deposit; a custodian
/// grant on some other record does not qualify.
///
/// Checked in order: `EntityMissing`, `Unauthorized`, `RecordExists`.
pub fn deposit_record(txn: &mut Txn<'_>, scope: &Scope, content: RecordContent, caller: &ActorId) -> EngineResult<()> {
    if txn.entity(&scope.entity).is_none() {
        return Err(EngineError::EntityMissing);
    }
    if !authz::is_controller(&*txn, scope, caller) {
        return Err(EngineError::Unauthorized);
    }
    if txn.record(scope).is_some() {
        return Err(EngineError::RecordExists);
    }
    let now = txn.now();
    let record = Record {
        entity: scope.entity.clone(),
        handle: scope.record.clone(),
        title: content.title,
        summary: content.summary,
        checksum: content.checksum,
        category: content.category,
        created_at: now,
        updated_at: now,
        iteration: 1,
        active: true,
    };
    let memo = Memo::truncated(format!("record registered: checksum={}", record.checksum));
    txn.put_record(record);
    ledger::append(txn, scope, caller, OperationKind::Register, memo);
    debug!(target: "tierguard::vault", scope = %scope, "record deposited");
    Ok(())
}

/// Overwrite the content of a record and bump its iteration. `active` is left
/// as it is, so a purged record stays purged even when revised.
///
/// Checked in order: `RecordMissing`, `Unauthorized` (needs `Modifier`).
pub fn revise_record(txn: &mut Txn<'_>, scope: &Scope, content: RecordContent, caller: &ActorId) -> EngineResult<u64> {
    let Some(current) = txn.record(scope) else {
        return Err(EngineError::RecordMissing);
    };
    if !authz::has_tier(&*txn, scope, caller, Tier::Modifier) {
        return Err(EngineError::Unauthorized);
    }
    let mut next = current.clone();
    next.title = content.title;
    next.summary = content.summary;
    next.checksum = content.checksum;
    next.category = content.category;
    next.updated_at = txn.now();
    next.iteration += 1;
    let iteration = next.iteration;
    let memo = Memo::truncated(format!("record modified: iteration={} checksum={}", iteration, next.checksum));
    txn.put_record(next);
    ledger::append(txn, scope, caller, OperationKind::Modify, memo);
    debug!(target: "tierguard::vault", scope = %scope, iteration, "record revised");
    Ok(iteration)
}

/// Mark a record inactive. Every other field is kept.
///
/// Checked in order: `RecordMissing`, `Unauthorized` (needs `Custodian`).
pub fn purge_record(txn: &mut Txn<'_>, scope: &Scope, caller: &ActorId) -> EngineResult<()> {
    let Some(current) = txn.record(scope) else {
        return Err(EngineError::RecordMissing);
    };
    if !authz::has_tier(&*txn, scope, caller, Tier::Custodian) {
        return Err(EngineError::Unauthorized);
    }
    let mut next = current.clone();
    next.active = false;
    txn.put_record(next);
    ledger::append(txn, scope, caller, OperationKind::Purge, Memo::truncated("record purged"));
    debug!(target: "tierguard::vault", scope = %scope, "record purged");
    Ok(())
}

/// Lookup regardless of `active`; callers inspect the flag themselves.
pub fn get_record(view: &impl TableView, scope: &Scope) -> Option<Record> { view.record(scope).cloned() }

pub fn records(tables: &Tables, entity: &Handle) -> Vec<Record> { tables.records_in(entity).cloned().collect() }
