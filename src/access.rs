//! Access control matrix: explicit tier grants per (entity, record, actor).
//!
//! Only `Reader`, `Modifier` and `Custodian` are ever stored. Controllers hold
//! `Principal` implicitly and have no row here.

use tracing::debug;

use crate::authz;
use crate::error::{EngineError, EngineResult};
use crate::ident::{ActorId, Memo};
use crate::ledger;
use crate::model::{AccessGrant, OperationKind, Scope, Tier};
use crate::storage::{TableView, Tables, Txn};

/// Grant `actor` the tier numbered `level`, replacing any earlier grant.
///
/// Checked in order: `Unauthorized` (needs `Custodian`), `RecordMissing`,
/// `AccessLevelInvalid` (anything outside `Reader..=Custodian`, including
/// numbers that are not tiers at all).
pub fn allocate_access(txn: &mut Txn<'_>, scope: &Scope, actor: &ActorId, level: u8, caller: &ActorId) -> EngineResult<()> {
    if !authz::has_tier(&*txn, scope, caller, Tier::Custodian) {
        return Err(EngineError::Unauthorized);
    }
    if txn.record(scope).is_none() {
        return Err(EngineError::RecordMissing);
    }
    let tier = match Tier::from_level(level) {
        Some(t) if t.is_grantable() => t,
        _ => return Err(EngineError::AccessLevelInvalid),
    };
    let grant = AccessGrant {
        entity: scope.entity.clone(),
        record: scope.record.clone(),
        actor: actor.clone(),
        tier,
        grantor: caller.clone(),
        granted_at: txn.now(),
    };
    txn.put_grant(grant);
    let memo = Memo::truncated(format!("access allocated: actor={actor} tier={tier}"));
    ledger::append(txn, scope, caller, OperationKind::Distribute, memo);
    debug!(target: "tierguard::access", scope = %scope, actor = %actor, tier = %tier, "access allocated");
    Ok(())
}

/// Remove `actor`'s grant. Succeeds, and is logged, even when there was none.
///
/// Checked in order: `Unauthorized` (needs `Custodian`), `RecordMissing`.
pub fn revoke_access(txn: &mut Txn<'_>, scope: &Scope, actor: &ActorId, caller: &ActorId) -> EngineResult<()> {
    if !authz::has_tier(&*txn, scope, caller, Tier::Custodian) {
        return Err(EngineError::Unauthorized);
    }
    if txn.record(scope).is_none() {
        return Err(EngineError::RecordMissing);
    }
    let had_grant = txn.grant(scope, actor).is_some();
    if had_grant {
        txn.delete_grant(scope.clone(), actor.clone());
    }
    let memo = Memo::truncated(format!("access revoked: actor={actor}"));
    ledger::append(txn, scope, caller, OperationKind::Distribute, memo);
    debug!(target: "tierguard::access", scope = %scope, actor = %actor, had_grant, "access revoked");
    Ok(())
}

pub fn get_tier(view: &impl TableView, scope: &Scope, actor: &ActorId) -> Tier { authz::effective_tier(view, scope, actor) }

/// Stored grants of a record, by actor.
pub fn grants(tables: &Tables, scope: &Scope) -> Vec<AccessGrant> { tables.grants_in(scope).cloned().collect() }
