//! Tier resolution. Pure functions over a table view; nothing here writes.
//!
//! Resolution order for an actor on a record:
//! 1. unknown entity: nothing is granted,
//! 2. the entity's controller: `Principal`, whatever the grant table says,
//! 3. otherwise the explicit grant for (entity, record, actor), if any.

use crate::ident::ActorId;
use crate::model::{Scope, Tier};
use crate::storage::TableView;

/// Whether `actor` holds at least `minimum` on the record of `scope`.
pub fn has_tier(view: &impl TableView, scope: &Scope, actor: &ActorId, minimum: Tier) -> bool {
    let Some(entity) = view.entity(&scope.entity) else { return false; };
    if &entity.controller == actor { return true; }
    match view.grant(scope, actor) {
        Some(grant) => grant.tier >= minimum,
        None => false,
    }
}

/// Tier `actor` effectively holds on the record of `scope`. Never fails;
/// anything unresolvable is `Blocked`.
pub fn effective_tier(view: &impl TableView, scope: &Scope, actor: &ActorId) -> Tier {
    let Some(entity) = view.entity(&scope.entity) else { return Tier::Blocked; };
    if &entity.controller == actor { return Tier::Principal; }
    view.grant(scope, actor).map(|g| g.tier).unwrap_or(Tier::Blocked)
}

/// Whether `actor` controls the entity named by `scope`.
pub fn is_controller(view: &impl TableView, scope: &Scope, actor: &ActorId) -> bool {
    view.entity(&scope.entity).map(|e| &e.controller == actor).unwrap_or(false)
}
