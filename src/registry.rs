//! Entity registry: the global namespace of owners.

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::ident::{ActorId, Handle, Title};
use crate::model::Entity;
use crate::storage::{TableView, Txn};

/// Register `handle` with `caller` as its controller. The controller is fixed
/// for the entity's lifetime; no transfer exists.
pub fn register_entity(txn: &mut Txn<'_>, handle: &Handle, title: Title, caller: &ActorId) -> EngineResult<()> {
    if txn.entity(handle).is_some() {
        return Err(EngineError::EntityExists);
    }
    let entity = Entity {
        handle: handle.clone(),
        controller: caller.clone(),
        title,
        registered_at: txn.now(),
        active: true,
    };
    txn.put_entity(entity);
    debug!(target: "tierguard::registry", entity = %handle, controller = %caller, "entity registered");
    Ok(())
}

pub fn get_entity(view: &impl TableView, handle: &Handle) -> Option<Entity> { view.entity(handle).cloned() }
