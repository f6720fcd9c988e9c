use phage_core::Transform2;

use crate::entity::EntityId;
use crate::error::Result;
use crate::scene::Scene;
use crate::tree::Parent;

/// Arguments of [`EntityListener::parent_changed`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParentChange {
    pub entity: EntityId,
    pub old_parent: Parent,
    pub new_parent: Parent,
    pub old_local: Transform2,
    pub new_local: Transform2,
    pub old_world: Transform2,
    pub new_world: Transform2,
}

/// Observer of one entity's tree and transform changes.
///
/// Hooks run after the change is applied and may mutate the scene; anything
/// they trigger is delivered once they return.
pub trait EntityListener {
    fn child_added(&mut self, entity: EntityId, child: EntityId, scene: &mut Scene) -> Result<()> {
        let _ = (entity, child, scene);
        Ok(())
    }

    fn child_removed(&mut self, entity: EntityId, child: EntityId, scene: &mut Scene) -> Result<()> {
        let _ = (entity, child, scene);
        Ok(())
    }

    fn parent_changed(&mut self, change: &ParentChange, scene: &mut Scene) -> Result<()> {
        let _ = (change, scene);
        Ok(())
    }

    fn transform_set(
        &mut self,
        entity: EntityId,
        old: Transform2,
        new: Transform2,
        scene: &mut Scene,
    ) -> Result<()> {
        let _ = (entity, old, new, scene);
        Ok(())
    }
}
