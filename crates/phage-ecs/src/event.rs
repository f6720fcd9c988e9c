use phage_core::Transform2;

use crate::entity::{Entity, EntityId};
use crate::listener::ParentChange;
use crate::script::ScriptHandle;
use crate::tree::Parent;

/// A notification waiting in a scene's queue.
pub(crate) enum SceneEvent {
    /// To the listeners of `parent`.
    ChildAdded { parent: EntityId, child: EntityId },
    ChildRemoved { parent: EntityId, child: EntityId },
    /// To the listeners of the moved entity.
    ParentChanged(ParentChange),
    TransformSet {
        entity: EntityId,
        old: Transform2,
        new: Transform2,
    },
    /// To systems whose event filter matches.
    EntityAdded { entity: EntityId, parent: Parent },
    EntityRemoved { entity: Box<Entity>, parent: Parent },
    EntityMoved {
        entity: EntityId,
        old_parent: Parent,
        new_parent: Parent,
    },
    /// To every system.
    ScriptAdded { entity: EntityId, script: ScriptHandle },
    /// A script unbound while it may still be running.
    ScriptDetached(ScriptHandle),
}

impl SceneEvent {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            SceneEvent::ChildAdded { .. } => "child_added",
            SceneEvent::ChildRemoved { .. } => "child_removed",
            SceneEvent::ParentChanged(_) => "parent_changed",
            SceneEvent::TransformSet { .. } => "transform_set",
            SceneEvent::EntityAdded { .. } => "entity_added",
            SceneEvent::EntityRemoved { .. } => "entity_removed",
            SceneEvent::EntityMoved { .. } => "entity_moved",
            SceneEvent::ScriptAdded { .. } => "script_added",
            SceneEvent::ScriptDetached(_) => "script_detached",
        }
    }
}
