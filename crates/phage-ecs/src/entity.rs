use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use phage_core::Transform2;

use crate::component::Component;
use crate::error::{EcsError, Result};
use crate::listener::EntityListener;
use crate::manager::ComponentManager;
use crate::script::ScriptManager;
use crate::tags::TagList;
use crate::tree::{Parent, TreeManager};
use crate::value::FieldValue;

static NEXT_SCENE_TAG: AtomicU32 = AtomicU32::new(0);

/// A generational entity handle, scoped to the scene that allocated it.
///
/// Handles are never reused for a different entity: a destroyed entity's
/// handle stays stale, and handles from another scene never match.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    pub(crate) scene: u32,
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl EntityId {
    /// The slot index of this entity.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The generation of this entity (incremented on reuse).
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}:{}v{})", self.scene, self.index, self.generation)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Allocates and recycles entity slots with generational tracking.
pub(crate) struct EntityAllocator {
    scene: u32,
    generations: Vec<u32>,
    alive: Vec<bool>,
    free_list: Vec<u32>,
    len: usize,
}

impl EntityAllocator {
    /// Create an allocator with a fresh scene tag.
    pub fn new() -> Self {
        Self {
            scene: NEXT_SCENE_TAG.fetch_add(1, Ordering::Relaxed),
            generations: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Allocate a new handle, reusing a freed slot if available.
    pub fn allocate(&mut self) -> EntityId {
        self.len += 1;
        if let Some(index) = self.free_list.pop() {
            self.alive[index as usize] = true;
            EntityId {
                scene: self.scene,
                index,
                generation: self.generations[index as usize],
            }
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.alive.push(true);
            EntityId {
                scene: self.scene,
                index,
                generation: 0,
            }
        }
    }

    /// Release a handle. Returns `true` if it was alive.
    pub fn deallocate(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let idx = id.index as usize;
        self.alive[idx] = false;
        self.generations[idx] += 1;
        self.free_list.push(id.index);
        self.len -= 1;
        true
    }

    /// Check whether a handle refers to a live entity of this allocator.
    pub fn is_alive(&self, id: EntityId) -> bool {
        let idx = id.index as usize;
        id.scene == self.scene
            && idx < self.alive.len()
            && self.alive[idx]
            && self.generations[idx] == id.generation
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.len
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// A node of a scene: a name, a place in the tree, components, listeners
/// and scripts.
///
/// Entities are created, moved and destroyed only through their
/// [`Scene`](crate::Scene), which owns them.
pub struct Entity {
    id: EntityId,
    name: String,
    tree: TreeManager,
    components: ComponentManager,
    listeners: Vec<Rc<RefCell<dyn EntityListener>>>,
    scripts: ScriptManager,
}

impl Entity {
    pub(crate) fn new(id: EntityId, name: String, parent: Parent, components: ComponentManager) -> Self {
        Self {
            id,
            name,
            tree: TreeManager::new(parent),
            components,
            listeners: Vec::new(),
            scripts: ScriptManager::new(),
        }
    }

    /// The handle of this entity.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Name, unique among its siblings.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// Parent link and children.
    pub fn tree(&self) -> &TreeManager {
        &self.tree
    }

    pub(crate) fn tree_mut(&mut self) -> &mut TreeManager {
        &mut self.tree
    }

    /// The parent: the scene or another entity.
    pub fn parent(&self) -> Parent {
        self.tree.parent()
    }

    /// Check whether the scene is the direct parent.
    pub fn is_top_level(&self) -> bool {
        self.tree.is_top_level()
    }

    /// All components of this entity.
    pub fn components(&self) -> &ComponentManager {
        &self.components
    }

    /// Mutable access to the components.
    pub fn components_mut(&mut self) -> &mut ComponentManager {
        &mut self.components
    }

    /// Check whether a component with this name is attached.
    pub fn has_component(&self, name: &str) -> bool {
        self.components.has_component(name)
    }

    /// Get a component by name.
    pub fn get_component(&self, name: &str) -> Result<&dyn Component> {
        self.components.get_component(name)
    }

    /// Read a field from whichever component declares it.
    pub fn get_field(&self, identifier: &str) -> Result<FieldValue> {
        self.components.get_field(identifier)
    }

    /// Write a field. Undeclared identifiers go to the script-data bag.
    pub fn set_field(&mut self, identifier: &str, value: FieldValue) -> Result<()> {
        self.components.set_field(identifier, value)
    }

    /// Check whether any component or the script data holds this field.
    pub fn has_field(&self, identifier: &str) -> bool {
        self.components.has_field(identifier)
    }

    /// Local transform, relative to the parent.
    pub fn transform(&self) -> Transform2 {
        self.components.transform().transform()
    }

    /// Replace the local transform.
    pub fn set_transform(&mut self, transform: Transform2) {
        self.components.transform_mut().set_transform(transform);
    }

    /// Tags of this entity.
    pub fn tags(&self) -> &TagList {
        self.components.tags().tags()
    }

    /// Register a listener. The same listener cannot be added twice.
    pub fn add_listener(&mut self, listener: Rc<RefCell<dyn EntityListener>>) -> Result<()> {
        if self.listeners.iter().any(|l| Rc::ptr_eq(l, &listener)) {
            return Err(EcsError::usage("listener is already registered"));
        }
        self.listeners.push(listener);
        Ok(())
    }

    /// Unregister a listener.
    pub fn remove_listener(&mut self, listener: &Rc<RefCell<dyn EntityListener>>) -> Result<()> {
        let Some(position) = self.listeners.iter().position(|l| Rc::ptr_eq(l, listener)) else {
            return Err(EcsError::usage("listener is not registered"));
        };
        self.listeners.remove(position);
        Ok(())
    }

    /// Registered listeners, in registration order.
    pub fn listeners(&self) -> &[Rc<RefCell<dyn EntityListener>>] {
        &self.listeners
    }

    /// Scripts bound to this entity.
    pub fn scripts(&self) -> &ScriptManager {
        &self.scripts
    }

    pub(crate) fn scripts_mut(&mut self) -> &mut ScriptManager {
        &mut self.scripts
    }

    pub(crate) fn has_pending_changes(&self) -> bool {
        self.components.transform().has_changes()
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent", &self.tree.parent())
            .field("children", &self.tree.children().len())
            .field("components", &self.components.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::tests::Stats;
    use crate::error::Subject;

    #[test]
    fn allocate_sequential() {
        let mut alloc = EntityAllocator::new();
        let e0 = alloc.allocate();
        let e1 = alloc.allocate();
        assert_eq!(e0.index(), 0);
        assert_eq!(e1.index(), 1);
        assert_eq!(e0.generation(), 0);
        assert_eq!(alloc.len(), 2);
    }

    #[test]
    fn deallocate_and_reuse() {
        let mut alloc = EntityAllocator::new();
        let e0 = alloc.allocate();
        assert!(alloc.deallocate(e0));
        assert!(!alloc.deallocate(e0));
        let reused = alloc.allocate();
        assert_eq!(reused.index(), 0);
        assert_eq!(reused.generation(), 1);
        assert_ne!(e0, reused);
        assert!(!alloc.is_alive(e0));
        assert!(alloc.is_alive(reused));
    }

    #[test]
    fn handles_are_scoped_to_their_allocator() {
        let mut a = EntityAllocator::new();
        let mut b = EntityAllocator::new();
        let from_a = a.allocate();
        let from_b = b.allocate();
        assert_ne!(from_a, from_b);
        assert!(!b.is_alive(from_a));
        assert!(!a.deallocate(from_b));
    }

    #[test]
    fn field_access_goes_through_components() {
        let mut alloc = EntityAllocator::new();
        let components =
            ComponentManager::new(vec![
            Box::new(Stats::new("health", &[("hp", 3.0)])) as Box<dyn Component>
        ])
        .unwrap();
        let mut entity = Entity::new(alloc.allocate(), "hero".into(), Parent::Scene, components);
        assert!(entity.has_component("health"));
        assert!(entity.has_component("transform"));
        entity.set_field("hp", 5.0f32.into()).unwrap();
        assert_eq!(entity.get_field("hp").unwrap(), FieldValue::Float(5.0));
        assert!(entity.tags().is_empty());
        assert_eq!(entity.transform(), Transform2::IDENTITY);
        assert!(entity.is_top_level());
    }

    #[test]
    fn listeners_registered_once() {
        struct Quiet;
        impl EntityListener for Quiet {}

        let mut alloc = EntityAllocator::new();
        let mut entity = Entity::new(
            alloc.allocate(),
            "e".into(),
            Parent::Scene,
            ComponentManager::new(Vec::new()).unwrap(),
        );
        let listener: Rc<RefCell<dyn EntityListener>> = Rc::new(RefCell::new(Quiet));
        entity.add_listener(listener.clone()).unwrap();
        assert!(entity.add_listener(listener.clone()).is_err());
        entity.remove_listener(&listener).unwrap();
        assert!(entity.remove_listener(&listener).is_err());
        assert!(matches!(
            entity.get_component("render"),
            Err(EcsError::NotFound { subject: Subject::Component, .. })
        ));
    }
}
