use std::collections::HashMap;
use std::fmt;

use crate::entity::EntityId;
use crate::error::{require_name, EcsError, Result, Subject};

/// The parent of an entity: its scene, or another entity of the same scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parent {
    Scene,
    Entity(EntityId),
}

impl Parent {
    /// The parent entity, or `None` for the scene.
    pub fn entity(self) -> Option<EntityId> {
        match self {
            Parent::Scene => None,
            Parent::Entity(id) => Some(id),
        }
    }

    /// Check whether this is the scene.
    pub fn is_scene(self) -> bool {
        matches!(self, Parent::Scene)
    }
}

impl From<EntityId> for Parent {
    fn from(id: EntityId) -> Self {
        Parent::Entity(id)
    }
}

impl fmt::Display for Parent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parent::Scene => f.write_str("scene"),
            Parent::Entity(id) => write!(f, "{id}"),
        }
    }
}

/// Ordered children of one node, addressable by name.
#[derive(Debug, Clone, Default)]
pub struct ChildSet {
    order: Vec<EntityId>,
    names: HashMap<String, EntityId>,
}

impl ChildSet {
    /// Append a child. Repeated ids and names are rejected without change.
    pub(crate) fn insert(&mut self, name: &str, id: EntityId) -> Result<()> {
        require_name(name, "child name")?;
        if self.contains(id) {
            return Err(EcsError::duplicate(Subject::Child, id.to_string()));
        }
        if self.names.contains_key(name) {
            return Err(EcsError::duplicate(Subject::Child, name));
        }
        self.order.push(id);
        self.names.insert(name.to_string(), id);
        Ok(())
    }

    /// Remove a child. Both the id and its name must match.
    pub(crate) fn remove(&mut self, name: &str, id: EntityId) -> Result<()> {
        let Some(position) = self.order.iter().position(|c| *c == id) else {
            return Err(EcsError::not_found(Subject::Child, id.to_string()));
        };
        if self.names.get(name) != Some(&id) {
            return Err(EcsError::not_found(Subject::Child, name));
        }
        self.order.remove(position);
        self.names.remove(name);
        Ok(())
    }

    /// Re-key a child under a new name.
    pub(crate) fn rename(&mut self, old: &str, new: &str, id: EntityId) -> Result<()> {
        require_name(new, "child name")?;
        if self.names.get(old) != Some(&id) {
            return Err(EcsError::not_found(Subject::Child, old));
        }
        if old == new {
            return Ok(());
        }
        if self.names.contains_key(new) {
            return Err(EcsError::duplicate(Subject::Child, new));
        }
        self.names.remove(old);
        self.names.insert(new.to_string(), id);
        Ok(())
    }

    /// Get a child by name.
    pub fn get(&self, name: &str) -> Option<EntityId> {
        self.names.get(name).copied()
    }

    /// Check whether `id` is a child.
    pub fn contains(&self, id: EntityId) -> bool {
        self.order.contains(&id)
    }

    /// Check whether a child has this name.
    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Children in insertion order.
    pub fn ids(&self) -> &[EntityId] {
        &self.order
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check whether there are no children.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// One entity's place in the hierarchy: its parent and its named children.
///
/// Only the owning scene mutates the tree, which keeps both directions of
/// every parent/child link in agreement.
#[derive(Debug, Clone)]
pub struct TreeManager {
    parent: Parent,
    children: ChildSet,
}

impl TreeManager {
    pub(crate) fn new(parent: Parent) -> Self {
        Self {
            parent,
            children: ChildSet::default(),
        }
    }

    /// The parent of this entity.
    pub fn parent(&self) -> Parent {
        self.parent
    }

    /// Check whether the scene is the direct parent.
    pub fn is_top_level(&self) -> bool {
        self.parent.is_scene()
    }

    /// Children in insertion order.
    pub fn children(&self) -> &[EntityId] {
        self.children.ids()
    }

    /// Children with their names.
    pub fn child_set(&self) -> &ChildSet {
        &self.children
    }

    /// Check whether a child has this name.
    pub fn has_child(&self, name: &str) -> bool {
        self.children.contains_name(name)
    }

    /// Get a child by name, failing if there is none.
    pub fn child(&self, name: &str) -> Result<EntityId> {
        require_name(name, "child name")?;
        self.children
            .get(name)
            .ok_or_else(|| EcsError::not_found(Subject::Child, name))
    }

    pub(crate) fn add_child(&mut self, name: &str, child: EntityId) -> Result<()> {
        self.children.insert(name, child)
    }

    pub(crate) fn remove_child(&mut self, name: &str, child: EntityId) -> Result<()> {
        self.children.remove(name, child)
    }

    pub(crate) fn rename_child(&mut self, old: &str, new: &str, child: EntityId) -> Result<()> {
        self.children.rename(old, new, child)
    }

    /// Point at a new parent, returning the old one.
    pub(crate) fn set_parent(&mut self, parent: Parent) -> Parent {
        std::mem::replace(&mut self.parent, parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityAllocator;

    #[test]
    fn children_keep_insertion_order() {
        let mut alloc = EntityAllocator::new();
        let (a, b) = (alloc.allocate(), alloc.allocate());
        let mut tree = TreeManager::new(Parent::Scene);
        tree.add_child("b", b).unwrap();
        tree.add_child("a", a).unwrap();
        assert_eq!(tree.children(), &[b, a]);
        assert_eq!(tree.child("a").unwrap(), a);
        assert!(tree.has_child("b"));
        assert!(tree.is_top_level());
    }

    #[test]
    fn duplicate_children_rejected() {
        let mut alloc = EntityAllocator::new();
        let (a, b) = (alloc.allocate(), alloc.allocate());
        let mut tree = TreeManager::new(Parent::Scene);
        tree.add_child("a", a).unwrap();
        assert!(tree.add_child("a", b).is_err());
        assert!(tree.add_child("other", a).is_err());
        assert_eq!(tree.children(), &[a]);
    }

    #[test]
    fn remove_missing_child_fails() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let mut tree = TreeManager::new(Parent::Scene);
        assert!(matches!(
            tree.remove_child("a", a),
            Err(EcsError::NotFound { subject: Subject::Child, .. })
        ));
        tree.add_child("a", a).unwrap();
        tree.remove_child("a", a).unwrap();
        assert!(tree.children().is_empty());
        assert!(tree.child("a").is_err());
    }

    #[test]
    fn rename_rechecks_uniqueness() {
        let mut alloc = EntityAllocator::new();
        let (a, b) = (alloc.allocate(), alloc.allocate());
        let mut tree = TreeManager::new(Parent::Scene);
        tree.add_child("a", a).unwrap();
        tree.add_child("b", b).unwrap();
        assert!(tree.rename_child("a", "b", a).is_err());
        tree.rename_child("a", "c", a).unwrap();
        assert_eq!(tree.child("c").unwrap(), a);
        assert!(!tree.has_child("a"));
    }

    #[test]
    fn set_parent_returns_old() {
        let mut alloc = EntityAllocator::new();
        let p = alloc.allocate();
        let mut tree = TreeManager::new(Parent::Scene);
        assert_eq!(tree.set_parent(Parent::Entity(p)), Parent::Scene);
        assert_eq!(tree.parent().entity(), Some(p));
        assert!(!tree.is_top_level());
    }
}
