use std::cell::{RefCell, RefMut};
use std::collections::{HashSet, VecDeque};
use std::fmt::{self, Write as _};
use std::rc::Rc;

use phage_core::Transform2;
use tracing::{debug, trace};

use crate::builder::EntityBuilder;
use crate::component::Component;
use crate::entity::{Entity, EntityAllocator, EntityId};
use crate::error::{require_name, EcsError, Result, Subject};
use crate::event::SceneEvent;
use crate::filter::EntityFilter;
use crate::listener::{EntityListener, ParentChange};
use crate::manager::ComponentManager;
use crate::script::{Script, ScriptContext, ScriptHandle};
use crate::system::{EntitySystem, SystemHandle, SystemSchedule};
use crate::tree::{ChildSet, Parent};
use crate::value::FieldValue;

type ListenerHandle = Rc<RefCell<dyn EntityListener>>;

/// The root of an entity tree and the only authority that creates, moves
/// and destroys its entities.
///
/// Every change is announced through a queue: listener and system hooks run
/// after the change is applied and before the outermost scene call returns.
/// Hooks get the scene itself and may change it again; those changes are
/// queued behind the current ones instead of nesting. Inside
/// [`deferred`](Self::deferred) nothing is delivered until the closure
/// returns.
pub struct Scene {
    name: String,
    game: String,
    allocator: EntityAllocator,
    slots: Vec<Option<Entity>>,
    all: Vec<EntityId>,
    top: ChildSet,
    systems: Option<Rc<RefCell<SystemSchedule>>>,
    active: bool,
    pending: VecDeque<SceneEvent>,
    touched: Vec<EntityId>,
    dispatching: bool,
    deferred: u32,
    requested_scene: Option<String>,
    generated_names: u64,
}

/// A builder instantiated up front, so nothing enters the scene unless the
/// whole subtree could be built.
struct Planned {
    components: ComponentManager,
    children: Vec<(String, Planned)>,
    scripts: Vec<ScriptHandle>,
}

impl Planned {
    fn from_builder(builder: &EntityBuilder) -> Result<Self> {
        let children = builder
            .children()
            .iter()
            .map(|(name, child)| Ok((name.clone(), Planned::from_builder(child)?)))
            .collect::<Result<Vec<_>>>()?;
        let scripts = builder
            .scripts()
            .iter()
            .map(|script| Ok(running_check(script.try_borrow())?.duplicate()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            components: builder.build_components()?,
            children,
            scripts,
        })
    }
}

impl Scene {
    /// Create an empty, inactive scene belonging to `game`.
    pub fn new(name: impl Into<String>, game: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            game: game.into(),
            allocator: EntityAllocator::new(),
            slots: Vec::new(),
            all: Vec::new(),
            top: ChildSet::default(),
            systems: None,
            active: false,
            pending: VecDeque::new(),
            touched: Vec::new(),
            dispatching: false,
            deferred: 0,
            requested_scene: None,
            generated_names: 0,
        }
    }

    /// Scene name, unique within its game.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the owning game.
    pub fn game(&self) -> &str {
        &self.game
    }

    /// Share a system schedule with this scene. Systems only hear about
    /// changes while the scene is active.
    pub fn attach_systems(&mut self, systems: Rc<RefCell<SystemSchedule>>) {
        self.systems = Some(systems);
    }

    /// The attached system schedule, if any.
    pub fn systems(&self) -> Option<&Rc<RefCell<SystemSchedule>>> {
        self.systems.as_ref()
    }

    /// Turn system notification on or off.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Whether systems are notified of changes.
    pub fn is_active(&self) -> bool {
        self.active
    }

    // ---- membership ----

    /// Check whether a handle refers to a live entity of this scene.
    pub fn contains(&self, id: EntityId) -> bool {
        self.allocator.is_alive(id)
    }

    /// Number of entities, at every depth.
    pub fn len(&self) -> usize {
        self.all.len()
    }

    /// Check whether the scene has no entities.
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// Every entity of the scene, in creation order.
    pub fn all_entities(&self) -> &[EntityId] {
        &self.all
    }

    /// Direct children of the scene.
    pub fn top_level(&self) -> &[EntityId] {
        self.top.ids()
    }

    /// Get a top-level entity by name.
    pub fn top_level_entity(&self, name: &str) -> Result<EntityId> {
        require_name(name, "entity name")?;
        self.top
            .get(name)
            .ok_or_else(|| EcsError::not_found(Subject::Entity, name))
    }

    /// Get an entity by handle.
    pub fn entity(&self, id: EntityId) -> Result<&Entity> {
        self.slot(id)
            .ok_or_else(|| EcsError::not_found(Subject::Entity, id.to_string()))
    }

    /// Mutable access to an entity. Transform changes made through it are
    /// announced at the next flush.
    pub fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        if self.contains(id) && !self.touched.contains(&id) {
            self.touched.push(id);
        }
        self.slot_mut(id)
            .ok_or_else(|| EcsError::not_found(Subject::Entity, id.to_string()))
    }

    fn slot(&self, id: EntityId) -> Option<&Entity> {
        if !self.allocator.is_alive(id) {
            return None;
        }
        self.slots.get(id.index as usize).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        if !self.allocator.is_alive(id) {
            return None;
        }
        self.slots.get_mut(id.index as usize).and_then(Option::as_mut)
    }

    /// Like [`entity`](Self::entity), but a missing entity is a state error
    /// of the structural operation at hand.
    fn member(&self, id: EntityId) -> Result<&Entity> {
        self.slot(id).ok_or_else(|| {
            EcsError::state(format!("entity {id} is not in scene '{}'", self.name))
        })
    }

    fn member_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        if !self.contains(id) {
            return Err(EcsError::state(format!(
                "entity {id} is not in scene '{}'",
                self.name
            )));
        }
        self.entity_mut(id)
    }

    fn require_parent(&self, parent: Parent) -> Result<()> {
        match parent {
            Parent::Scene => Ok(()),
            Parent::Entity(id) => self.member(id).map(|_| ()),
        }
    }

    fn children_of(&self, parent: Parent) -> Result<&ChildSet> {
        match parent {
            Parent::Scene => Ok(&self.top),
            Parent::Entity(id) => Ok(self.member(id)?.tree().child_set()),
        }
    }

    fn attach(&mut self, parent: Parent, name: &str, child: EntityId) -> Result<()> {
        match parent {
            Parent::Scene => self.top.insert(name, child),
            Parent::Entity(id) => self.member_mut(id)?.tree_mut().add_child(name, child),
        }
    }

    fn detach(&mut self, parent: Parent, name: &str, child: EntityId) -> Result<()> {
        match parent {
            Parent::Scene => self.top.remove(name, child),
            Parent::Entity(id) => self.member_mut(id)?.tree_mut().remove_child(name, child),
        }
    }

    // ---- creation ----

    /// Create an empty entity with a generated name.
    pub fn create_entity(&mut self, parent: Parent) -> Result<EntityId> {
        self.require_parent(parent)?;
        let name = loop {
            self.generated_names += 1;
            let candidate = format!("entity{}", self.generated_names);
            if !self.children_of(parent)?.contains_name(&candidate) {
                break candidate;
            }
        };
        self.create_named_entity(&name, parent)
    }

    /// Create an empty entity named `name` under `parent`.
    pub fn create_named_entity(&mut self, name: &str, parent: Parent) -> Result<EntityId> {
        let id = self.insert(name, parent, ComponentManager::new(Vec::new())?)?;
        self.flush()?;
        Ok(id)
    }

    /// Instantiate a template as `name` under `parent`, children and
    /// script duplicates included.
    pub fn create_entity_from(
        &mut self,
        name: &str,
        parent: Parent,
        builder: &EntityBuilder,
    ) -> Result<EntityId> {
        require_name(name, "entity name")?;
        if self.children_of(parent)?.contains_name(name) {
            return Err(EcsError::duplicate(Subject::Child, name));
        }
        let plan = Planned::from_builder(builder)?;
        let id = self.instantiate(name, parent, plan)?;
        self.flush()?;
        Ok(id)
    }

    fn instantiate(&mut self, name: &str, parent: Parent, plan: Planned) -> Result<EntityId> {
        let id = self.insert(name, parent, plan.components)?;
        for (child_name, child) in plan.children {
            self.instantiate(&child_name, Parent::Entity(id), child)?;
        }
        for script in plan.scripts {
            self.bind_script(id, script)?;
        }
        Ok(id)
    }

    fn insert(&mut self, name: &str, parent: Parent, components: ComponentManager) -> Result<EntityId> {
        require_name(name, "entity name")?;
        if self.children_of(parent)?.contains_name(name) {
            return Err(EcsError::duplicate(Subject::Child, name));
        }

        let id = self.allocator.allocate();
        if let Err(err) = self.attach(parent, name, id) {
            self.allocator.deallocate(id);
            return Err(err);
        }
        let index = id.index as usize;
        if self.slots.len() <= index {
            self.slots.resize_with(index + 1, || None);
        }
        self.slots[index] = Some(Entity::new(id, name.to_string(), parent, components));
        self.all.push(id);
        trace!(scene = %self.name, entity = %id, name, %parent, "entity created");

        if let Parent::Entity(parent_id) = parent {
            self.pending.push_back(SceneEvent::ChildAdded {
                parent: parent_id,
                child: id,
            });
        }
        self.pending
            .push_back(SceneEvent::EntityAdded { entity: id, parent });
        Ok(id)
    }

    // ---- destruction ----

    /// Detach an entity and destroy it together with its whole subtree.
    ///
    /// Children go before their parents. Each removed entity is handed to
    /// the systems in its last state, then its scripts are deactivated.
    /// Its handle stays stale for good.
    pub fn destroy_entity(&mut self, id: EntityId) -> Result<()> {
        let (name, parent) = {
            let entity = self.member(id)?;
            (entity.name().to_string(), entity.parent())
        };
        self.detach(parent, &name, id)?;
        if let Parent::Entity(parent_id) = parent {
            self.pending.push_back(SceneEvent::ChildRemoved {
                parent: parent_id,
                child: id,
            });
        }
        let mut removed = HashSet::new();
        self.tear_down(id, parent, &mut removed);
        self.all.retain(|e| !removed.contains(e));
        self.touched.retain(|e| !removed.contains(e));
        debug!(
            scene = %self.name,
            entity = %id,
            name = %name,
            removed = removed.len(),
            "entity destroyed"
        );
        self.flush()
    }

    /// Empty the slots of `id` and its subtree, children first, collecting
    /// the freed ids in `removed`.
    fn tear_down(&mut self, id: EntityId, parent: Parent, removed: &mut HashSet<EntityId>) {
        let children = match self.slot(id) {
            Some(entity) => entity.tree().children().to_vec(),
            None => return,
        };
        for child in children {
            self.tear_down(child, Parent::Entity(id), removed);
        }
        let Some(entity) = self.slots.get_mut(id.index as usize).and_then(Option::take) else {
            return;
        };
        self.allocator.deallocate(id);
        removed.insert(id);
        self.pending.push_back(SceneEvent::EntityRemoved {
            entity: Box::new(entity),
            parent,
        });
    }

    // ---- hierarchy ----

    /// Reparent an entity. The local transform is kept as is, so the world
    /// transform generally changes.
    pub fn move_entity(&mut self, id: EntityId, new_parent: Parent) -> Result<()> {
        let (name, old_parent, local) = {
            let entity = self.member(id)?;
            (entity.name().to_string(), entity.parent(), entity.transform())
        };
        self.require_parent(new_parent)?;
        if old_parent == new_parent {
            return Err(EcsError::state(format!(
                "entity {id} is already a child of {new_parent}"
            )));
        }
        if let Parent::Entity(target) = new_parent {
            if self.is_ancestor_or_self(id, target)? {
                return Err(EcsError::state(format!(
                    "cannot move entity {id} below itself"
                )));
            }
        }
        if self.children_of(new_parent)?.contains_name(&name) {
            return Err(EcsError::duplicate(Subject::Child, name));
        }

        let old_world = self.world_transform(id)?;
        self.detach(old_parent, &name, id)?;
        self.attach(new_parent, &name, id)?;
        self.member_mut(id)?.tree_mut().set_parent(new_parent);
        let new_world = self.world_transform(id)?;

        if let Parent::Entity(parent) = old_parent {
            self.pending
                .push_back(SceneEvent::ChildRemoved { parent, child: id });
        }
        if let Parent::Entity(parent) = new_parent {
            self.pending
                .push_back(SceneEvent::ChildAdded { parent, child: id });
        }
        self.pending.push_back(SceneEvent::ParentChanged(ParentChange {
            entity: id,
            old_parent,
            new_parent,
            old_local: local,
            new_local: local,
            old_world,
            new_world,
        }));
        self.pending.push_back(SceneEvent::EntityMoved {
            entity: id,
            old_parent,
            new_parent,
        });
        debug!(scene = %self.name, entity = %id, from = %old_parent, to = %new_parent, "entity moved");
        self.flush()
    }

    fn is_ancestor_or_self(&self, ancestor: EntityId, mut node: EntityId) -> Result<bool> {
        loop {
            if node == ancestor {
                return Ok(true);
            }
            match self.member(node)?.parent() {
                Parent::Scene => return Ok(false),
                Parent::Entity(parent) => node = parent,
            }
        }
    }

    /// Compose the local transforms from the top-level ancestor down to `id`.
    pub fn world_transform(&self, id: EntityId) -> Result<Transform2> {
        let mut chain = Vec::new();
        let mut node = id;
        loop {
            let entity = self.member(node)?;
            chain.push(entity.transform());
            match entity.parent() {
                Parent::Scene => break,
                Parent::Entity(parent) => node = parent,
            }
        }
        Ok(chain
            .iter()
            .rev()
            .fold(Transform2::IDENTITY, |world, local| world.compose(local)))
    }

    /// Resolve a dot-separated path of names, starting at the top level,
    /// e.g. `"player.camera"`.
    pub fn find(&self, path: &str) -> Result<EntityId> {
        require_name(path, "path")?;
        let mut names = path.split('.');
        let mut current = self.top_level_entity(names.next().unwrap_or_default())?;
        for name in names {
            current = self.entity(current)?.tree().child(name)?;
        }
        Ok(current)
    }

    /// Rename an entity. The new name must be free among its siblings.
    pub fn rename_entity(&mut self, id: EntityId, name: &str) -> Result<()> {
        require_name(name, "entity name")?;
        let (old, parent) = {
            let entity = self.member(id)?;
            (entity.name().to_string(), entity.parent())
        };
        match parent {
            Parent::Scene => self.top.rename(&old, name, id)?,
            Parent::Entity(parent) => self
                .member_mut(parent)?
                .tree_mut()
                .rename_child(&old, name, id)?,
        }
        self.member_mut(id)?.set_name(name.to_string());
        Ok(())
    }

    /// Every entity `filter` matches, in creation order.
    pub fn entities_by_filter(&self, filter: &dyn EntityFilter) -> Vec<EntityId> {
        self.all
            .iter()
            .copied()
            .filter(|id| self.slot(*id).is_some_and(|e| filter.matches(e)))
            .collect()
    }

    // ---- components and fields ----

    /// Read a field of an entity.
    pub fn get_field(&self, id: EntityId, identifier: &str) -> Result<FieldValue> {
        self.entity(id)?.get_field(identifier)
    }

    /// Write a field of an entity and announce any transform change.
    pub fn set_field(&mut self, id: EntityId, identifier: &str, value: FieldValue) -> Result<()> {
        self.entity_mut(id)?.set_field(identifier, value)?;
        self.flush()
    }

    /// Replace the local transform of an entity.
    pub fn set_transform(&mut self, id: EntityId, transform: Transform2) -> Result<()> {
        self.entity_mut(id)?.set_transform(transform);
        self.flush()
    }

    /// Attach a component to an entity.
    pub fn add_component(&mut self, id: EntityId, component: Box<dyn Component>) -> Result<()> {
        self.entity_mut(id)?.components_mut().add_component(component)
    }

    /// Detach a component from an entity.
    pub fn remove_component(&mut self, id: EntityId, name: &str) -> Result<Box<dyn Component>> {
        self.entity_mut(id)?.components_mut().remove_component(name)
    }

    /// Swap a component of an entity for one of the same name.
    pub fn replace_component(
        &mut self,
        id: EntityId,
        component: Box<dyn Component>,
    ) -> Result<Box<dyn Component>> {
        self.entity_mut(id)?
            .components_mut()
            .replace_component(component)
    }

    /// Re-index the field identifiers of an entity's components.
    pub fn reload_fields(&mut self, id: EntityId) -> Result<()> {
        self.entity_mut(id)?.components_mut().reload_fields()
    }

    /// Add a tag to an entity.
    pub fn add_tag(&mut self, id: EntityId, tag: &str) -> Result<()> {
        self.entity_mut(id)?.components_mut().tags_mut().add_tag(tag)
    }

    /// Remove a tag from an entity.
    pub fn remove_tag(&mut self, id: EntityId, tag: &str) -> Result<()> {
        self.entity_mut(id)?
            .components_mut()
            .tags_mut()
            .remove_tag(tag)
    }

    /// Register a listener on an entity.
    pub fn add_listener(&mut self, id: EntityId, listener: ListenerHandle) -> Result<()> {
        self.entity_mut(id)?.add_listener(listener)
    }

    /// Unregister a listener from an entity.
    pub fn remove_listener(&mut self, id: EntityId, listener: &ListenerHandle) -> Result<()> {
        self.entity_mut(id)?.remove_listener(listener)
    }

    // ---- scripts ----

    /// Bind a script to an entity. Every system hears about it.
    pub fn add_script(&mut self, id: EntityId, script: ScriptHandle) -> Result<()> {
        self.bind_script(id, script)?;
        self.flush()
    }

    fn bind_script(&mut self, id: EntityId, script: ScriptHandle) -> Result<()> {
        let context = ScriptContext::new(self.game.clone(), self.name.clone(), id);
        self.member_mut(id)?
            .scripts_mut()
            .add(script.clone(), context)?;
        self.pending
            .push_back(SceneEvent::ScriptAdded { entity: id, script });
        Ok(())
    }

    /// Unbind a script. It is deactivated once it is no longer running.
    pub fn remove_script(&mut self, id: EntityId, script: &ScriptHandle) -> Result<()> {
        let detached = self.member_mut(id)?.scripts_mut().detach(script)?;
        self.pending.push_back(SceneEvent::ScriptDetached(detached));
        self.flush()
    }

    /// Run `on_scene_load` on every bound script.
    pub fn on_scene_load(&mut self) -> Result<()> {
        self.run_scripts(|script, scene| script.on_scene_load(scene))
    }

    /// Run `update` on every bound script.
    pub fn update_scripts(&mut self, dt: f32) -> Result<()> {
        self.run_scripts(|script, scene| script.update(scene, dt))
    }

    /// Run `exit` on every bound script.
    pub fn exit_scripts(&mut self) -> Result<()> {
        self.run_scripts(|script, scene| script.exit(scene))
    }

    /// Run `call` on every script bound when the pass starts, skipping the
    /// ones unbound along the way.
    fn run_scripts<F>(&mut self, mut call: F) -> Result<()>
    where
        F: FnMut(&mut dyn Script, &mut Scene) -> Result<()>,
    {
        let scripts: Vec<(EntityId, ScriptHandle)> = self
            .all
            .iter()
            .filter_map(|id| self.slot(*id))
            .flat_map(|e| e.scripts().handles().iter().map(move |s| (e.id(), s.clone())))
            .collect();
        for (id, script) in scripts {
            let bound = self
                .slot(id)
                .is_some_and(|e| e.scripts().contains(&script));
            if !bound {
                continue;
            }
            self.deferred(|scene| {
                let mut running = running_check(script.try_borrow_mut())?;
                call(&mut *running, scene)
            })?;
        }
        Ok(())
    }

    // ---- scene switching ----

    /// Ask the game to switch to another scene at the end of the frame.
    pub fn request_scene(&mut self, name: impl Into<String>) {
        self.requested_scene = Some(name.into());
    }

    /// The pending scene change, if any.
    pub fn requested_scene(&self) -> Option<&str> {
        self.requested_scene.as_deref()
    }

    /// Take the pending scene change, clearing it.
    pub fn take_requested_scene(&mut self) -> Option<String> {
        self.requested_scene.take()
    }

    // ---- dispatch ----

    /// Run `f` with delivery held back, then deliver everything it queued.
    pub fn deferred<R>(&mut self, f: impl FnOnce(&mut Scene) -> Result<R>) -> Result<R> {
        self.deferred += 1;
        let result = f(self);
        self.deferred -= 1;
        let value = result?;
        self.flush()?;
        Ok(value)
    }

    /// Deliver queued notifications. Does nothing while already delivering
    /// or inside [`deferred`](Self::deferred).
    ///
    /// A failing hook stops delivery; the rest stays queued for the next
    /// flush.
    pub fn flush(&mut self) -> Result<()> {
        if self.dispatching || self.deferred > 0 {
            return Ok(());
        }
        self.dispatching = true;
        let result = self.drain();
        self.dispatching = false;
        result
    }

    /// Number of notifications waiting for delivery.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn drain(&mut self) -> Result<()> {
        loop {
            self.collect_transform_changes();
            let Some(event) = self.pending.pop_front() else {
                return Ok(());
            };
            trace!(scene = %self.name, event = event.kind(), "dispatch");
            self.deliver(event)?;
        }
    }

    fn collect_transform_changes(&mut self) {
        for id in std::mem::take(&mut self.touched) {
            let Some(entity) = self.slot_mut(id) else {
                continue;
            };
            if !entity.has_pending_changes() {
                continue;
            }
            let changes = entity.components_mut().transform_mut().take_changes();
            if entity.listeners().is_empty() {
                continue;
            }
            for (old, new) in changes {
                self.pending
                    .push_back(SceneEvent::TransformSet { entity: id, old, new });
            }
        }
    }

    fn listeners_of(&self, id: EntityId) -> Vec<ListenerHandle> {
        self.slot(id)
            .map(|e| e.listeners().to_vec())
            .unwrap_or_default()
    }

    fn active_systems(&self) -> Result<Vec<SystemHandle>> {
        let Some(systems) = self.systems.as_ref().filter(|_| self.active) else {
            return Ok(Vec::new());
        };
        let schedule = systems
            .try_borrow()
            .map_err(|_| EcsError::state("system schedule is being modified"))?;
        Ok(schedule.snapshot().into_iter().map(|(_, s)| s).collect())
    }

    fn event_filter_matches(&self, system: &SystemHandle, entity: &Entity) -> Result<bool> {
        Ok(running_check(system.try_borrow())?
            .event_filter()
            .matches(entity))
    }

    fn deliver(&mut self, event: SceneEvent) -> Result<()> {
        match event {
            SceneEvent::ChildAdded { parent, child } => {
                for listener in self.listeners_of(parent) {
                    running_check(listener.try_borrow_mut())?.child_added(parent, child, self)?;
                }
            }
            SceneEvent::ChildRemoved { parent, child } => {
                for listener in self.listeners_of(parent) {
                    running_check(listener.try_borrow_mut())?.child_removed(parent, child, self)?;
                }
            }
            SceneEvent::ParentChanged(change) => {
                for listener in self.listeners_of(change.entity) {
                    running_check(listener.try_borrow_mut())?.parent_changed(&change, self)?;
                }
            }
            SceneEvent::TransformSet { entity, old, new } => {
                for listener in self.listeners_of(entity) {
                    running_check(listener.try_borrow_mut())?.transform_set(entity, old, new, self)?;
                }
            }
            SceneEvent::EntityAdded { entity, parent } => {
                for system in self.active_systems()? {
                    let Some(current) = self.slot(entity) else { break };
                    if self.event_filter_matches(&system, current)? {
                        running_system(&system)?.entity_added(entity, parent, self)?;
                    }
                }
            }
            SceneEvent::EntityRemoved { entity, parent } => {
                for system in self.active_systems()? {
                    if self.event_filter_matches(&system, &entity)? {
                        running_system(&system)?.entity_removed(&entity, parent, self)?;
                    }
                }
                for script in entity.scripts().handles() {
                    running_check(script.try_borrow_mut())?.deactivate_context();
                }
            }
            SceneEvent::EntityMoved {
                entity,
                old_parent,
                new_parent,
            } => {
                for system in self.active_systems()? {
                    let Some(current) = self.slot(entity) else { break };
                    if self.event_filter_matches(&system, current)? {
                        running_system(&system)?.entity_moved(entity, old_parent, new_parent, self)?;
                    }
                }
            }
            SceneEvent::ScriptAdded { entity, script } => {
                for system in self.active_systems()? {
                    if !self.contains(entity) {
                        break;
                    }
                    running_system(&system)?.script_added(entity, &script, self)?;
                }
            }
            SceneEvent::ScriptDetached(script) => {
                running_check(script.try_borrow_mut())?.deactivate_context();
            }
        }
        Ok(())
    }

    /// The hierarchy as indented text, one entity per line.
    pub fn dump_tree(&self) -> String {
        let mut out = format!("scene '{}' ({} entities)\n", self.name, self.all.len());
        for id in self.top.ids() {
            self.dump_entity(*id, 1, &mut out);
        }
        out
    }

    fn dump_entity(&self, id: EntityId, depth: usize, out: &mut String) {
        let Some(entity) = self.slot(id) else { return };
        let _ = writeln!(
            out,
            "{:indent$}{} {} [{}]",
            "",
            entity.name(),
            entity.transform(),
            entity.components().names().join(", "),
            indent = depth * 2
        );
        for child in entity.tree().children() {
            self.dump_entity(*child, depth + 1, out);
        }
    }
}

fn running_check<T, E>(borrow: std::result::Result<T, E>) -> Result<T> {
    borrow.map_err(|_| EcsError::state("re-entrant call into a running hook"))
}

fn running_system(system: &SystemHandle) -> Result<RefMut<'_, dyn EntitySystem + 'static>> {
    running_check(system.try_borrow_mut())
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("name", &self.name)
            .field("game", &self.game)
            .field("entities", &self.all.len())
            .field("active", &self.active)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dump_tree())
    }
}
