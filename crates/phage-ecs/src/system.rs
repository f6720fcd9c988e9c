use std::cell::RefCell;
use std::rc::Rc;

use crate::entity::{Entity, EntityId};
use crate::error::{EcsError, Result, Subject};
use crate::filter::EntityFilter;
use crate::scene::Scene;
use crate::script::ScriptHandle;
use crate::tree::Parent;

/// A per-frame observer and mutator of the entities its filters select.
///
/// The update filter picks the entities passed to
/// [`update_entity`](Self::update_entity); the event filter gates the
/// structural hooks. Both are fixed for the lifetime of the system.
/// Every hook defaults to doing nothing.
pub trait EntitySystem {
    /// Unique name, referenced by the configured system order.
    fn name(&self) -> &str;

    fn update_filter(&self) -> &dyn EntityFilter;

    fn event_filter(&self) -> &dyn EntityFilter;

    /// The current scene changed. Rebuild any cache from `scene`.
    fn scene_changed(&mut self, old: Option<&str>, scene: &mut Scene) -> Result<()> {
        let _ = (old, scene);
        Ok(())
    }

    fn entity_added(&mut self, entity: EntityId, parent: Parent, scene: &mut Scene) -> Result<()> {
        let _ = (entity, parent, scene);
        Ok(())
    }

    /// `entity` is already detached; it is passed in its last state.
    fn entity_removed(&mut self, entity: &Entity, parent: Parent, scene: &mut Scene) -> Result<()> {
        let _ = (entity, parent, scene);
        Ok(())
    }

    fn entity_moved(
        &mut self,
        entity: EntityId,
        old_parent: Parent,
        new_parent: Parent,
        scene: &mut Scene,
    ) -> Result<()> {
        let _ = (entity, old_parent, new_parent, scene);
        Ok(())
    }

    /// A script was bound to `entity`. Sent to every system regardless of
    /// filters, so any of them can inject bindings.
    fn script_added(&mut self, entity: EntityId, script: &ScriptHandle, scene: &mut Scene) -> Result<()> {
        let _ = (entity, script, scene);
        Ok(())
    }

    fn update(&mut self, scene: &mut Scene, dt: f32) -> Result<()> {
        let _ = (scene, dt);
        Ok(())
    }

    fn update_entity(&mut self, entity: EntityId, scene: &mut Scene, dt: f32) -> Result<()> {
        let _ = (entity, scene, dt);
        Ok(())
    }

    fn post_update(&mut self, scene: &mut Scene) -> Result<()> {
        let _ = scene;
        Ok(())
    }
}

pub type SystemHandle = Rc<RefCell<dyn EntitySystem>>;

/// The ordered list of systems run each frame.
///
/// Order is a correctness contract: later systems see what earlier ones
/// wrote in the same frame. Names are read once, at registration.
#[derive(Default)]
pub struct SystemSchedule {
    systems: Vec<(String, SystemHandle)>,
}

impl SystemSchedule {
    /// Create an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a system to the end of the schedule.
    pub fn add_system<S: EntitySystem + 'static>(&mut self, system: S) -> Result<SystemHandle> {
        let handle: SystemHandle = Rc::new(RefCell::new(system));
        self.add_handle(handle.clone())?;
        Ok(handle)
    }

    /// Add an already shared system. Names must be unique.
    pub fn add_handle(&mut self, handle: SystemHandle) -> Result<()> {
        let name = handle
            .try_borrow()
            .map_err(|_| EcsError::state("cannot register a system while it runs"))?
            .name()
            .to_string();
        if name.is_empty() {
            return Err(EcsError::usage("system name must not be empty"));
        }
        if self.position(&name).is_some() {
            return Err(EcsError::duplicate(Subject::System, name));
        }
        tracing::debug!(system = %name, position = self.systems.len(), "system registered");
        self.systems.push((name, handle));
        Ok(())
    }

    /// Remove a system by name.
    pub fn remove_system(&mut self, name: &str) -> Result<SystemHandle> {
        let position = self
            .position(name)
            .ok_or_else(|| EcsError::not_found(Subject::System, name))?;
        Ok(self.systems.remove(position).1)
    }

    /// Get a system by name.
    pub fn get(&self, name: &str) -> Option<SystemHandle> {
        self.position(name).map(|i| self.systems[i].1.clone())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.systems.iter().position(|(n, _)| n == name)
    }

    /// A copy of the current order, safe to iterate while systems mutate
    /// the schedule.
    pub fn snapshot(&self) -> Vec<(String, SystemHandle)> {
        self.systems.clone()
    }

    /// System names in run order.
    pub fn names(&self) -> Vec<String> {
        self.systems.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Move the named systems to the front, in the given order. Systems not
    /// named keep their relative order behind them.
    pub fn apply_order(&mut self, order: &[String]) -> Result<()> {
        let mut rest = self.systems.clone();
        let mut ordered = Vec::with_capacity(rest.len());
        for (i, name) in order.iter().enumerate() {
            if order[..i].contains(name) {
                return Err(EcsError::duplicate(Subject::System, name.as_str()));
            }
            let position = rest
                .iter()
                .position(|(n, _)| n == name)
                .ok_or_else(|| EcsError::not_found(Subject::System, name.as_str()))?;
            ordered.push(rest.remove(position));
        }
        ordered.extend(rest);
        self.systems = ordered;
        tracing::info!(order = ?self.names(), "system order applied");
        Ok(())
    }

    /// Number of systems.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// Check whether the schedule is empty.
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}
