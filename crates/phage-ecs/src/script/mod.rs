//! Binding of behavior scripts to entities.
//!
//! A [`Script`] is driven by the scene it lives in: it receives a
//! [`ScriptContext`] when bound, named [`ScriptObject`] bindings from
//! systems, and lifecycle calls while its scene is current. How a script
//! executes is up to its engine; [`NativeScript`] runs Rust closures.

mod manager;
mod native;

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub use manager::ScriptManager;
pub use native::{NativeFn, NativeScript, ScriptCall};

use crate::entity::EntityId;
use crate::error::Result;
use crate::scene::Scene;
use crate::value::FieldValue;

/// Function run when a scene becomes current.
pub const SCENE_LOAD: &str = "onSceneLoad";
/// Function run once per frame with the frame delta.
pub const UPDATE: &str = "update";
/// Function run when the game stops.
pub const EXIT: &str = "exit";

pub type ScriptHandle = Rc<RefCell<dyn Script>>;

/// Who a script runs for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptContext {
    pub game: String,
    pub scene: String,
    pub entity: EntityId,
}

impl ScriptContext {
    /// Create the context for a script bound to `entity`.
    pub fn new(game: impl Into<String>, scene: impl Into<String>, entity: EntityId) -> Self {
        Self {
            game: game.into(),
            scene: scene.into(),
            entity,
        }
    }
}

/// A named engine object injected into a script.
#[derive(Clone)]
pub struct ScriptObject {
    name: String,
    object: Rc<dyn Any>,
}

impl ScriptObject {
    /// Wrap `object` for injection under `name`.
    pub fn new<T: Any>(name: impl Into<String>, object: T) -> Self {
        Self::from_rc(name, Rc::new(object))
    }

    /// Wrap an already shared object.
    pub fn from_rc(name: impl Into<String>, object: Rc<dyn Any>) -> Self {
        Self {
            name: name.into(),
            object,
        }
    }

    /// The binding name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check whether the object is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.object.is::<T>()
    }

    /// Get the object as a `T`.
    pub fn get<T: Any>(&self) -> Option<Rc<T>> {
        self.object.clone().downcast::<T>().ok()
    }
}

impl fmt::Debug for ScriptObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptObject").field("name", &self.name).finish()
    }
}

/// A unit of behavior bound to one entity.
pub trait Script {
    fn name(&self) -> &str;

    /// Bind to an entity. Runs the script's own initialization.
    fn set_context(&mut self, context: ScriptContext) -> Result<()>;

    fn deactivate_context(&mut self);

    fn context(&self) -> Option<&ScriptContext>;

    /// Make `object` visible to the script under `name`.
    fn bind(&mut self, name: &str, object: ScriptObject);

    /// Call a function of the script. Undefined functions do nothing and
    /// return `None`.
    fn call_func(
        &mut self,
        name: &str,
        args: &[FieldValue],
        scene: &mut Scene,
    ) -> Result<Option<FieldValue>>;

    /// A fresh, unbound copy for another entity.
    fn duplicate(&self) -> ScriptHandle;

    fn on_scene_load(&mut self, scene: &mut Scene) -> Result<()> {
        self.call_func(SCENE_LOAD, &[], scene).map(|_| ())
    }

    fn update(&mut self, scene: &mut Scene, dt: f32) -> Result<()> {
        self.call_func(UPDATE, &[FieldValue::Float(dt)], scene)
            .map(|_| ())
    }

    fn exit(&mut self, scene: &mut Scene) -> Result<()> {
        self.call_func(EXIT, &[], scene).map(|_| ())
    }
}
