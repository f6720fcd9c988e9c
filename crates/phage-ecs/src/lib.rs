//! Phage ECS - scene graph and entity component model
//!
//! Entities live in a [`Scene`] tree. Each one carries named components whose
//! fields are addressed by identifier, a transform relative to its parent,
//! a tag list and any number of bound scripts. Systems select entities with
//! filters and are told about structural changes; listeners watch a single
//! entity.

mod builder;
mod component;
mod entity;
mod error;
mod event;
mod fields;
mod filter;
mod listener;
mod manager;
mod scene;
pub mod script;
mod script_data;
mod system;
mod tags;
mod transform;
mod tree;
mod value;

pub use builder::EntityBuilder;
pub use component::{AsAny, Component, ComponentBuilder, FnBuilder, PrototypeBuilder};
pub use entity::{Entity, EntityId};
pub use error::{EcsError, ErrorKind, Result, Subject};
pub use fields::FieldManager;
pub use filter::{CompositeEntityFilter, EntityFilter, NoEntities, SimpleEntityFilter};
pub use listener::{EntityListener, ParentChange};
pub use manager::{is_builtin, ComponentManager, BUILTIN_COMPONENTS};
pub use scene::Scene;
pub use script::{Script, ScriptContext, ScriptHandle, ScriptObject};
pub use script_data::CScriptData;
pub use system::{EntitySystem, SystemHandle, SystemSchedule};
pub use tags::{CTags, TagList};
pub use transform::CTransform;
pub use tree::{ChildSet, Parent, TreeManager};
pub use value::FieldValue;
