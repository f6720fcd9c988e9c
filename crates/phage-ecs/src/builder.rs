use phage_core::Transform2;

use crate::component::{Component, ComponentBuilder};
use crate::error::{require_name, EcsError, Result, Subject};
use crate::manager::{is_builtin, ComponentManager};
use crate::script::ScriptHandle;
use crate::tags::{CTags, TagList};
use crate::transform::CTransform;

/// A reusable template for a subtree of entities.
///
/// Holds component builders, an initial transform and tag list, named
/// child templates, and prototype scripts that each instance receives a
/// duplicate of.
#[derive(Default)]
pub struct EntityBuilder {
    components: Vec<Box<dyn ComponentBuilder>>,
    tags: TagList,
    transform: Transform2,
    children: Vec<(String, EntityBuilder)>,
    scripts: Vec<ScriptHandle>,
}

impl EntityBuilder {
    /// Create an empty template: no extra components, no tags, identity transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component builder. Built-in and repeated names are rejected.
    pub fn add_component(&mut self, builder: Box<dyn ComponentBuilder>) -> Result<()> {
        let name = builder.name();
        require_name(name, "component name")?;
        if is_builtin(name) || self.components.iter().any(|b| b.name() == name) {
            return Err(EcsError::duplicate(Subject::Component, name));
        }
        self.components.push(builder);
        Ok(())
    }

    /// Builder form of [`add_component`](Self::add_component).
    pub fn with_component(mut self, builder: Box<dyn ComponentBuilder>) -> Result<Self> {
        self.add_component(builder)?;
        Ok(self)
    }

    /// Add a builder stamping out clones of `prototype`.
    pub fn with_prototype<C: Component + Clone>(self, prototype: C) -> Result<Self> {
        self.with_component(prototype.builder())
    }

    /// Set the tags every instance starts with.
    pub fn with_tags(mut self, tags: TagList) -> Self {
        self.tags = tags;
        self
    }

    /// Set the local transform every instance starts with.
    pub fn with_transform(mut self, transform: Transform2) -> Self {
        self.transform = transform;
        self
    }

    /// Add a named child template. Names must be unique among the children.
    pub fn add_child(&mut self, name: &str, child: EntityBuilder) -> Result<()> {
        require_name(name, "child name")?;
        if self.children.iter().any(|(n, _)| n == name) {
            return Err(EcsError::duplicate(Subject::Child, name));
        }
        self.children.push((name.to_string(), child));
        Ok(())
    }

    /// Builder form of [`add_child`](Self::add_child).
    pub fn with_child(mut self, name: &str, child: EntityBuilder) -> Result<Self> {
        self.add_child(name, child)?;
        Ok(self)
    }

    /// Every instance gets its own [`duplicate`](crate::Script::duplicate)
    /// of `script`.
    pub fn with_script(mut self, script: ScriptHandle) -> Self {
        self.scripts.push(script);
        self
    }

    /// Names of the components this template adds, in insertion order.
    pub fn component_names(&self) -> Vec<&str> {
        self.components.iter().map(|b| b.name()).collect()
    }

    /// Initial tags.
    pub fn tags(&self) -> &TagList {
        &self.tags
    }

    /// Initial local transform.
    pub fn transform(&self) -> Transform2 {
        self.transform
    }

    /// Child templates with their names.
    pub fn children(&self) -> &[(String, EntityBuilder)] {
        &self.children
    }

    /// Prototype scripts. Each instance gets its own duplicate.
    pub fn scripts(&self) -> &[ScriptHandle] {
        &self.scripts
    }

    /// Build the components of one instance.
    pub(crate) fn build_components(&self) -> Result<ComponentManager> {
        let mut components = Vec::with_capacity(self.components.len());
        for builder in &self.components {
            let component = builder.build();
            if component.name() != builder.name() {
                return Err(EcsError::usage(format!(
                    "builder '{}' produced component '{}'",
                    builder.name(),
                    component.name()
                )));
            }
            components.push(component);
        }
        ComponentManager::with_builtins(
            CTransform::new(self.transform),
            CTags::new(self.tags.clone()),
            components,
        )
    }
}
