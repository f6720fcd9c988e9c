use std::any::Any;

use crate::error::Result;
use crate::value::FieldValue;

/// Upcast helper so `dyn Component` can be downcast to its concrete type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A named bundle of fields attached to an entity.
///
/// The identifiers a component reports must stay stable until the owning
/// entity is told to reload its field index. `get`/`set` fail with
/// [`EcsError::UnknownField`](crate::EcsError::UnknownField) for identifiers
/// the component does not own.
pub trait Component: AsAny {
    /// Name, unique among the components of one entity.
    fn name(&self) -> &str;

    /// Field identifiers owned by this component.
    fn identifiers(&self) -> Vec<String>;

    fn get(&self, identifier: &str) -> Result<FieldValue>;

    fn set(&mut self, identifier: &str, value: FieldValue) -> Result<()>;

    /// A builder stamping out copies of this component as it is now.
    fn builder(&self) -> Box<dyn ComponentBuilder>
    where
        Self: Sized + Clone,
    {
        Box::new(PrototypeBuilder::new(self.clone()))
    }
}

impl<'a> dyn Component + 'a {
    /// Check whether this component is a `T`.
    pub fn is<T: Component>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Downcast to a concrete component type.
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Mutable downcast to a concrete component type.
    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// Factory for fresh component instances, used by entity templates.
pub trait ComponentBuilder {
    /// Name of the component this builder produces.
    fn name(&self) -> &str;

    fn build(&self) -> Box<dyn Component>;
}

/// Builds clones of a prototype component.
#[derive(Debug, Clone)]
pub struct PrototypeBuilder<C> {
    prototype: C,
}

impl<C: Component + Clone> PrototypeBuilder<C> {
    /// Create a builder cloning `prototype`.
    pub fn new(prototype: C) -> Self {
        Self { prototype }
    }
}

impl<C: Component + Clone> ComponentBuilder for PrototypeBuilder<C> {
    fn name(&self) -> &str {
        self.prototype.name()
    }

    fn build(&self) -> Box<dyn Component> {
        Box::new(self.prototype.clone())
    }
}

/// Builds components with a closure.
pub struct FnBuilder<F> {
    name: String,
    make: F,
}

impl<F: Fn() -> Box<dyn Component>> FnBuilder<F> {
    /// Create a builder named `name` that calls `make` for every instance.
    pub fn new(name: impl Into<String>, make: F) -> Self {
        Self {
            name: name.into(),
            make,
        }
    }
}

impl<F: Fn() -> Box<dyn Component>> ComponentBuilder for FnBuilder<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn build(&self) -> Box<dyn Component> {
        (self.make)()
    }
}
