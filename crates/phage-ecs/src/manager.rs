use crate::component::Component;
use crate::error::{require_name, EcsError, Result, Subject};
use crate::fields::{FieldManager, Slot};
use crate::script_data::CScriptData;
use crate::tags::CTags;
use crate::transform::CTransform;
use crate::value::FieldValue;

/// Names taken by the components every entity carries.
pub const BUILTIN_COMPONENTS: [&str; 3] = [CTransform::NAME, CTags::NAME, CScriptData::NAME];

/// Check whether `name` is reserved for a built-in component.
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_COMPONENTS.contains(&name)
}

/// The components attached to one entity.
///
/// Transform, tags and script data are always present and held as typed
/// fields; everything else is a boxed [`Component`]. Names are unique and
/// every declared field identifier resolves to exactly one component.
/// Operations that change the component set rebuild the field index first
/// and leave the manager untouched if that fails.
pub struct ComponentManager {
    transform: CTransform,
    tags: CTags,
    script_data: CScriptData,
    extra: Vec<Box<dyn Component>>,
    fields: FieldManager,
}

impl ComponentManager {
    /// Build a manager with default built-ins plus `components`.
    pub fn new(components: Vec<Box<dyn Component>>) -> Result<Self> {
        Self::with_builtins(CTransform::default(), CTags::default(), components)
    }

    /// Build a manager with the given transform and tags plus `components`.
    ///
    /// Fails on empty, reserved or repeated component names and on identifiers declared twice.
    pub fn with_builtins(
        transform: CTransform,
        tags: CTags,
        components: Vec<Box<dyn Component>>,
    ) -> Result<Self> {
        let mut seen: Vec<&str> = Vec::with_capacity(components.len());
        for component in &components {
            let name = component.name();
            require_name(name, "component name")?;
            if is_builtin(name) || seen.contains(&name) {
                return Err(EcsError::duplicate(Subject::Component, name));
            }
            seen.push(name);
        }

        let mut manager = Self {
            transform,
            tags,
            script_data: CScriptData::new(),
            extra: components,
            fields: FieldManager::default(),
        };
        manager.reload_fields()?;
        Ok(manager)
    }

    fn index<'a>(&'a self, extra: &[&'a dyn Component]) -> Result<FieldManager> {
        let builtins: [(Slot, &'a dyn Component); 2] = [
            (Slot::Transform, &self.transform),
            (Slot::Tags, &self.tags),
        ];
        FieldManager::build(
            builtins.into_iter().chain(
                extra
                    .iter()
                    .enumerate()
                    .map(|(i, component)| (Slot::Extra(i), *component)),
            ),
        )
    }

    fn slot(&self, name: &str) -> Option<Slot> {
        match name {
            CTransform::NAME => Some(Slot::Transform),
            CTags::NAME => Some(Slot::Tags),
            CScriptData::NAME => Some(Slot::ScriptData),
            _ => self
                .extra
                .iter()
                .position(|c| c.name() == name)
                .map(Slot::Extra),
        }
    }

    fn at(&self, slot: Slot) -> &dyn Component {
        match slot {
            Slot::Transform => &self.transform,
            Slot::Tags => &self.tags,
            Slot::ScriptData => &self.script_data,
            Slot::Extra(i) => self.extra[i].as_ref(),
        }
    }

    fn at_mut(&mut self, slot: Slot) -> &mut dyn Component {
        match slot {
            Slot::Transform => &mut self.transform,
            Slot::Tags => &mut self.tags,
            Slot::ScriptData => &mut self.script_data,
            Slot::Extra(i) => self.extra[i].as_mut(),
        }
    }

    fn require_slot(&self, name: &str) -> Result<Slot> {
        require_name(name, "component name")?;
        self.slot(name)
            .ok_or_else(|| EcsError::not_found(Subject::Component, name))
    }

    /// Re-run the identifier index, picking up identifiers a component added
    /// or dropped since the last pass.
    pub fn reload_fields(&mut self) -> Result<()> {
        let fields = {
            let view: Vec<&dyn Component> = self.extra.iter().map(|c| c.as_ref()).collect();
            self.index(&view)?
        };
        self.install(fields);
        Ok(())
    }

    /// Swap in a rebuilt index. Script-data entries for identifiers a
    /// component now declares are dropped, so each identifier has one owner.
    fn install(&mut self, fields: FieldManager) {
        for identifier in fields.identifiers() {
            if self.script_data.remove(identifier).is_some() {
                tracing::debug!(identifier, "declared field replaces script data");
            }
        }
        self.fields = fields;
    }

    /// Get a component by name, built-ins included.
    pub fn get_component(&self, name: &str) -> Result<&dyn Component> {
        let slot = self.require_slot(name)?;
        Ok(self.at(slot))
    }

    /// Mutable access to a component. Call [`reload_fields`](Self::reload_fields)
    /// afterwards if its identifiers changed.
    pub fn get_component_mut(&mut self, name: &str) -> Result<&mut dyn Component> {
        let slot = self.require_slot(name)?;
        Ok(self.at_mut(slot))
    }

    /// Typed access to a component.
    pub fn component<T: Component>(&self, name: &str) -> Result<&T> {
        self.get_component(name)?
            .downcast_ref::<T>()
            .ok_or_else(|| type_mismatch::<T>(name))
    }

    /// Typed mutable access to a component.
    pub fn component_mut<T: Component>(&mut self, name: &str) -> Result<&mut T> {
        self.get_component_mut(name)?
            .downcast_mut::<T>()
            .ok_or_else(|| type_mismatch::<T>(name))
    }

    /// Check whether a component with this name is attached.
    pub fn has_component(&self, name: &str) -> bool {
        self.slot(name).is_some()
    }

    /// All components, built-ins first, then the others in insertion order.
    pub fn all(&self) -> Vec<&dyn Component> {
        let mut all: Vec<&dyn Component> = Vec::with_capacity(3 + self.extra.len());
        all.push(&self.transform);
        all.push(&self.tags);
        all.push(&self.script_data);
        all.extend(self.extra.iter().map(|c| c.as_ref()));
        all
    }

    /// Component names, built-ins first.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = BUILTIN_COMPONENTS.to_vec();
        names.extend(self.extra.iter().map(|c| c.name()));
        names
    }

    /// The identifier index.
    pub fn fields(&self) -> &FieldManager {
        &self.fields
    }

    /// Check whether a component or the script data holds this field.
    pub fn has_field(&self, identifier: &str) -> bool {
        self.fields.contains(identifier) || self.script_data.contains(identifier)
    }

    /// Read a field from whichever component declares it, else from the
    /// script-data bag.
    pub fn get_field(&self, identifier: &str) -> Result<FieldValue> {
        require_name(identifier, "identifier")?;
        match self.fields.owner(identifier) {
            Some(slot) => self.at(slot).get(identifier),
            None if self.script_data.contains(identifier) => self.script_data.get(identifier),
            None => Err(EcsError::not_found(Subject::Field, identifier)),
        }
    }

    /// Write a field on whichever component declares it. Undeclared
    /// identifiers are stored in the script-data bag.
    pub fn set_field(&mut self, identifier: &str, value: FieldValue) -> Result<()> {
        require_name(identifier, "identifier")?;
        match self.fields.owner(identifier) {
            Some(slot) => self.at_mut(slot).set(identifier, value),
            None => self.script_data.set(identifier, value),
        }
    }

    /// Attach a component. Its identifiers must not clash with existing ones.
    pub fn add_component(&mut self, component: Box<dyn Component>) -> Result<()> {
        let name = component.name();
        require_name(name, "component name")?;
        if self.has_component(name) {
            return Err(EcsError::duplicate(Subject::Component, name));
        }
        let fields = {
            let mut view: Vec<&dyn Component> = self.extra.iter().map(|c| c.as_ref()).collect();
            view.push(component.as_ref());
            self.index(&view)?
        };
        self.extra.push(component);
        self.install(fields);
        Ok(())
    }

    /// Detach a component. Built-ins cannot be removed.
    pub fn remove_component(&mut self, name: &str) -> Result<Box<dyn Component>> {
        let position = self.extra_position(name)?;
        let fields = {
            let view: Vec<&dyn Component> = self
                .extra
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != position)
                .map(|(_, c)| c.as_ref())
                .collect();
            self.index(&view)?
        };
        let removed = self.extra.remove(position);
        self.install(fields);
        Ok(removed)
    }

    /// Swap in a component for the existing one of the same name, returning
    /// the old instance.
    pub fn replace_component(&mut self, component: Box<dyn Component>) -> Result<Box<dyn Component>> {
        let position = self.extra_position(component.name())?;
        let fields = {
            let view: Vec<&dyn Component> = self
                .extra
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    if i == position {
                        component.as_ref()
                    } else {
                        c.as_ref()
                    }
                })
                .collect();
            self.index(&view)?
        };
        let old = std::mem::replace(&mut self.extra[position], component);
        self.install(fields);
        Ok(old)
    }

    fn extra_position(&self, name: &str) -> Result<usize> {
        match self.require_slot(name)? {
            Slot::Extra(i) => Ok(i),
            _ => Err(EcsError::state(format!(
                "built-in component '{name}' cannot be removed or replaced"
            ))),
        }
    }

    /// The built-in transform component.
    pub fn transform(&self) -> &CTransform {
        &self.transform
    }

    /// Mutable access to the built-in transform.
    pub fn transform_mut(&mut self) -> &mut CTransform {
        &mut self.transform
    }

    /// The built-in tags component.
    pub fn tags(&self) -> &CTags {
        &self.tags
    }

    /// Mutable access to the built-in tags.
    pub fn tags_mut(&mut self) -> &mut CTags {
        &mut self.tags
    }

    /// The script-data bag.
    pub fn script_data(&self) -> &CScriptData {
        &self.script_data
    }

    /// Mutable access to the script-data bag.
    pub fn script_data_mut(&mut self) -> &mut CScriptData {
        &mut self.script_data
    }
}

fn type_mismatch<T>(name: &str) -> EcsError {
    EcsError::usage(format!(
        "component '{name}' is not a {}",
        std::any::type_name::<T>()
    ))
}

impl std::fmt::Debug for ComponentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentManager")
            .field("components", &self.names())
            .field("fields", &self.fields.len())
            .finish()
    }
}
