use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::{Script, ScriptContext, ScriptHandle, ScriptObject};
use crate::entity::EntityId;
use crate::error::{EcsError, Result};
use crate::scene::Scene;
use crate::value::FieldValue;

pub type NativeFn = Rc<dyn Fn(&mut ScriptCall<'_>) -> Result<Option<FieldValue>>>;

/// What a native script function can see while it runs.
pub struct ScriptCall<'a> {
    context: &'a ScriptContext,
    bindings: &'a HashMap<String, ScriptObject>,
    scene: Option<&'a mut Scene>,
    args: &'a [FieldValue],
}

impl<'a> ScriptCall<'a> {
    /// The context of the running script.
    pub fn context(&self) -> &ScriptContext {
        self.context
    }

    /// The entity the script is bound to.
    pub fn entity(&self) -> EntityId {
        self.context.entity
    }

    /// Arguments of this call.
    pub fn args(&self) -> &[FieldValue] {
        self.args
    }

    /// Get one argument, failing if it was not passed.
    pub fn arg(&self, index: usize) -> Result<&FieldValue> {
        self.args
            .get(index)
            .ok_or_else(|| EcsError::Script(format!("missing argument {index}")))
    }

    /// Get an injected binding by name.
    pub fn binding(&self, name: &str) -> Result<&ScriptObject> {
        self.bindings
            .get(name)
            .ok_or_else(|| EcsError::Script(format!("no binding named '{name}'")))
    }

    /// The scene the script runs in. Not available during `onContextSet`.
    pub fn scene(&mut self) -> Result<&mut Scene> {
        self.scene
            .as_deref_mut()
            .ok_or_else(|| EcsError::Script("no scene available in this call".to_string()))
    }
}

/// A script whose functions are Rust closures, looked up by name.
#[derive(Clone)]
pub struct NativeScript {
    name: String,
    functions: HashMap<String, NativeFn>,
    bindings: HashMap<String, ScriptObject>,
    context: Option<ScriptContext>,
}

impl NativeScript {
    /// Run once the script is bound to an entity, without scene access.
    pub const CONTEXT_SET: &'static str = "onContextSet";

    /// Create a script with no functions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: HashMap::new(),
            bindings: HashMap::new(),
            context: None,
        }
    }

    /// Builder form of [`define`](Self::define).
    pub fn with_fn<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&mut ScriptCall<'_>) -> Result<Option<FieldValue>> + 'static,
    {
        self.define(name, function);
        self
    }

    /// Register `function` under `name`, replacing any previous one.
    pub fn define<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&mut ScriptCall<'_>) -> Result<Option<FieldValue>> + 'static,
    {
        self.functions.insert(name.into(), Rc::new(function));
    }

    /// Check whether a function is registered.
    pub fn has_fn(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Objects injected by systems.
    pub fn bindings(&self) -> &HashMap<String, ScriptObject> {
        &self.bindings
    }

    /// Wrap this script in a shared handle.
    pub fn into_handle(self) -> ScriptHandle {
        Rc::new(RefCell::new(self))
    }

    fn invoke(
        &mut self,
        name: &str,
        args: &[FieldValue],
        scene: Option<&mut Scene>,
    ) -> Result<Option<FieldValue>> {
        let Some(function) = self.functions.get(name).cloned() else {
            return Ok(None);
        };
        let Some(context) = self.context.as_ref() else {
            return Err(EcsError::Script(format!(
                "script '{}' called '{name}' without a context",
                self.name
            )));
        };
        let mut call = ScriptCall {
            context,
            bindings: &self.bindings,
            scene,
            args,
        };
        function(&mut call)
    }
}

impl Script for NativeScript {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_context(&mut self, context: ScriptContext) -> Result<()> {
        self.context = Some(context);
        self.invoke(Self::CONTEXT_SET, &[], None).map(|_| ())
    }

    fn deactivate_context(&mut self) {
        self.context = None;
    }

    fn context(&self) -> Option<&ScriptContext> {
        self.context.as_ref()
    }

    fn bind(&mut self, name: &str, object: ScriptObject) {
        self.bindings.insert(name.to_string(), object);
    }

    fn call_func(
        &mut self,
        name: &str,
        args: &[FieldValue],
        scene: &mut Scene,
    ) -> Result<Option<FieldValue>> {
        self.invoke(name, args, Some(scene))
    }

    /// Shares the functions; bindings and context start empty.
    fn duplicate(&self) -> ScriptHandle {
        NativeScript {
            name: self.name.clone(),
            functions: self.functions.clone(),
            bindings: HashMap::new(),
            context: None,
        }
        .into_handle()
    }
}
