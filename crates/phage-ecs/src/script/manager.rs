use std::rc::Rc;

use super::{ScriptContext, ScriptHandle};
use crate::error::{EcsError, Result, Subject};

/// The scripts bound to one entity, in insertion order.
#[derive(Default)]
pub struct ScriptManager {
    scripts: Vec<ScriptHandle>,
}

impl ScriptManager {
    /// Create an empty script manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `script` under `context`. The same script instance cannot be
    /// added twice. A script whose context setup fails is left unbound with
    /// its context cleared.
    pub fn add(&mut self, script: ScriptHandle, context: ScriptContext) -> Result<()> {
        if self.contains(&script) {
            return Err(EcsError::duplicate(Subject::Script, script_name(&script)));
        }
        {
            let mut bound = script.try_borrow_mut().map_err(|_| busy())?;
            if let Err(err) = bound.set_context(context) {
                bound.deactivate_context();
                return Err(err);
            }
        }
        self.scripts.push(script);
        Ok(())
    }

    /// Unbind without touching the script; the scene deactivates it once the
    /// detach has been delivered.
    pub(crate) fn detach(&mut self, script: &ScriptHandle) -> Result<ScriptHandle> {
        let position = self.position(script)?;
        Ok(self.scripts.remove(position))
    }

    fn position(&self, script: &ScriptHandle) -> Result<usize> {
        self.scripts
            .iter()
            .position(|s| Rc::ptr_eq(s, script))
            .ok_or_else(|| EcsError::not_found(Subject::Script, script_name(script)))
    }

    /// Check whether this exact script instance is bound.
    pub fn contains(&self, script: &ScriptHandle) -> bool {
        self.scripts.iter().any(|s| Rc::ptr_eq(s, script))
    }

    /// Bound scripts, in insertion order.
    pub fn handles(&self) -> &[ScriptHandle] {
        &self.scripts
    }

    /// Number of bound scripts.
    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    /// Check whether no script is bound.
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

fn script_name(script: &ScriptHandle) -> String {
    script
        .try_borrow()
        .map(|s| s.name().to_string())
        .unwrap_or_else(|_| "<running>".to_string())
}

fn busy() -> EcsError {
    EcsError::state("script is running")
}
