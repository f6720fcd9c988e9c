use std::collections::HashMap;

use phage_ecs::Scene;
use tracing::{debug, info};

use crate::error::{GameError, Result};

/// The scenes of a game, keyed by name, and which one is current.
///
/// Only the current scene is active, so only it notifies systems.
#[derive(Debug, Default)]
pub struct SceneManager {
    scenes: HashMap<String, Scene>,
    current: Option<String>,
}

impl SceneManager {
    /// Create an empty scene manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scene. It stays inactive until made current.
    pub fn add_scene(&mut self, mut scene: Scene) -> Result<()> {
        let name = scene.name().to_string();
        if self.scenes.contains_key(&name) {
            return Err(GameError::DuplicateScene(name));
        }
        scene.set_active(false);
        debug!(scene = %name, "scene added");
        self.scenes.insert(name, scene);
        Ok(())
    }

    /// Take a scene out of the game. The current scene cannot be removed.
    pub fn remove_scene(&mut self, name: &str) -> Result<Scene> {
        if !self.scenes.contains_key(name) {
            return Err(GameError::UnknownScene(name.to_string()));
        }
        if self.current.as_deref() == Some(name) {
            return Err(GameError::RemoveCurrent(name.to_string()));
        }
        self.scenes
            .remove(name)
            .ok_or_else(|| GameError::UnknownScene(name.to_string()))
    }

    /// Check whether a scene with this name exists.
    pub fn has_scene(&self, name: &str) -> bool {
        self.scenes.contains_key(name)
    }

    /// Get a scene by name.
    pub fn scene(&self, name: &str) -> Result<&Scene> {
        self.scenes
            .get(name)
            .ok_or_else(|| GameError::UnknownScene(name.to_string()))
    }

    /// Get a scene by name, mutably.
    pub fn scene_mut(&mut self, name: &str) -> Result<&mut Scene> {
        self.scenes
            .get_mut(name)
            .ok_or_else(|| GameError::UnknownScene(name.to_string()))
    }

    /// Make `name` the current scene and return the previous one's name.
    ///
    /// Only flips which scene is active; the game runs the load hooks.
    pub fn set_current(&mut self, name: &str) -> Result<Option<String>> {
        if !self.scenes.contains_key(name) {
            return Err(GameError::UnknownScene(name.to_string()));
        }
        let old = self.current.replace(name.to_string());
        if let Some(previous) = old.as_deref().and_then(|n| self.scenes.get_mut(n)) {
            previous.set_active(false);
        }
        if let Some(scene) = self.scenes.get_mut(name) {
            scene.set_active(true);
        }
        info!(from = ?old, to = name, "current scene changed");
        Ok(old)
    }

    /// Name of the current scene.
    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// The current scene.
    pub fn current(&self) -> Option<&Scene> {
        self.current.as_deref().and_then(|n| self.scenes.get(n))
    }

    /// The current scene, mutably.
    pub fn current_mut(&mut self) -> Option<&mut Scene> {
        let name = self.current.as_deref()?;
        self.scenes.get_mut(name)
    }

    /// Scene names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.scenes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of scenes.
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    /// Check whether there are no scenes.
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Log the hierarchy of every scene at debug level.
    pub fn dump(&self) {
        for name in self.names() {
            if let Some(scene) = self.scenes.get(name) {
                debug!("{}", scene.dump_tree());
            }
        }
        debug!(current = ?self.current, "scene dump done");
    }
}
