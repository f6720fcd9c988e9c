//! Game configuration

use phage_assets::{AssetLoader, Resource, TomlLoader};
use phage_core::TimeConfig;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Static description of a game, usually read from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Game name, handed to scripts through their context
    pub title: String,
    /// Scene made current by `Game::start`
    pub initial_scene: String,
    /// Systems that must run first, in this order (e.g. physics before
    /// render). Systems not listed run after them in registration order.
    pub system_order: Vec<String>,
    /// Frame time settings
    pub time: TimeConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            title: "phage".to_string(),
            initial_scene: "main".to_string(),
            system_order: Vec::new(),
            time: TimeConfig::default(),
        }
    }
}

impl GameConfig {
    /// Parse a config from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read the config from a resource, e.g. a `game.toml` next to the assets.
    pub fn load(resource: &Resource) -> Result<Self> {
        Ok(TomlLoader::<GameConfig>::new().load(resource, &[])?)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use phage_assets::MemoryLocator;

    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let config = GameConfig::from_toml_str("title = \"demo\"").unwrap();
        assert_eq!(config.title, "demo");
        assert_eq!(config.initial_scene, "main");
        assert!(config.system_order.is_empty());
        assert_eq!(config.time, TimeConfig::default());
    }

    #[test]
    fn full_config() {
        let text = r#"
            title = "demo"
            initial_scene = "intro"
            system_order = ["physics", "render"]

            [time]
            fixed_timestep = 0.02
        "#;
        let config = GameConfig::from_toml_str(text).unwrap();
        assert_eq!(config.system_order, vec!["physics", "render"]);
        assert_eq!(config.initial_scene, "intro");
        assert!((config.time.fixed_timestep - 0.02).abs() < 1e-6);
        assert!((config.time.time_scale - 1.0).abs() < 1e-6);
    }

    #[test]
    fn load_from_resource() {
        let locator = Rc::new(MemoryLocator::new().with_file("game.toml", "title = \"res\""));
        let config = GameConfig::load(&Resource::new("game.toml", locator)).unwrap();
        assert_eq!(config.title, "res");

        let broken = Rc::new(MemoryLocator::new().with_file("game.toml", "title = "));
        assert!(GameConfig::load(&Resource::new("game.toml", broken)).is_err());
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        assert!(matches!(
            GameConfig::from_toml_str("system_order = 3"),
            Err(crate::GameError::Config(_))
        ));
    }
}
