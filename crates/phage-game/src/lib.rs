//! Phage Game - scene management and the frame driver
//!
//! A [`Game`] owns its scenes, the ordered system schedule and an
//! [`AssetManager`](phage_assets::AssetManager), and runs frames against
//! the current scene.

mod config;
mod error;
mod game;
mod scene_manager;

pub use config::GameConfig;
pub use error::{GameError, Result};
pub use game::Game;
pub use scene_manager::SceneManager;
