//! Phage Assets - Asset loading and management
//!
//! Resources are located through a pluggable [`ResourceLocator`] and turned
//! into typed values by per-type [`AssetLoader`]s registered with an
//! [`AssetManager`].

mod error;
mod handle;
mod loader;
mod manager;
mod resource;

pub use error::{AssetError, Result};
pub use handle::{AssetHandle, AssetId};
pub use loader::{AssetLoader, BytesLoader, TextLoader, TomlLoader};
pub use manager::AssetManager;
pub use resource::{FolderLocator, MemoryLocator, Resource, ResourceLocator};
