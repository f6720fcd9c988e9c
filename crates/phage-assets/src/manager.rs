use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, info};

use crate::error::{AssetError, Result};
use crate::handle::{next_asset_id, AssetHandle, AssetId};
use crate::loader::{AssetLoader, BytesLoader, TextLoader};
use crate::resource::Resource;

struct LoadedAsset {
    id: AssetId,
    type_id: TypeId,
    type_name: &'static str,
    resource: Resource,
    value: Rc<dyn Any>,
}

struct RegisteredLoader {
    type_name: &'static str,
    /// A `Box<dyn AssetLoader<T>>` for the registered `T`.
    loader: Box<dyn Any>,
}

/// Registry of loaded assets, keyed by identifier.
///
/// One loader per Rust type turns resources into values; loaded values are
/// shared out as `Rc<T>`. Owned by the game, never global.
#[derive(Default)]
pub struct AssetManager {
    loaders: HashMap<TypeId, RegisteredLoader>,
    assets: HashMap<String, LoadedAsset>,
    by_id: HashMap<AssetId, String>,
}

impl AssetManager {
    /// A manager without any loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// A manager that can load `String` and `Vec<u8>` assets.
    pub fn with_default_loaders() -> Self {
        let mut manager = Self::new();
        manager.insert_loader::<String>(Box::new(TextLoader));
        manager.insert_loader::<Vec<u8>>(Box::new(BytesLoader));
        manager
    }

    /// Register the loader for assets of type `T`. Only one per type.
    pub fn add_loader<T: 'static>(&mut self, loader: impl AssetLoader<T> + 'static) -> Result<()> {
        if self.has_loader::<T>() {
            return Err(AssetError::DuplicateLoader(type_name::<T>()));
        }
        self.insert_loader::<T>(Box::new(loader));
        Ok(())
    }

    fn insert_loader<T: 'static>(&mut self, loader: Box<dyn AssetLoader<T>>) {
        debug!(kind = type_name::<T>(), "asset loader registered");
        self.loaders.insert(
            TypeId::of::<T>(),
            RegisteredLoader {
                type_name: type_name::<T>(),
                loader: Box::new(loader),
            },
        );
    }

    /// Check whether a loader is registered for `T`.
    pub fn has_loader<T: 'static>(&self) -> bool {
        self.loaders.contains_key(&TypeId::of::<T>())
    }

    /// Load `resource` as a `T` and keep it under `identifier`.
    pub fn load<T: 'static>(
        &mut self,
        identifier: &str,
        resource: Resource,
        params: &[String],
    ) -> Result<AssetHandle<T>> {
        if identifier.is_empty() {
            return Err(AssetError::EmptyIdentifier);
        }
        if self.assets.contains_key(identifier) {
            return Err(AssetError::DuplicateIdentifier(identifier.to_string()));
        }
        let loader = self
            .loaders
            .get(&TypeId::of::<T>())
            .and_then(|registered| registered.loader.downcast_ref::<Box<dyn AssetLoader<T>>>())
            .ok_or(AssetError::NoLoader(type_name::<T>()))?;
        let value = loader.load(&resource, params)?;

        let id = next_asset_id();
        info!(
            identifier,
            path = %resource.path().display(),
            kind = type_name::<T>(),
            "asset loaded"
        );
        self.by_id.insert(id, identifier.to_string());
        self.assets.insert(
            identifier.to_string(),
            LoadedAsset {
                id,
                type_id: TypeId::of::<T>(),
                type_name: type_name::<T>(),
                resource,
                value: Rc::new(value),
            },
        );
        Ok(AssetHandle::new(id))
    }

    fn loaded(&self, identifier: &str) -> Result<&LoadedAsset> {
        self.assets
            .get(identifier)
            .ok_or_else(|| AssetError::UnknownIdentifier(identifier.to_string()))
    }

    /// The asset under `identifier`, which must have been loaded as a `T`.
    pub fn get<T: 'static>(&self, identifier: &str) -> Result<Rc<T>> {
        let loaded = self.loaded(identifier)?;
        let wrong_type = || AssetError::WrongType {
            identifier: identifier.to_string(),
            expected: type_name::<T>(),
            actual: loaded.type_name,
        };
        if loaded.type_id != TypeId::of::<T>() {
            return Err(wrong_type());
        }
        loaded.value.clone().downcast::<T>().map_err(|_| wrong_type())
    }

    /// Get a loaded asset by its typed handle.
    pub fn get_by_handle<T: 'static>(&self, handle: AssetHandle<T>) -> Result<Rc<T>> {
        let identifier = self
            .by_id
            .get(&handle.id())
            .ok_or_else(|| AssetError::UnknownIdentifier(format!("#{}", handle.id())))?;
        self.get(identifier)
    }

    /// The asset under `identifier`, whatever its type.
    pub fn get_any(&self, identifier: &str) -> Result<Rc<dyn Any>> {
        Ok(self.loaded(identifier)?.value.clone())
    }

    /// The resource an asset was loaded from.
    pub fn resource(&self, identifier: &str) -> Result<&Resource> {
        Ok(&self.loaded(identifier)?.resource)
    }

    /// Forget an asset. Outstanding `Rc`s keep the value alive.
    pub fn unload(&mut self, identifier: &str) -> Result<()> {
        let loaded = self
            .assets
            .remove(identifier)
            .ok_or_else(|| AssetError::UnknownIdentifier(identifier.to_string()))?;
        self.by_id.remove(&loaded.id);
        debug!(identifier, "asset unloaded");
        Ok(())
    }

    /// Check whether an identifier is loaded.
    pub fn contains(&self, identifier: &str) -> bool {
        self.assets.contains_key(identifier)
    }

    /// Loaded identifiers, sorted.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.assets.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of loaded assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Check whether no asset is loaded.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl fmt::Debug for AssetManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loaders: Vec<&str> = self.loaders.values().map(|l| l.type_name).collect();
        f.debug_struct("AssetManager")
            .field("loaders", &loaders)
            .field("assets", &self.identifiers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use serde::Deserialize;

    use super::*;
    use crate::loader::TomlLoader;
    use crate::resource::{MemoryLocator, ResourceLocator};

    #[derive(Debug, Deserialize)]
    struct Level {
        width: u32,
    }

    fn locator() -> Rc<dyn ResourceLocator> {
        Rc::new(
            MemoryLocator::new()
                .with_file("intro.txt", "Once upon a time")
                .with_file("level.toml", "width = 64"),
        )
    }

    #[test]
    fn load_and_get() {
        let mut assets = AssetManager::with_default_loaders();
        let handle = assets
            .load::<String>("intro", Resource::new("intro.txt", locator()), &[])
            .unwrap();
        assert_eq!(*assets.get::<String>("intro").unwrap(), "Once upon a time");
        assert_eq!(*assets.get_by_handle(handle).unwrap(), "Once upon a time");
        assert_eq!(assets.resource("intro").unwrap().path(), Path::new("intro.txt"));
        assert!(assets.get_any("intro").unwrap().is::<String>());
    }

    #[test]
    fn custom_loader() {
        let mut assets = AssetManager::new();
        assets.add_loader(TomlLoader::<Level>::new()).unwrap();
        assert!(matches!(
            assets.add_loader(TomlLoader::<Level>::new()),
            Err(AssetError::DuplicateLoader(_))
        ));
        assets
            .load::<Level>("level", Resource::new("level.toml", locator()), &[])
            .unwrap();
        assert_eq!(assets.get::<Level>("level").unwrap().width, 64);
    }

    #[test]
    fn load_errors() {
        let mut assets = AssetManager::with_default_loaders();
        let intro = Resource::new("intro.txt", locator());
        assert!(matches!(
            assets.load::<String>("", intro.clone(), &[]),
            Err(AssetError::EmptyIdentifier)
        ));
        assert!(matches!(
            assets.load::<Level>("level", intro.clone(), &[]),
            Err(AssetError::NoLoader(_))
        ));
        assert!(matches!(
            assets.load::<String>("missing", Resource::new("nope.txt", locator()), &[]),
            Err(AssetError::NotFound(_))
        ));
        assets.load::<String>("intro", intro.clone(), &[]).unwrap();
        assert!(matches!(
            assets.load::<String>("intro", intro, &[]),
            Err(AssetError::DuplicateIdentifier(_))
        ));
        assert_eq!(assets.identifiers(), vec!["intro"]);
    }

    #[test]
    fn get_errors() {
        let mut assets = AssetManager::with_default_loaders();
        assets
            .load::<String>("intro", Resource::new("intro.txt", locator()), &[])
            .unwrap();
        assert!(matches!(
            assets.get::<Vec<u8>>("intro"),
            Err(AssetError::WrongType { .. })
        ));
        assert!(matches!(
            assets.get::<String>("outro"),
            Err(AssetError::UnknownIdentifier(_))
        ));
    }

    #[test]
    fn unload_keeps_shared_values() {
        let mut assets = AssetManager::with_default_loaders();
        let handle = assets
            .load::<String>("intro", Resource::new("intro.txt", locator()), &[])
            .unwrap();
        let text = assets.get::<String>("intro").unwrap();
        assets.unload("intro").unwrap();
        assert!(!assets.contains("intro"));
        assert!(assets.get_by_handle(handle).is_err());
        assert!(assets.unload("intro").is_err());
        assert_eq!(*text, "Once upon a time");
    }
}
