use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::{AssetError, Result};

/// Where resource bytes come from.
pub trait ResourceLocator {
    /// Read the whole resource at `path`.
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    fn exists(&self, path: &Path) -> bool;
}

/// Resolves paths against a directory on disk.
#[derive(Debug, Clone)]
pub struct FolderLocator {
    root: PathBuf,
}

impl FolderLocator {
    /// Create a locator resolving relative paths against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory relative paths are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl ResourceLocator for FolderLocator {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let full_path = self.resolve(path);
        if !full_path.exists() {
            return Err(AssetError::NotFound(full_path));
        }
        std::fs::read(&full_path).map_err(|e| AssetError::Io(full_path, e))
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }
}

/// In-memory files, for tests and embedded content.
#[derive(Debug, Clone, Default)]
pub struct MemoryLocator {
    files: HashMap<PathBuf, Vec<u8>>,
}

impl MemoryLocator {
    /// Create an empty in-memory locator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `contents` under `path`, replacing any previous file.
    pub fn insert(&mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), contents.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }
}

impl ResourceLocator for MemoryLocator {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(path.to_path_buf()))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }
}

/// A path paired with the locator that can open it.
#[derive(Clone)]
pub struct Resource {
    path: PathBuf,
    locator: Rc<dyn ResourceLocator>,
}

impl Resource {
    /// Create a resource for `path`, read through `locator`.
    pub fn new(path: impl Into<PathBuf>, locator: Rc<dyn ResourceLocator>) -> Self {
        Self {
            path: path.into(),
            locator,
        }
    }

    /// The path as given, before the locator resolves it.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The locator this resource reads through.
    pub fn locator(&self) -> &Rc<dyn ResourceLocator> {
        &self.locator
    }

    /// A sibling resource, resolved relative to this one's directory.
    pub fn relative(&self, path: impl AsRef<Path>) -> Resource {
        let base = self.path.parent().unwrap_or_else(|| Path::new(""));
        Resource {
            path: base.join(path),
            locator: self.locator.clone(),
        }
    }

    /// Check whether the locator can find this resource.
    pub fn exists(&self) -> bool {
        self.locator.exists(&self.path)
    }

    /// Read the whole resource as bytes.
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        self.locator.read(&self.path)
    }

    /// Read the whole resource as UTF-8 text.
    pub fn read_string(&self) -> Result<String> {
        String::from_utf8(self.read_bytes()?)
            .map_err(|e| AssetError::Decode(self.path.clone(), e.to_string()))
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Resource").field(&self.path).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Rc<dyn ResourceLocator> {
        Rc::new(
            MemoryLocator::new()
                .with_file("levels/intro.toml", "name = \"intro\"")
                .with_file("levels/tiles.txt", "##..")
                .with_file("broken.txt", vec![0xff, 0xfe]),
        )
    }

    #[test]
    fn memory_resources() {
        let intro = Resource::new("levels/intro.toml", memory());
        assert!(intro.exists());
        assert_eq!(intro.read_string().unwrap(), "name = \"intro\"");
        let tiles = intro.relative("tiles.txt");
        assert_eq!(tiles.path(), Path::new("levels/tiles.txt"));
        assert_eq!(tiles.read_bytes().unwrap(), b"##..");
    }

    #[test]
    fn missing_resource_is_not_found() {
        let missing = Resource::new("nope.txt", memory());
        assert!(!missing.exists());
        match missing.read_bytes().unwrap_err() {
            AssetError::NotFound(path) => assert_eq!(path, PathBuf::from("nope.txt")),
            other => panic!("expected NotFound, got: {:?}", other),
        }
    }

    #[test]
    fn invalid_utf8_is_a_decode_error() {
        let broken = Resource::new("broken.txt", memory());
        assert!(matches!(broken.read_string(), Err(AssetError::Decode(..))));
    }

    #[test]
    fn folder_locator_reads_files() {
        let dir = std::env::temp_dir().join(format!("phage-assets-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("hello.txt"), "hello").unwrap();

        let locator = FolderLocator::new(&dir);
        assert!(locator.exists(Path::new("hello.txt")));
        assert_eq!(locator.read(Path::new("hello.txt")).unwrap(), b"hello");
        assert!(matches!(
            locator.read(Path::new("absent.txt")),
            Err(AssetError::NotFound(_))
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn folder_locator_keeps_absolute_paths() {
        let locator = FolderLocator::new("/home/user/assets");
        assert_eq!(
            locator.resolve(Path::new("/absolute/path.txt")),
            PathBuf::from("/absolute/path.txt")
        );
        assert_eq!(
            locator.resolve(Path::new("levels/a.toml")),
            PathBuf::from("/home/user/assets/levels/a.toml")
        );
    }
}
