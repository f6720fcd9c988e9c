use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::error::{AssetError, Result};
use crate::resource::Resource;

/// Turns a resource into a value of type `T`.
///
/// `params` are loader-specific and may be empty.
pub trait AssetLoader<T> {
    fn load(&self, resource: &Resource, params: &[String]) -> Result<T>;
}

impl<T, F> AssetLoader<T> for F
where
    F: Fn(&Resource, &[String]) -> Result<T>,
{
    fn load(&self, resource: &Resource, params: &[String]) -> Result<T> {
        self(resource, params)
    }
}

/// Loads a resource as UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLoader;

impl AssetLoader<String> for TextLoader {
    fn load(&self, resource: &Resource, _params: &[String]) -> Result<String> {
        resource.read_string()
    }
}

/// Loads a resource as raw bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesLoader;

impl AssetLoader<Vec<u8>> for BytesLoader {
    fn load(&self, resource: &Resource, _params: &[String]) -> Result<Vec<u8>> {
        resource.read_bytes()
    }
}

/// Deserializes a TOML resource into `T`.
///
/// With a parameter, only the table at that dotted key is decoded, so one
/// file can hold several assets.
pub struct TomlLoader<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> TomlLoader<T> {
    /// Create a loader deserializing the whole document.
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for TomlLoader<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> AssetLoader<T> for TomlLoader<T> {
    fn load(&self, resource: &Resource, params: &[String]) -> Result<T> {
        let text = resource.read_string()?;
        let decode_err = |e: &dyn std::fmt::Display| {
            AssetError::Decode(resource.path().to_path_buf(), e.to_string())
        };
        let Some(key) = params.first() else {
            return toml::from_str(&text).map_err(|e| decode_err(&e));
        };

        let mut value: toml::Value = toml::from_str(&text).map_err(|e| decode_err(&e))?;
        for part in key.split('.') {
            value = match value {
                toml::Value::Table(mut table) => table
                    .remove(part)
                    .ok_or_else(|| decode_err(&format!("no key '{key}'")))?,
                _ => return Err(decode_err(&format!("'{key}' does not name a table"))),
            };
        }
        value.try_into().map_err(|e| decode_err(&e))
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use serde::Deserialize;

    use super::*;
    use crate::resource::MemoryLocator;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Enemy {
        name: String,
        speed: f32,
    }

    fn resource(path: &str, contents: &str) -> Resource {
        Resource::new(path, Rc::new(MemoryLocator::new().with_file(path, contents)))
    }

    #[test]
    fn text_and_bytes() {
        let res = resource("a.txt", "abc");
        assert_eq!(TextLoader.load(&res, &[]).unwrap(), "abc");
        assert_eq!(BytesLoader.load(&res, &[]).unwrap(), b"abc".to_vec());
    }

    #[test]
    fn toml_whole_file() {
        let res = resource("slime.toml", "name = \"slime\"\nspeed = 1.5\n");
        let enemy = TomlLoader::<Enemy>::new().load(&res, &[]).unwrap();
        assert_eq!(
            enemy,
            Enemy {
                name: "slime".into(),
                speed: 1.5
            }
        );
    }

    #[test]
    fn toml_nested_key() {
        let res = resource(
            "enemies.toml",
            "[forest.bat]\nname = \"bat\"\nspeed = 4.0\n",
        );
        let enemy = TomlLoader::<Enemy>::new()
            .load(&res, &["forest.bat".to_string()])
            .unwrap();
        assert_eq!(enemy.name, "bat");
        assert!(matches!(
            TomlLoader::<Enemy>::new().load(&res, &["forest.wolf".to_string()]),
            Err(AssetError::Decode(..))
        ));
    }

    #[test]
    fn malformed_toml_is_a_decode_error() {
        let res = resource("bad.toml", "name = ");
        assert!(matches!(
            TomlLoader::<Enemy>::new().load(&res, &[]),
            Err(AssetError::Decode(..))
        ));
    }

    #[test]
    fn closures_are_loaders() {
        let upper = |res: &Resource, _: &[String]| -> Result<String> {
            Ok(res.read_string()?.to_uppercase())
        };
        assert_eq!(upper.load(&resource("a.txt", "hi"), &[]).unwrap(), "HI");
    }
}
