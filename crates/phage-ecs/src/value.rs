use glam::Vec2;
use phage_core::Transform2;
use serde::{Deserialize, Serialize};

use crate::error::{EcsError, Result};
use crate::tags::TagList;

/// A value stored in a component field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f32),
    Str(String),
    Vec2(Vec2),
    Transform(Transform2),
    Tags(TagList),
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Short name of the variant, used in type errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Float(_) => "float",
            FieldValue::Str(_) => "string",
            FieldValue::Vec2(_) => "vec2",
            FieldValue::Transform(_) => "transform",
            FieldValue::Tags(_) => "tags",
            FieldValue::List(_) => "list",
        }
    }

    fn mismatch(&self, identifier: &str, expected: &'static str) -> EcsError {
        EcsError::FieldType {
            identifier: identifier.to_string(),
            expected,
            found: self.type_name(),
        }
    }

    /// The value as a bool, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The value as an integer, if it is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Floats, and ints widened to floats.
    pub fn as_float(&self) -> Option<f32> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Int(i) => Some(*i as f32),
            _ => None,
        }
    }

    /// The value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The value as a vector, if it is one.
    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            FieldValue::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as a tag list, if it is one.
    pub fn as_tags(&self) -> Option<&TagList> {
        match self {
            FieldValue::Tags(t) => Some(t),
            _ => None,
        }
    }

    /// Like [`as_float`](Self::as_float), but reports a typed error for `identifier`.
    pub fn expect_float(&self, identifier: &str) -> Result<f32> {
        self.as_float().ok_or_else(|| self.mismatch(identifier, "float"))
    }

    /// The value as a vector, or a type error naming `identifier`.
    pub fn expect_vec2(&self, identifier: &str) -> Result<Vec2> {
        self.as_vec2().ok_or_else(|| self.mismatch(identifier, "vec2"))
    }

    /// The value as a tag list, or a type error naming `identifier`.
    pub fn expect_tags(&self, identifier: &str) -> Result<TagList> {
        self.as_tags()
            .cloned()
            .ok_or_else(|| self.mismatch(identifier, "tags"))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value as i64)
    }
}

impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        FieldValue::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<Vec2> for FieldValue {
    fn from(value: Vec2) -> Self {
        FieldValue::Vec2(value)
    }
}

impl From<Transform2> for FieldValue {
    fn from(value: Transform2) -> Self {
        FieldValue::Transform(value)
    }
}

impl From<TagList> for FieldValue {
    fn from(value: TagList) -> Self {
        FieldValue::Tags(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn int_widens_to_float() {
        assert_eq!(FieldValue::from(3).as_float(), Some(3.0));
        assert_eq!(FieldValue::from(true).as_float(), None);
    }

    #[test]
    fn typed_access_errors() {
        let err = FieldValue::from("nope").expect_vec2("translation").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(err.to_string().contains("vec2"));
        assert!(err.to_string().contains("string"));
    }
}
