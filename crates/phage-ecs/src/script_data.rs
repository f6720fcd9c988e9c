use std::collections::BTreeMap;

use crate::component::Component;
use crate::error::{require_name, EcsError, Result};
use crate::value::FieldValue;

/// Built-in bag of ad-hoc fields shared by all scripts of an entity.
///
/// Writes to identifiers no declared component owns end up here.
#[derive(Debug, Clone, Default)]
pub struct CScriptData {
    data: BTreeMap<String, FieldValue>,
}

impl CScriptData {
    pub const NAME: &'static str = "script_data";

    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a field is stored.
    pub fn contains(&self, identifier: &str) -> bool {
        self.data.contains_key(identifier)
    }

    /// Drop a field. Returns the old value, if any.
    pub fn remove(&mut self, identifier: &str) -> Option<FieldValue> {
        self.data.remove(identifier)
    }

    /// Number of stored fields.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check whether the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Component for CScriptData {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn identifiers(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    fn get(&self, identifier: &str) -> Result<FieldValue> {
        require_name(identifier, "identifier")?;
        self.data
            .get(identifier)
            .cloned()
            .ok_or_else(|| EcsError::unknown_field(Self::NAME, identifier))
    }

    /// Creates the field if it does not exist yet.
    fn set(&mut self, identifier: &str, value: FieldValue) -> Result<()> {
        require_name(identifier, "identifier")?;
        self.data.insert(identifier.to_string(), value);
        Ok(())
    }

    /// Script data is per instance: templates always start empty.
    fn builder(&self) -> Box<dyn crate::component::ComponentBuilder>
    where
        Self: Sized + Clone,
    {
        Box::new(crate::component::PrototypeBuilder::new(CScriptData::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_creates_fields() {
        let mut data = CScriptData::new();
        assert!(data.get("score").is_err());
        data.set("score", 10.into()).unwrap();
        data.set("label", "boss".into()).unwrap();
        assert_eq!(data.get("score").unwrap(), FieldValue::Int(10));
        assert_eq!(data.identifiers(), vec!["label", "score"]);
        assert_eq!(data.remove("label"), Some(FieldValue::from("boss")));
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn builder_starts_empty() {
        let mut data = CScriptData::new();
        data.set("x", 1.into()).unwrap();
        assert!(data.builder().build().identifiers().is_empty());
    }
}
