use std::collections::HashMap;

use crate::component::Component;
use crate::error::{require_name, EcsError, Result, Subject};

/// Where a component lives inside a [`ComponentManager`](crate::ComponentManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Slot {
    Transform,
    Tags,
    ScriptData,
    Extra(usize),
}

/// Reverse index from field identifier to the component declaring it.
///
/// The script-data bag is never indexed: its identifiers come and go at
/// runtime and act only as a fallback behind the declared ones.
#[derive(Debug, Clone, Default)]
pub struct FieldManager {
    owners: HashMap<String, Slot>,
    order: Vec<String>,
}

impl FieldManager {
    /// Index every identifier of `components`. Fails on the first identifier
    /// declared twice; nothing is kept in that case.
    pub(crate) fn build<'a, I>(components: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Slot, &'a dyn Component)>,
    {
        let mut fields = FieldManager::default();
        for (slot, component) in components {
            for identifier in component.identifiers() {
                require_name(&identifier, "identifier")?;
                if fields.owners.contains_key(&identifier) {
                    return Err(EcsError::duplicate(Subject::Field, identifier));
                }
                fields.owners.insert(identifier.clone(), slot);
                fields.order.push(identifier);
            }
        }
        Ok(fields)
    }

    /// The component slot owning `identifier`.
    pub(crate) fn owner(&self, identifier: &str) -> Option<Slot> {
        self.owners.get(identifier).copied()
    }

    /// Whether a declared component owns `identifier`.
    pub fn contains(&self, identifier: &str) -> bool {
        self.owners.contains_key(identifier)
    }

    /// Declared identifiers in component order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of indexed identifiers.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check whether no identifier is indexed.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::tests::Stats;

    fn index(components: &[Stats]) -> Result<FieldManager> {
        FieldManager::build(
            components
                .iter()
                .enumerate()
                .map(|(i, c)| (Slot::Extra(i), c as &dyn Component)),
        )
    }

    #[test]
    fn indexes_owners() {
        let fields = index(&[
            Stats::new("a", &[("hp", 1.0), ("mp", 2.0)]),
            Stats::new("b", &[("speed", 3.0)]),
        ])
        .unwrap();
        assert_eq!(fields.owner("mp"), Some(Slot::Extra(0)));
        assert_eq!(fields.owner("speed"), Some(Slot::Extra(1)));
        assert_eq!(fields.owner("armor"), None);
        assert_eq!(fields.identifiers().collect::<Vec<_>>(), vec!["hp", "mp", "speed"]);
    }

    #[test]
    fn duplicate_identifier_fails() {
        let err = index(&[
            Stats::new("a", &[("hp", 1.0)]),
            Stats::new("b", &[("hp", 3.0)]),
        ])
        .unwrap_err();
        assert!(matches!(err, EcsError::Duplicate { subject: Subject::Field, .. }));
    }
}
