use glam::Vec2;
use phage_core::Transform2;

use crate::component::{Component, ComponentBuilder, PrototypeBuilder};
use crate::error::{require_name, EcsError, Result};
use crate::value::FieldValue;

/// Built-in component holding an entity's transform relative to its parent.
///
/// Every notifying change is recorded as an `(old, new)` pair; the owning
/// scene drains the record and forwards it to the entity's listeners.
#[derive(Debug, Clone, Default)]
pub struct CTransform {
    transform: Transform2,
    changes: Vec<(Transform2, Transform2)>,
}

impl CTransform {
    pub const NAME: &'static str = "transform";
    pub const TRANSLATION: &'static str = "translation";
    pub const ROTATION: &'static str = "rotation";
    pub const SCALE: &'static str = "scale";
    const IDENTIFIERS: [&'static str; 3] = [Self::TRANSLATION, Self::ROTATION, Self::SCALE];

    /// Create a transform component starting at `transform`.
    pub fn new(transform: Transform2) -> Self {
        Self {
            transform,
            changes: Vec::new(),
        }
    }

    /// The local transform.
    pub fn transform(&self) -> Transform2 {
        self.transform
    }

    /// Replace the transform and record the change for listeners.
    pub fn set_transform(&mut self, transform: Transform2) {
        let old = self.transform;
        self.transform = transform;
        self.changes.push((old, transform));
    }

    /// Move by `offset` in the parent's frame.
    pub fn translate(&mut self, offset: Vec2) {
        self.set_transform(self.transform.translated(offset));
    }

    /// Rotate by `angle` radians.
    pub fn rotate(&mut self, angle: f32) {
        self.set_transform(self.transform.rotated(angle));
    }

    /// Multiply the scale by `factor`.
    pub fn scale_by(&mut self, factor: Vec2) {
        self.set_transform(self.transform.scaled(factor));
    }

    /// Drain the recorded (old, new) pairs.
    pub(crate) fn take_changes(&mut self) -> Vec<(Transform2, Transform2)> {
        std::mem::take(&mut self.changes)
    }

    /// Check whether a change is waiting to be announced.
    pub(crate) fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

impl Component for CTransform {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn identifiers(&self) -> Vec<String> {
        Self::IDENTIFIERS.iter().map(|s| s.to_string()).collect()
    }

    fn get(&self, identifier: &str) -> Result<FieldValue> {
        require_name(identifier, "identifier")?;
        match identifier {
            Self::TRANSLATION => Ok(FieldValue::Vec2(self.transform.translation)),
            Self::ROTATION => Ok(FieldValue::Float(self.transform.rotation)),
            Self::SCALE => Ok(FieldValue::Vec2(self.transform.scale)),
            _ => Err(EcsError::unknown_field(Self::NAME, identifier)),
        }
    }

    fn set(&mut self, identifier: &str, value: FieldValue) -> Result<()> {
        require_name(identifier, "identifier")?;
        let mut next = self.transform;
        match identifier {
            Self::TRANSLATION => next.translation = value.expect_vec2(identifier)?,
            Self::ROTATION => next.rotation = value.expect_float(identifier)?,
            Self::SCALE => next.scale = value.expect_vec2(identifier)?,
            _ => return Err(EcsError::unknown_field(Self::NAME, identifier)),
        }
        self.set_transform(next);
        Ok(())
    }

    fn builder(&self) -> Box<dyn ComponentBuilder>
    where
        Self: Sized + Clone,
    {
        Box::new(PrototypeBuilder::new(CTransform::new(self.transform)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_access() {
        let mut c = CTransform::default();
        c.set(CTransform::TRANSLATION, Vec2::new(1.0, 2.0).into())
            .unwrap();
        c.set(CTransform::ROTATION, 0.5f32.into()).unwrap();
        assert_eq!(
            c.get(CTransform::TRANSLATION).unwrap(),
            FieldValue::Vec2(Vec2::new(1.0, 2.0))
        );
        assert_eq!(c.get(CTransform::ROTATION).unwrap(), FieldValue::Float(0.5));
        assert_eq!(c.get(CTransform::SCALE).unwrap(), FieldValue::Vec2(Vec2::ONE));
    }

    #[test]
    fn unknown_and_mistyped_fields() {
        let mut c = CTransform::default();
        assert!(matches!(
            c.get("skew"),
            Err(EcsError::UnknownField { .. })
        ));
        assert!(matches!(
            c.set(CTransform::SCALE, 2.0f32.into()),
            Err(EcsError::FieldType { .. })
        ));
        assert!(!c.has_changes());
    }

    #[test]
    fn changes_record_old_and_new() {
        let mut c = CTransform::default();
        c.translate(Vec2::new(1.0, 0.0));
        c.rotate(1.0);
        let changes = c.take_changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].0, Transform2::IDENTITY);
        assert_eq!(changes[1].1.rotation, 1.0);
        assert!(!c.has_changes());
    }

    #[test]
    fn builder_drops_pending_changes() {
        let mut c = CTransform::default();
        c.scale_by(Vec2::splat(2.0));
        let built = c.builder().build();
        let built = built.downcast_ref::<CTransform>().unwrap();
        assert!(!built.has_changes());
        assert_eq!(built.transform().scale, Vec2::splat(2.0));
    }
}
